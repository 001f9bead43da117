//! Queue operations behind the commands.
//!
//! Commands only talk to the player through [Playback], which is implemented for
//! songbird's [TrackQueue]. The functions here decide what to refuse and what to
//! forward, the player does the rest.

use std::sync::Arc;

use async_trait::async_trait;
use songbird::tracks::TrackQueue;

use crate::data::TrackMetadata;
use crate::data::Volume;
use crate::error::UserError;
use crate::JukeboxError;

/// The player operations commands rely on.
#[async_trait]
pub trait Playback: Sync {
    /// Metadata of every track, starting with the one playing.
    async fn tracks(&self) -> Vec<Arc<TrackMetadata>>;
    /// End the current track and move to the next one.
    fn skip_current(&self) -> Result<(), JukeboxError>;
    /// End the current track and drop the rest.
    fn stop_all(&self);
    /// Set the volume of every queued track.
    fn apply_volume(&self, volume: Volume) -> Result<(), JukeboxError>;
}

#[async_trait]
impl Playback for TrackQueue {
    async fn tracks(&self) -> Vec<Arc<TrackMetadata>> {
        // Metadata is attached right after `call::enqueue` adds a track.
        let mut tracks = Vec::new();
        for handle in self.current_queue() {
            match TrackMetadata::of(&handle).await {
                Some(meta) => tracks.push(meta),
                None => tracing::debug!("Track {} has no metadata yet.", handle.uuid()),
            }
        }
        tracks
    }

    fn skip_current(&self) -> Result<(), JukeboxError> {
        self.skip()?;
        Ok(())
    }

    fn stop_all(&self) {
        self.stop()
    }

    fn apply_volume(&self, volume: Volume) -> Result<(), JukeboxError> {
        for handle in self.current_queue() {
            handle.set_volume(volume.gain())?;
        }
        Ok(())
    }
}

/// Skips the playing track as long as another one is waiting.
/// Returns the skipped track.
pub async fn skip(queue: &impl Playback) -> Result<Arc<TrackMetadata>, JukeboxError> {
    let tracks = queue.tracks().await;
    let current = tracks.first().cloned().ok_or(UserError::NothingPlaying)?;
    if tracks.len() < 2 {
        Err(UserError::NoNextTrack)?;
    }

    tracing::info!("Skipping {}", current.title());
    queue.skip_current()?;
    Ok(current)
}

/// Stops playback and clears the queue.
pub async fn stop(queue: &impl Playback) -> Result<(), JukeboxError> {
    if queue.tracks().await.is_empty() {
        Err(UserError::NothingPlaying)?;
    }

    tracing::info!("Stopping the queue.");
    queue.stop_all();
    Ok(())
}

/// Applies the volume to everything queued.
pub fn set_volume(queue: &impl Playback, volume: Volume) -> Result<(), JukeboxError> {
    tracing::info!("Setting volume to {volume}");
    queue.apply_volume(volume)
}

/// Everything queued, refusing an empty queue.
pub async fn snapshot(queue: &impl Playback) -> Result<Vec<Arc<TrackMetadata>>, UserError> {
    let tracks = queue.tracks().await;
    if tracks.is_empty() {
        Err(UserError::EmptyQueue)
    } else {
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::serenity::{ChannelId, UserId};

    /// A call the [MockQueue] received.
    #[derive(Debug, PartialEq)]
    pub enum Call {
        Skip,
        Stop,
        Volume(u8),
    }

    /// Records calls instead of playing anything.
    #[derive(Default)]
    pub struct MockQueue {
        pub tracks: Vec<Arc<TrackMetadata>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl MockQueue {
        pub fn with_tracks(titles: &[&str]) -> Self {
            let tracks = titles
                .iter()
                .map(|title| {
                    Arc::new(TrackMetadata {
                        title: Some(title.to_string()),
                        duration: Some(Duration::from_secs(90)),
                        thumbnail_url: None,
                        url: None,
                        requested_by: UserId::new(1),
                        channel_id: ChannelId::new(1),
                    })
                })
                .collect();
            Self {
                tracks,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().expect("lock poisoned"))
        }

        fn record(&self, call: Call) {
            self.calls.lock().expect("lock poisoned").push(call);
        }
    }

    #[async_trait]
    impl Playback for MockQueue {
        async fn tracks(&self) -> Vec<Arc<TrackMetadata>> {
            self.tracks.clone()
        }

        fn skip_current(&self) -> Result<(), JukeboxError> {
            self.record(Call::Skip);
            Ok(())
        }

        fn stop_all(&self) {
            self.record(Call::Stop);
        }

        fn apply_volume(&self, volume: Volume) -> Result<(), JukeboxError> {
            self.record(Call::Volume(volume.percent()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn skip_on_empty_queue_touches_nothing() {
        let queue = MockQueue::default();
        let result = skip(&queue).await;

        assert!(matches!(
            result,
            Err(JukeboxError::UserError(UserError::NothingPlaying))
        ));
        assert!(queue.calls().is_empty());
    }

    #[tokio::test]
    async fn skip_without_next_track_is_refused() {
        let queue = MockQueue::with_tracks(&["only"]);
        let result = skip(&queue).await;

        assert!(matches!(
            result,
            Err(JukeboxError::UserError(UserError::NoNextTrack))
        ));
        assert!(queue.calls().is_empty());
    }

    #[tokio::test]
    async fn skip_forwards_once_and_returns_current() {
        let queue = MockQueue::with_tracks(&["current", "next"]);
        let skipped = skip(&queue).await.expect("skip succeeds");

        assert_eq!(skipped.title(), "current");
        assert_eq!(queue.calls(), vec![Call::Skip]);
    }

    #[tokio::test]
    async fn stop_on_empty_queue_touches_nothing() {
        let queue = MockQueue::default();

        assert!(stop(&queue).await.is_err());
        assert!(queue.calls().is_empty());
    }

    #[tokio::test]
    async fn stop_forwards_to_player() {
        let queue = MockQueue::with_tracks(&["current", "next"]);

        stop(&queue).await.expect("stop succeeds");
        assert_eq!(queue.calls(), vec![Call::Stop]);
    }

    #[test]
    fn volume_is_forwarded() {
        let queue = MockQueue::with_tracks(&["current"]);
        let volume = Volume::new(30).expect("in range");

        set_volume(&queue, volume).expect("volume applies");
        assert_eq!(queue.calls(), vec![Call::Volume(30)]);
    }

    #[tokio::test]
    async fn snapshot_refuses_empty_queue() {
        assert!(matches!(
            snapshot(&MockQueue::default()).await,
            Err(UserError::EmptyQueue)
        ));
        let tracks = snapshot(&MockQueue::with_tracks(&["a", "b"])).await;
        assert_eq!(tracks.map(|t| t.len()).ok(), Some(2));
    }
}
