//! Stores track metadata and their display implementation.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use songbird::input::Input;
use songbird::tracks::TrackHandle;

use crate::error::UserError;
use crate::music::embed;
use crate::serenity::ChannelId;
use crate::serenity::prelude::TypeMapKey;
use crate::serenity::UserId;

/// Metadata for a track in the queue.
/// Attached to every enqueued track through its [TrackHandle::typemap].
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    /// Title of the track.
    pub title: Option<String>,
    /// Duration of the track, `None` for live streams.
    pub duration: Option<Duration>,
    /// The url to the source's thumbnail.
    pub thumbnail_url: Option<String>,
    /// Url to source
    pub url: Option<String>,
    /// Who asked for this track.
    pub requested_by: UserId,
    /// Where the track was asked for, announcements go here.
    pub channel_id: ChannelId,
}

impl TrackMetadata {
    /// Try to get [TrackMetadata] from [Input]
    pub async fn from_input(
        input: &mut Input,
        requested_by: UserId,
        channel_id: ChannelId,
    ) -> Result<Self, UserError> {
        // Bad links and searches without results fail here.
        let meta = input
            .aux_metadata()
            .await
            .map_err(UserError::search_failed)?;
        Ok(TrackMetadata {
            title: meta.title,
            duration: meta.duration,
            thumbnail_url: meta.thumbnail,
            url: meta.source_url,
            requested_by,
            channel_id,
        })
    }

    /// Attach to a queued track.
    pub async fn attach(self: Arc<Self>, handle: &TrackHandle) {
        handle.typemap().write().await.insert::<TrackMetadataKey>(self);
    }

    /// Metadata attached to the track, `None` until [attach](Self::attach) ran.
    pub async fn of(handle: &TrackHandle) -> Option<Arc<TrackMetadata>> {
        handle.typemap().read().await.get::<TrackMetadataKey>().cloned()
    }

    /// The title, or a placeholder when the source had none.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("<MISSING TITLE>")
    }

    /// Title as a markdown link when the url is known.
    pub fn link(&self) -> String {
        match &self.url {
            Some(url) => format!("[{}]({url})", self.title()),
            None => self.title().to_string(),
        }
    }

    /// Duration as shown in chat.
    pub fn duration_string(&self) -> String {
        embed::format_duration(self.duration)
    }
}

/// Key to store [TrackMetadata] in a track's typemap.
struct TrackMetadataKey;

impl TypeMapKey for TrackMetadataKey {
    type Value = Arc<TrackMetadata>;
}

impl Display for TrackMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - `{}`", self.title(), self.duration_string())
    }
}

#[cfg(test)]
mod tests {
    use songbird::input::File;
    use songbird::Driver;

    use super::*;

    fn track(title: Option<&str>, url: Option<&str>) -> TrackMetadata {
        TrackMetadata {
            title: title.map(str::to_string),
            duration: Some(Duration::from_secs(205)),
            thumbnail_url: None,
            url: url.map(str::to_string),
            requested_by: UserId::new(1),
            channel_id: ChannelId::new(2),
        }
    }

    #[test]
    fn displays_title_and_duration() {
        let meta = track(Some("Never Gonna Give You Up"), None);
        assert_eq!(meta.to_string(), "Never Gonna Give You Up - `03:25`");
    }

    #[test]
    fn link_falls_back_to_title() {
        let with_url = track(Some("Song"), Some("https://youtu.be/abc"));
        let without = track(None, None);
        assert_eq!(with_url.link(), "[Song](https://youtu.be/abc)");
        assert_eq!(without.link(), "<MISSING TITLE>");
    }

    #[tokio::test]
    async fn unreadable_source_is_a_user_error() {
        let mut input: Input = File::new("no/such/track.mp3").into();
        let result = TrackMetadata::from_input(&mut input, UserId::new(1), ChannelId::new(2)).await;

        assert!(matches!(result, Err(UserError::SearchFailed { .. })));
    }

    #[tokio::test]
    async fn metadata_rides_on_the_track_handle() {
        let mut driver = Driver::default();
        let handle = driver.play_input(File::new("no/such/track.mp3").into());
        assert!(TrackMetadata::of(&handle).await.is_none());

        Arc::new(track(Some("Song"), None)).attach(&handle).await;
        let meta = TrackMetadata::of(&handle).await.expect("metadata attached");

        assert_eq!(meta.title(), "Song");
    }
}
