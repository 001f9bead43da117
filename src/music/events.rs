//! Event handling
//!
//! Currently the bot monitors for the following:
//! - On track start, the track is announced where it was requested.
//! - On track error, the error is reported where the track was requested.
//! - On idle (alone for some time), the bot stops and deletes the queues, then disconnects.
//! - On disconnect, the bot stops and deletes the queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::CreateMessage;
use serenity::Http;
use songbird::tracks::PlayMode;
use songbird::tracks::TrackHandle;
use songbird::tracks::TrackState;
use songbird::CoreEvent;
use songbird::Event;
use songbird::EventContext;
use songbird::EventHandler;
use songbird::TrackEvent;

use super::call::CallRef;
use super::embed;
use crate::data::TrackMetadata;
use crate::serenity;
use crate::Context;

/// Error reports are cut off after this many chars.
const ERROR_REPORT_LEN: usize = 100;

/// Default interval between idle checks.
pub const DEFAULT_IDLE_CHECK: Duration = Duration::from_secs(300);

/// Register the global events of a freshly created call.
pub async fn register_global_events(ctx: &Context<'_>, call: &CallRef) {
    tracing::info!("Initializing global events.");

    let serenity_ctx = ctx.serenity_context();
    let idle_check = ctx.data().idle_check;

    let mut call = call.lock().await;
    call.add_global_event(
        Event::Periodic(idle_check, None),
        CheckIdle::new(call_ref(ctx)),
    );
    call.add_global_event(
        Event::Core(CoreEvent::DriverDisconnect),
        DisconnectStop::new(call_ref(ctx)),
    );
    call.add_global_event(
        Event::Track(TrackEvent::Play),
        AnnounceTrack {
            http: serenity_ctx.http.clone(),
        },
    );
    call.add_global_event(
        Event::Track(TrackEvent::Error),
        ReportError {
            http: serenity_ctx.http.clone(),
        },
    );
}

/// Handlers outlive the command, so they look the call up again when they run.
fn call_ref(ctx: &Context<'_>) -> CallLookup {
    CallLookup {
        ctx: ctx.serenity_context().clone(),
        guild_id: ctx.guild_id(),
    }
}

/// Finds a guild's call through songbird, without keeping the call alive.
struct CallLookup {
    /// Needed to reach the songbird manager.
    ctx: serenity::Context,
    #[allow(clippy::missing_docs_in_private_items)]
    guild_id: Option<serenity::GuildId>,
}

impl CallLookup {
    async fn get(&self) -> Option<CallRef> {
        let manager = songbird::get(&self.ctx).await?;
        manager.get(self.guild_id?)
    }
}

/// Tracks in an event, paired with the metadata they were enqueued with.
/// A track whose metadata isn't attached yet is left out.
async fn tracks<'a>(ectx: &'a EventContext<'_>) -> Vec<(&'a TrackState, Arc<TrackMetadata>)> {
    let list: &[(&TrackState, &TrackHandle)] = match ectx {
        EventContext::Track(list) => list,
        _ => &[],
    };

    let mut tracks = Vec::with_capacity(list.len());
    for (state, handle) in list {
        match TrackMetadata::of(handle).await {
            Some(meta) => tracks.push((*state, meta)),
            None => tracing::debug!("Ignoring event of track {} without metadata.", handle.uuid()),
        }
    }
    tracks
}

/// Check if there are non-bot users in the call, if not then disconnect.
struct CheckIdle {
    /// The call to check, its context is also used to find channels and guilds.
    call: CallLookup,
}

impl CheckIdle {
    /// Constructor for [CheckIdle]
    fn new(call: CallLookup) -> Self {
        Self { call }
    }
}

#[async_trait]
impl EventHandler for CheckIdle {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        let ctx = &self.call.ctx;
        let call = self.call.get().await?;

        // Not connected yet, or already left.
        let channel_id = call
            .lock()
            .await
            .current_channel()
            // Convert songbird::ChannelId -> NonZeroU64 -> serenity::ChannelId
            .map(|c| serenity::ChannelId::from(c.0))?;

        // A series of conversions, each try operator (?) causes this handler
        // to retry on it's next trigger if the operator fails.
        let channel = channel_id.to_channel(ctx).await.ok()?;
        let guild = channel.guild()?;
        let members = guild.members(ctx).ok()?;

        // Check if there are any non-bot members.
        let has_members = members.iter().any(|m| !m.user.bot);

        if !has_members {
            tracing::info!("Idle! Disconnecting from voice channel.");
            let mut call = call.lock().await;
            call.queue().stop();
            if let Err(e) = call.leave().await {
                tracing::error!("Failed to leave idle call. {e}");
            }
        }
        None
    }
}

/// Stop the bot when it disconnects.
/// 'Stopping' means:
/// - End anything currently playing.
/// - Reset the queue.
struct DisconnectStop {
    /// Reference to the call that will be dropped.
    call: CallLookup,
}

impl DisconnectStop {
    /// Constructor for [DisconnectStop]
    fn new(call: CallLookup) -> Self {
        Self { call }
    }
}

#[async_trait]
impl EventHandler for DisconnectStop {
    async fn act(&self, _ectx: &EventContext<'_>) -> Option<Event> {
        tracing::info!("Stopping on disconnect!");
        let call = self.call.get().await?;
        let call = call.lock().await;
        call.queue().stop();
        None
    }
}

/// Post a "now playing" embed when a track starts.
struct AnnounceTrack {
    #[allow(clippy::missing_docs_in_private_items)]
    http: Arc<Http>,
}

#[async_trait]
impl EventHandler for AnnounceTrack {
    async fn act(&self, ectx: &EventContext<'_>) -> Option<Event> {
        for (_state, meta) in tracks(ectx).await {
            tracing::info!("Now playing {}", meta.title());
            let message = CreateMessage::new().embed(embed::now_playing(&meta));
            if let Err(e) = meta.channel_id.send_message(&*self.http, message).await {
                tracing::error!("Failed to announce track. {e}");
            }
        }
        None
    }
}

/// Tell the requester when a track fails to play.
struct ReportError {
    #[allow(clippy::missing_docs_in_private_items)]
    http: Arc<Http>,
}

#[async_trait]
impl EventHandler for ReportError {
    async fn act(&self, ectx: &EventContext<'_>) -> Option<Event> {
        for (state, meta) in tracks(ectx).await {
            let reason = match &state.playing {
                PlayMode::Errored(e) => e.to_string(),
                _ => "unknown playback error".to_string(),
            };
            tracing::error!("Failed to play {}: {reason}", meta.title());

            let content = error_report(&reason);
            if let Err(e) = meta.channel_id.say(&*self.http, content).await {
                tracing::error!("Failed to report track error. {e}");
            }
        }
        None
    }
}

/// The message shown in chat for a failed track.
fn error_report(reason: &str) -> String {
    format!(
        "❌ An error occurred: {}",
        embed::truncate(reason, ERROR_REPORT_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reports_are_truncated() {
        let reason = "e".repeat(250);
        let report = error_report(&reason);

        assert_eq!(report, format!("❌ An error occurred: {}", "e".repeat(100)));
    }

    #[test]
    fn short_errors_are_kept() {
        assert_eq!(error_report("no audio"), "❌ An error occurred: no audio");
    }
}
