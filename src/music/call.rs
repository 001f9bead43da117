//! Manages [voice calls](songbird::Call).

use std::collections::HashMap;
use std::sync::Arc;

use songbird::input::Input;
use songbird::tracks::Track;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::data::GetData;
use crate::data::TrackMetadata;
use crate::error::UserError;
use crate::music::events;
use crate::serenity;
use crate::Context;
use crate::JukeboxError;

/// Convenience type alias for [songbird::Call].
pub type CallRef = Arc<Mutex<songbird::Call>>;
/// Convenience type alias for [songbird::Songbird].
type Manager = Arc<songbird::Songbird>;

/// Get the [Manager] from [Context]
pub async fn get_manager(ctx: &Context<'_>) -> Result<Manager, JukeboxError> {
    songbird::get(ctx.serenity_context())
        .await
        .ok_or(JukeboxError::MissingFromSetup {
            reason: "Expecting songbird manager.".to_string(),
        })
}

/// Get the guild's call, registering its global events the first time.
/// Must always use this function to initialize a call.
pub async fn get_call(ctx: &Context<'_>) -> Result<CallRef, JukeboxError> {
    let manager = get_manager(ctx).await?;
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;

    // Held until the events are registered, so only one command sets up the call.
    let guild_data = ctx.guild_data().await?;
    let mut guild_data = guild_data.lock().await;

    let call = manager.get_or_insert(guild_id);
    if guild_data.claim_call_setup() {
        events::register_global_events(ctx, &call).await;
    }
    Ok(call)
}

/// Find the voice channel the author is in.
pub fn author_voice_channel(
    ctx: &Context<'_>,
) -> Result<(serenity::GuildId, serenity::ChannelId), UserError> {
    let guild = ctx.guild().ok_or(UserError::GuildOnly)?;
    let channel_id = voice_channel_of(&guild.voice_states, ctx.author().id)?;
    Ok((guild.id, channel_id))
}

/// The voice channel `user` is connected to.
fn voice_channel_of(
    voice_states: &HashMap<serenity::UserId, serenity::VoiceState>,
    user: serenity::UserId,
) -> Result<serenity::ChannelId, UserError> {
    voice_states
        .get(&user)
        .and_then(|vs| vs.channel_id)
        .ok_or(UserError::NotInVoice)
}

/// Command check, every music command needs the author in a voice channel.
pub async fn author_in_voice(ctx: Context<'_>) -> Result<bool, JukeboxError> {
    author_voice_channel(&ctx)?;
    Ok(true)
}

/// Join the author's voice channel and register global songbird events.
#[instrument(skip(ctx), fields(author=%ctx.author(), guild=?ctx.guild_id(), channel=?ctx.channel_id()))]
pub async fn join_author(ctx: &Context<'_>) -> Result<CallRef, JukeboxError> {
    // Initializes only once
    let call = get_call(ctx).await?;
    let (guild_id, channel_id) = author_voice_channel(ctx)?;

    if call.lock().await.current_channel() == Some(channel_id.into()) {
        return Ok(call);
    }

    tracing::info!(
        "Joining {user} at {guild}",
        user = ctx.author().name,
        guild = guild_id.name(ctx).unwrap_or("<MISSING GUILD>".to_string())
    );

    // Try to join the call.
    let manager = get_manager(ctx).await?;
    let call = manager.join(guild_id, channel_id).await?;

    Ok(call)
}

/// Add [Input] to the back of the queue at the guild's volume.
/// Returns the track's metadata and how many tracks were queued before it.
pub async fn enqueue(
    ctx: &Context<'_>,
    call: &CallRef,
    mut input: Input,
) -> Result<(Arc<TrackMetadata>, usize), JukeboxError> {
    tracing::debug!("Adding to the queue.");

    let metadata = TrackMetadata::from_input(&mut input, ctx.author().id, ctx.channel_id()).await?;
    let metadata = Arc::new(metadata);

    let volume = {
        let guild_data = ctx.guild_data().await?;
        let guild_data = guild_data.lock().await;
        guild_data.volume
    };

    let track = Track::new(input).volume(volume.gain());

    let mut call = call.lock().await;
    let queued_before = call.queue().len();
    let handle = call.enqueue(track).await;
    metadata.clone().attach(&handle).await;

    Ok((metadata, queued_before))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serenity::{ChannelId, UserId, VoiceState};

    fn voice_state(user: u64, channel: Option<u64>) -> (UserId, VoiceState) {
        let state = serde_json::json!({
            "channel_id": channel.map(|c| c.to_string()),
            "deaf": false,
            "mute": false,
            "self_deaf": false,
            "self_mute": false,
            "self_video": false,
            "session_id": "session",
            "suppress": false,
            "user_id": user.to_string(),
            "request_to_speak_timestamp": null,
        });
        let state = serde_json::from_value(state).expect("valid voice state");
        (UserId::new(user), state)
    }

    #[test]
    fn finds_the_authors_channel() {
        let states = HashMap::from([voice_state(1, Some(10)), voice_state(2, Some(20))]);

        assert_eq!(voice_channel_of(&states, UserId::new(2)).ok(), Some(ChannelId::new(20)));
    }

    #[test]
    fn author_outside_voice_is_refused() {
        let states = HashMap::from([voice_state(1, Some(10)), voice_state(2, None)]);

        // Never joined, and left the channel.
        for user in [3, 2] {
            assert!(matches!(
                voice_channel_of(&states, UserId::new(user)),
                Err(UserError::NotInVoice)
            ));
        }
    }
}
