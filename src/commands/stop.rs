//! Implements the `/stop` command.
//!
//! This stops all bot actions, clears the queue, and disconnects the
//! bot from the current voice channel.

use tracing::instrument;

use crate::music::{call, queue};
use crate::Context;
use crate::JukeboxError;

/// ⏹️ Stop the music and clear the queue.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, check = "call::author_in_voice")]
pub async fn stop(ctx: Context<'_>) -> Result<(), JukeboxError> {
    let call = call::get_call(&ctx).await?;

    {
        let mut call = call.lock().await;
        queue::stop(call.queue()).await?;
        call.leave().await?;
    }

    ctx.say("⏹️ Stopped the music and cleared the queue!").await?;
    Ok(())
}
