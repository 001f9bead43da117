//! Implements the `/skip` command.
//!
//! The bot will skip the current track and start playing the next one
//! in the queue (if there is one).

use tracing::instrument;

use crate::music::{call, queue};
use crate::Context;
use crate::JukeboxError;

/// ⏭️ Skip to the next song.
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    guild_only,
    guild_cooldown = 2,
    check = "call::author_in_voice"
)]
pub async fn skip(ctx: Context<'_>) -> Result<(), JukeboxError> {
    let call = call::get_call(&ctx).await?;

    let skipped = {
        let call = call.lock().await;
        queue::skip(call.queue()).await?
    };

    ctx.say(format!("⏭️ Skipped `{}`!", skipped.title())).await?;
    Ok(())
}
