//! Implements the `/queue` command.
//!
//! The bot responds with an embed displaying all the songs in the queue.

use poise::CreateReply;
use tracing::instrument;

use crate::error::UserError;
use crate::music::{call, embed, queue as playback};
use crate::Context;
use crate::JukeboxError;

/// 📜 Show the current queue.
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    guild_only,
    guild_cooldown = 2,
    check = "call::author_in_voice"
)]
pub async fn queue(ctx: Context<'_>) -> Result<(), JukeboxError> {
    let guild = ctx.guild().ok_or(UserError::GuildOnly)?.name.clone();
    let call = call::get_call(&ctx).await?;

    let tracks = {
        let call = call.lock().await;
        playback::snapshot(call.queue()).await?
    };

    let reply = CreateReply::default().embed(embed::queue(&guild, &tracks));
    ctx.send(reply).await?;

    Ok(())
}
