//! Implements the `/volume` command.
//!
//! The volume is kept per guild, so it also applies to tracks queued later.

use tracing::instrument;

use crate::data::GetData;
use crate::data::Volume;
use crate::music::{call, queue};
use crate::Context;
use crate::JukeboxError;

/// 🔊 Set the playback volume.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, check = "call::author_in_voice")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume from 1 to 100"]
    #[min = 1]
    #[max = 100]
    level: i64,
) -> Result<(), JukeboxError> {
    // Refuse before touching the player.
    let volume = Volume::new(level)?;

    {
        let guild_data = ctx.guild_data().await?;
        guild_data.lock().await.volume = volume;
    }

    let call = call::get_call(&ctx).await?;
    {
        let call = call.lock().await;
        queue::set_volume(call.queue(), volume)?;
    }

    ctx.say(format!("🔊 Volume set to **{volume}**")).await?;
    Ok(())
}
