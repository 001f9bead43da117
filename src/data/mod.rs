//! This module contains everything relating to [Data].

mod track_metadata;
mod volume;

use std::collections::HashMap;
use std::collections::HashSet;

use std::sync::Arc;

use reqwest::Client;
use serenity::GuildId;
use serenity::UserId;
use tokio::sync::Mutex;

use crate::error::UserError;
use crate::music::spotify::Spotify;
use crate::serenity;
use crate::Context;
pub use track_metadata::TrackMetadata;
pub use volume::Volume;

/// Convenience type alias for [GuildData]
pub type GuildDataRef = Arc<Mutex<GuildData>>;

/// The data kept between shards
#[derive(Debug)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Per-Guild data
    pub guild_data: Mutex<HashMap<GuildId, GuildDataRef>>,
    /// Shared by every `yt-dlp` source, uses an [Arc] internally.
    pub http_client: Client,
    /// Volume of guilds that never used `/volume`.
    pub default_volume: Volume,
    /// How often to check whether the bot sits alone in a call.
    pub idle_check: std::time::Duration,
    /// Resolves spotify links, `None` without credentials.
    pub spotify: Option<Spotify>,
}

/// Data stored on a per-guild basis.
#[derive(Debug)]
pub struct GuildData {
    /// Applied to every track this guild enqueues.
    pub volume: Volume,
    /// Set once the guild's call has its global events.
    call_ready: bool,
}

impl GuildData {
    /// New guild at the given volume.
    pub fn new(volume: Volume) -> Self {
        Self {
            volume,
            call_ready: false,
        }
    }

    /// `true` only for the first caller, who must then set up the call.
    pub fn claim_call_setup(&mut self) -> bool {
        !std::mem::replace(&mut self.call_ready, true)
    }
}

/// Is able to get a [GuildData] and a [Client].
pub trait GetData {
    /// Returns a [Client].
    fn http_client(&self) -> Client;
    /// Returns a reference to [GuildData]. Errors if not in a guild.
    async fn guild_data(&self) -> Result<GuildDataRef, UserError>;
}

impl GetData for Context<'_> {
    fn http_client(&self) -> Client {
        // Client internally uses an Arc, so this is cheap to clone
        self.data().http_client.clone()
    }

    async fn guild_data(&self) -> Result<GuildDataRef, UserError> {
        let guild = self.guild_id().ok_or(UserError::GuildOnly)?;
        let data = self.data();
        let mut map = data.guild_data.lock().await;

        let guild_data = map
            .entry(guild)
            .or_insert_with(|| Arc::new(Mutex::new(GuildData::new(data.default_volume))));
        Ok(guild_data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_setup_is_claimed_once() {
        let guild_data: GuildDataRef = Arc::new(Mutex::new(GuildData::new(Volume::default())));

        let claims = (0..8).map(|_| {
            let guild_data = guild_data.clone();
            tokio::spawn(async move { guild_data.lock().await.claim_call_setup() })
        });
        let mut claimed = 0;
        for claim in claims.collect::<Vec<_>>() {
            if claim.await.expect("task finishes") {
                claimed += 1;
            }
        }

        assert_eq!(claimed, 1);
    }
}
