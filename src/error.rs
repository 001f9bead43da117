//! Error types used throughout the bot.
//!
//! [JukeboxError] is the error type of every command. Errors meant for the person
//! using a command are wrapped in [UserError] so the framework error handler can
//! reply with them instead of filing a bug report.

use std::time::Duration;

use thiserror::Error;

use crate::serenity;

/// Every error the bot can run into.
#[derive(Debug, Error)]
pub enum JukeboxError {
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("Command check failed: {}", reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },

    #[error("Command panicked: {}", payload.as_deref().unwrap_or("no payload"))]
    Panic { payload: Option<String> },

    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },

    /// Something that should have been set up at startup is missing.
    #[error("Missing from setup: {reason}")]
    MissingFromSetup { reason: String },

    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Failed to join voice channel: {0}")]
    Join(#[from] songbird::error::JoinError),

    #[error("Failed to control track: {0}")]
    Control(#[from] songbird::error::ControlError),

    #[error("Spotify error: {0}")]
    Spotify(#[from] rspotify::ClientError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// Errors caused by users, their messages are shown to them as is.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("You need to be in a voice channel!")]
    NotInVoice,

    #[error("Nothing is playing!")]
    NothingPlaying,

    #[error("There are no more songs in the queue.")]
    NoNextTrack,

    #[error("The queue is empty!")]
    EmptyQueue,

    #[error("`{level}` is out of range. Choose a volume between 1 and 100.")]
    VolumeOutOfRange { level: i64 },

    #[error("Search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("Spotify links are not enabled on this bot.")]
    SpotifyDisabled,

    #[error("Couldn't understand the arguments{}.", input.as_ref().map(|i| format!(": `{i}`")).unwrap_or_default())]
    BadArgs { input: Option<String> },

    #[error("Slow down! Try again in {:.1}s.", remaining_cooldown.as_secs_f32())]
    OnCooldown { remaining_cooldown: Duration },

    #[error("I'm missing these permissions: {missing_permissions}")]
    MissingBotPermissions {
        missing_permissions: serenity::Permissions,
    },

    #[error("You don't have the permissions for this command.")]
    MissingUserPermissions {
        missing_permissions: Option<serenity::Permissions>,
    },

    #[error("This command only works in a server.")]
    GuildOnly,
}

impl UserError {
    /// A source or link that couldn't be resolved, most likely a typo or a dead link.
    pub fn search_failed(error: impl std::fmt::Display) -> Self {
        let reason = error.to_string();
        tracing::debug!("Search failed: {reason}");
        Self::SearchFailed { reason }
    }
}

/// Errors while reading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Couldn't access config file: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_shown_verbatim() {
        let err: JukeboxError = UserError::NotInVoice.into();
        assert_eq!(err.to_string(), "You need to be in a voice channel!");
    }

    #[test]
    fn bad_args_mentions_input() {
        let with_input = UserError::BadArgs {
            input: Some("loud".to_string()),
        };
        let without = UserError::BadArgs { input: None };
        assert_eq!(with_input.to_string(), "Couldn't understand the arguments: `loud`.");
        assert_eq!(without.to_string(), "Couldn't understand the arguments.");
    }

    #[test]
    fn guild_only_commands_explain_themselves() {
        assert_eq!(UserError::GuildOnly.to_string(), "This command only works in a server.");
    }

    #[test]
    fn failed_searches_are_user_errors() {
        let err: JukeboxError = UserError::search_failed("Video unavailable").into();

        assert!(matches!(err, JukeboxError::UserError(UserError::SearchFailed { .. })));
        assert_eq!(err.to_string(), "Search failed: Video unavailable");
    }

    #[test]
    fn cooldown_rounds_to_tenths() {
        let err = UserError::OnCooldown {
            remaining_cooldown: Duration::from_millis(1300),
        };
        assert_eq!(err.to_string(), "Slow down! Try again in 1.3s.");
    }
}
