//! Configuration for running this bot.

use std::collections::HashSet;
use std::time::Duration;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::data::Volume;
use crate::error::ConfigError;
use crate::music::events::DEFAULT_IDLE_CHECK;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Overrides the discord token.
const TOKEN_VAR: &str = "TOKEN";
/// Overrides the keep-alive port.
const PORT_VAR: &str = "PORT";
/// Overrides the spotify client id.
const SPOTIFY_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
/// Overrides the spotify client secret.
const SPOTIFY_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [KeepAliveConfig]
    keepalive: KeepAliveConfig,

    /// See [PlayerConfig]
    player: PlayerConfig,

    /// See [SpotifyConfig]
    spotify: SpotifyConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Loads `.env`, then the config file, then applies environment overrides.
    ///
    /// Without a config file, defaults are used as long as a token is in the
    /// environment. Hosts like that only configure through the environment.
    pub fn load() -> Result<Config, ConfigError> {
        // A missing .env is fine.
        dotenv::dotenv().ok();

        let config_missing = matches!(
            std::fs::metadata(CONFIG_PATH),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound
        );
        let config = if config_missing && env_var(TOKEN_VAR).is_some() {
            Config::default()
        } else {
            Config::read()?
        };

        config.with_overrides(env_var)
    }

    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file to create a config.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        let file = std::fs::read_to_string(CONFIG_PATH);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                    })
                } else {
                    Config::parse(&content)
                }
            }
            // File not found or other filesystem error
            Err(file_error) => match file_error.kind() {
                // If file doesn't exist, create default config file.
                std::io::ErrorKind::NotFound => {
                    let action = format!("Creating {CONFIG_PATH}...");
                    write_file(Config::default())?;
                    Err(ConfigError::MissingConfig { action_msg: action })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Parses the content of a config file.
    /// If deserialization fails, the error describes the mistake and where it is.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let result: Result<Config, _> = serde_path_to_error::deserialize(to_toml);

        result.map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// Replaces settings with the environment variables that are set.
    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        if let Some(token) = lookup(TOKEN_VAR) {
            self.discord_token = token;
        }
        if let Some(port) = lookup(PORT_VAR) {
            self.keepalive.port = port.parse().map_err(|_| ConfigError::InvalidConfig {
                reason: format!("{PORT_VAR} must be a port number, got '{port}'"),
            })?;
        }
        if let Some(id) = lookup(SPOTIFY_ID_VAR) {
            self.spotify.client_id = id;
        }
        if let Some(secret) = lookup(SPOTIFY_SECRET_VAR) {
            self.spotify.client_secret = secret;
        }
        Ok(self)
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = &self.discord_token;

        let is_empty = given_token.trim().is_empty();
        let contains_default = given_token.contains(&default_token);

        if !is_empty && !contains_default {
            Ok(&self.discord_token)
        } else {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        }
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils
            .notifications
            .notify_list(fw.options().owners.iter().copied())
    }

    /// Port to answer keep-alive pings on, `None` when disabled.
    pub fn keepalive_port(&self) -> Option<u16> {
        self.keepalive.enabled.then_some(self.keepalive.port)
    }

    /// Volume of guilds that haven't picked one.
    pub fn default_volume(&self) -> Volume {
        self.player.default_volume
    }

    /// How often to check for an empty call.
    pub fn idle_check(&self) -> Duration {
        Duration::from_secs(self.player.idle_check_secs)
    }

    /// Spotify client id and secret, if both were given.
    pub fn spotify_credentials(&self) -> Option<(&str, &str)> {
        let SpotifyConfig {
            client_id,
            client_secret,
        } = &self.spotify;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            None
        } else {
            Some((client_id, client_secret))
        }
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),

            keepalive: KeepAliveConfig {
                enabled: true,
                port: 3000,
            },

            player: PlayerConfig {
                default_volume: Volume::default(),
                idle_check_secs: DEFAULT_IDLE_CHECK.as_secs(),
            },

            spotify: SpotifyConfig {
                client_id: String::new(),
                client_secret: String::new(),
            },

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Reads an environment variable, treating blank values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// HTTP endpoint for hosts that need pings to keep the bot running.
#[derive(Debug, Serialize, Deserialize)]
struct KeepAliveConfig {
    /// Serve the endpoint at all?
    enabled: bool,
    /// Port to listen on, on every interface.
    port: u16,
}

/// Playback behavior.
#[derive(Debug, Serialize, Deserialize)]
struct PlayerConfig {
    /// Volume (1-100) of guilds that never used `/volume`.
    default_volume: Volume,
    /// Seconds between checks for an empty call.
    idle_check_secs: u64,
}

/// Credentials to resolve spotify links. Leave blank to disable them.
#[derive(Debug, Serialize, Deserialize)]
struct SpotifyConfig {
    #[allow(clippy::missing_docs_in_private_items)]
    client_id: String,
    #[allow(clippy::missing_docs_in_private_items)]
    client_secret: String,
}

/// Configs for
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list from the config and the bot owners.
    fn notify_list(&self, owners: impl IntoIterator<Item = UserId>) -> HashSet<UserId> {
        // If disabled, don't add anyone to the list.
        if !self.enabled {
            return HashSet::new();
        }

        let owners = owners.into_iter().filter(|_| self.add_owners);
        owners.chain(self.userids.iter().copied()).collect()
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: Config) -> Result<(), ConfigError> {
    use std::fs::write;

    let content = toml::to_string_pretty(&config).map_err(|e| ConfigError::InvalidConfig {
        reason: e.to_string(),
    })?;
    write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(OptVisitor)
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

struct OptVisitor;

impl<'de> serde::de::Visitor<'de> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                Ok(Some(GuildId::new(num)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).expect("default config serializes")
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_config_parses() {
        let config = Config::parse(&default_toml()).expect("default config parses");

        assert_eq!(config.keepalive_port(), Some(3000));
        assert_eq!(config.default_volume(), Volume::default());
        assert_eq!(config.idle_check(), DEFAULT_IDLE_CHECK);
        assert_eq!(config.dev_guild(), None);
        assert!(config.spotify_credentials().is_none());
    }

    #[test]
    fn default_token_is_rejected() {
        assert!(Config::default().token().is_err());
    }

    #[test]
    fn missing_keys_name_their_path() {
        let content = default_toml().replace("default_volume = 100\n", "");
        let err = Config::parse(&content).expect_err("incomplete config");

        assert!(err.to_string().contains("player"), "{err}");
    }

    #[test]
    fn out_of_range_default_volume_is_rejected() {
        let content = default_toml().replace("default_volume = 100", "default_volume = 150");
        assert!(Config::parse(&content).is_err());
    }

    #[test]
    fn dev_guild_parses_from_string() {
        let content = default_toml().replace("dev_guild = \"\"", "dev_guild = \"1234\"");
        let config = Config::parse(&content).expect("config parses");

        assert_eq!(config.dev_guild(), Some(GuildId::new(1234)));
    }

    #[test]
    fn environment_overrides_token_port_and_spotify() {
        let config = Config::default()
            .with_overrides(env(&[
                ("TOKEN", "real-token"),
                ("PORT", "8080"),
                ("SPOTIFY_CLIENT_ID", "id"),
                ("SPOTIFY_CLIENT_SECRET", "secret"),
            ]))
            .expect("overrides apply");

        assert_eq!(config.token().ok().map(String::as_str), Some("real-token"));
        assert_eq!(config.keepalive_port(), Some(8080));
        assert_eq!(config.spotify_credentials(), Some(("id", "secret")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = Config::default().with_overrides(env(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn disabled_keepalive_has_no_port() {
        let content = default_toml().replacen("enabled = true", "enabled = false", 1);
        let config = Config::parse(&content).expect("config parses");

        assert_eq!(config.keepalive_port(), None);
    }

    #[test]
    fn notify_list_respects_flags() {
        let owner = UserId::new(1);
        let extra = UserId::new(2);
        let mut notify = NotifyConfig {
            enabled: false,
            add_owners: true,
            userids: vec![extra],
        };
        assert!(notify.notify_list([owner]).is_empty());

        notify.enabled = true;
        assert_eq!(notify.notify_list([owner]), HashSet::from([owner, extra]));

        notify.add_owners = false;
        assert_eq!(notify.notify_list([owner]), HashSet::from([extra]));
    }
}
