//! A discord music bot playing youtube (and spotify) tracks in voice channels.

mod commands;
mod data;
mod error;
mod keepalive;
mod log;
mod music;
mod setup;

use std::process::ExitCode;

pub use poise::serenity_prelude as serenity;

pub use data::Data;
pub use error::JukeboxError;
pub use setup::Config;

/// Convenience type alias for [poise::Context]
pub type Context<'a> = poise::Context<'a, Data, JukeboxError>;

#[tokio::main]
async fn main() -> ExitCode {
    // Tracing reads its settings from the config, so errors here can only be printed.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Dropping the guard flushes the file logs.
    let _guard = log::install_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the bot, and the keep-alive server if enabled, until either stops.
async fn run(config: Config) -> Result<(), JukeboxError> {
    let keepalive = match config.keepalive_port() {
        Some(port) => Some(keepalive::bind(port).await?),
        None => None,
    };

    let mut client = setup::client(config).await?;

    match keepalive {
        Some(listener) => tokio::select! {
            result = client.start() => result?,
            result = keepalive::serve(listener) => result?,
        },
        None => client.start().await?,
    }

    Ok(())
}
