//! Setup for [poise::Framework]

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::commands;
use crate::music::spotify::Spotify;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::JukeboxError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, JukeboxError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, JukeboxError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
) -> poise::BoxFuture<'a, Result<Data, JukeboxError>> {
    Box::pin(async move {
        // Register the commands
        let commands = &fw.options().commands;
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        let data = Data {
            notify_list: config.notify_list(fw),
            guild_data: Mutex::new(HashMap::new()),
            http_client: reqwest::Client::new(),
            default_volume: config.default_volume(),
            idle_check: config.idle_check(),
            spotify: spotify(&config).await,
        };

        // Simple message that logs when the bot has initialized
        let bot_name = &rdy.user.name;
        tracing::info!("{bot_name} is ready!");

        Ok(data)
    })
}

/// Connects to spotify if credentials were given.
/// A failed login only disables spotify links.
async fn spotify(config: &Config) -> Option<Spotify> {
    let (id, secret) = config.spotify_credentials()?;

    match Spotify::connect(id, secret).await {
        Ok(spotify) => {
            tracing::info!("Spotify links enabled.");
            Some(spotify)
        }
        Err(e) => {
            tracing::warn!("Spotify login failed, spotify links are disabled. {e}");
            None
        }
    }
}
