//! Implements the `/play` command.
//!
//! Joins the author's call and queues whatever the query resolves to.
//! The track that starts right away is announced by the "now playing" event,
//! tracks that have to wait get a message here.

use std::sync::Arc;

use poise::CreateReply;
use tracing::instrument;

use crate::data::TrackMetadata;
use crate::error::UserError;
use crate::music::call;
use crate::music::query::Query;
use crate::music::{self, youtube};
use crate::serenity;
use crate::Context;
use crate::JukeboxError;

/// Queries this short get no suggestions.
const MIN_AUTOCOMPLETE_LEN: usize = 2;
/// Autocomplete suggestions shown at once.
const AUTOCOMPLETE_RESULTS: u8 = 5;

/// 🎵 Play a song or playlist.
///
/// Suggestions only show up once the query is longer than 2 characters.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, check = "call::author_in_voice")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Song name or link to a song/playlist"]
    #[autocomplete = "autocomplete_query"]
    query: String,
) -> Result<(), JukeboxError> {
    let query = Query::parse(&query)?;

    let searching = CreateReply::default()
        .ephemeral(true)
        .content("🔍 Searching...");
    ctx.send(searching).await?;

    // Resolve first, a link that can't be played shouldn't pull the bot into the call.
    let sources = music::sources(&ctx, &query).await?;
    let call = call::join_author(&ctx).await?;

    let mut added = Vec::new();
    let mut queued_before = None;
    for source in sources {
        match call::enqueue(&ctx, &call, source.into()).await {
            Ok((meta, before)) => {
                queued_before.get_or_insert(before);
                added.push(meta);
            }
            // A single bad entry shouldn't sink a whole playlist.
            Err(e) if matches!(query, Query::Spotify(_)) => {
                tracing::warn!("Skipping unplayable track. {e}");
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(reply) = added_reply(queued_before, &added)? {
        ctx.say(reply).await?;
    }
    Ok(())
}

/// What `/play` says about the tracks it queued.
/// The track that started right away is announced by the event handler instead.
fn added_reply(
    queued_before: Option<usize>,
    added: &[Arc<TrackMetadata>],
) -> Result<Option<String>, UserError> {
    match (queued_before, added) {
        (_, []) => Err(UserError::SearchFailed {
            reason: "Nothing playable was found.".to_string(),
        }),
        (Some(0), [_]) => Ok(None),
        (_, [meta]) => Ok(Some(format!(
            "✅ Added to the queue: **{}** - `{}`",
            meta.title(),
            meta.duration_string()
        ))),
        (_, many) => Ok(Some(format!("✅ Added {} tracks to the queue.", many.len()))),
    }
}

/// Searching every keystroke of a short query isn't worth a `yt-dlp` call.
fn worth_searching(partial: &str) -> bool {
    partial.chars().count() > MIN_AUTOCOMPLETE_LEN
}

#[instrument(skip(_ctx))]
async fn autocomplete_query(_ctx: Context<'_>, partial: &str) -> Vec<serenity::AutocompleteChoice> {
    if !worth_searching(partial) {
        tracing::trace!("Skipping search, query '{partial}' is too short.");
        return Vec::new();
    };

    // Links are played as they are.
    if matches!(Query::parse(partial), Ok(Query::Url(_) | Query::Spotify(_))) {
        return Vec::new();
    }

    tracing::trace!("Searching for '{partial}'.");

    match youtube::search_query(partial, AUTOCOMPLETE_RESULTS).await {
        Ok(search_res) => search_res
            .into_iter()
            .map(|res| serenity::AutocompleteChoice::new(res.name, res.url))
            .collect(),
        Err(e) => {
            tracing::error!("{e}");
            Vec::new()
        }
    }
}
