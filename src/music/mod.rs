//! Everything between the commands and the player: calls, events, sources.

pub mod call;
pub mod embed;
pub mod events;
pub mod query;
pub mod queue;
pub mod spotify;
pub mod youtube;

use songbird::input::YoutubeDl;
use tracing::instrument;

use crate::data::GetData;
use crate::error::UserError;
use crate::Context;
use crate::JukeboxError;
use query::Query;
use spotify::Spotify;

/// Turns a query into the sources to enqueue, in order.
#[instrument(skip(ctx), err)]
pub async fn sources(ctx: &Context<'_>, query: &Query) -> Result<Vec<YoutubeDl>, JukeboxError> {
    let http = ctx.http_client();

    let sources = match query {
        Query::Url(url) => vec![youtube::from_url(http, url)],
        Query::Search(text) => vec![youtube::from_search(http, text.as_str())],
        Query::Spotify(link) => {
            enabled(ctx.data().spotify.as_ref())?
                .search_queries(link)
                .await?
                .into_iter()
                .map(|search| youtube::from_search(http.clone(), search))
                .collect()
        }
    };
    Ok(sources)
}

/// The spotify client, or why spotify links can't be played.
fn enabled(spotify: Option<&Spotify>) -> Result<&Spotify, UserError> {
    spotify.ok_or(UserError::SpotifyDisabled)
}
