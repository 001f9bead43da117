//! Turns spotify links into youtube searches.
//!
//! Spotify doesn't serve audio, so every spotify track is played from the
//! first youtube result for "artist title".

use futures::StreamExt;
use futures::TryStreamExt;
use rspotify::clients::BaseClient;
use rspotify::model::AlbumId;
use rspotify::model::PlayableItem;
use rspotify::model::PlaylistId;
use rspotify::model::SimplifiedArtist;
use rspotify::model::TrackId;
use rspotify::ClientCredsSpotify;
use rspotify::Credentials;
use tracing::instrument;

use crate::error::UserError;
use crate::music::query::SpotifyLink;
use crate::JukeboxError;

/// Albums and playlists are cut off after this many tracks.
pub const MAX_COLLECTION_TRACKS: usize = 50;

/// An authenticated spotify client.
#[derive(Debug)]
pub struct Spotify {
    client: ClientCredsSpotify,
}

impl Spotify {
    /// Authenticates with the client credentials flow.
    pub async fn connect(client_id: &str, client_secret: &str) -> Result<Self, JukeboxError> {
        let client = ClientCredsSpotify::new(Credentials::new(client_id, client_secret));
        client.request_token().await?;
        Ok(Self { client })
    }

    /// The youtube searches that play the linked resource, in order.
    /// Links spotify can't resolve, like removed tracks, are [UserError]s.
    #[instrument(skip(self), err)]
    pub async fn search_queries(&self, link: &SpotifyLink) -> Result<Vec<String>, JukeboxError> {
        let queries = match link {
            SpotifyLink::Track(id) => {
                let id = TrackId::from_id(id).map_err(bad_id)?;
                let track = self
                    .client
                    .track(id, None)
                    .await
                    .map_err(UserError::search_failed)?;
                vec![search_query(first_artist(&track.artists), &track.name)]
            }
            SpotifyLink::Album(id) => {
                let id = AlbumId::from_id(id).map_err(bad_id)?;
                self.client
                    .album_track(id, None)
                    .take(MAX_COLLECTION_TRACKS)
                    .map_ok(|track| search_query(first_artist(&track.artists), &track.name))
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(UserError::search_failed)?
            }
            SpotifyLink::Playlist(id) => {
                let id = PlaylistId::from_id(id).map_err(bad_id)?;
                let items: Vec<_> = self
                    .client
                    .playlist_items(id, None, None)
                    .take(MAX_COLLECTION_TRACKS)
                    .try_collect()
                    .await
                    .map_err(UserError::search_failed)?;
                // Podcast episodes and local files are skipped.
                items
                    .into_iter()
                    .filter_map(|item| match item.track {
                        Some(PlayableItem::Track(track)) => {
                            Some(search_query(first_artist(&track.artists), &track.name))
                        }
                        _ => None,
                    })
                    .collect()
            }
        };

        if queries.is_empty() {
            Err(UserError::SearchFailed {
                reason: "Nothing playable behind that spotify link.".to_string(),
            })?;
        }
        Ok(queries)
    }
}

fn bad_id(error: rspotify::model::IdError) -> UserError {
    UserError::SearchFailed {
        reason: format!("Invalid spotify link: {error}"),
    }
}

fn first_artist(artists: &[SimplifiedArtist]) -> Option<&str> {
    artists.first().map(|artist| artist.name.as_str())
}

/// "artist title", or just the title when spotify lists no artist.
fn search_query(artist: Option<&str>, title: &str) -> String {
    match artist {
        Some(artist) => format!("{artist} {title}"),
        None => title.to_string(),
    }
}
