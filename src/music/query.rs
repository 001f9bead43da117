//! Classifies what users type into `/play`.

use url::Url;

use crate::error::UserError;

/// Something `/play` knows how to turn into audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A spotify resource, resolved through youtube searches.
    Spotify(SpotifyLink),
    /// Any other link, handed to `yt-dlp` as is.
    Url(Url),
    /// Free text, searched on youtube.
    Search(String),
}

/// The spotify resources that can be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Album(String),
    Playlist(String),
}

impl Query {
    /// Parses user input. Fails on blank input.
    pub fn parse(input: &str) -> Result<Self, UserError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UserError::BadArgs { input: None });
        }

        let query = match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                match SpotifyLink::from_url(&url) {
                    Some(link) => Query::Spotify(link),
                    None => Query::Url(url),
                }
            }
            _ => match SpotifyLink::from_uri(input) {
                Some(link) => Query::Spotify(link),
                None => Query::Search(input.to_string()),
            },
        };
        Ok(query)
    }
}

impl SpotifyLink {
    /// Parses `https://open.spotify.com/[intl-xx/]{track,album,playlist}/<id>`.
    fn from_url(url: &Url) -> Option<Self> {
        if url.host_str() != Some("open.spotify.com") {
            return None;
        }

        let mut segments = url
            .path_segments()?
            .filter(|s| !s.is_empty())
            .skip_while(|s| s.starts_with("intl-"));
        let kind = segments.next()?;
        let id = segments.next()?;
        Self::new(kind, id)
    }

    /// Parses `spotify:{track,album,playlist}:<id>`.
    fn from_uri(input: &str) -> Option<Self> {
        let mut parts = input.strip_prefix("spotify:")?.split(':');
        let kind = parts.next()?;
        let id = parts.next()?;
        Self::new(kind, id)
    }

    fn new(kind: &str, id: &str) -> Option<Self> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let id = id.to_string();
        match kind {
            "track" => Some(Self::Track(id)),
            "album" => Some(Self::Album(id)),
            "playlist" => Some(Self::Playlist(id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_search() {
        assert_eq!(
            Query::parse("  one last kiss ").ok(),
            Some(Query::Search("one last kiss".to_string()))
        );
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(matches!(Query::parse("   "), Err(UserError::BadArgs { .. })));
    }

    #[test]
    fn youtube_links_are_urls() {
        let parsed = Query::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(matches!(parsed, Ok(Query::Url(url)) if url.host_str() == Some("www.youtube.com")));
    }

    #[test]
    fn non_http_schemes_are_searches() {
        assert_eq!(
            Query::parse("ftp://example.com/song.mp3").ok(),
            Some(Query::Search("ftp://example.com/song.mp3".to_string()))
        );
    }

    #[test]
    fn spotify_links() {
        let cases = [
            (
                "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc",
                SpotifyLink::Track("4uLU6hMCjMI75M1A2tKUQC".to_string()),
            ),
            (
                "https://open.spotify.com/intl-pt/album/1DFixLWuPkv3KT3TnV35m3",
                SpotifyLink::Album("1DFixLWuPkv3KT3TnV35m3".to_string()),
            ),
            (
                "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M",
                SpotifyLink::Playlist("37i9dQZF1DXcBWIGoYBM5M".to_string()),
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(Query::parse(input).ok(), Some(Query::Spotify(expected)), "{input}");
        }
    }

    #[test]
    fn unsupported_spotify_pages_are_plain_urls() {
        let parsed = Query::parse("https://open.spotify.com/artist/0OdUWJ0sBjDrqHygGUXeCF");
        assert!(matches!(parsed, Ok(Query::Url(_))));
    }
}
