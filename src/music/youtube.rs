//! * Functionality for interfacing with youtube (e.g. searches).

use itertools::Itertools;
use reqwest::Client;
use songbird::input::YoutubeDl;
use tracing::instrument;

use crate::error::UserError;
use crate::JukeboxError;

/// A youtube video with formatted metadata and its url.
pub struct SearchResult {
    /// Display name
    pub name: String,
    /// The url of source
    pub url: String,
}

/// Source that plays the given link.
pub fn from_url(http: Client, url: &url::Url) -> YoutubeDl {
    YoutubeDl::new(http, url.to_string())
}

/// Source that plays the best youtube match for the given text.
pub fn from_search(http: Client, query: impl Into<String>) -> YoutubeDl {
    YoutubeDl::new_search(http, query.into())
}

/// Searches youtube for the given query.
///
/// `limit` is the max amount of results to get.
#[instrument(fields(query=query.as_ref()))]
pub async fn search_query(
    query: impl AsRef<str>,
    limit: u8,
) -> Result<Vec<SearchResult>, JukeboxError> {
    let uri = &format!("ytsearch{limit}:{}", query.as_ref());
    search(uri).await
}

/// Helper function that actually calls yt-dlp.
async fn search(uri: impl AsRef<str>) -> Result<Vec<SearchResult>, JukeboxError> {
    // Discord enforces a 100 char limit so we budget
    // Format is title[duration]-channel
    let format: &str = &[
        "%(title).60s ",          // Title, at most 60 chars
        "[%(duration_string)s] ", // Duration in '[HH:MM:SS]' format, at most 10 chars
        "- ",
        "%(channel).20s", // Channel name, at most 20 chars
    ]
    .concat();

    let ytdlp_args = [
        "--no-warnings",
        "--ignore-config",
        "--flat-playlist",
        "--print",
        format,
        "--print",
        "webpage_url",
        uri.as_ref(),
    ];

    let ytdlp_output = tokio::process::Command::new("yt-dlp")
        .args(ytdlp_args)
        .stdin(std::process::Stdio::null())
        .output()
        .await?;

    if !ytdlp_output.status.success() {
        let stderr = String::from_utf8_lossy(&ytdlp_output.stderr);
        return Err(UserError::SearchFailed {
            reason: stderr.trim().to_string(),
        }
        .into());
    }

    let out_string = String::from_utf8(ytdlp_output.stdout)?;
    Ok(parse_output(&out_string))
}

/// yt-dlp prints one line per `--print`, so results come in name/url pairs.
fn parse_output(output: &str) -> Vec<SearchResult> {
    output
        .lines()
        .tuples()
        .map(|(name, url)| SearchResult {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_names_with_urls() {
        let output = "Song A [3:25] - Channel\nhttps://youtu.be/a\nSong B [1:00:00] - Other\nhttps://youtu.be/b\n";
        let results = parse_output(output);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Song A [3:25] - Channel");
        assert_eq!(results[1].url, "https://youtu.be/b");
    }

    #[test]
    fn drops_unpaired_trailing_line() {
        let results = parse_output("Song A\nhttps://youtu.be/a\nSong B");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_output_has_no_results() {
        assert!(parse_output("").is_empty());
    }
}
