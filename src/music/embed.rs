//! Chat rendering of tracks and queues.

use std::time::Duration;

use serenity::Colour;
use serenity::CreateEmbed;
use serenity::Mentionable;

use crate::data::TrackMetadata;
use crate::serenity;

/// An embed description has a limit of 4096 chars.
pub const DESCRIPTION_LIMIT: usize = 4096;

/// Formats a duration as `mm:ss`, or `hh:mm:ss` from one hour on.
/// Sources without a duration are live streams.
pub fn format_duration(dur: Option<Duration>) -> String {
    let Some(dur) = dur else {
        return "Live".to_string();
    };

    let total_secs = dur.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs / 60) % 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

/// Cuts `text` down to at most `max` chars.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Embed announcing the track that just started.
pub fn now_playing(track: &TrackMetadata) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title("🎶 Now Playing")
        .description(format!("**{}**", track.link()))
        .field("Duration", format!("`{}`", track.duration_string()), true)
        .field("Requested by", track.requested_by.mention().to_string(), true)
        .colour(Colour::from_rgb(0, 255, 0));

    match &track.thumbnail_url {
        Some(url) => embed.thumbnail(url),
        None => embed,
    }
}

/// Lists the queue, the first track being the one playing.
/// Tracks that would overflow the description are left out.
pub fn queue_listing<T: AsRef<TrackMetadata>>(tracks: &[T]) -> String {
    let lines = tracks.iter().enumerate().map(|(num, track)| match num {
        0 => format!("Playing: {}\n", track.as_ref()),
        _ => format!("{num}. {}\n", track.as_ref()),
    });

    let mut len = 0;
    lines
        .take_while(|line| {
            len += line.len();
            len <= DESCRIPTION_LIMIT
        })
        .collect()
}

/// Embed showing everything in the queue.
pub fn queue<T: AsRef<TrackMetadata>>(guild_name: &str, tracks: &[T]) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title(format!("📜 {guild_name} Queue"))
        .description(queue_listing(tracks));

    // Add thumbnail if front has a thumbnail.
    match tracks.first().and_then(|t| t.as_ref().thumbnail_url.clone()) {
        Some(url) => embed.thumbnail(url),
        None => embed,
    }
}
