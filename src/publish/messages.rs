use serde::{Deserialize, Serialize};

use crate::bridge::ActiveSelection;

/// Retained status message describing the active source.
///
/// Field order is the wire order consumed by the display device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// "Playing", "Paused" or "Stopped"
    pub status: String,

    /// Track title
    pub title: String,

    /// Flattened artist string
    pub artist: String,

    /// Configured name of this machine
    pub player: String,

    /// Artwork locator as reported by the source
    pub album_art_url: String,

    /// Track length in seconds
    pub length: Option<u64>,

    /// Elapsed seconds
    pub elapsed: Option<u64>,
}

impl StatusMessage {
    /// Builds the status message for `selection`.
    ///
    /// The idle placeholder becomes a Stopped message with empty text and
    /// null timings.
    pub fn from_selection(selection: &ActiveSelection, player_name: &str) -> Self {
        let snapshot = selection.snapshot();

        Self {
            status: selection.status().as_str().to_string(),
            title: selection.title().to_string(),
            artist: selection.artist().to_string(),
            player: player_name.to_string(),
            album_art_url: selection.artwork_reference().to_string(),
            length: snapshot.and_then(|s| s.duration),
            elapsed: snapshot.and_then(|s| s.position),
        }
    }
}

/// Retained message announcing a freshly written status image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReadyMessage {
    /// Image URL with a `?v=<timestamp>` cache buster
    pub url: String,

    /// Track title shown on the image
    pub track: String,

    /// Artist shown on the image
    pub artist: String,

    /// Unix timestamp of the publish
    pub timestamp: i64,
}

impl ImageReadyMessage {
    /// Builds the message, appending the cache buster to `base_url`.
    pub fn new(base_url: &str, track: &str, artist: &str, timestamp: i64) -> Self {
        Self {
            url: format!("{base_url}?v={timestamp}"),
            track: track.to_string(),
            artist: artist.to_string(),
            timestamp,
        }
    }
}

/// Public URL of the served image file.
pub fn image_base_url(host: &str, port: u16, filename: &str) -> String {
    format!("http://{host}:{port}/{filename}")
}
