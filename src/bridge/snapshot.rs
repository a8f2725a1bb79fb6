use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder used when a source reports neither artists nor an album.
pub const ARTIST_NOT_AVAILABLE: &str = "Artist not available";

/// Placeholder used when a source reports no usable title.
pub const TITLE_NOT_AVAILABLE: &str = "Title not available";

/// Opaque, stable identifier of one playback source.
///
/// For local players this is the D-Bus bus name; remote backends prefix
/// their own handle (`spotify:<device>`, `jellyfin:<session>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend class a snapshot came from.
///
/// Classes are ordered against each other by the configured precedence, not
/// by anything intrinsic to this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Desktop players enumerated over the session bus.
    Mpris,
    /// Spotify Web API.
    Spotify,
    /// Jellyfin media server sessions.
    Jellyfin,
}

impl SourceKind {
    /// Only local players can receive inbound control commands.
    pub fn is_local(self) -> bool {
        matches!(self, SourceKind::Mpris)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Mpris => write!(f, "mpris"),
            SourceKind::Spotify => write!(f, "spotify"),
            SourceKind::Jellyfin => write!(f, "jellyfin"),
        }
    }
}

/// Playback status reported by a source.
///
/// The derived ordering is the resolver priority: `Playing` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlaybackStatus {
    /// Source is currently playing
    Playing,

    /// Source is paused
    Paused,

    /// Source is stopped
    Stopped,
}

impl PlaybackStatus {
    /// Wire name used in the outbound status message.
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
    }
}

impl From<&str> for PlaybackStatus {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, point-in-time read of one source's playback state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Identifier of the reporting player or session
    pub source_id: SourceId,

    /// Backend class of the reporting adapter
    pub kind: SourceKind,

    /// Playback status
    pub status: PlaybackStatus,

    /// Track title, possibly empty
    pub title: String,

    /// Flattened artist string, possibly empty
    pub artist: String,

    /// Artwork URL or locator, possibly empty
    pub artwork_reference: String,

    /// Elapsed whole seconds
    pub position: Option<u64>,

    /// Track length in whole seconds
    pub duration: Option<u64>,

    /// Backend track handle used for absolute seeks
    pub track_id: Option<String>,
}

impl PlaybackSnapshot {
    /// Creates a snapshot with empty metadata.
    pub fn new(source_id: SourceId, kind: SourceKind, status: PlaybackStatus) -> Self {
        Self {
            source_id,
            kind,
            status,
            title: String::new(),
            artist: String::new(),
            artwork_reference: String::new(),
            position: None,
            duration: None,
            track_id: None,
        }
    }
}

/// Joins the non-blank artist names with ", ".
///
/// Falls back to `album` when nothing is left, then to
/// [`ARTIST_NOT_AVAILABLE`].
pub fn flatten_artists<S: AsRef<str>>(artists: &[S], album: Option<&str>) -> String {
    let joined = artists
        .iter()
        .map(AsRef::as_ref)
        .filter(|artist| !artist.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if !joined.is_empty() {
        return joined;
    }

    match album {
        Some(album) if !album.trim().is_empty() => album.to_string(),
        _ => ARTIST_NOT_AVAILABLE.to_string(),
    }
}

/// Floor-divides a microsecond count to whole seconds.
///
/// Negative values are treated as unknown.
pub fn micros_to_secs(micros: i64) -> Option<u64> {
    u64::try_from(micros).ok().map(|us| us / 1_000_000)
}

/// Floor-divides a millisecond count to whole seconds.
pub fn millis_to_secs(millis: i64) -> Option<u64> {
    u64::try_from(millis).ok().map(|ms| ms / 1_000)
}

/// Floor-divides 100 ns ticks (Jellyfin's unit) to whole seconds.
pub fn ticks_to_secs(ticks: i64) -> Option<u64> {
    u64::try_from(ticks).ok().map(|t| t / 10_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_skips_blank_entries() {
        assert_eq!(flatten_artists(&["A", "", "B"], None), "A, B");
        assert_eq!(flatten_artists(&["A", "  ", "B"], Some("Album")), "A, B");
    }

    #[test]
    fn flatten_falls_back_to_album() {
        let empty: [&str; 0] = [];
        assert_eq!(flatten_artists(&empty, Some("Album X")), "Album X");
        assert_eq!(flatten_artists(&[""], Some("Album X")), "Album X");
    }

    #[test]
    fn flatten_falls_back_to_placeholder() {
        let empty: [&str; 0] = [];
        assert_eq!(flatten_artists(&empty, None), ARTIST_NOT_AVAILABLE);
        assert_eq!(flatten_artists(&empty, Some("")), ARTIST_NOT_AVAILABLE);
    }

    #[test]
    fn unit_conversions_floor() {
        assert_eq!(micros_to_secs(45_999_999), Some(45));
        assert_eq!(micros_to_secs(-1), None);
        assert_eq!(millis_to_secs(1_999), Some(1));
        assert_eq!(ticks_to_secs(2_050_000_000), Some(205));
    }

    #[test]
    fn status_priority_order() {
        assert!(PlaybackStatus::Playing < PlaybackStatus::Paused);
        assert!(PlaybackStatus::Paused < PlaybackStatus::Stopped);
        assert_eq!(PlaybackStatus::from("Bogus"), PlaybackStatus::Stopped);
    }
}
