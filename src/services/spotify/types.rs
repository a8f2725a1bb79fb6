#![allow(missing_docs)]

use serde::Deserialize;

use crate::bridge::{
    PlaybackSnapshot, PlaybackStatus, SourceId, SourceKind, TITLE_NOT_AVAILABLE, flatten_artists,
    millis_to_secs,
};

/// Response of the refresh-token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// `GET /v1/me/player` body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackState {
    pub device: Option<Device>,
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<i64>,
    pub item: Option<PlayingItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
}

/// A track or an episode.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayingItem {
    pub id: Option<String>,
    pub name: String,
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub artists: Vec<NamedRef>,
    pub album: Option<Album>,
    pub show: Option<Show>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Show {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

impl PlaybackState {
    /// Maps the player state to at most one snapshot.
    ///
    /// Paused playback maps to nothing unless `report_paused` is set.
    pub fn into_snapshot(self, report_paused: bool) -> Option<PlaybackSnapshot> {
        let item = self.item?;

        let status = if self.is_playing {
            PlaybackStatus::Playing
        } else if report_paused {
            PlaybackStatus::Paused
        } else {
            return None;
        };

        let device = self
            .device
            .map(|device| device.name)
            .unwrap_or_else(|| "unknown".to_string());

        let mut snapshot = PlaybackSnapshot::new(
            SourceId::new(format!("spotify:{device}")),
            SourceKind::Spotify,
            status,
        );

        let artists: Vec<&str> = item.artists.iter().map(|a| a.name.as_str()).collect();
        let fallback = item
            .album
            .as_ref()
            .map(|album| album.name.as_str())
            .or_else(|| item.show.as_ref().map(|show| show.name.as_str()));

        snapshot.title = if item.name.is_empty() {
            TITLE_NOT_AVAILABLE.to_string()
        } else {
            item.name.clone()
        };
        snapshot.artist = flatten_artists(&artists, fallback);
        snapshot.artwork_reference = item
            .album
            .as_ref()
            .map(|album| album.images.as_slice())
            .or_else(|| item.show.as_ref().map(|show| show.images.as_slice()))
            .and_then(|images| images.first())
            .map(|image| image.url.clone())
            .unwrap_or_default();
        snapshot.duration = item.duration_ms.and_then(millis_to_secs);
        snapshot.position = self.progress_ms.and_then(millis_to_secs);
        snapshot.track_id = item.id;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: &str = r#"{
        "device": {"id": "abc", "name": "Kitchen"},
        "is_playing": true,
        "progress_ms": 61500,
        "item": {
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Teardrop",
            "duration_ms": 330773,
            "artists": [{"name": "Massive Attack"}],
            "album": {
                "name": "Mezzanine",
                "images": [{"url": "https://i.scdn.co/image/large"}, {"url": "https://i.scdn.co/image/small"}]
            }
        }
    }"#;

    #[test]
    fn maps_playing_track() {
        let state: PlaybackState = serde_json::from_str(PLAYING).unwrap();
        let snapshot = state.into_snapshot(false).unwrap();

        assert_eq!(snapshot.source_id.as_str(), "spotify:Kitchen");
        assert_eq!(snapshot.status, PlaybackStatus::Playing);
        assert_eq!(snapshot.title, "Teardrop");
        assert_eq!(snapshot.artist, "Massive Attack");
        assert_eq!(snapshot.artwork_reference, "https://i.scdn.co/image/large");
        assert_eq!(snapshot.duration, Some(330));
        assert_eq!(snapshot.position, Some(61));
    }

    #[test]
    fn paused_is_hidden_unless_requested() {
        let json = PLAYING.replace("\"is_playing\": true", "\"is_playing\": false");
        let state: PlaybackState = serde_json::from_str(&json).unwrap();

        assert!(state.clone().into_snapshot(false).is_none());
        let snapshot = state.into_snapshot(true).unwrap();
        assert_eq!(snapshot.status, PlaybackStatus::Paused);
    }

    #[test]
    fn episode_uses_show_fallbacks() {
        let json = r#"{
            "device": {"name": "Phone"},
            "is_playing": true,
            "item": {
                "name": "Episode 12",
                "duration_ms": 0,
                "show": {"name": "Some Podcast", "images": [{"url": "https://img/show"}]}
            }
        }"#;
        let state: PlaybackState = serde_json::from_str(json).unwrap();
        let snapshot = state.into_snapshot(false).unwrap();

        assert_eq!(snapshot.artist, "Some Podcast");
        assert_eq!(snapshot.artwork_reference, "https://img/show");
        assert_eq!(snapshot.position, None);
    }

    #[test]
    fn missing_item_yields_nothing() {
        let state: PlaybackState =
            serde_json::from_str(r#"{"is_playing": true, "item": null}"#).unwrap();
        assert!(state.into_snapshot(true).is_none());
    }
}
