#![allow(missing_docs)]

use serde::Deserialize;

use crate::bridge::{
    PlaybackSnapshot, PlaybackStatus, SourceId, SourceKind, TITLE_NOT_AVAILABLE, flatten_artists,
    ticks_to_secs,
};

/// `POST /Users/AuthenticateByName` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: String,
}

/// One entry of `GET /Sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub now_playing_item: Option<NowPlayingItem>,
    #[serde(default)]
    pub play_state: PlayState,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayState {
    #[serde(default)]
    pub is_paused: bool,
    pub position_ticks: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NowPlayingItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub item_type: String,
    pub series_name: Option<String>,
    pub album: Option<String>,
    pub album_id: Option<String>,
    #[serde(default)]
    pub artist_items: Vec<NameRef>,
    #[serde(default)]
    pub artists: Vec<String>,
    pub run_time_ticks: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRef {
    pub name: String,
}

impl NowPlayingItem {
    /// "Series - Episode" for episodes, the bare name otherwise.
    pub fn display_title(&self) -> String {
        let name = if self.name.is_empty() {
            TITLE_NOT_AVAILABLE
        } else {
            self.name.as_str()
        };

        match (self.item_type.as_str(), self.series_name.as_deref()) {
            ("Episode", Some(series)) if !series.is_empty() => format!("{series} - {name}"),
            _ => name.to_string(),
        }
    }

    pub fn display_artist(&self) -> String {
        let names: Vec<&str> = if self.artist_items.is_empty() {
            self.artists.iter().map(String::as_str).collect()
        } else {
            self.artist_items.iter().map(|a| a.name.as_str()).collect()
        };

        flatten_artists(&names, self.album.as_deref())
    }

    /// Item id whose primary image is used as artwork.
    pub fn artwork_item_id(&self) -> &str {
        match (self.item_type.as_str(), self.album_id.as_deref()) {
            ("Audio", Some(album_id)) if !album_id.is_empty() => album_id,
            _ => &self.id,
        }
    }
}

impl Session {
    /// Maps a session to a snapshot when it has something loaded.
    ///
    /// `server_url` is the base used to build the artwork URL.
    pub fn into_snapshot(self, server_url: &str) -> Option<PlaybackSnapshot> {
        let item = self.now_playing_item?;

        let status = if self.play_state.is_paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        };

        let mut snapshot = PlaybackSnapshot::new(
            SourceId::new(format!("jellyfin:{}", self.id)),
            SourceKind::Jellyfin,
            status,
        );
        snapshot.title = item.display_title();
        snapshot.artist = item.display_artist();
        snapshot.artwork_reference = format!(
            "{}/Items/{}/Images/Primary?maxWidth=400",
            server_url.trim_end_matches('/'),
            item.artwork_item_id()
        );
        snapshot.duration = item.run_time_ticks.and_then(ticks_to_secs);
        snapshot.position = self.play_state.position_ticks.and_then(ticks_to_secs);
        snapshot.track_id = Some(item.id);

        Some(snapshot)
    }
}
