use std::collections::HashMap;

use zbus::zvariant::{Array, ObjectPath, OwnedValue};

use crate::bridge::{TITLE_NOT_AVAILABLE, flatten_artists, micros_to_secs};

/// Track metadata as exposed by an MPRIS player.
///
/// Keeps the raw fields; the display rules live in the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// `xesam:title`
    pub title: Option<String>,

    /// `xesam:url`
    pub url: Option<String>,

    /// `xesam:artist`, single strings are wrapped
    pub artists: Vec<String>,

    /// `xesam:album`
    pub album: Option<String>,

    /// `mpris:artUrl`
    pub art_url: Option<String>,

    /// `mpris:length` in microseconds
    pub length_micros: Option<i64>,

    /// `mpris:trackid`
    pub track_id: Option<String>,
}

impl TrackMetadata {
    /// Title, then URL, then a placeholder.
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .or_else(|| self.url.as_deref().filter(|url| !url.is_empty()))
            .unwrap_or(TITLE_NOT_AVAILABLE)
            .to_string()
    }

    /// Joined artists, then album, then a placeholder.
    pub fn display_artist(&self) -> String {
        flatten_artists(&self.artists, self.album.as_deref())
    }

    /// Track length in whole seconds; zero counts as unknown.
    pub fn length_secs(&self) -> Option<u64> {
        self.length_micros
            .filter(|&micros| micros > 0)
            .and_then(micros_to_secs)
    }
}

fn string_value(value: &OwnedValue) -> Option<String> {
    value.downcast_ref::<&str>().ok().map(str::to_string)
}

fn string_list(value: &OwnedValue) -> Vec<String> {
    if let Ok(array) = value.downcast_ref::<&Array>() {
        return array
            .iter()
            .filter_map(|item| <&str>::try_from(item).ok())
            .map(str::to_string)
            .collect();
    }

    string_value(value).into_iter().collect()
}

fn integer_value(value: &OwnedValue) -> Option<i64> {
    value
        .downcast_ref::<i64>()
        .ok()
        .or_else(|| {
            value
                .downcast_ref::<u64>()
                .ok()
                .and_then(|v| i64::try_from(v).ok())
        })
        .or_else(|| value.downcast_ref::<i32>().ok().map(i64::from))
}

fn object_path_value(value: &OwnedValue) -> Option<String> {
    value
        .downcast_ref::<ObjectPath<'_>>()
        .ok()
        .map(|path| path.to_string())
        .or_else(|| string_value(value))
}

impl From<&HashMap<String, OwnedValue>> for TrackMetadata {
    fn from(metadata: &HashMap<String, OwnedValue>) -> Self {
        Self {
            title: metadata.get("xesam:title").and_then(string_value),
            url: metadata.get("xesam:url").and_then(string_value),
            artists: metadata
                .get("xesam:artist")
                .map(string_list)
                .unwrap_or_default(),
            album: metadata.get("xesam:album").and_then(string_value),
            art_url: metadata.get("mpris:artUrl").and_then(string_value),
            length_micros: metadata.get("mpris:length").and_then(integer_value),
            track_id: metadata.get("mpris:trackid").and_then(object_path_value),
        }
    }
}
