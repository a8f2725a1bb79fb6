use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bridge::SourceKind;

/// Which sources run and how they are ranked.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Backend classes from highest to lowest precedence.
    pub precedence: Vec<SourceKind>,

    /// Local players on the session bus.
    pub mpris: MprisSourceConfig,

    /// Spotify Web API.
    pub spotify: SpotifySourceConfig,

    /// Jellyfin server sessions.
    pub jellyfin: JellyfinSourceConfig,
}

impl SourcesConfig {
    /// Classes with `enabled = true`, in declaration order.
    pub fn enabled(&self) -> Vec<SourceKind> {
        [
            (SourceKind::Mpris, self.mpris.enabled),
            (SourceKind::Spotify, self.spotify.enabled),
            (SourceKind::Jellyfin, self.jellyfin.enabled),
        ]
        .into_iter()
        .filter_map(|(kind, enabled)| enabled.then_some(kind))
        .collect()
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            precedence: vec![SourceKind::Spotify, SourceKind::Jellyfin, SourceKind::Mpris],
            mpris: MprisSourceConfig::default(),
            spotify: SpotifySourceConfig::default(),
            jellyfin: JellyfinSourceConfig::default(),
        }
    }
}

fn stale_after(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Local-IPC source settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MprisSourceConfig {
    /// Poll local players.
    pub enabled: bool,

    /// Minimum time between polls in milliseconds; 0 polls every tick.
    pub interval_ms: u64,

    /// Bus names containing any of these are ignored.
    pub ignored_players: Vec<String>,

    /// Cached readings older than this are treated as unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_after_secs: Option<u64>,
}

impl MprisSourceConfig {
    /// Poll interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Cache expiry.
    pub fn stale_after(&self) -> Option<Duration> {
        stale_after(self.stale_after_secs)
    }
}

impl Default for MprisSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 0,
            ignored_players: Vec::new(),
            stale_after_secs: None,
        }
    }
}

/// Streaming-API source settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SpotifySourceConfig {
    /// Poll the Web API.
    pub enabled: bool,

    /// Minimum time between polls in seconds.
    pub interval_secs: u64,

    /// OAuth client id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Long-lived refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Report paused playback instead of nothing.
    pub report_paused: bool,

    /// Cached readings older than this are treated as unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_after_secs: Option<u64>,
}

impl SpotifySourceConfig {
    /// Poll interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Cache expiry.
    pub fn stale_after(&self) -> Option<Duration> {
        stale_after(self.stale_after_secs)
    }
}

impl Default for SpotifySourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 30,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            report_paused: false,
            stale_after_secs: None,
        }
    }
}

/// Media-server source settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct JellyfinSourceConfig {
    /// Poll the server's sessions.
    pub enabled: bool,

    /// Minimum time between polls in seconds.
    pub interval_secs: u64,

    /// Base URL, e.g. `http://jellyfin.lan:8096`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Account password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Device id announced to the server.
    pub device_id: String,

    /// Cached readings older than this are treated as unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_after_secs: Option<u64>,
}

impl JellyfinSourceConfig {
    /// Poll interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Cache expiry.
    pub fn stale_after(&self) -> Option<Duration> {
        stale_after(self.stale_after_secs)
    }
}

impl Default for JellyfinSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 30,
            server_url: None,
            username: None,
            password: None,
            device_id: "desk-hid-device-001".to_string(),
            stale_after_secs: None,
        }
    }
}
