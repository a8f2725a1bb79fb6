use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, instrument};
use zbus::{Connection, fdo, proxy::CacheProperties};

use crate::bridge::{
    PlaybackSnapshot, PlaybackStatus, SourceAdapter, SourceError, SourceId, SourceKind,
    micros_to_secs,
};

use super::{MediaError, MediaPlayer2PlayerProxy, TrackMetadata};

/// Well-known bus name prefix of MPRIS players.
pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Builds an uncached player proxy for `bus_name`.
///
/// Properties are read fresh on every call, which is what a poller wants.
pub(super) async fn player_proxy(
    connection: &Connection,
    bus_name: &str,
) -> Result<MediaPlayer2PlayerProxy<'static>, MediaError> {
    MediaPlayer2PlayerProxy::builder(connection)
        .destination(bus_name.to_string())
        .map_err(MediaError::DbusError)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
        .map_err(MediaError::DbusError)
}

/// Local-IPC adapter: every MPRIS player on the session bus.
pub struct MprisAdapter {
    connection: Connection,
    ignored_players: Vec<String>,
}

impl MprisAdapter {
    /// Wraps an existing session bus connection.
    ///
    /// Players whose bus name contains any of `ignored_players` are skipped.
    pub fn new(connection: Connection, ignored_players: Vec<String>) -> Self {
        Self {
            connection,
            ignored_players,
        }
    }

    /// Check if a player should be ignored based on its bus name
    pub fn should_ignore_player(&self, bus_name: &str) -> bool {
        self.ignored_players
            .iter()
            .any(|pattern| bus_name.contains(pattern.as_str()))
    }

    /// Bus names of all non-ignored players, in bus enumeration order.
    ///
    /// # Errors
    /// Returns error if the bus daemon cannot be queried
    pub async fn player_names(&self) -> Result<Vec<String>, MediaError> {
        let dbus_proxy = fdo::DBusProxy::new(&self.connection)
            .await
            .map_err(MediaError::DbusError)?;

        let names = dbus_proxy
            .list_names()
            .await
            .map_err(|e| MediaError::DbusError(e.into()))?;

        Ok(names
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name.starts_with(MPRIS_PREFIX))
            .filter(|name| !self.should_ignore_player(name))
            .collect())
    }

    #[instrument(skip(self))]
    async fn read_player(&self, bus_name: &str) -> Result<PlaybackSnapshot, MediaError> {
        let proxy = player_proxy(&self.connection, bus_name).await?;

        let status = proxy.playback_status().await?;
        let metadata = TrackMetadata::from(&proxy.metadata().await?);
        let position = proxy.position().await.ok().and_then(micros_to_secs);

        let mut snapshot = PlaybackSnapshot::new(
            SourceId::new(bus_name),
            SourceKind::Mpris,
            PlaybackStatus::from(status.as_str()),
        );
        snapshot.title = metadata.display_title();
        snapshot.artist = metadata.display_artist();
        snapshot.artwork_reference = metadata.art_url.clone().unwrap_or_default();
        snapshot.duration = metadata.length_secs();
        snapshot.position = position;
        snapshot.track_id = metadata.track_id;

        Ok(snapshot)
    }
}

#[async_trait]
impl SourceAdapter for MprisAdapter {
    fn name(&self) -> &str {
        "mpris"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Mpris
    }

    async fn query(&self) -> Result<Vec<PlaybackSnapshot>, SourceError> {
        let names = self.player_names().await?;
        let reads = join_all(names.iter().map(|name| self.read_player(name))).await;

        Ok(names
            .iter()
            .zip(reads)
            .filter_map(|(name, read)| match read {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    debug!(player = %name, error = %e, "player did not answer, skipping");
                    None
                }
            })
            .collect())
    }
}
