use async_trait::async_trait;
use tracing::{info, instrument};
use zbus::{Connection, zvariant::ObjectPath};

use crate::bridge::{PlayerController, SourceId, TransportOp};

use super::{MediaError, TrackMetadata, adapter::player_proxy};

/// Sends control operations to local players over the session bus.
pub struct MprisController {
    connection: Connection,
}

impl MprisController {
    /// Wraps an existing session bus connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PlayerController for MprisController {
    #[instrument(skip(self), fields(player = %target))]
    async fn transport(&self, target: &SourceId, op: TransportOp) -> Result<(), MediaError> {
        let proxy = player_proxy(&self.connection, target.as_str()).await?;

        match op {
            TransportOp::PlayPause => proxy.play_pause().await,
            TransportOp::Next => proxy.next().await,
            TransportOp::Previous => proxy.previous().await,
        }
        .map_err(MediaError::DbusError)
    }

    #[instrument(skip(self), fields(player = %target))]
    async fn set_position(
        &self,
        target: &SourceId,
        position_micros: i64,
    ) -> Result<(), MediaError> {
        let proxy = player_proxy(&self.connection, target.as_str()).await?;

        let metadata = TrackMetadata::from(&proxy.metadata().await?);
        let track_id = metadata
            .track_id
            .ok_or_else(|| MediaError::MissingTrackId(target.clone()))?;

        let path =
            ObjectPath::try_from(track_id.as_str()).map_err(|_| MediaError::InvalidTrackId {
                player: target.clone(),
                track_id: track_id.clone(),
            })?;

        info!(
            seconds = position_micros as f64 / 1_000_000.0,
            track_id = %track_id,
            "seeking"
        );

        proxy
            .set_position(&path, position_micros)
            .await
            .map_err(MediaError::DbusError)
    }
}
