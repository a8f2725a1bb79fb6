use crate::bridge::SourceId;

/// Errors that can occur while talking to local players
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),

    /// Player exposes no current track, so it cannot seek
    #[error("Player {0} has no current track id")]
    MissingTrackId(SourceId),

    /// Player reported a track id that is not an object path
    #[error("Player {player} reported invalid track id '{track_id}'")]
    InvalidTrackId {
        /// Player that reported it
        player: SourceId,
        /// The offending value
        track_id: String,
    },
}
