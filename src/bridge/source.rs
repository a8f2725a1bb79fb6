use async_trait::async_trait;
use tracing::{debug, warn};

use crate::services::{jellyfin::JellyfinError, mpris::MediaError, spotify::SpotifyError};

use super::snapshot::{PlaybackSnapshot, SourceKind};

/// Why an adapter could not produce a reading.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Session bus or player query failed
    #[error(transparent)]
    Mpris(#[from] MediaError),

    /// Spotify Web API failed
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    /// Jellyfin server failed
    #[error(transparent)]
    Jellyfin(#[from] JellyfinError),

    /// Any other backend failure
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Outcome of one adapter poll as stored in its cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reading {
    /// The backend could not be reached or parsed
    #[default]
    Unavailable,

    /// The backend answered; zero or more players/sessions reported
    Reported(Vec<PlaybackSnapshot>),
}

impl Reading {
    /// Snapshots carried by this reading, empty when unavailable.
    pub fn snapshots(&self) -> &[PlaybackSnapshot] {
        match self {
            Reading::Unavailable => &[],
            Reading::Reported(snapshots) => snapshots,
        }
    }

    /// Whether the backend answered.
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Reported(_))
    }
}

/// One queryable playback backend.
///
/// Implementations map their backend's metadata shape onto
/// [`PlaybackSnapshot`]. A local adapter may report several players at once;
/// remote adapters report zero or more sessions.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Backend class used by the precedence policy.
    fn kind(&self) -> SourceKind;

    /// Queries the backend.
    ///
    /// # Errors
    /// Returns the transport or parse failure that prevented a reading.
    async fn query(&self) -> Result<Vec<PlaybackSnapshot>, SourceError>;

    /// Queries the backend, converting any failure to [`Reading::Unavailable`].
    async fn poll(&self) -> Reading {
        match self.query().await {
            Ok(snapshots) => {
                debug!(source = self.name(), reported = snapshots.len(), "source polled");
                Reading::Reported(snapshots)
            }
            Err(e) => {
                warn!(source = self.name(), error = %e, "source unavailable");
                Reading::Unavailable
            }
        }
    }
}
