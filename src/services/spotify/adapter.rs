use async_trait::async_trait;
use tracing::instrument;

use crate::bridge::{PlaybackSnapshot, SourceAdapter, SourceError, SourceKind};

use super::SpotifyClient;

/// Streaming-API adapter: the account's current playback, if any.
pub struct SpotifyAdapter {
    client: SpotifyClient,
    report_paused: bool,
}

impl SpotifyAdapter {
    /// Wraps a client. Paused playback is only reported when `report_paused`.
    pub fn new(client: SpotifyClient, report_paused: bool) -> Self {
        Self {
            client,
            report_paused,
        }
    }
}

#[async_trait]
impl SourceAdapter for SpotifyAdapter {
    fn name(&self) -> &str {
        "spotify"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Spotify
    }

    #[instrument(skip(self), name = "spotify_poll")]
    async fn query(&self) -> Result<Vec<PlaybackSnapshot>, SourceError> {
        let state = self.client.current_playback().await?;

        Ok(state
            .and_then(|state| state.into_snapshot(self.report_paused))
            .into_iter()
            .collect())
    }
}
