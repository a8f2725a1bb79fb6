use async_trait::async_trait;
use tracing::instrument;

use crate::bridge::{PlaybackSnapshot, SourceAdapter, SourceError, SourceKind};

use super::JellyfinClient;

/// Media-server adapter: one snapshot per session with a loaded item.
pub struct JellyfinAdapter {
    client: JellyfinClient,
}

impl JellyfinAdapter {
    /// Wraps a client.
    pub fn new(client: JellyfinClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for JellyfinAdapter {
    fn name(&self) -> &str {
        "jellyfin"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Jellyfin
    }

    #[instrument(skip(self), name = "jellyfin_poll")]
    async fn query(&self) -> Result<Vec<PlaybackSnapshot>, SourceError> {
        let sessions = self.client.sessions().await?;
        let server_url = self.client.server_url();

        Ok(sessions
            .into_iter()
            .filter_map(|session| session.into_snapshot(server_url))
            .collect())
    }
}
