//! Static file server for the rendered image.

use std::{net::SocketAddr, path::PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::core::BridgeError;

/// Serves one directory over plain HTTP on all interfaces.
pub struct FileServer {
    directory: PathBuf,
    port: u16,
}

impl FileServer {
    /// Creates a server for `directory` on `port`.
    pub fn new(directory: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            directory: directory.into(),
            port,
        }
    }

    /// Router serving the directory contents.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback_service(ServeDir::new(&self.directory))
            .layer(TraceLayer::new_for_http())
    }

    /// Creates the directory and binds the listener.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or the port is taken
    pub async fn bind(&self) -> Result<TcpListener, BridgeError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| BridgeError::io_at(e, &self.directory))?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        Ok(TcpListener::bind(addr).await?)
    }

    /// Serves until the listener fails.
    ///
    /// # Errors
    /// Returns the bind or accept-loop failure
    pub async fn run(self) -> Result<(), BridgeError> {
        let listener = self.bind().await?;
        info!(
            directory = %self.directory.display(),
            addr = %listener.local_addr()?,
            "serving status image"
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
