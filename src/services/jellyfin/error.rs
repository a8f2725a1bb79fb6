use thiserror::Error;

/// Errors from the Jellyfin client.
#[derive(Debug, Error)]
pub enum JellyfinError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login rejected or session token revoked
    #[error("auth error: {0}")]
    Auth(String),

    /// Non-success response from the server
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}
