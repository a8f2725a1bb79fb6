use thiserror::Error;

/// Errors from the Spotify Web API client.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token refresh was rejected
    #[error("auth error: {0}")]
    Auth(String),

    /// Non-success response from the Web API
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
