/// Source adapter over the Web API client
pub mod adapter;
/// Web API client with cached access token
pub mod client;
/// Spotify error types
pub mod error;
/// Response payloads
pub mod types;

pub use adapter::SpotifyAdapter;
pub use client::{SpotifyClient, SpotifyCredentials};
pub use error::SpotifyError;
