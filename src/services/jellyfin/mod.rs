/// Source adapter over the session listing
pub mod adapter;
/// REST client with cached session token
pub mod client;
/// Jellyfin error types
pub mod error;
/// Response payloads
pub mod types;

pub use adapter::JellyfinAdapter;
pub use client::{JellyfinClient, JellyfinCredentials};
pub use error::JellyfinError;
