/// Jellyfin media server sessions
pub mod jellyfin;
/// Local players over MPRIS
pub mod mpris;
/// Spotify Web API playback state
pub mod spotify;
