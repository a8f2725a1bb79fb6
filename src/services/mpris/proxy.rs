#![allow(missing_docs)]

use std::collections::HashMap;
use zbus::{Result, proxy, zvariant::ObjectPath};

/// Playback half of MPRIS, bound to one player's bus name.
///
/// Only the members the bridge reads or invokes are declared.
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Player {
    /// Toggles between playing and paused
    fn play_pause(&self) -> Result<()>;

    fn next(&self) -> Result<()>;

    fn previous(&self) -> Result<()>;

    /// Seeks to `position` µs within `track_id`; players ignore stale ids
    fn set_position(&self, track_id: &ObjectPath<'_>, position: i64) -> Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> Result<String>;

    /// `xesam:*` and `mpris:*` entries for the current track
    #[zbus(property)]
    fn metadata(&self) -> Result<HashMap<String, zbus::zvariant::OwnedValue>>;

    /// Position in µs
    #[zbus(property)]
    fn position(&self) -> Result<i64>;
}
