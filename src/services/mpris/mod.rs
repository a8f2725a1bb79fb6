/// Session bus adapter for local players
pub mod adapter;
/// Transport and seek control
pub mod control;
/// Media player error types
pub mod error;
/// Track metadata mapping
pub mod metadata;
/// D-Bus proxy trait definitions
pub mod proxy;

pub use adapter::{MPRIS_PREFIX, MprisAdapter};
pub use control::MprisController;
pub use error::*;
pub use metadata::*;
pub use proxy::*;
