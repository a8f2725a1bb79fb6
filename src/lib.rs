//! nowplaying-bridge - "now playing" status bridge for a small MQTT display.
//!
//! Media sources are polled on their own intervals:
//!
//! - local players over MPRIS on the D-Bus session bus
//! - the Spotify Web API
//! - Jellyfin server sessions
//!
//! One active player is resolved per tick, first by backend precedence and
//! then by playback status. When it materially changes, a status image is
//! rendered and the status is published over MQTT. Control commands arriving
//! over MQTT are forwarded to the active local player.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nowplaying_bridge::config::Config;
//!
//! # async fn start() -> nowplaying_bridge::Result<()> {
//! let config = Config::load_effective(
//!     std::path::Path::new("config.toml"),
//!     |key| std::env::var(key).ok(),
//! )?;
//! nowplaying_bridge::app::run(config).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Startup wiring and the player diagnostics.
pub mod app;

/// Active-player resolution, change detection and command routing.
pub mod bridge;

/// Configuration schema definitions and validation.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// MQTT publishing and inbound message routing.
pub mod publish;

/// Status image rendering.
pub mod render;

/// HTTP file server for the rendered image.
pub mod server;

/// Media source backends.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{BridgeError, Result};
