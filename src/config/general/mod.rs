mod log_level;

use std::time::Duration;

pub use log_level::LogLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bridge::ChangeDetection;

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level for the bridge.
    pub log_level: LogLevel,

    /// Name reported as `player` in every status message.
    pub player_name: String,

    /// Base tick of the poll loop in milliseconds.
    pub tick_interval_ms: u64,

    /// After a failed tick the loop sleeps `tick_interval_ms` times this.
    pub backoff_multiplier: u32,

    /// What counts as a material change.
    pub change_detection: ChangeDetection,

    /// Also write logs to a daily rolling file.
    pub log_to_file: bool,
}

impl GeneralConfig {
    /// Tick interval as a duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            player_name: "Ubuntu PC".to_string(),
            tick_interval_ms: 500,
            backoff_multiplier: 10,
            change_detection: ChangeDetection::default(),
            log_to_file: false,
        }
    }
}
