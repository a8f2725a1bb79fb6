use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logging level for the bridge.
///
/// `RUST_LOG` still wins when it is set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only failures that stop a tick or the process.
    Error,

    /// Dropped commands and unavailable sources.
    Warn,

    /// Dispatches, active-source changes and executed commands (default level).
    #[default]
    Info,

    /// Skipped dispatches, suppressed seeks and per-player read failures.
    Debug,

    /// Everything, including span enter/exit.
    Trace,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
