use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigPaths, LogLevel};

/// Selects JSON output when set to `json`.
pub const LOG_FORMAT_VAR: &str = "NOWPLAYING_LOG_FORMAT";

const DAYS_TO_KEEP: usize = 7;

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

fn json_requested() -> bool {
    env::var(LOG_FORMAT_VAR).is_ok_and(|format| format == "json")
}

/// Initialize console logging
///
/// `RUST_LOG` takes precedence over the configured level. Output is pretty
/// unless `NOWPLAYING_LOG_FORMAT=json`.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry().with(env_filter(level));

    if json_requested() {
        registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Initialize console logging plus a daily rolling file
///
/// Files land in `$HOME/.nowplaying-bridge/logs` and a week of them is kept.
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
///
/// # Errors
/// Returns error if the log directory cannot be created or a global
/// subscriber is already installed
pub fn init_with_file(level: LogLevel) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_dir = ConfigPaths::log_dir()?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .max_log_files(DAYS_TO_KEEP)
        .filename_prefix("nowplaying-bridge")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter(level));

    if json_requested() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_names(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(guard)
}
