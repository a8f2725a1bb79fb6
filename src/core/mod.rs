use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

/// Error types for the bridge process.
///
/// Covers configuration loading and validation, startup of the external
/// collaborators, and failures that abandon a whole poll tick.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// Configuration field missing or invalid
    #[error("invalid config field '{field}' in {component}: {reason}")]
    InvalidConfigField {
        /// The field that is invalid
        field: String,
        /// Component containing the field
        component: String,
        /// Reason why the field is invalid
        reason: String,
    },

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// D-Bus session could not be opened
    #[error("D-Bus connection failed: {0}")]
    Dbus(#[from] zbus::Error),

    /// HTTP client for a remote source could not be built
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An adapter task panicked or was cancelled mid-poll
    #[error("adapter '{source_name}' aborted during poll: {details}")]
    AdapterPanicked {
        /// Name of the adapter whose task failed
        source_name: String,
        /// Join error details
        details: String,
    },

    /// A downstream payload could not be serialized
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for bridge operations.
pub type Result<T> = result::Result<T, BridgeError>;

impl BridgeError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        BridgeError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an I/O error carrying the path it happened on.
    pub fn io_at(error: impl fmt::Display, path: &Path) -> Self {
        BridgeError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }

    /// Shorthand for a missing or invalid configuration field.
    pub fn invalid_field(component: &str, field: &str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidConfigField {
            field: field.to_string(),
            component: component.to_string(),
            reason: reason.into(),
        }
    }
}
