mod env;
mod validation;

use std::{fs, path::Path};

pub use env::{ENV_OVERRIDES, apply_env_overrides};

use super::Config;
use crate::core::{BridgeError, Result};

/// Placeholder written over secrets by [`Config::redacted`].
pub const REDACTED: &str = "<redacted>";

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    /// Returns `BridgeError::TomlParseError` if the TOML is invalid
    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| BridgeError::toml_parse(e, None))
    }

    /// Loads the file at `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BridgeError::io_at(e, path))?;
        toml::from_str(&content).map_err(|e| BridgeError::toml_parse(e, Some(path)))
    }

    /// File, then environment overrides, then validation.
    ///
    /// `lookup` resolves environment variable names; pass `|k| std::env::var(k).ok()`
    /// for the process environment.
    ///
    /// # Errors
    /// Returns the first load, override or validation failure
    pub fn load_effective<F>(path: &Path, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load(path)?;
        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// A copy with passwords, secrets and tokens replaced.
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        let hide = |value: &mut Option<String>| {
            if value.is_some() {
                *value = Some(REDACTED.to_string());
            }
        };

        hide(&mut config.mqtt.password);
        hide(&mut config.sources.spotify.client_secret);
        hide(&mut config.sources.spotify.refresh_token);
        hide(&mut config.sources.jellyfin.password);
        config
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    /// Returns `BridgeError::ConfigValidation` if a value cannot be represented
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::ConfigValidation {
            component: "config".to_string(),
            details: e.to_string(),
        })
    }
}
