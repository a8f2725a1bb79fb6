//! Configuration schema, loading and validation.
//!
//! One TOML file, overlaid with the deployment's environment variables and
//! validated once at startup. Every section has defaults except the broker
//! host, which must come from somewhere.

mod general;
mod loading;
mod mqtt;
mod output;
mod paths;
mod sources;

pub use general::{GeneralConfig, LogLevel};
pub use loading::{ENV_OVERRIDES, REDACTED, apply_env_overrides};
pub use mqtt::MqttConfig;
pub use output::{HttpConfig, RenderConfig};
pub use paths::ConfigPaths;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use sources::{JellyfinSourceConfig, MprisSourceConfig, SourcesConfig, SpotifySourceConfig};

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct Config {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Broker connection and topics.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Built-in file server.
    #[serde(default)]
    pub http: HttpConfig,

    /// Status image.
    #[serde(default)]
    pub render: RenderConfig,

    /// Media sources and their precedence.
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[cfg(test)]
mod tests;
