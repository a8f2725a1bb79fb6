use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::publish::MqttSettings;

/// Broker connection and topic layout.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host name or address. Required.
    pub host: String,

    /// Broker port.
    pub port: u16,

    /// Login name, requires `password`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Login password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Client identifier presented to the broker.
    pub client_id: String,

    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    /// Retained status JSON.
    pub status_topic: String,

    /// Retained image-ready JSON.
    pub image_topic: String,

    /// Control topics are `<prefix>/position`, `/playpause`, `/next`, `/previous`.
    pub command_prefix: String,

    /// Any message here forces the next tick to poll every source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_topic: Option<String>,
}

impl MqttConfig {
    /// Connection parameters for the publisher.
    pub fn settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.host.clone(),
            port: self.port,
            client_id: self.client_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            status_topic: self.status_topic.clone(),
            image_topic: self.image_topic.clone(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            username: None,
            password: None,
            client_id: "nowplaying-bridge".to_string(),
            keep_alive_secs: 60,
            status_topic: "music/status".to_string(),
            image_topic: "music/image".to_string(),
            command_prefix: "music/control".to_string(),
            refresh_topic: None,
        }
    }
}
