use std::collections::HashSet;

use crate::{
    bridge::SourceKind,
    config::Config,
    core::{BridgeError, Result},
};

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl Config {
    /// Checks everything the bridge needs before it starts.
    ///
    /// # Errors
    /// Returns the first problem found, naming the offending field
    pub fn validate(&self) -> Result<()> {
        if self.mqtt.host.trim().is_empty() {
            return Err(BridgeError::invalid_field(
                "mqtt",
                "host",
                "broker host is required (set it in the file or MQTT_BROKER_HOST)",
            ));
        }

        if !is_blank(&self.mqtt.username) && is_blank(&self.mqtt.password) {
            return Err(BridgeError::invalid_field(
                "mqtt",
                "password",
                "username is set without a password",
            ));
        }

        if self.render.enabled && is_blank(&self.http.host_ip) {
            return Err(BridgeError::invalid_field(
                "http",
                "host_ip",
                "required to build image URLs while rendering is enabled",
            ));
        }

        self.validate_sources()
    }

    fn validate_sources(&self) -> Result<()> {
        let sources = &self.sources;

        if sources.spotify.enabled {
            for (field, value) in [
                ("client_id", &sources.spotify.client_id),
                ("client_secret", &sources.spotify.client_secret),
                ("refresh_token", &sources.spotify.refresh_token),
            ] {
                if is_blank(value) {
                    return Err(BridgeError::invalid_field(
                        "sources.spotify",
                        field,
                        "required when the source is enabled",
                    ));
                }
            }
        }

        if sources.jellyfin.enabled {
            for (field, value) in [
                ("server_url", &sources.jellyfin.server_url),
                ("username", &sources.jellyfin.username),
                ("password", &sources.jellyfin.password),
            ] {
                if is_blank(value) {
                    return Err(BridgeError::invalid_field(
                        "sources.jellyfin",
                        field,
                        "required when the source is enabled",
                    ));
                }
            }
        }

        let enabled = sources.enabled();
        if enabled.is_empty() {
            return Err(BridgeError::ConfigValidation {
                component: "sources".to_string(),
                details: "no source is enabled".to_string(),
            });
        }

        let mut seen: HashSet<SourceKind> = HashSet::new();
        for kind in &sources.precedence {
            if !seen.insert(*kind) {
                return Err(BridgeError::invalid_field(
                    "sources",
                    "precedence",
                    format!("'{kind}' is listed more than once"),
                ));
            }
        }

        if let Some(missing) = enabled.iter().find(|kind| !seen.contains(kind)) {
            return Err(BridgeError::invalid_field(
                "sources",
                "precedence",
                format!("enabled source '{missing}' has no precedence entry"),
            ));
        }

        Ok(())
    }
}
