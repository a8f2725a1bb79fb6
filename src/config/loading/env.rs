use std::str::FromStr;

use tracing::debug;

use crate::{
    config::Config,
    core::{BridgeError, Result},
};

/// Variables read by [`apply_env_overrides`], in application order.
pub const ENV_OVERRIDES: &[&str] = &[
    "MQTT_BROKER_HOST",
    "MQTT_BROKER_PORT",
    "MQTT_USERNAME",
    "MQTT_PASSWORD",
    "MQTT_TOPIC",
    "MQTT_STATUS_TOPIC",
    "HOST_IP",
    "HTTP_PORT",
    "JELLYFIN_SERVER_URL",
    "JELLYFIN_USERNAME",
    "JELLYFIN_PASSWORD",
    "SPOTIFY_CLIENT_ID",
    "SPOTIFY_CLIENT_SECRET",
    "SPOTIFY_REFRESH_TOKEN",
];

fn parse<T: FromStr>(var: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| BridgeError::invalid_field("environment", var, e.to_string()))
}

/// Overlays environment variables onto a loaded configuration.
///
/// Empty values are ignored so an unset compose variable does not wipe a
/// value from the file.
///
/// # Errors
/// Returns `BridgeError::InvalidConfigField` if a port is not a number
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for &var in ENV_OVERRIDES {
        let Some(value) = lookup(var).filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        debug!(var, "applying environment override");

        match var {
            "MQTT_BROKER_HOST" => config.mqtt.host = value,
            "MQTT_BROKER_PORT" => config.mqtt.port = parse(var, &value)?,
            "MQTT_USERNAME" => config.mqtt.username = Some(value),
            "MQTT_PASSWORD" => config.mqtt.password = Some(value),
            "MQTT_TOPIC" => config.mqtt.image_topic = value,
            "MQTT_STATUS_TOPIC" => config.mqtt.status_topic = value,
            "HOST_IP" => config.http.host_ip = Some(value),
            "HTTP_PORT" => config.http.port = parse(var, &value)?,
            "JELLYFIN_SERVER_URL" => config.sources.jellyfin.server_url = Some(value),
            "JELLYFIN_USERNAME" => config.sources.jellyfin.username = Some(value),
            "JELLYFIN_PASSWORD" => config.sources.jellyfin.password = Some(value),
            "SPOTIFY_CLIENT_ID" => config.sources.spotify.client_id = Some(value),
            "SPOTIFY_CLIENT_SECRET" => config.sources.spotify.client_secret = Some(value),
            "SPOTIFY_REFRESH_TOKEN" => config.sources.spotify.refresh_token = Some(value),
            _ => {}
        }
    }

    Ok(())
}
