//! Unit tests for config module
//!
//! Defaults, parsing, environment overrides and validation.
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic)]

use std::collections::HashMap;

use crate::{
    bridge::{ChangeDetection, SourceKind},
    config::{Config, LogLevel, REDACTED, apply_env_overrides},
    core::BridgeError,
};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn valid() -> Config {
    Config::from_toml_str(
        r#"
        [mqtt]
        host = "broker.lan"

        [http]
        host_ip = "192.168.1.20"
        "#,
    )
    .unwrap()
}

fn invalid_field(config: &Config) -> (String, String) {
    match config.validate() {
        Err(BridgeError::InvalidConfigField {
            component, field, ..
        }) => (component, field),
        other => panic!("expected InvalidConfigField, got {other:?}"),
    }
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.general.player_name, "Ubuntu PC");
    assert_eq!(config.general.tick_interval_ms, 500);
    assert_eq!(config.general.backoff_multiplier, 10);
    assert_eq!(config.general.change_detection, ChangeDetection::Track);
    assert_eq!(config.mqtt.port, 1883);
    assert_eq!(config.mqtt.status_topic, "music/status");
    assert_eq!(config.mqtt.image_topic, "music/image");
    assert_eq!(config.mqtt.command_prefix, "music/control");
    assert_eq!(config.http.port, 8000);
    assert_eq!(config.http.filename, "artwork.png");
    assert_eq!(
        config.sources.precedence,
        vec![SourceKind::Spotify, SourceKind::Jellyfin, SourceKind::Mpris]
    );
    assert_eq!(config.sources.enabled(), vec![SourceKind::Mpris]);
}

#[test]
fn parses_full_file() {
    let config = Config::from_toml_str(
        r#"
        [general]
        log_level = "debug"
        change_detection = "payload"

        [mqtt]
        host = "broker.lan"
        refresh_topic = "music/refresh"

        [sources]
        precedence = ["jellyfin", "mpris"]

        [sources.mpris]
        ignored_players = ["firefox"]
        stale_after_secs = 10

        [sources.jellyfin]
        enabled = true
        server_url = "http://jelly:8096"
        username = "me"
        password = "pw"
        "#,
    )
    .unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.general.change_detection, ChangeDetection::Payload);
    assert_eq!(config.mqtt.refresh_topic.as_deref(), Some("music/refresh"));
    assert_eq!(config.sources.mpris.ignored_players, vec!["firefox"]);
    assert_eq!(
        config.sources.mpris.stale_after(),
        Some(std::time::Duration::from_secs(10))
    );
    assert_eq!(
        config.sources.enabled(),
        vec![SourceKind::Mpris, SourceKind::Jellyfin]
    );
}

#[test]
fn unknown_source_in_precedence_is_a_parse_error() {
    let result = Config::from_toml_str("[sources]\nprecedence = [\"tidal\"]");
    assert!(matches!(result, Err(BridgeError::TomlParseError { .. })));
}

#[test]
fn env_overrides_replace_file_values() {
    let mut config = valid();
    apply_env_overrides(
        &mut config,
        env(&[
            ("MQTT_BROKER_HOST", "10.0.0.5"),
            ("MQTT_BROKER_PORT", "8883"),
            ("MQTT_TOPIC", "desk/image"),
            ("HOST_IP", ""),
            ("SPOTIFY_REFRESH_TOKEN", "tok"),
        ]),
    )
    .unwrap();

    assert_eq!(config.mqtt.host, "10.0.0.5");
    assert_eq!(config.mqtt.port, 8883);
    assert_eq!(config.mqtt.image_topic, "desk/image");
    assert_eq!(config.http.host_ip.as_deref(), Some("192.168.1.20"));
    assert_eq!(config.sources.spotify.refresh_token.as_deref(), Some("tok"));
}

#[test]
fn non_numeric_port_is_rejected() {
    let mut config = valid();
    let result = apply_env_overrides(&mut config, env(&[("HTTP_PORT", "eighty")]));

    assert!(matches!(
        result,
        Err(BridgeError::InvalidConfigField { ref field, .. }) if field == "HTTP_PORT"
    ));
}

#[test]
fn valid_config_passes() {
    assert!(valid().validate().is_ok());
}

#[test]
fn missing_broker_host_fails() {
    let mut config = valid();
    config.mqtt.host.clear();
    assert_eq!(invalid_field(&config), ("mqtt".into(), "host".into()));
}

#[test]
fn username_without_password_fails() {
    let mut config = valid();
    config.mqtt.username = Some("user".to_string());
    assert_eq!(invalid_field(&config), ("mqtt".into(), "password".into()));
}

#[test]
fn rendering_requires_host_ip() {
    let mut config = valid();
    config.http.host_ip = None;
    assert_eq!(invalid_field(&config), ("http".into(), "host_ip".into()));

    config.render.enabled = false;
    assert!(config.validate().is_ok());
}

#[test]
fn enabled_spotify_needs_credentials() {
    let mut config = valid();
    config.sources.spotify.enabled = true;
    config.sources.spotify.client_id = Some("id".to_string());
    assert_eq!(
        invalid_field(&config),
        ("sources.spotify".into(), "client_secret".into())
    );
}

#[test]
fn no_enabled_source_fails() {
    let mut config = valid();
    config.sources.mpris.enabled = false;
    assert!(matches!(
        config.validate(),
        Err(BridgeError::ConfigValidation { .. })
    ));
}

#[test]
fn precedence_must_cover_enabled_sources_once() {
    let mut config = valid();
    config.sources.precedence = vec![SourceKind::Spotify];
    assert_eq!(invalid_field(&config), ("sources".into(), "precedence".into()));

    config.sources.precedence = vec![SourceKind::Mpris, SourceKind::Mpris];
    assert_eq!(invalid_field(&config), ("sources".into(), "precedence".into()));
}

#[test]
fn redaction_hides_secrets_only() {
    let mut config = valid();
    config.mqtt.username = Some("user".to_string());
    config.mqtt.password = Some("hunter2".to_string());
    config.sources.spotify.client_secret = Some("s3cret".to_string());

    let redacted = config.redacted();
    assert_eq!(redacted.mqtt.username.as_deref(), Some("user"));
    assert_eq!(redacted.mqtt.password.as_deref(), Some(REDACTED));
    assert_eq!(
        redacted.sources.spotify.client_secret.as_deref(),
        Some(REDACTED)
    );
    assert_eq!(redacted.sources.spotify.refresh_token, None);

    let toml = redacted.to_toml_string().unwrap();
    assert!(!toml.contains("hunter2"));
    assert!(toml.contains("[sources.mpris]"));
}
