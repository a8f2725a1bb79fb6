use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::Client;
use tracing::{error, info, instrument, warn};
use zbus::Connection;

use crate::{
    bridge::{
        ActiveSelection, Bridge, ChangeDetector, CommandRouter, PlaybackSnapshot, PollScheduler,
        PrecedencePolicy, SourceKind, SourceSlot, active_source,
    },
    config::Config,
    core::{BridgeError, Result},
    publish::{self, InboundRouter},
    render::{ImageRenderer, RenderSettings},
    server::FileServer,
    services::{
        jellyfin::{JellyfinAdapter, JellyfinClient, JellyfinCredentials},
        mpris::{MprisAdapter, MprisController},
        spotify::{SpotifyAdapter, SpotifyClient, SpotifyCredentials},
    },
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for the remote sources and artwork downloads.
///
/// # Errors
/// Returns error if the TLS backend cannot be initialized
pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("nowplaying-bridge/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()?)
}

/// One slot per enabled source, in declaration order.
///
/// `session` must be present when the local source is enabled.
pub fn source_slots(
    config: &Config,
    http: &Client,
    session: Option<&Connection>,
) -> Vec<SourceSlot> {
    let sources = &config.sources;
    let mut slots = Vec::new();

    if sources.mpris.enabled {
        match session {
            Some(connection) => {
                let adapter = MprisAdapter::new(
                    connection.clone(),
                    sources.mpris.ignored_players.clone(),
                );
                slots.push(
                    SourceSlot::new(Arc::new(adapter), sources.mpris.interval())
                        .with_stale_after(sources.mpris.stale_after()),
                );
            }
            None => warn!("local players enabled but no session bus, skipping"),
        }
    }

    if sources.spotify.enabled {
        let credentials = SpotifyCredentials {
            client_id: sources.spotify.client_id.clone().unwrap_or_default(),
            client_secret: sources.spotify.client_secret.clone().unwrap_or_default(),
            refresh_token: sources.spotify.refresh_token.clone().unwrap_or_default(),
        };
        let adapter = SpotifyAdapter::new(
            SpotifyClient::new(http.clone(), credentials),
            sources.spotify.report_paused,
        );
        slots.push(
            SourceSlot::new(Arc::new(adapter), sources.spotify.interval())
                .with_stale_after(sources.spotify.stale_after()),
        );
    }

    if sources.jellyfin.enabled {
        let credentials = JellyfinCredentials {
            server_url: sources.jellyfin.server_url.clone().unwrap_or_default(),
            username: sources.jellyfin.username.clone().unwrap_or_default(),
            password: sources.jellyfin.password.clone().unwrap_or_default(),
            device_id: sources.jellyfin.device_id.clone(),
        };
        let adapter = JellyfinAdapter::new(JellyfinClient::new(http.clone(), credentials));
        slots.push(
            SourceSlot::new(Arc::new(adapter), sources.jellyfin.interval())
                .with_stale_after(sources.jellyfin.stale_after()),
        );
    }

    slots
}

async fn session_bus(config: &Config) -> Result<Option<Connection>> {
    if !config.sources.mpris.enabled {
        return Ok(None);
    }
    Ok(Some(Connection::session().await?))
}

/// Result of a single diagnostic poll.
#[derive(Debug)]
pub struct PlayersReport {
    /// Every snapshot, grouped by source class
    pub readings: Vec<(SourceKind, Vec<PlaybackSnapshot>)>,
    /// Names of sources that could not be read
    pub unavailable: Vec<String>,
    /// What the bridge would publish
    pub selection: ActiveSelection,
}

/// Polls every enabled source once and resolves the selection without
/// publishing anything.
///
/// # Errors
/// Returns error if the session bus or HTTP client cannot be set up, or an
/// adapter task panics
pub async fn list_players(config: &Config) -> Result<PlayersReport> {
    let http = http_client()?;
    let session = session_bus(config).await?;
    let mut scheduler = PollScheduler::new(source_slots(config, &http, session.as_ref()));

    let now = Instant::now();
    let poll = scheduler.poll_due(now).await?;
    let readings = scheduler.readings(now);
    let selection =
        PrecedencePolicy::new(config.sources.precedence.clone()).resolve(readings.iter().copied());

    Ok(PlayersReport {
        readings: readings
            .into_iter()
            .map(|(kind, snapshots)| (kind, snapshots.to_vec()))
            .collect(),
        unavailable: poll.unavailable,
        selection,
    })
}

/// Starts every task and runs the poll loop until Ctrl+C.
///
/// # Errors
/// Returns error if a collaborator cannot be set up
#[instrument(skip_all)]
pub async fn run(config: Config) -> Result<()> {
    let http = http_client()?;
    let session = session_bus(&config).await?;

    let scheduler = PollScheduler::new(source_slots(&config, &http, session.as_ref()));
    let force = scheduler.force_handle();
    let policy = PrecedencePolicy::new(config.sources.precedence.clone());

    let (publisher, connection) = publish::connect(&config.mqtt.settings());
    let mut detector = ChangeDetector::new(
        config.general.change_detection,
        config.general.player_name.clone(),
        Arc::new(publisher),
    );

    if config.render.enabled {
        let settings = RenderSettings {
            directory: config.http.directory.clone(),
            filename: config.http.filename.clone(),
            base_url: config.http.image_url().unwrap_or_default(),
            font_path: config.render.font_path.clone(),
            font_size: config.render.font_size,
        };
        let renderer = ImageRenderer::new(http.clone(), settings)
            .map_err(|e| BridgeError::invalid_field("render", "font_path", e.to_string()))?;
        detector = detector.with_renderer(Arc::new(renderer));
    }

    let (active_writer, active_reader) = active_source();
    let commands = session.map(|connection| {
        CommandRouter::new(
            config.mqtt.command_prefix.clone(),
            active_reader,
            Arc::new(MprisController::new(connection)),
        )
    });
    let (inbound, worker) = InboundRouter::new(commands, config.mqtt.refresh_topic.clone(), force);
    if let Some(worker) = worker {
        tokio::spawn(worker.run());
    }
    tokio::spawn(connection.run(inbound));

    if config.http.enabled {
        let server = FileServer::new(config.http.directory.clone(), config.http.port);
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!(error = %e, "file server stopped");
            }
        });
    }

    let bridge = Bridge::new(
        scheduler,
        policy,
        detector,
        active_writer,
        config.general.tick_interval(),
        config.general.backoff_multiplier,
    );

    info!(
        player = %config.general.player_name,
        broker = %config.mqtt.host,
        "bridge started"
    );

    tokio::select! {
        () = bridge.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutting down");
        }
    }

    Ok(())
}
