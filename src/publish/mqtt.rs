use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::bridge::{CommandRouter, ForcePoll, Publisher};

use super::{ImageReadyMessage, PublishError, StatusMessage};

/// Delay before the event loop is polled again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the client request channel.
const REQUEST_CAPACITY: usize = 64;

/// Broker connection parameters and outbound topics.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Client identifier
    pub client_id: String,
    /// Optional login
    pub username: Option<String>,
    /// Password for `username`
    pub password: Option<String>,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Topic for the status JSON
    pub status_topic: String,
    /// Topic for the image-ready JSON
    pub image_topic: String,
}

impl MqttSettings {
    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options.set_credentials(username, password);
        }
        options
    }
}

/// Creates the publisher and the connection that drives it.
///
/// Nothing touches the network until [`MqttConnection::run`] is polled.
pub fn connect(settings: &MqttSettings) -> (MqttPublisher, MqttConnection) {
    let (client, eventloop) = AsyncClient::new(settings.options(), REQUEST_CAPACITY);
    let connected = Arc::new(AtomicBool::new(false));

    let publisher = MqttPublisher {
        client: client.clone(),
        connected: connected.clone(),
        status_topic: settings.status_topic.clone(),
        image_topic: settings.image_topic.clone(),
    };

    let connection = MqttConnection {
        client,
        eventloop,
        connected,
    };

    (publisher, connection)
}

/// Publishes status and image-ready messages, retained, at least once.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    status_topic: String,
    image_topic: String,
}

impl MqttPublisher {
    /// Whether a broker session is established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        message: &T,
    ) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }

        let payload = serde_json::to_vec(message)?;
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await?;

        debug!(topic, "published");
        Ok(())
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish_status(&self, message: &StatusMessage) -> Result<(), PublishError> {
        self.publish_json(&self.status_topic, message).await
    }

    async fn publish_image(&self, message: &ImageReadyMessage) -> Result<(), PublishError> {
        self.publish_json(&self.image_topic, message).await
    }
}

/// What an inbound message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// One of the control topics
    Command,
    /// The refresh topic
    Refresh,
    /// Anything else
    Unknown,
}

/// Inbound commands waiting for the worker.
const COMMAND_QUEUE: usize = 32;

/// Fans inbound messages out to command handling and the force-poll flag.
///
/// Commands are queued to a single [`CommandWorker`] so they reach the
/// player in arrival order.
#[derive(Clone)]
pub struct InboundRouter {
    commands: Option<CommandQueue>,
    refresh_topic: Option<String>,
    force: ForcePoll,
}

#[derive(Clone)]
struct CommandQueue {
    router: CommandRouter,
    tx: mpsc::Sender<(String, Vec<u8>)>,
}

/// Applies queued control commands one at a time.
pub struct CommandWorker {
    router: CommandRouter,
    rx: mpsc::Receiver<(String, Vec<u8>)>,
}

impl CommandWorker {
    /// Handles commands until every [`InboundRouter`] clone is dropped.
    #[instrument(skip_all, name = "commands")]
    pub async fn run(mut self) {
        while let Some((topic, payload)) = self.rx.recv().await {
            self.router.handle(&topic, &payload).await;
        }
        debug!("command queue closed");
    }
}

impl InboundRouter {
    /// Creates a router; either side may be absent.
    ///
    /// The returned worker must be spawned for commands to be applied.
    pub fn new(
        commands: Option<CommandRouter>,
        refresh_topic: Option<String>,
        force: ForcePoll,
    ) -> (Self, Option<CommandWorker>) {
        let (commands, worker) = match commands {
            Some(router) => {
                let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
                let worker = CommandWorker {
                    router: router.clone(),
                    rx,
                };
                (Some(CommandQueue { router, tx }), Some(worker))
            }
            None => (None, None),
        };

        let router = Self {
            commands,
            refresh_topic,
            force,
        };
        (router, worker)
    }

    /// Topics to subscribe to on every connect.
    pub fn subscriptions(&self) -> Vec<String> {
        let mut topics = self
            .commands
            .as_ref()
            .map(|queue| queue.router.topics())
            .unwrap_or_default();
        topics.extend(self.refresh_topic.clone());
        topics
    }

    /// Classifies a topic.
    pub fn classify(&self, topic: &str) -> Inbound {
        if self.refresh_topic.as_deref() == Some(topic) {
            Inbound::Refresh
        } else if self
            .commands
            .as_ref()
            .is_some_and(|queue| queue.router.handles(topic))
        {
            Inbound::Command
        } else {
            Inbound::Unknown
        }
    }

    /// Routes one inbound message. Commands are queued, never run inline.
    pub fn route(&self, topic: &str, payload: &[u8]) -> Inbound {
        let kind = self.classify(topic);

        match kind {
            Inbound::Refresh => {
                info!(topic, "refresh requested");
                self.force.trigger();
            }
            Inbound::Command => {
                let queued = self
                    .commands
                    .as_ref()
                    .map(|queue| queue.tx.try_send((topic.to_string(), payload.to_vec())));
                if let Some(Err(e)) = queued {
                    warn!(topic, error = %e, "command dropped");
                }
            }
            Inbound::Unknown => warn!(topic, "message on unexpected topic"),
        }

        kind
    }
}

/// Owns the MQTT event loop.
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: Arc<AtomicBool>,
}

impl MqttConnection {
    /// Drives the connection forever, reconnecting after errors.
    #[instrument(skip_all, name = "mqtt")]
    pub async fn run(mut self, router: InboundRouter) {
        let subscriptions: Vec<SubscribeFilter> = router
            .subscriptions()
            .into_iter()
            .map(|topic| SubscribeFilter::new(topic, QoS::AtLeastOnce))
            .collect();

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("connected to MQTT broker");
                    self.connected.store(true, Ordering::Release);

                    if !subscriptions.is_empty() {
                        if let Err(e) = self.client.try_subscribe_many(subscriptions.clone()) {
                            error!(error = %e, "cannot subscribe to control topics");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    router.route(&publish.topic, &publish.payload);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("broker closed the session");
                    self.connected.store(false, Ordering::Release);
                }
                Ok(_) => {}
                Err(e) => {
                    if self.connected.swap(false, Ordering::AcqRel) {
                        warn!(error = %e, "lost MQTT connection");
                    } else {
                        debug!(error = %e, "MQTT connection attempt failed");
                    }
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}
