use std::{str, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::services::mpris::MediaError;

use super::{active::ActiveSourceReader, snapshot::SourceId};

/// Positions at or below this many microseconds are never sent as seeks.
const MIN_SEEK_MICROS: i64 = 1;

/// No-argument transport operations on a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    /// Toggle between playing and paused
    PlayPause,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Previous,
}

/// Inbound control topics, relative to the configured command prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTopic {
    /// `<prefix>/position`, payload is decimal seconds
    Position,
    /// `<prefix>/playpause`
    PlayPause,
    /// `<prefix>/next`
    Next,
    /// `<prefix>/previous`
    Previous,
}

impl ControlTopic {
    /// Every control topic, in subscription order.
    pub const ALL: [ControlTopic; 4] = [
        ControlTopic::Position,
        ControlTopic::PlayPause,
        ControlTopic::Next,
        ControlTopic::Previous,
    ];

    /// Last path segment of the topic.
    pub fn suffix(self) -> &'static str {
        match self {
            ControlTopic::Position => "position",
            ControlTopic::PlayPause => "playpause",
            ControlTopic::Next => "next",
            ControlTopic::Previous => "previous",
        }
    }

    /// Full topic under `prefix`.
    pub fn topic(self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.suffix())
    }

    /// Matches a full topic under `prefix`.
    pub fn from_topic(prefix: &str, topic: &str) -> Option<Self> {
        let rest = topic
            .strip_prefix(prefix.trim_end_matches('/'))?
            .strip_prefix('/')?;

        Self::ALL.into_iter().find(|candidate| candidate.suffix() == rest)
    }
}

/// Malformed inbound command.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// Seek payload is not a non-negative decimal number of seconds
    #[error("invalid position value '{payload}': {reason}")]
    InvalidPosition {
        /// Payload as received
        payload: String,
        /// Why it was rejected
        reason: String,
    },

    /// Topic is not one of the control topics
    #[error("no handler for topic '{0}'")]
    UnknownTopic(String),
}

/// Parses a seek payload of decimal seconds into microseconds.
///
/// # Errors
/// Returns [`CommandError::InvalidPosition`] for non-UTF-8, non-numeric,
/// non-finite or negative input.
pub fn parse_seek_payload(payload: &[u8]) -> Result<i64, CommandError> {
    let text = String::from_utf8_lossy(payload);
    let invalid = |reason: &str| CommandError::InvalidPosition {
        payload: text.to_string(),
        reason: reason.to_string(),
    };

    let seconds: f64 = str::from_utf8(payload)
        .map_err(|_| invalid("not UTF-8"))?
        .trim()
        .parse()
        .map_err(|_| invalid("not a number"))?;

    if !seconds.is_finite() {
        return Err(invalid("not finite"));
    }
    if seconds < 0.0 {
        return Err(invalid("position must be non-negative"));
    }

    Ok((seconds * 1_000_000.0) as i64)
}

/// Executes control operations on a local player.
#[async_trait]
pub trait PlayerController: Send + Sync {
    /// Invokes a transport operation on `target`.
    ///
    /// # Errors
    /// Returns the bus failure.
    async fn transport(&self, target: &SourceId, op: TransportOp) -> Result<(), MediaError>;

    /// Seeks `target` to an absolute position in microseconds.
    ///
    /// # Errors
    /// Returns the bus failure, or [`MediaError::MissingTrackId`] when the
    /// player exposes no current track.
    async fn set_position(
        &self,
        target: &SourceId,
        position_micros: i64,
    ) -> Result<(), MediaError>;
}

/// What happened to one inbound command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Sent to the active source
    Executed,

    /// Dropped: no local source is active
    NoActiveSource,

    /// Dropped: the topic or payload was malformed
    Rejected(CommandError),

    /// Dropped: the seek target rounds to the start of the track
    SeekSuppressed,

    /// The player refused or failed the operation
    Failed(MediaError),
}

/// Routes inbound control messages to the active local source.
///
/// Commands are fire-and-forget against whichever source is active when they
/// arrive; nothing is queued.
#[derive(Clone)]
pub struct CommandRouter {
    prefix: String,
    active: ActiveSourceReader,
    controller: Arc<dyn PlayerController>,
}

impl CommandRouter {
    /// Creates a router for topics under `prefix`.
    pub fn new(
        prefix: impl Into<String>,
        active: ActiveSourceReader,
        controller: Arc<dyn PlayerController>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            active,
            controller,
        }
    }

    /// Topics to subscribe to.
    pub fn topics(&self) -> Vec<String> {
        ControlTopic::ALL
            .into_iter()
            .map(|topic| topic.topic(&self.prefix))
            .collect()
    }

    /// Whether `topic` is one of this router's control topics.
    pub fn handles(&self, topic: &str) -> bool {
        ControlTopic::from_topic(&self.prefix, topic).is_some()
    }

    /// Handles one inbound message.
    #[instrument(skip(self, payload))]
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> CommandOutcome {
        let Some(control) = ControlTopic::from_topic(&self.prefix, topic) else {
            let e = CommandError::UnknownTopic(topic.to_string());
            warn!(error = %e, "command ignored");
            return CommandOutcome::Rejected(e);
        };

        let Some(target) = self.active.current() else {
            warn!("command ignored: no active player");
            return CommandOutcome::NoActiveSource;
        };

        let result = match control {
            ControlTopic::Position => {
                let position_micros = match parse_seek_payload(payload) {
                    Ok(micros) => micros,
                    Err(e) => {
                        error!(error = %e, "rejected seek command");
                        return CommandOutcome::Rejected(e);
                    }
                };

                if position_micros <= MIN_SEEK_MICROS {
                    debug!(position_micros, source = %target, "seek to start skipped");
                    return CommandOutcome::SeekSuppressed;
                }

                self.controller.set_position(&target, position_micros).await
            }
            ControlTopic::PlayPause => {
                self.controller
                    .transport(&target, TransportOp::PlayPause)
                    .await
            }
            ControlTopic::Next => self.controller.transport(&target, TransportOp::Next).await,
            ControlTopic::Previous => {
                self.controller
                    .transport(&target, TransportOp::Previous)
                    .await
            }
        };

        match result {
            Ok(()) => {
                info!(source = %target, command = control.suffix(), "command executed");
                CommandOutcome::Executed
            }
            Err(e) => {
                error!(source = %target, command = control.suffix(), error = %e, "command failed");
                CommandOutcome::Failed(e)
            }
        }
    }
}
