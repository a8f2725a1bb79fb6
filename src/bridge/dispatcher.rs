use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    core::BridgeError,
    publish::{ImageReadyMessage, PublishError, StatusMessage},
    render::RenderError,
};

use super::resolver::ActiveSelection;

/// What counts as a material change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    /// Compare only the title and artist visible on the display.
    #[default]
    Track,

    /// Compare the whole serialized status payload, timings included.
    Payload,
}

/// Identity of what was last sent downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchKey {
    /// The "Not Playing" placeholder
    Idle,

    /// A real track
    Track {
        /// Displayed title
        title: String,
        /// Displayed artist
        artist: String,
    },

    /// Serialized status payload
    Payload(String),
}

/// Produces the status image for a selection.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders and stores the image, returning the announcement to publish.
    ///
    /// # Errors
    /// Returns the fetch, decode or write failure.
    async fn render(&self, selection: &ActiveSelection) -> Result<ImageReadyMessage, RenderError>;
}

/// Sends messages to the display device.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes the status message.
    ///
    /// # Errors
    /// Returns the transport failure.
    async fn publish_status(&self, message: &StatusMessage) -> Result<(), PublishError>;

    /// Publishes the image-ready announcement.
    ///
    /// # Errors
    /// Returns the transport failure.
    async fn publish_image(&self, message: &ImageReadyMessage) -> Result<(), PublishError>;
}

/// A downstream step that failed after a change was detected.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    /// Rendering failed
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// Publishing failed
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Result of one [`ChangeDetector::maybe_dispatch`] call.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Same identity as last dispatched; nothing sent
    Unchanged,

    /// Render and publish all succeeded
    Dispatched,

    /// A step failed; the change will be retried next tick
    Failed(DispatchError),
}

/// Suppresses redundant renders and publishes.
///
/// The dispatched key only advances after every downstream step succeeds,
/// so a failed render or publish is retried on the next tick.
pub struct ChangeDetector {
    mode: ChangeDetection,
    player_name: String,
    renderer: Option<Arc<dyn Renderer>>,
    publisher: Arc<dyn Publisher>,
    dispatched: Option<DispatchKey>,
}

impl ChangeDetector {
    /// Creates a detector that publishes status only.
    pub fn new(
        mode: ChangeDetection,
        player_name: impl Into<String>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            mode,
            player_name: player_name.into(),
            renderer: None,
            publisher,
            dispatched: None,
        }
    }

    /// Also renders an image and publishes its announcement on change.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Identity of the last successful dispatch.
    pub fn dispatched(&self) -> Option<&DispatchKey> {
        self.dispatched.as_ref()
    }

    /// Computes the identity key of a selection under the configured mode.
    ///
    /// # Errors
    /// Returns the serialization error in payload mode.
    pub fn key_for(
        &self,
        selection: &ActiveSelection,
        status: &StatusMessage,
    ) -> Result<DispatchKey, serde_json::Error> {
        match self.mode {
            ChangeDetection::Payload => Ok(DispatchKey::Payload(serde_json::to_string(status)?)),
            ChangeDetection::Track => Ok(match selection.snapshot() {
                None => DispatchKey::Idle,
                Some(snapshot) => DispatchKey::Track {
                    title: snapshot.title.clone(),
                    artist: snapshot.artist.clone(),
                },
            }),
        }
    }

    /// Sends `selection` downstream if it differs from the last dispatch.
    ///
    /// # Errors
    /// Returns [`BridgeError::Serialization`] if the identity key cannot be
    /// computed. Downstream failures are reported as
    /// [`DispatchOutcome::Failed`], not as errors.
    #[instrument(skip_all, fields(title = selection.title(), artist = selection.artist()))]
    pub async fn maybe_dispatch(
        &mut self,
        selection: &ActiveSelection,
    ) -> Result<DispatchOutcome, BridgeError> {
        let status = StatusMessage::from_selection(selection, &self.player_name);
        let key = self.key_for(selection, &status)?;

        if self.dispatched.as_ref() == Some(&key) {
            debug!("no material change, skipping dispatch");
            return Ok(DispatchOutcome::Unchanged);
        }

        if let Err(e) = self.send(selection, &status).await {
            warn!(error = %e, "dispatch failed, will retry next tick");
            return Ok(DispatchOutcome::Failed(e));
        }

        info!(status = %status.status, "status update dispatched");
        self.dispatched = Some(key);
        Ok(DispatchOutcome::Dispatched)
    }

    async fn send(
        &self,
        selection: &ActiveSelection,
        status: &StatusMessage,
    ) -> Result<(), DispatchError> {
        let image = match &self.renderer {
            Some(renderer) => Some(renderer.render(selection).await?),
            None => None,
        };

        self.publisher.publish_status(status).await?;

        if let Some(image) = image {
            self.publisher.publish_image(&image).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use super::*;
    use crate::bridge::{PlaybackSnapshot, PlaybackStatus, SourceId, SourceKind};

    #[derive(Default)]
    struct RecordingPublisher {
        statuses: Mutex<Vec<StatusMessage>>,
        images: Mutex<Vec<ImageReadyMessage>>,
        fail: AtomicBool,
        fail_images: AtomicBool,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish_status(&self, message: &StatusMessage) -> Result<(), PublishError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PublishError::NotConnected);
            }
            self.statuses.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn publish_image(&self, message: &ImageReadyMessage) -> Result<(), PublishError> {
            if self.fail_images.load(Ordering::SeqCst) {
                return Err(PublishError::NotConnected);
            }
            self.images.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn render(
            &self,
            selection: &ActiveSelection,
        ) -> Result<ImageReadyMessage, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(RenderError::Io(std::io::Error::other("disk full")));
            }
            Ok(ImageReadyMessage::new(
                "http://host:8000/artwork.png",
                selection.title(),
                selection.artist(),
                1,
            ))
        }
    }

    fn track(title: &str, artist: &str, position: u64) -> ActiveSelection {
        let mut snapshot = PlaybackSnapshot::new(
            SourceId::new("org.mpris.MediaPlayer2.vlc"),
            SourceKind::Mpris,
            PlaybackStatus::Playing,
        );
        snapshot.title = title.to_string();
        snapshot.artist = artist.to_string();
        snapshot.position = Some(position);
        ActiveSelection::Source(snapshot)
    }

    fn detector(
        mode: ChangeDetection,
    ) -> (ChangeDetector, Arc<RecordingPublisher>, Arc<CountingRenderer>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let renderer = Arc::new(CountingRenderer::default());
        let detector = ChangeDetector::new(mode, "Ubuntu PC", publisher.clone())
            .with_renderer(renderer.clone());
        (detector, publisher, renderer)
    }

    #[tokio::test]
    async fn same_selection_dispatches_once() {
        let (mut detector, publisher, renderer) = detector(ChangeDetection::Track);
        let a = track("A", "Artist", 1);

        assert!(matches!(
            detector.maybe_dispatch(&a).await.unwrap(),
            DispatchOutcome::Dispatched
        ));
        assert!(matches!(
            detector.maybe_dispatch(&a).await.unwrap(),
            DispatchOutcome::Unchanged
        ));

        assert_eq!(publisher.statuses.lock().unwrap().len(), 1);
        assert_eq!(publisher.images.lock().unwrap().len(), 1);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn position_changes_are_not_material_in_track_mode() {
        let (mut detector, publisher, _) = detector(ChangeDetection::Track);

        detector.maybe_dispatch(&track("A", "Artist", 1)).await.unwrap();
        detector.maybe_dispatch(&track("A", "Artist", 2)).await.unwrap();

        assert_eq!(publisher.statuses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn position_changes_are_material_in_payload_mode() {
        let (mut detector, publisher, _) = detector(ChangeDetection::Payload);

        detector.maybe_dispatch(&track("A", "Artist", 1)).await.unwrap();
        detector.maybe_dispatch(&track("A", "Artist", 2)).await.unwrap();

        assert_eq!(publisher.statuses.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_publish_keeps_previous_state_and_retries() {
        let (mut detector, publisher, renderer) = detector(ChangeDetection::Track);
        let a = track("A", "Artist", 1);
        let b = track("B", "Artist", 1);

        detector.maybe_dispatch(&a).await.unwrap();

        publisher.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Failed(DispatchError::Publish(_))
        ));
        assert_eq!(
            detector.dispatched(),
            Some(&DispatchKey::Track {
                title: "A".to_string(),
                artist: "Artist".to_string()
            })
        );

        publisher.fail.store(false, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Dispatched
        ));

        let statuses = publisher.statuses.lock().unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[1].title, "B");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    }

    fn key(title: &str) -> DispatchKey {
        DispatchKey::Track {
            title: title.to_string(),
            artist: "Artist".to_string(),
        }
    }

    #[tokio::test]
    async fn failed_render_publishes_nothing_and_retries() {
        let (mut detector, publisher, renderer) = detector(ChangeDetection::Track);
        let a = track("A", "Artist", 1);
        let b = track("B", "Artist", 1);

        detector.maybe_dispatch(&a).await.unwrap();

        renderer.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Failed(DispatchError::Render(_))
        ));
        assert_eq!(detector.dispatched(), Some(&key("A")));
        assert_eq!(publisher.statuses.lock().unwrap().len(), 1);
        assert_eq!(publisher.images.lock().unwrap().len(), 1);

        renderer.fail.store(false, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Dispatched
        ));
        assert_eq!(detector.dispatched(), Some(&key("B")));
        assert_eq!(publisher.statuses.lock().unwrap()[1].title, "B");
        assert_eq!(publisher.images.lock().unwrap()[1].track, "B");
    }

    #[tokio::test]
    async fn failed_image_publish_keeps_state_and_republishes_both() {
        let (mut detector, publisher, renderer) = detector(ChangeDetection::Track);
        let a = track("A", "Artist", 1);
        let b = track("B", "Artist", 1);

        detector.maybe_dispatch(&a).await.unwrap();

        publisher.fail_images.store(true, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Failed(DispatchError::Publish(_))
        ));
        assert_eq!(detector.dispatched(), Some(&key("A")));
        // the status went out before the image announcement failed
        assert_eq!(publisher.statuses.lock().unwrap().len(), 2);
        assert_eq!(publisher.images.lock().unwrap().len(), 1);

        publisher.fail_images.store(false, Ordering::SeqCst);
        assert!(matches!(
            detector.maybe_dispatch(&b).await.unwrap(),
            DispatchOutcome::Dispatched
        ));
        assert_eq!(detector.dispatched(), Some(&key("B")));

        let statuses = publisher.statuses.lock().unwrap();
        let titles: Vec<&str> = statuses.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "B"]);
        assert_eq!(publisher.images.lock().unwrap()[1].track, "B");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stopping_is_a_dispatched_change() {
        let (mut detector, publisher, _) = detector(ChangeDetection::Track);

        detector.maybe_dispatch(&track("A", "Artist", 1)).await.unwrap();
        assert!(matches!(
            detector.maybe_dispatch(&ActiveSelection::Idle).await.unwrap(),
            DispatchOutcome::Dispatched
        ));
        assert_eq!(detector.dispatched(), Some(&DispatchKey::Idle));

        let statuses = publisher.statuses.lock().unwrap();
        assert_eq!(statuses[1].status, "Stopped");
    }

    #[tokio::test]
    async fn empty_track_is_distinct_from_idle() {
        let (mut detector, publisher, _) = detector(ChangeDetection::Track);

        detector.maybe_dispatch(&ActiveSelection::Idle).await.unwrap();
        detector.maybe_dispatch(&track("", "", 0)).await.unwrap();

        assert_eq!(publisher.statuses.lock().unwrap().len(), 2);
    }
}
