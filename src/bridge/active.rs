use tokio::sync::watch;
use tracing::info;

use super::snapshot::SourceId;

/// Creates the shared "currently active local source" cell.
///
/// The writer is owned by the poll loop; readers are cloned into the inbound
/// command path. Reads never block the writer.
pub fn active_source() -> (ActiveSourceWriter, ActiveSourceReader) {
    let (tx, rx) = watch::channel(None);
    (ActiveSourceWriter { tx }, ActiveSourceReader { rx })
}

/// Single writer of the active local source.
#[derive(Debug)]
pub struct ActiveSourceWriter {
    tx: watch::Sender<Option<SourceId>>,
}

impl ActiveSourceWriter {
    /// Stores the active source, returning whether it changed.
    pub fn set(&self, source: Option<SourceId>) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current != source {
                *current = source.clone();
                true
            } else {
                false
            }
        });

        if changed {
            match &source {
                Some(id) => info!(source = %id, "active local source changed"),
                None => info!("no active local source"),
            }
        }

        changed
    }

    /// Creates another reader.
    pub fn reader(&self) -> ActiveSourceReader {
        ActiveSourceReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the active local source.
#[derive(Debug, Clone)]
pub struct ActiveSourceReader {
    rx: watch::Receiver<Option<SourceId>>,
}

impl ActiveSourceReader {
    /// Current active local source, if any.
    pub fn current(&self) -> Option<SourceId> {
        self.rx.borrow().clone()
    }
}
