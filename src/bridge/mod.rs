//! Active-player resolution and change detection.
//!
//! Adapters fill per-source caches on their own intervals, the resolver picks
//! one active selection per tick, and the change detector sends it downstream
//! only when it materially changed. Inbound control commands are routed to
//! the active local source through a single-writer cell.

mod active;
mod commands;
mod dispatcher;
mod resolver;
mod runner;
mod scheduler;
mod snapshot;
mod source;

pub use active::{ActiveSourceReader, ActiveSourceWriter, active_source};
pub use commands::{
    CommandError, CommandOutcome, CommandRouter, ControlTopic, PlayerController, TransportOp,
    parse_seek_payload,
};
pub use dispatcher::{
    ChangeDetection, ChangeDetector, DispatchError, DispatchKey, DispatchOutcome, Publisher,
    Renderer,
};
pub use resolver::{ActiveSelection, PrecedencePolicy, command_target, resolve};
pub use runner::{Bridge, TickReport};
pub use scheduler::{
    FAILED_POLL_RETRY, ForcePoll, PollReport, PollScheduler, SourceCache, SourceSlot,
};
pub use snapshot::{
    ARTIST_NOT_AVAILABLE, PlaybackSnapshot, PlaybackStatus, SourceId, SourceKind,
    TITLE_NOT_AVAILABLE, flatten_artists, micros_to_secs, millis_to_secs, ticks_to_secs,
};
pub use source::{Reading, SourceAdapter, SourceError};
