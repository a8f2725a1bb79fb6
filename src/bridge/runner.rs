use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument};

use crate::core::BridgeError;

use super::{
    active::ActiveSourceWriter,
    dispatcher::{ChangeDetector, DispatchOutcome},
    resolver::{ActiveSelection, PrecedencePolicy, command_target},
    scheduler::{ForcePoll, PollReport, PollScheduler},
};

/// Everything one tick did.
#[derive(Debug)]
pub struct TickReport {
    /// Which adapters were polled
    pub poll: PollReport,

    /// Resolved active selection
    pub selection: ActiveSelection,

    /// Downstream result
    pub outcome: DispatchOutcome,
}

/// The poll, resolve and dispatch loop.
///
/// Ticks never overlap: all due adapters are polled, the selection is
/// resolved, and dispatch is attempted before the loop sleeps.
pub struct Bridge {
    scheduler: PollScheduler,
    policy: PrecedencePolicy,
    detector: ChangeDetector,
    active: ActiveSourceWriter,
    tick_interval: Duration,
    backoff: Duration,
}

impl Bridge {
    /// Assembles the loop.
    ///
    /// After a failed tick the loop sleeps `tick_interval * backoff_multiplier`.
    pub fn new(
        scheduler: PollScheduler,
        policy: PrecedencePolicy,
        detector: ChangeDetector,
        active: ActiveSourceWriter,
        tick_interval: Duration,
        backoff_multiplier: u32,
    ) -> Self {
        Self {
            scheduler,
            policy,
            detector,
            active,
            tick_interval,
            backoff: tick_interval.saturating_mul(backoff_multiplier.max(1)),
        }
    }

    /// Handle that forces the next tick to poll every adapter.
    pub fn force_handle(&self) -> ForcePoll {
        self.scheduler.force_handle()
    }

    /// Sleep used after a failed tick.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs one tick at `now`.
    ///
    /// # Errors
    /// Returns the failure that abandoned the tick: an adapter task that did
    /// not complete, or a status payload that could not be serialized.
    #[instrument(skip_all)]
    pub async fn tick(&mut self, now: Instant) -> Result<TickReport, BridgeError> {
        let poll = self.scheduler.poll_due(now).await?;

        let (selection, target) = {
            let readings = self.scheduler.readings(now);
            (
                self.policy.resolve(readings.iter().copied()),
                command_target(readings.iter().copied()),
            )
        };

        self.active.set(target);
        debug!(active = ?selection.owner(), status = %selection.status(), "selection resolved");

        let outcome = self.detector.maybe_dispatch(&selection).await?;

        Ok(TickReport {
            poll,
            selection,
            outcome,
        })
    }

    /// Ticks until the process is terminated.
    pub async fn run(mut self) {
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            backoff_ms = self.backoff.as_millis() as u64,
            "poll loop starting"
        );

        loop {
            let pause = match self.tick(Instant::now()).await {
                Ok(_) => self.tick_interval,
                Err(e) => {
                    error!(error = %e, "tick abandoned, backing off");
                    self.backoff
                }
            };

            tokio::time::sleep(pause).await;
        }
    }
}
