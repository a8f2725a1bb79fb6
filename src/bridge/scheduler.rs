use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use futures::future::join_all;
use tracing::{debug, error, instrument};

use crate::core::BridgeError;

use super::{
    snapshot::{PlaybackSnapshot, SourceKind},
    source::{Reading, SourceAdapter},
};

/// Longest wait before a failing adapter is queried again.
///
/// Shorter intervals still apply, so a source polled every tick keeps being
/// polled every tick.
pub const FAILED_POLL_RETRY: Duration = Duration::from_secs(5);

/// One-shot trigger that makes the next tick poll every adapter.
///
/// Cloned into whatever learns that upstream state changed (for example an
/// inbound refresh message). Triggering twice before a tick still forces a
/// single poll round.
#[derive(Debug, Clone, Default)]
pub struct ForcePoll(Arc<AtomicBool>);

impl ForcePoll {
    /// Requests a full poll on the next tick.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a forced poll is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Most recent reading of one adapter.
#[derive(Debug, Clone, Default)]
pub struct SourceCache {
    reading: Reading,
    last_success: Option<Instant>,
    last_attempt: Option<Instant>,
}

impl SourceCache {
    /// Latest stored reading, regardless of age.
    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    /// When the adapter last answered successfully.
    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// When the adapter was last queried, successfully or not.
    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    fn failing(&self) -> bool {
        self.last_attempt.is_some() && self.last_attempt != self.last_success
    }

    fn record(&mut self, reading: Reading, now: Instant) {
        self.last_attempt = Some(now);
        if reading.is_available() {
            self.last_success = Some(now);
        }
        self.reading = reading;
    }
}

/// An adapter together with its polling policy and cache.
pub struct SourceSlot {
    adapter: Arc<dyn SourceAdapter>,
    interval: Duration,
    stale_after: Option<Duration>,
    cache: SourceCache,
}

impl SourceSlot {
    /// Creates a slot polled every `interval`; zero means every tick.
    pub fn new(adapter: Arc<dyn SourceAdapter>, interval: Duration) -> Self {
        Self {
            adapter,
            interval,
            stale_after: None,
            cache: SourceCache::default(),
        }
    }

    /// Treats cached data older than `stale_after` as unavailable.
    pub fn with_stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Adapter name.
    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// Adapter backend class.
    pub fn kind(&self) -> SourceKind {
        self.adapter.kind()
    }

    /// Cached reading.
    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Whether the adapter should be queried at `now`.
    ///
    /// A healthy adapter is due `interval` after its last successful poll. A
    /// failing one is retried after `interval` or [`FAILED_POLL_RETRY`],
    /// whichever is shorter, counted from the failed attempt.
    pub fn is_due(&self, now: Instant, forced: bool) -> bool {
        if forced {
            return true;
        }

        if self.cache.failing() {
            let retry = self.interval.min(FAILED_POLL_RETRY);
            return self
                .cache
                .last_attempt
                .is_none_or(|last| now.saturating_duration_since(last) >= retry);
        }

        match self.cache.last_success {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Snapshots the resolver may use at `now`, honoring expiry.
    pub fn current(&self, now: Instant) -> &[PlaybackSnapshot] {
        let expired = match (self.stale_after, self.cache.last_success) {
            (Some(limit), Some(last)) => now.saturating_duration_since(last) > limit,
            _ => false,
        };

        if expired {
            &[]
        } else {
            self.cache.reading.snapshots()
        }
    }
}

/// Summary of one scheduler round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Adapters queried this tick
    pub polled: Vec<String>,

    /// Adapters that answered Unavailable
    pub unavailable: Vec<String>,

    /// Whether the round was forced
    pub forced: bool,
}

/// Decides which adapters are due each tick and refreshes their caches.
pub struct PollScheduler {
    slots: Vec<SourceSlot>,
    force: ForcePoll,
}

impl PollScheduler {
    /// Creates a scheduler; slot order is the adapter enumeration order.
    pub fn new(slots: Vec<SourceSlot>) -> Self {
        Self {
            slots,
            force: ForcePoll::default(),
        }
    }

    /// Handle for triggering a forced poll from elsewhere.
    pub fn force_handle(&self) -> ForcePoll {
        self.force.clone()
    }

    /// Registered slots in enumeration order.
    pub fn slots(&self) -> &[SourceSlot] {
        &self.slots
    }

    /// Queries every due adapter concurrently and stores the results.
    ///
    /// An adapter that fails is stored as Unavailable without delaying the
    /// others.
    ///
    /// # Errors
    /// Returns [`BridgeError::AdapterPanicked`] if an adapter task did not
    /// complete. The caches of the adapters that did complete are still
    /// updated.
    #[instrument(skip(self, now))]
    pub async fn poll_due(&mut self, now: Instant) -> Result<PollReport, BridgeError> {
        let forced = self.force.take();
        let due: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_due(now, forced))
            .map(|(index, _)| index)
            .collect();

        if forced {
            debug!(adapters = due.len(), "forced poll of all sources");
        }

        let handles = due.iter().map(|&index| {
            let adapter = Arc::clone(&self.slots[index].adapter);
            tokio::spawn(async move { adapter.poll().await })
        });
        let results = join_all(handles).await;

        let mut report = PollReport {
            forced,
            ..PollReport::default()
        };
        let mut failure = None;

        for (index, result) in due.into_iter().zip(results) {
            let slot = &mut self.slots[index];
            let name = slot.name().to_string();

            let reading = match result {
                Ok(reading) => reading,
                Err(e) => {
                    error!(source = %name, error = %e, "adapter task aborted");
                    failure.get_or_insert(BridgeError::AdapterPanicked {
                        source_name: name.clone(),
                        details: e.to_string(),
                    });
                    Reading::Unavailable
                }
            };

            if !reading.is_available() {
                report.unavailable.push(name.clone());
            }
            slot.cache.record(reading, now);
            report.polled.push(name);
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Current readings as `(class, snapshots)` pairs in enumeration order.
    pub fn readings(&self, now: Instant) -> Vec<(SourceKind, &[PlaybackSnapshot])> {
        self.slots
            .iter()
            .map(|slot| (slot.kind(), slot.current(now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::bridge::{
        snapshot::{PlaybackStatus, SourceId},
        source::SourceError,
    };

    struct CountingAdapter {
        name: String,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingAdapter {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceAdapter for CountingAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Mpris
        }

        async fn query(&self) -> Result<Vec<PlaybackSnapshot>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Backend("offline".to_string()));
            }
            Ok(vec![PlaybackSnapshot::new(
                SourceId::new(self.name.clone()),
                SourceKind::Mpris,
                PlaybackStatus::Playing,
            )])
        }
    }

    #[tokio::test]
    async fn intervals_are_independent() {
        let fast = CountingAdapter::new("fast", false);
        let slow = CountingAdapter::new("slow", false);
        let mut scheduler = PollScheduler::new(vec![
            SourceSlot::new(fast.clone(), Duration::ZERO),
            SourceSlot::new(slow.clone(), Duration::from_secs(30)),
        ]);

        let start = Instant::now();
        scheduler.poll_due(start).await.unwrap();
        scheduler.poll_due(start + Duration::from_secs(1)).await.unwrap();
        scheduler.poll_due(start + Duration::from_secs(2)).await.unwrap();

        assert_eq!(fast.calls(), 3);
        assert_eq!(slow.calls(), 1);

        scheduler.poll_due(start + Duration::from_secs(30)).await.unwrap();
        assert_eq!(slow.calls(), 2);
    }

    #[tokio::test]
    async fn force_polls_everything_once() {
        let slow = CountingAdapter::new("slow", false);
        let mut scheduler =
            PollScheduler::new(vec![SourceSlot::new(slow.clone(), Duration::from_secs(30))]);
        let force = scheduler.force_handle();

        let start = Instant::now();
        scheduler.poll_due(start).await.unwrap();

        force.trigger();
        force.trigger();
        let report = scheduler.poll_due(start + Duration::from_secs(1)).await.unwrap();
        assert!(report.forced);
        assert!(!force.is_pending());
        assert_eq!(slow.calls(), 2);

        let report = scheduler.poll_due(start + Duration::from_secs(2)).await.unwrap();
        assert!(!report.forced);
        assert_eq!(slow.calls(), 2);
    }

    #[tokio::test]
    async fn failing_adapter_does_not_block_others() {
        let broken = CountingAdapter::new("broken", true);
        let healthy = CountingAdapter::new("healthy", false);
        let mut scheduler = PollScheduler::new(vec![
            SourceSlot::new(broken.clone(), Duration::from_secs(10)),
            SourceSlot::new(healthy.clone(), Duration::from_secs(10)),
        ]);

        let start = Instant::now();
        let report = scheduler.poll_due(start).await.unwrap();
        assert_eq!(report.unavailable, vec!["broken".to_string()]);
        assert_eq!(scheduler.readings(start)[1].1.len(), 1);

        scheduler.poll_due(start + Duration::from_secs(1)).await.unwrap();
        assert_eq!(broken.calls(), 1);

        // retried before its own interval elapses
        scheduler.poll_due(start + FAILED_POLL_RETRY).await.unwrap();
        assert_eq!(broken.calls(), 2);
        assert_eq!(healthy.calls(), 1);
    }

    #[tokio::test]
    async fn outage_is_retried_at_bounded_rate() {
        let broken = CountingAdapter::new("broken", true);
        let mut scheduler = PollScheduler::new(vec![SourceSlot::new(
            broken.clone(),
            Duration::from_secs(30),
        )]);

        let start = Instant::now();
        for tick in 0..20 {
            scheduler
                .poll_due(start + Duration::from_millis(500 * tick))
                .await
                .unwrap();
        }

        // ten seconds of half-second ticks: the first attempt plus one retry
        assert_eq!(broken.calls(), 2);
        assert!(scheduler.slots()[0].cache().last_success().is_none());
    }

    #[tokio::test]
    async fn every_tick_source_keeps_polling_while_failing() {
        let broken = CountingAdapter::new("broken", true);
        let mut scheduler =
            PollScheduler::new(vec![SourceSlot::new(broken.clone(), Duration::ZERO)]);

        let start = Instant::now();
        scheduler.poll_due(start).await.unwrap();
        scheduler.poll_due(start + Duration::from_millis(500)).await.unwrap();

        assert_eq!(broken.calls(), 2);
    }

    #[tokio::test]
    async fn stale_readings_expire() {
        let slow = CountingAdapter::new("slow", false);
        let mut scheduler = PollScheduler::new(vec![
            SourceSlot::new(slow, Duration::from_secs(60))
                .with_stale_after(Some(Duration::from_secs(5))),
        ]);

        let start = Instant::now();
        scheduler.poll_due(start).await.unwrap();

        assert_eq!(scheduler.readings(start + Duration::from_secs(5))[0].1.len(), 1);
        assert!(scheduler.readings(start + Duration::from_secs(6))[0].1.is_empty());
    }
}
