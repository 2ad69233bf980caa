//! Fixed-interval timer with random jitter that drives the pipeline.

use crate::config::ScheduleConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Longest accepted interval or jitter.
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Fire times on a fixed grid: fire `n` happens at
/// `start + n * interval + jitter_n`, with `jitter_n` drawn from `[0, jitter]`.
///
/// Jitter never accumulates, so consecutive fires are between
/// `interval - jitter` and `interval + jitter` apart.
pub struct FireSchedule<R> {
    start: Instant,
    interval: Duration,
    jitter: Duration,
    next_slot: u32,
    rng: R,
}

impl<R: Rng> FireSchedule<R> {
    /// `interval` and `jitter` are clamped to [`MAX_PERIOD`].
    pub fn new(start: Instant, interval: Duration, jitter: Duration, rng: R) -> Self {
        Self {
            start,
            interval: interval.min(MAX_PERIOD),
            jitter: jitter.min(MAX_PERIOD),
            next_slot: 1,
            rng,
        }
    }

    /// The next fire time not earlier than `now`, with the number of slots
    /// skipped because their time had already passed.
    pub fn next_after(&mut self, now: Instant) -> (Instant, u32) {
        let mut skipped = 0;
        loop {
            let slot = self.next_slot;
            self.next_slot = self.next_slot.saturating_add(1);

            let at = self.start + self.interval * slot + self.sample_jitter();
            if at >= now {
                return (at, skipped);
            }
            skipped += 1;
        }
    }

    fn sample_jitter(&mut self) -> Duration {
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.random_range(0..=max_ms))
    }
}

pub struct Scheduler<R = StdRng> {
    config: ScheduleConfig,
    rng: R,
}

impl Scheduler<StdRng> {
    pub fn new(config: ScheduleConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> Scheduler<R> {
    pub fn with_rng(config: ScheduleConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Invokes `job` on schedule until the returned future is dropped.
    ///
    /// Runs never overlap: each `job` future is awaited before the next fire
    /// time is computed, and slots that elapsed meanwhile are skipped.
    pub async fn run<F, Fut>(self, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let ScheduleConfig {
            interval,
            jitter,
            run_on_start,
        } = self.config;

        info!(
            interval_secs = interval.as_secs(),
            jitter_secs = jitter.as_secs(),
            "scheduler armed"
        );

        let mut schedule = FireSchedule::new(Instant::now(), interval, jitter, self.rng);
        if run_on_start {
            job().await;
        }

        loop {
            let now = Instant::now();
            let (fire_at, skipped) = schedule.next_after(now);
            if skipped > 0 {
                warn!(skipped, "previous run overran its slot, skipping missed runs");
            }
            debug!(in_secs = (fire_at - now).as_secs(), "next run scheduled");

            sleep_until(fire_at).await;
            job().await;
        }
    }
}
