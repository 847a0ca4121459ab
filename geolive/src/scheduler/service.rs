//! Periodic cycle driver.
//!
//! Lifecycle: `Created → WaitingForReady → Idle ⇄ Running`, with
//! `Cancelled` reachable from `WaitingForReady` and `Idle`. A cycle that
//! has started always runs to completion; cancellation is observed between
//! cycles only.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cycle::{CycleReport, FeedCycle};
use crate::domain::tenant::DEFAULT_POLL_INTERVAL_HOURS;
use crate::{Error, Result};

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Created,
    WaitingForReady,
    Idle,
    Running,
    Cancelled,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::WaitingForReady => "waiting_for_ready",
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Created, WaitingForReady)
                | (WaitingForReady, Idle)
                | (WaitingForReady, Cancelled)
                | (Idle, Running)
                | (Idle, Cancelled)
                | (Running, Idle)
        )
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can execute one cycle.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self) -> CycleReport;
}

#[async_trait]
impl CycleRunner for FeedCycle {
    async fn run_cycle(&self) -> CycleReport {
        self.run_once().await
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts.
    pub interval: Duration,
}

impl SchedulerConfig {
    /// Interval of `hours`. Zero, or a value too large to express in
    /// seconds, falls back to the default.
    pub fn from_hours(hours: u64) -> Self {
        let default_hours = u64::from(DEFAULT_POLL_INTERVAL_HOURS);
        let secs = Some(hours)
            .filter(|h| *h > 0)
            .and_then(|h| h.checked_mul(60 * 60))
            .unwrap_or(default_hours * 60 * 60);
        Self {
            interval: Duration::from_secs(secs),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_hours(u64::from(DEFAULT_POLL_INTERVAL_HOURS))
    }
}

/// Runs cycles on a fixed interval until cancelled.
pub struct Scheduler {
    runner: Arc<dyn CycleRunner>,
    config: SchedulerConfig,
    state: RwLock<SchedulerState>,
    cancellation_token: CancellationToken,
    cycles_completed: AtomicU64,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn CycleRunner>, config: SchedulerConfig) -> Self {
        Self::with_cancellation(runner, config, CancellationToken::new())
    }

    /// Create a scheduler driven by an external cancellation token.
    pub fn with_cancellation(
        runner: Arc<dyn CycleRunner>,
        config: SchedulerConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            runner,
            config,
            state: RwLock::new(SchedulerState::Created),
            cancellation_token,
            cycles_completed: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::SeqCst)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Request shutdown. An in-flight cycle still completes.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    fn transition(&self, next: SchedulerState) -> Result<()> {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            return Err(Error::invalid_transition(*state, next));
        }
        debug!(from = %*state, to = %next, "Scheduler state change");
        *state = next;
        Ok(())
    }

    /// Wait for `ready`, then run cycles every interval until cancelled.
    ///
    /// The first cycle starts immediately once ready. A cycle that overruns
    /// the interval delays the next start instead of triggering a burst of
    /// catch-up cycles. Returns an error only when the scheduler has already
    /// been started.
    pub async fn run<F>(&self, ready: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        self.transition(SchedulerState::WaitingForReady)?;
        debug!("Scheduler waiting for readiness");

        tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => {
                info!("Scheduler cancelled before becoming ready");
                return self.transition(SchedulerState::Cancelled);
            }
            _ = ready => {}
        }

        self.transition(SchedulerState::Idle)?;
        info!(interval_secs = self.config.interval.as_secs(), "Scheduler started");

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.transition(SchedulerState::Running)?;
            let started = Instant::now();
            let report = self.runner.run_cycle().await;
            let cycle = self.cycles_completed.fetch_add(1, Ordering::SeqCst) + 1;
            self.transition(SchedulerState::Idle)?;

            info!(
                cycle,
                tenants = report.outcomes.len(),
                dispatched = report.dispatch_count(),
                delivered = report.delivered_count(),
                skipped = report.skipped.is_some(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Cycle finished"
            );
        }

        self.transition(SchedulerState::Cancelled)?;
        info!(cycles = self.cycles_completed(), "Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    /// Runner that counts cycles and optionally takes time.
    struct CountingRunner {
        started: AtomicUsize,
        finished: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        duration: Duration,
        starts: parking_lot::Mutex<Vec<tokio::time::Instant>>,
    }

    impl CountingRunner {
        fn new(duration: Duration) -> Arc<Self> {
            Arc::new(Self {
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                duration,
                starts: parking_lot::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CycleRunner for CountingRunner {
        async fn run_cycle(&self) -> CycleReport {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.starts.lock().push(tokio::time::Instant::now());
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            if !self.duration.is_zero() {
                tokio::time::sleep(self.duration).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            CycleReport::default()
        }
    }

    fn scheduler(runner: Arc<CountingRunner>, interval: Duration) -> Arc<Scheduler> {
        Arc::new(Scheduler::new(runner, SchedulerConfig { interval }))
    }

    #[test]
    fn test_state_transitions() {
        use SchedulerState::*;
        assert!(Created.can_transition_to(WaitingForReady));
        assert!(WaitingForReady.can_transition_to(Cancelled));
        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Idle));
        assert!(!Running.can_transition_to(Cancelled));
        assert!(!Created.can_transition_to(Running));
        assert!(!Cancelled.can_transition_to(Idle));
    }

    #[test]
    fn test_config_from_hours() {
        assert_eq!(
            SchedulerConfig::from_hours(2).interval,
            Duration::from_secs(2 * 3600)
        );
        assert_eq!(
            SchedulerConfig::from_hours(0).interval,
            SchedulerConfig::default().interval
        );
        assert_eq!(SchedulerConfig::default().interval, Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_config_from_hours_overflow_falls_back() {
        let default = SchedulerConfig::default().interval;
        assert_eq!(SchedulerConfig::from_hours(u64::MAX / 60).interval, default);
        assert_eq!(SchedulerConfig::from_hours(u64::MAX).interval, default);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cycle_before_ready() {
        let runner = CountingRunner::new(Duration::ZERO);
        let scheduler = scheduler(runner.clone(), Duration::from_secs(60));
        let (ready_tx, ready_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move {
                scheduler
                    .run(async {
                        let _ = ready_rx.await;
                    })
                    .await
            }
        });

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runner.started.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.state(), SchedulerState::WaitingForReady);

        ready_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runner.started.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runner.started.load(Ordering::SeqCst), 2);

        scheduler.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(scheduler.cycles_completed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_ready() {
        let runner = CountingRunner::new(Duration::ZERO);
        let scheduler = scheduler(runner.clone(), Duration::from_secs(60));
        scheduler.cancel();

        scheduler.run(std::future::pending()).await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(runner.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_lets_in_flight_cycle_finish() {
        let runner = CountingRunner::new(Duration::from_secs(30));
        let scheduler = scheduler(runner.clone(), Duration::from_secs(60));

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run(async {}).await }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.cancel();

        handle.await.unwrap().unwrap();
        assert_eq!(runner.started.load(Ordering::SeqCst), 1);
        assert_eq!(runner.finished.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_never_overlaps_or_bursts() {
        let runner = CountingRunner::new(Duration::from_secs(25));
        let scheduler = scheduler(runner.clone(), Duration::from_secs(10));

        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run(async {}).await }
        });

        tokio::time::sleep(Duration::from_secs(60)).await;
        scheduler.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(runner.max_active.load(Ordering::SeqCst), 1);
        let starts = runner.starts.lock().clone();
        assert!(starts.len() >= 2);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(25));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_twice_is_rejected() {
        let runner = CountingRunner::new(Duration::ZERO);
        let scheduler = scheduler(runner, Duration::from_secs(60));
        scheduler.cancel();
        scheduler.run(async {}).await.unwrap();

        let err = scheduler.run(async {}).await.unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
    }
}
