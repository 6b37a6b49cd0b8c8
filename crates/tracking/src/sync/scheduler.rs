//! Interval scheduler with overlap prevention
//!
//! The scheduler owns one recurring timer task. The startup probe and every
//! tick spawn their work on separate tasks, so cancelling the timer (stop,
//! interval change) never cancels a probe or cycle that is already running. A busy flag guarantees at most one cycle
//! at a time; ticks and manual triggers that arrive while it is set are
//! dropped, not queued.

use chrono::Local;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::cycle::run_cycle;
use crate::classify::Thresholds;
use crate::config::{EngineOptions, Settings};
use crate::models::{CycleStatus, PollResult, Zone};
use crate::navixy::{TrackerFetcher, Transport};

/// Shortest interval the scheduler accepts
const MIN_INTERVAL: Duration = Duration::from_millis(Settings::MIN_REFRESH_MS);

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerOptions {
    pub refresh_interval: Duration,
    pub thresholds: Thresholds,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from(&EngineOptions::default())
    }
}

impl From<&EngineOptions> for SchedulerOptions {
    fn from(options: &EngineOptions) -> Self {
        Self {
            refresh_interval: options.refresh_interval,
            thresholds: options.thresholds,
        }
    }
}

/// An immutable published view of one completed cycle
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub result: PollResult,
    pub status: CycleStatus,
    /// Outcome of the most recent connectivity check
    pub connected: bool,
    /// Interval in effect when the cycle finished
    pub refresh_interval: Duration,
    /// 1-based cycle counter
    pub cycle: u64,
}

impl Snapshot {
    /// Status badge text
    pub fn status_line(&self) -> String {
        match self.status {
            CycleStatus::Failed => "Update failed – see diagnostics".to_string(),
            CycleStatus::Ok | CycleStatus::Partial => format!(
                "Updated at {} • every {}s",
                self.result
                    .timestamp
                    .with_timezone(&Local)
                    .format("%H:%M:%S"),
                self.refresh_interval.as_secs_f64().round() as u64
            ),
        }
    }

    /// Tracker count badge text
    pub fn count_line(&self) -> String {
        format!("Trackers: {}", self.result.states.len())
    }
}

/// Holds the busy flag for the lifetime of one cycle
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State shared between the scheduler handle, its timer and running cycles
struct Shared<T: Transport> {
    fetcher: TrackerFetcher<T>,
    thresholds: Thresholds,
    busy: AtomicBool,
    connected: AtomicBool,
    interval_ms: AtomicU64,
    cycles: AtomicU64,
    published: watch::Sender<Option<Arc<Snapshot>>>,
}

impl<T: Transport> Shared<T> {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Relaxed))
    }

    /// Run one cycle unless another is in progress
    async fn run_guarded(&self) -> Option<Arc<Snapshot>> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("Cycle already running, dropping this one");
            return None;
        };

        let cached_zones: Vec<Zone> = self
            .published
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.result.zones.clone())
            .unwrap_or_default();

        let outcome = run_cycle(&self.fetcher, &self.thresholds, &cached_zones).await;
        self.connected.store(outcome.roster_ok, Ordering::Relaxed);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        let snapshot = Arc::new(Snapshot {
            result: outcome.result,
            status: outcome.status,
            connected: outcome.roster_ok,
            refresh_interval: self.interval(),
            cycle,
        });

        match snapshot.status {
            CycleStatus::Ok => info!(
                "Cycle {} ok: {} trackers",
                cycle,
                snapshot.result.states.len()
            ),
            CycleStatus::Partial => warn!(
                "Cycle {} partial: {} trackers, {} errors",
                cycle,
                snapshot.result.states.len(),
                snapshot.result.errors.len()
            ),
            CycleStatus::Failed => error!("Cycle {} failed", cycle),
        }

        self.published.send_replace(Some(Arc::clone(&snapshot)));
        Some(snapshot)
    }

    async fn probe(&self) -> bool {
        let connected = match self.fetcher.fetch_roster().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Connectivity probe failed: {}", e);
                false
            }
        };
        self.connected.store(connected, Ordering::Relaxed);
        info!("Connectivity probe: {}", if connected { "connected" } else { "offline" });
        connected
    }
}

/// Runs poll cycles on an interval and publishes snapshots
///
/// Snapshots are published through a `watch` channel; a reader always sees
/// the latest complete result, never a half-built one. Timer control methods
/// must be called from within a tokio runtime.
pub struct PollScheduler<T: Transport> {
    shared: Arc<Shared<T>>,
    timer: Option<JoinHandle<()>>,
}

impl<T: Transport> PollScheduler<T> {
    pub fn new(fetcher: TrackerFetcher<T>, options: SchedulerOptions) -> Self {
        let interval = options.refresh_interval.max(MIN_INTERVAL);
        let (published, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                fetcher,
                thresholds: options.thresholds,
                busy: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                interval_ms: AtomicU64::new(interval.as_millis() as u64),
                cycles: AtomicU64::new(0),
                published,
            }),
            timer: None,
        }
    }

    /// Probe connectivity, run the first cycle and keep polling
    ///
    /// Does nothing if the scheduler is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Scheduler already running");
            return;
        }

        let interval = self.interval();
        info!("Starting scheduler, interval {}ms", interval.as_millis());

        // Startup work runs outside the timer so a restart cannot cancel it
        let startup = Arc::clone(&self.shared);
        tokio::spawn(async move {
            startup.probe().await;
            startup.run_guarded().await;
        });

        self.timer = Some(spawn_timer(
            Arc::clone(&self.shared),
            Instant::now() + interval,
            interval,
        ));
    }

    /// Cancel the recurring timer; an in-flight cycle still completes
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Change the refresh interval
    ///
    /// The interval is clamped to one second. A running timer is cancelled and
    /// restarted so the next tick is one full new interval away.
    pub fn set_interval(&mut self, interval: Duration) {
        let interval = interval.max(MIN_INTERVAL);
        self.shared
            .interval_ms
            .store(interval.as_millis() as u64, Ordering::Relaxed);
        info!("Refresh interval set to {}ms", interval.as_millis());

        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.timer = Some(spawn_timer(
                Arc::clone(&self.shared),
                Instant::now() + interval,
                interval,
            ));
        }
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval()
    }

    /// Run a cycle now
    ///
    /// Returns `None` without fetching anything if a cycle is already running.
    pub async fn trigger(&self) -> Option<Arc<Snapshot>> {
        self.shared.run_guarded().await
    }

    /// Run a cycle on its own task
    ///
    /// The cycle completes even if the returned handle is dropped.
    pub fn spawn_trigger(&self) -> JoinHandle<Option<Arc<Snapshot>>> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.run_guarded().await })
    }

    /// Check connectivity with a roster call
    pub async fn probe(&self) -> bool {
        self.shared.probe().await
    }

    /// Check connectivity on its own task
    pub fn spawn_probe(&self) -> JoinHandle<bool> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.probe().await })
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Result of the most recent probe or roster fetch
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.shared.published.subscribe()
    }

    /// Most recently published snapshot, if any cycle has completed
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.shared.published.borrow().clone()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }
}

impl<T: Transport> Drop for PollScheduler<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_timer<T: Transport>(
    shared: Arc<Shared<T>>,
    first_tick: Instant,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let cycle = Arc::clone(&shared);
            tokio::spawn(async move {
                cycle.run_guarded().await;
            });
        }
    })
}
