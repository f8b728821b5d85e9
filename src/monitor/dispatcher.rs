//! Geofence monitor worker.
//!
//! A dedicated thread owns the `Evaluator`. Push updates from the continuous
//! location stream, poll ticks, and control requests all reach it through one
//! FIFO channel, so evaluation passes never overlap and a control request
//! observes every update enqueued before it. The location callback enqueues
//! with `try_send` and never blocks the platform.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};

use crate::coordinate::Coordinate;
use crate::location::{LocationProvider, PositionCallback, SubscriptionHandle};
use crate::notify::ReminderScheduler;
use crate::storage::TargetSource;
use crate::target::TriggerEvent;

use super::config::MonitorConfig;
use super::evaluator::{Evaluator, PassOutcome};
use super::stream::TriggerStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOrigin {
    Push,
    Poll,
}

impl PassOrigin {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

#[derive(Debug)]
enum WorkerMsg {
    Evaluate { position: Coordinate },
    Poll,
    DedupCount { reply: Sender<usize> },
    ResetDedup { reply: Sender<usize> },
    Shutdown,
}

/// Point-in-time view of the monitor.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStatus {
    pub active: bool,
    /// Owners currently considered inside; zero while stopped.
    pub dedup_count: usize,
    /// Evaluation passes run since construction.
    pub passes: u64,
    pub notifications_emitted: u64,
    /// Push updates discarded because the worker queue was full.
    pub dropped_updates: u64,
    /// Trigger events discarded because an observer fell behind.
    pub dropped_events: u64,
}

#[derive(Debug, Default)]
struct Counters {
    passes: AtomicU64,
    emitted: AtomicU64,
    dropped_updates: AtomicU64,
    dropped_events: AtomicU64,
}

type Subscribers = Arc<Mutex<Vec<Sender<TriggerEvent>>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ActiveMonitor {
    tx: Sender<WorkerMsg>,
    subscription: SubscriptionHandle,
    stopping: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl ActiveMonitor {
    fn request(&self, make: impl FnOnce(Sender<usize>) -> WorkerMsg) -> Option<usize> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx.send(make(reply_tx)).ok()?;
        reply_rx.recv().ok()
    }
}

/// Background geofence monitor.
///
/// Combines the continuous location stream with a periodic poll and runs every
/// evaluation pass on one worker thread. At most one worker runs per monitor;
/// `stop` joins it, so the `DedupSet` starts empty after every restart.
pub struct GeofenceMonitor {
    location: Arc<LocationProvider>,
    scheduler: Arc<ReminderScheduler>,
    cfg: MonitorConfig,
    active: Mutex<Option<ActiveMonitor>>,
    counters: Arc<Counters>,
    subscribers: Subscribers,
}

impl GeofenceMonitor {
    /// Create a stopped monitor.
    #[must_use]
    pub fn new(location: Arc<LocationProvider>, scheduler: Arc<ReminderScheduler>, cfg: MonitorConfig) -> Self {
        Self {
            location,
            scheduler,
            cfg,
            active: Mutex::new(None),
            counters: Arc::new(Counters::default()),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Monitor tuning.
    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.cfg
    }

    /// Returns true while a worker is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live().is_some()
    }

    /// Lock the active slot, first reaping a worker that exited on its own.
    fn live(&self) -> MutexGuard<'_, Option<ActiveMonitor>> {
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|m| m.join.is_finished()) {
            if let Some(dead) = active.take() {
                self.location.unsubscribe(&dead.subscription);
                if dead.join.join().is_err() {
                    tracing::error!("geofence monitor worker panicked");
                } else {
                    tracing::warn!("geofence monitor worker exited unexpectedly");
                }
            }
        }
        active
    }

    /// Start monitoring against `targets`.
    ///
    /// Idempotent: while running this returns true without touching the
    /// existing worker. Returns false, leaving the monitor stopped, when
    /// location services are off, the configuration is invalid, or the
    /// location stream cannot be started. The supplier is read on every pass.
    pub fn start(&self, targets: Arc<dyn TargetSource>) -> bool {
        let mut active = self.live();
        if active.is_some() {
            tracing::debug!("geofence monitor already running");
            return true;
        }

        if let Err(err) = self.cfg.validate() {
            tracing::warn!(error = %err, "invalid monitor configuration; geofence monitor not started");
            return false;
        }

        if !self.location.services_enabled() {
            tracing::info!("location services disabled; geofence monitor not started");
            return false;
        }

        let (tx, rx) = bounded::<WorkerMsg>(self.cfg.update_queue_capacity.max(1));

        let push_tx = tx.clone();
        let push_counters = Arc::clone(&self.counters);
        let on_update: PositionCallback = Arc::new(move |position| {
            match push_tx.try_send(WorkerMsg::Evaluate { position }) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    push_counters.dropped_updates.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        let subscription = match self.location.subscribe(
            on_update,
            self.cfg.stream_min_interval(),
            self.cfg.stream_min_distance_m,
        ) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(error = %err, "location stream unavailable; geofence monitor not started");
                return false;
            }
        };

        let stopping = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            location: Arc::clone(&self.location),
            scheduler: Arc::clone(&self.scheduler),
            targets,
            evaluator: Evaluator::new(),
            counters: Arc::clone(&self.counters),
            subscribers: Arc::clone(&self.subscribers),
            stopping: Arc::clone(&stopping),
        };
        let poll_interval = self.cfg.poll_interval();
        let spawned = thread::Builder::new()
            .name("geonote-monitor".to_string())
            .spawn(move || worker.run(rx, poll_interval));
        let join = match spawned {
            Ok(join) => join,
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn geofence monitor worker");
                self.location.unsubscribe(&subscription);
                return false;
            }
        };

        *active = Some(ActiveMonitor {
            tx,
            subscription,
            stopping,
            join,
        });
        tracing::info!(?poll_interval, "geofence monitor started");
        true
    }

    /// Stop monitoring. Safe to call when stopped.
    ///
    /// Releases the location stream first, then waits for the worker to finish
    /// the pass it is running. Updates still queued are discarded.
    pub fn stop(&self) {
        let Some(active) = lock(&self.active).take() else {
            return;
        };

        self.location.unsubscribe(&active.subscription);
        active.stopping.store(true, Ordering::Release);
        if active.tx.send(WorkerMsg::Shutdown).is_err() {
            tracing::debug!("geofence monitor worker already gone");
        }
        if active.join.join().is_err() {
            tracing::error!("geofence monitor worker panicked");
        }
        tracing::info!("geofence monitor stopped");
    }

    /// Current status. While running, reflects every update delivered before
    /// the call.
    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        let active = self.live();
        let dedup_count = active
            .as_ref()
            .and_then(|m| m.request(|reply| WorkerMsg::DedupCount { reply }))
            .unwrap_or(0);

        MonitorStatus {
            active: active.is_some(),
            dedup_count,
            passes: self.counters.passes.load(Ordering::Relaxed),
            notifications_emitted: self.counters.emitted.load(Ordering::Relaxed),
            dropped_updates: self.counters.dropped_updates.load(Ordering::Relaxed),
            dropped_events: self.counters.dropped_events.load(Ordering::Relaxed),
        }
    }

    /// Forget which targets the device is inside, so the next pass notifies
    /// again for every target it is inside. Returns the number of entries
    /// cleared; zero while stopped.
    pub fn reset_dedup(&self) -> usize {
        self.live()
            .as_ref()
            .and_then(|m| m.request(|reply| WorkerMsg::ResetDedup { reply }))
            .unwrap_or(0)
    }

    /// Queue an immediate poll. Returns false while stopped.
    pub fn poll_now(&self) -> bool {
        self.live()
            .as_ref()
            .is_some_and(|m| m.tx.send(WorkerMsg::Poll).is_ok())
    }

    /// Observe trigger events from now on. The stream survives restarts.
    #[must_use]
    pub fn events(&self) -> TriggerStream {
        let (tx, rx) = bounded(self.cfg.event_stream_capacity.max(1));
        lock(&self.subscribers).push(tx);
        TriggerStream::new(rx)
    }
}

impl Drop for GeofenceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for GeofenceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeofenceMonitor")
            .field("cfg", &self.cfg)
            .field("active", &self.is_active())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

struct Worker {
    location: Arc<LocationProvider>,
    scheduler: Arc<ReminderScheduler>,
    targets: Arc<dyn TargetSource>,
    evaluator: Evaluator,
    counters: Arc<Counters>,
    subscribers: Subscribers,
    stopping: Arc<AtomicBool>,
}

impl Worker {
    #[allow(clippy::needless_pass_by_value)]
    fn run(mut self, rx: Receiver<WorkerMsg>, poll_interval: Duration) {
        let ticker = tick(poll_interval);
        loop {
            select! {
                recv(rx) -> msg => match msg {
                    Ok(WorkerMsg::Evaluate { position }) => self.pass(position, PassOrigin::Push),
                    Ok(WorkerMsg::Poll) => self.poll(),
                    Ok(WorkerMsg::DedupCount { reply }) => {
                        let _ = reply.send(self.evaluator.dedup().len());
                    }
                    Ok(WorkerMsg::ResetDedup { reply }) => {
                        let cleared = self.evaluator.reset();
                        tracing::debug!(cleared, "dedup set reset");
                        let _ = reply.send(cleared);
                    }
                    Ok(WorkerMsg::Shutdown) | Err(_) => break,
                },
                recv(ticker) -> _ => self.poll(),
            }
        }
        tracing::debug!(dedup = self.evaluator.dedup().len(), "geofence monitor worker exiting");
    }

    fn poll(&mut self) {
        if self.stopping.load(Ordering::Acquire) {
            return;
        }
        match self.location.current_position() {
            Ok(position) => self.pass(position, PassOrigin::Poll),
            Err(err) => tracing::debug!(error = %err, "no position fix; skipping poll"),
        }
    }

    fn pass(&mut self, position: Coordinate, origin: PassOrigin) {
        if self.stopping.load(Ordering::Acquire) {
            return;
        }

        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| {
            self.evaluator
                .evaluate(position, self.targets.as_ref(), &self.scheduler, Utc::now())
        }));
        let Ok(outcome) = evaluated else {
            tracing::warn!(origin = origin.as_str(), %position, "evaluation pass panicked; skipped");
            return;
        };

        self.counters.passes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .emitted
            .fetch_add(u64::try_from(outcome.entered.len()).unwrap_or(u64::MAX), Ordering::Relaxed);

        tracing::debug!(
            origin = origin.as_str(),
            %position,
            targets = outcome.targets,
            triggered = outcome.triggered,
            entered = outcome.entered.len(),
            released = outcome.released.len(),
            "evaluation pass"
        );

        self.publish(outcome);
    }

    fn publish(&self, outcome: PassOutcome) {
        if outcome.entered.is_empty() {
            return;
        }

        let mut subs = lock(&self.subscribers);
        for event in outcome.entered {
            // Never block the worker on a slow observer.
            subs.retain(|tx| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.counters.dropped_events.fetch_add(1, Ordering::Relaxed);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SimulatedLocationService;
    use crate::notify::InMemoryNotificationService;
    use crate::storage::InMemoryTargetStore;
    use crate::target::{GeofenceTarget, OwnerId};

    struct Rig {
        location: Arc<SimulatedLocationService>,
        notifications: Arc<InMemoryNotificationService>,
        monitor: GeofenceMonitor,
        store: Arc<InMemoryTargetStore>,
    }

    fn rig(cfg: MonitorConfig) -> Rig {
        let location = Arc::new(SimulatedLocationService::new());
        let notifications = Arc::new(InMemoryNotificationService::new());
        let provider = Arc::new(LocationProvider::new(location.clone()));
        let scheduler = Arc::new(ReminderScheduler::new(notifications.clone()));
        let store = Arc::new(InMemoryTargetStore::with_targets([GeofenceTarget::new(
            OwnerId::new("A").unwrap(),
            Coordinate::new(0.0, 0.0).unwrap(),
            100.0,
            "Groceries",
        )
        .unwrap()]));
        Rig {
            location,
            notifications,
            monitor: GeofenceMonitor::new(provider, scheduler, cfg),
            store,
        }
    }

    fn origin() -> Coordinate {
        Coordinate::new(0.0, 0.0).unwrap()
    }

    #[test]
    fn full_queue_drops_push_updates() {
        let r = rig(MonitorConfig {
            update_queue_capacity: 1,
            ..MonitorConfig::default()
        });
        let (block_tx, block_rx) = bounded::<()>(0);
        let gate: Arc<dyn TargetSource> = {
            let store = r.store.clone();
            Arc::new(move || {
                let _ = block_rx.recv();
                store.list_geofence_targets().unwrap_or_default()
            })
        };
        assert!(r.monitor.start(gate));

        // First update occupies the worker, second fills the queue, the rest drop.
        for _ in 0..4 {
            r.location.push(origin());
        }
        drop(block_tx);
        let status = r.monitor.status();
        assert!(status.dropped_updates >= 1);
        r.monitor.stop();
    }

    #[test]
    fn reset_dedup_renotifies() {
        let r = rig(MonitorConfig::default());
        assert!(r.monitor.start(r.store.clone()));
        r.location.push(origin());
        assert_eq!(r.monitor.status().dedup_count, 1);

        assert_eq!(r.monitor.reset_dedup(), 1);
        r.location.push(origin());
        assert_eq!(r.monitor.status().dedup_count, 1);
        assert_eq!(r.notifications.delivered().len(), 2);
    }

    #[test]
    fn stopped_monitor_reports_inactive() {
        let r = rig(MonitorConfig::default());
        assert!(!r.monitor.poll_now());
        assert_eq!(r.monitor.reset_dedup(), 0);
        assert_eq!(r.monitor.status(), MonitorStatus::default());
    }

    #[test]
    fn events_mirror_notifications() {
        let r = rig(MonitorConfig::default());
        let events = r.monitor.events();
        assert!(r.monitor.start(r.store.clone()));
        r.location.push(origin());

        let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.owner_id.as_str(), "A");
        assert_eq!(event.label, "Groceries");
        assert_eq!(event.distance_meters, 0);
    }

    #[test]
    fn exited_worker_reads_as_stopped() {
        let r = rig(MonitorConfig::default());
        assert!(r.monitor.start(r.store.clone()));
        lock(&r.monitor.active)
            .as_ref()
            .unwrap()
            .tx
            .send(WorkerMsg::Shutdown)
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while r.monitor.is_active() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!r.monitor.is_active());
        assert!(!r.monitor.status().active);
        assert_eq!(r.location.active_watches(), 0);

        assert!(r.monitor.start(r.store.clone()));
        r.location.push(origin());
        assert_eq!(r.monitor.status().dedup_count, 1);
    }

    #[test]
    fn invalid_config_refuses_start() {
        let r = rig(MonitorConfig {
            poll_interval_ms: Some(0),
            ..MonitorConfig::default()
        });
        assert!(!r.monitor.start(r.store.clone()));
        assert!(!r.monitor.is_active());
        assert_eq!(r.location.active_watches(), 0);
    }

    #[test]
    fn drop_stops_worker_and_releases_stream() {
        let r = rig(MonitorConfig::default());
        assert!(r.monitor.start(r.store.clone()));
        assert_eq!(r.location.active_watches(), 1);
        drop(r.monitor);
        assert_eq!(r.location.active_watches(), 0);
    }
}
