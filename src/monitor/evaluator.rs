//! Evaluation pass for the geofence monitor.
//!
//! One pass checks a position against a fresh target snapshot, emits a
//! proximity notification for every new entry, and releases owners the
//! position has left. The `DedupSet` is the only state carried between passes.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};

use crate::coordinate::Coordinate;
use crate::distance::distance;
use crate::notify::ReminderScheduler;
use crate::storage::TargetSource;
use crate::target::{round_meters, OwnerId, TriggerEvent};

/// Owners whose geofence the position is currently inside.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupSet {
    inside: HashSet<OwnerId>,
}

impl DedupSet {
    /// Returns true if `owner` is considered inside.
    #[must_use]
    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.inside.contains(owner)
    }

    /// Number of owners considered inside.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inside.len()
    }

    /// Returns true if no owner is considered inside.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }

    fn insert(&mut self, owner: OwnerId) -> bool {
        self.inside.insert(owner)
    }

    fn release_absent(&mut self, triggered: &HashSet<OwnerId>) -> Vec<OwnerId> {
        let released: Vec<OwnerId> = self
            .inside
            .iter()
            .filter(|owner| !triggered.contains(*owner))
            .cloned()
            .collect();
        for owner in &released {
            self.inside.remove(owner);
        }
        released
    }

    fn clear(&mut self) -> usize {
        let n = self.inside.len();
        self.inside.clear();
        n
    }
}

/// What a single pass did.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// False when the snapshot was empty or unreadable and nothing was evaluated.
    pub evaluated: bool,
    pub targets: usize,
    pub triggered: usize,
    /// New entries, in snapshot order.
    pub entered: Vec<TriggerEvent>,
    /// Entries whose notification the platform refused.
    pub failed_notifications: usize,
    /// Owners the position has left.
    pub released: Vec<OwnerId>,
}

/// Stateful evaluator owning the `DedupSet`.
#[derive(Debug, Default)]
pub struct Evaluator {
    dedup: DedupSet,
}

impl Evaluator {
    /// Create an evaluator with an empty `DedupSet`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current `DedupSet`.
    #[must_use]
    pub const fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    /// Forget every entry; the next pass notifies for every target inside.
    pub fn reset(&mut self) -> usize {
        self.dedup.clear()
    }

    /// Run one pass at `position`.
    ///
    /// An empty or unreadable snapshot leaves the `DedupSet` untouched, as does
    /// a supplier that panics. Notification failures, panics included, are
    /// logged and do not roll back the entry.
    pub fn evaluate(
        &mut self,
        position: Coordinate,
        targets: &dyn TargetSource,
        scheduler: &ReminderScheduler,
        observed_at: DateTime<Utc>,
    ) -> PassOutcome {
        let snapshot = panic::catch_unwind(AssertUnwindSafe(|| targets.list_geofence_targets()));
        let targets = match snapshot {
            Ok(Ok(targets)) => targets,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "target snapshot unavailable; skipping pass");
                return PassOutcome::default();
            }
            Err(_) => {
                tracing::warn!("target supplier panicked; skipping pass");
                return PassOutcome::default();
            }
        };
        if targets.is_empty() {
            return PassOutcome::default();
        }

        let mut outcome = PassOutcome {
            evaluated: true,
            targets: targets.len(),
            ..PassOutcome::default()
        };

        let mut triggered: HashSet<OwnerId> = HashSet::new();
        for target in &targets {
            let meters = distance(position, target.center);
            if !target.contains_distance(meters) {
                continue;
            }
            triggered.insert(target.owner_id.clone());

            if !self.dedup.insert(target.owner_id.clone()) {
                continue;
            }

            let rounded = round_meters(meters);
            let emitted = panic::catch_unwind(AssertUnwindSafe(|| {
                scheduler.emit_proximity_notification(&target.label, &target.owner_id, rounded)
            }));
            match emitted {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    tracing::warn!(owner = %target.owner_id, error = %err, "proximity notification failed");
                    outcome.failed_notifications += 1;
                    continue;
                }
                Err(_) => {
                    tracing::warn!(owner = %target.owner_id, "notification service panicked");
                    outcome.failed_notifications += 1;
                    continue;
                }
            }
            outcome.entered.push(TriggerEvent {
                owner_id: target.owner_id.clone(),
                label: target.label.clone(),
                distance_meters: rounded,
                observed_at,
            });
        }

        outcome.triggered = triggered.len();
        outcome.released = self.dedup.release_absent(&triggered);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::notify::InMemoryNotificationService;
    use crate::storage::{InMemoryTargetStore, StorageError};
    use crate::target::GeofenceTarget;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn target(owner: &str, center: Coordinate, radius: f64) -> GeofenceTarget {
        GeofenceTarget::new(OwnerId::new(owner).unwrap(), center, radius, format!("note {owner}")).unwrap()
    }

    fn setup() -> (Arc<InMemoryNotificationService>, ReminderScheduler) {
        let service = Arc::new(InMemoryNotificationService::new());
        let scheduler = ReminderScheduler::new(service.clone());
        (service, scheduler)
    }

    /// A point due north of `center` at exactly `meters` (haversine-consistent).
    fn north_of(center: Coordinate, meters: f64) -> Coordinate {
        let dlat = (meters / crate::distance::EARTH_RADIUS_METERS).to_degrees();
        c(center.latitude() + dlat, center.longitude())
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let (service, scheduler) = setup();
        let center = c(40.0, -75.0);
        let store = InMemoryTargetStore::with_targets([target("a", center, 100.0)]);
        let mut eval = Evaluator::new();

        let edge = north_of(center, 99.999_999);
        let out = eval.evaluate(edge, &store, &scheduler, Utc::now());
        assert_eq!(out.entered.len(), 1);
        assert_eq!(out.entered[0].distance_meters, 100);

        eval.reset();
        let beyond = north_of(center, 100.1);
        let out = eval.evaluate(beyond, &store, &scheduler, Utc::now());
        assert!(out.entered.is_empty());
        assert_eq!(service.delivered().len(), 1);
    }

    #[test]
    fn one_notification_per_entry() {
        let (service, scheduler) = setup();
        let center = c(40.0, -75.0);
        let store = InMemoryTargetStore::with_targets([target("a", center, 100.0)]);
        let mut eval = Evaluator::new();
        let inside = north_of(center, 10.0);
        let outside = north_of(center, 500.0);

        for p in [inside, inside, outside, inside] {
            eval.evaluate(p, &store, &scheduler, Utc::now());
        }
        assert_eq!(service.delivered().len(), 2);
        assert_eq!(eval.dedup().len(), 1);
    }

    #[test]
    fn leaving_releases_owner() {
        let (_, scheduler) = setup();
        let store = InMemoryTargetStore::with_targets([target("a", c(0.0, 0.0), 50.0)]);
        let mut eval = Evaluator::new();

        eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());
        let out = eval.evaluate(c(1.0, 1.0), &store, &scheduler, Utc::now());
        assert_eq!(out.released, vec![OwnerId::new("a").unwrap()]);
        assert!(eval.dedup().is_empty());
    }

    #[test]
    fn empty_snapshot_keeps_dedup() {
        let (_, scheduler) = setup();
        let store = InMemoryTargetStore::with_targets([target("a", c(0.0, 0.0), 50.0)]);
        let mut eval = Evaluator::new();
        eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());

        store.clear().unwrap();
        let out = eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());
        assert!(!out.evaluated);
        assert_eq!(eval.dedup().len(), 1);
    }

    #[test]
    fn deleted_note_is_released_by_next_snapshot() {
        let (_, scheduler) = setup();
        let store = InMemoryTargetStore::with_targets([
            target("a", c(0.0, 0.0), 50.0),
            target("b", c(0.0, 0.0), 50.0),
        ]);
        let mut eval = Evaluator::new();
        eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());
        assert_eq!(eval.dedup().len(), 2);

        store.remove(&OwnerId::new("b").unwrap()).unwrap();
        let out = eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());
        assert_eq!(out.released, vec![OwnerId::new("b").unwrap()]);
        assert!(eval.dedup().contains(&OwnerId::new("a").unwrap()));
    }

    struct Flaky {
        inner: InMemoryTargetStore,
        failing: AtomicBool,
    }

    impl TargetSource for Flaky {
        fn list_geofence_targets(&self) -> Result<Vec<GeofenceTarget>, StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::BackendError("disk busy".to_string()));
            }
            self.inner.list_geofence_targets()
        }
    }

    #[test]
    fn unreadable_snapshot_is_skipped() {
        let (_, scheduler) = setup();
        let source = Flaky {
            inner: InMemoryTargetStore::with_targets([target("a", c(0.0, 0.0), 50.0)]),
            failing: AtomicBool::new(false),
        };
        let mut eval = Evaluator::new();
        eval.evaluate(c(0.0, 0.0), &source, &scheduler, Utc::now());

        source.failing.store(true, Ordering::SeqCst);
        let out = eval.evaluate(c(5.0, 5.0), &source, &scheduler, Utc::now());
        assert_eq!(out, PassOutcome::default());
        assert_eq!(eval.dedup().len(), 1);
    }

    #[test]
    fn panicking_supplier_is_skipped() {
        let (service, scheduler) = setup();
        let store = InMemoryTargetStore::with_targets([target("a", c(0.0, 0.0), 50.0)]);
        let mut eval = Evaluator::new();
        eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());

        let broken = || -> Vec<GeofenceTarget> { panic!("note store corrupted") };
        let out = eval.evaluate(c(1.0, 1.0), &broken, &scheduler, Utc::now());
        assert_eq!(out, PassOutcome::default());
        assert_eq!(eval.dedup().len(), 1);
        assert_eq!(service.delivered().len(), 1);
    }

    #[test]
    fn refused_notification_still_marks_entry() {
        let (service, scheduler) = setup();
        service.fail_schedule(Some(crate::error::NotificationError::ServiceUnavailable));
        let store = InMemoryTargetStore::with_targets([target("a", c(0.0, 0.0), 50.0)]);
        let mut eval = Evaluator::new();

        let out = eval.evaluate(c(0.0, 0.0), &store, &scheduler, Utc::now());
        assert_eq!(out.failed_notifications, 1);
        assert!(out.entered.is_empty());
        assert_eq!(eval.dedup().len(), 1);
    }
}
