//! In-process location service.
//!
//! Scriptable reference implementation of `LocationService` used by tests,
//! the simulator, and embedders without a platform adapter. Positions are
//! pushed explicitly with [`SimulatedLocationService::push`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::coordinate::Coordinate;
use crate::error::LocationError;
use crate::permission::{PermissionScope, PermissionStatus};

use super::service::{FixOptions, LocationService, PositionCallback, WatchId, WatchOptions};

struct Watch {
    options: WatchOptions,
    callback: PositionCallback,
}

struct State {
    enabled: bool,
    status: HashMap<PermissionScope, PermissionStatus>,
    responses: HashMap<PermissionScope, PermissionStatus>,
    requests: HashMap<PermissionScope, usize>,
    fail_permission_queries: bool,
    fix: Result<Coordinate, LocationError>,
    fix_count: usize,
    last_fix_options: Option<FixOptions>,
    watches: BTreeMap<WatchId, Watch>,
    last_watch_options: Option<WatchOptions>,
    next_watch_id: u64,
    fail_watch: Option<LocationError>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            enabled: true,
            status: HashMap::new(),
            responses: HashMap::new(),
            requests: HashMap::new(),
            fail_permission_queries: false,
            fix: Err(LocationError::TransientFixFailure {
                reason: "no fix scripted".to_string(),
            }),
            fix_count: 0,
            last_fix_options: None,
            watches: BTreeMap::new(),
            last_watch_options: None,
            next_watch_id: 1,
            fail_watch: None,
        }
    }
}

/// Scriptable in-memory `LocationService`.
///
/// Permissions start `Undetermined` and every request is answered `Granted`
/// unless overridden with [`set_permission_response`](Self::set_permission_response).
#[derive(Default)]
pub struct SimulatedLocationService {
    state: Mutex<State>,
}

impl SimulatedLocationService {
    /// Create a service with location enabled and permissive responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toggle the device-level location switch.
    pub fn set_services_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }

    /// Answer future requests for `scope` with `status`, and forget any
    /// previous answer.
    pub fn set_permission_response(&self, scope: PermissionScope, status: PermissionStatus) {
        let mut state = self.state();
        state.responses.insert(scope, status);
        state.status.remove(&scope);
    }

    /// Make permission queries and requests fail with a platform error.
    pub fn fail_permission_queries(&self, fail: bool) {
        self.state().fail_permission_queries = fail;
    }

    /// Number of permission prompts issued for `scope`.
    pub fn permission_requests(&self, scope: PermissionScope) -> usize {
        self.state().requests.get(&scope).copied().unwrap_or(0)
    }

    /// Script the result of subsequent one-shot fixes.
    pub fn set_fix(&self, fix: Result<Coordinate, LocationError>) {
        self.state().fix = fix;
    }

    /// Number of one-shot fixes attempted.
    pub fn fix_count(&self) -> usize {
        self.state().fix_count
    }

    /// Options passed to the most recent one-shot fix.
    pub fn last_fix_options(&self) -> Option<FixOptions> {
        self.state().last_fix_options.clone()
    }

    /// Make subsequent `watch` calls fail with `err`; `None` restores success.
    pub fn fail_watch(&self, err: Option<LocationError>) {
        self.state().fail_watch = err;
    }

    /// Number of live watches.
    pub fn active_watches(&self) -> usize {
        self.state().watches.len()
    }

    /// Options passed to the most recent successful `watch`.
    pub fn last_watch_options(&self) -> Option<WatchOptions> {
        self.state().last_watch_options.clone()
    }

    /// Deliver `position` to every live watch, on the caller's thread.
    ///
    /// Returns the number of watches notified.
    pub fn push(&self, position: Coordinate) -> usize {
        // Callbacks run outside the lock so they may call back into the service.
        let callbacks: Vec<PositionCallback> = self
            .state()
            .watches
            .values()
            .map(|w| w.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(position);
        }
        callbacks.len()
    }
}

impl LocationService for SimulatedLocationService {
    fn services_enabled(&self) -> Result<bool, LocationError> {
        Ok(self.state().enabled)
    }

    fn permission(&self, scope: PermissionScope) -> Result<PermissionStatus, LocationError> {
        let state = self.state();
        if state.fail_permission_queries {
            return Err(LocationError::Platform {
                message: "permission query failed".to_string(),
            });
        }
        Ok(state.status.get(&scope).copied().unwrap_or_default())
    }

    fn request_permission(&self, scope: PermissionScope) -> Result<PermissionStatus, LocationError> {
        let mut state = self.state();
        if state.fail_permission_queries {
            return Err(LocationError::Platform {
                message: "permission request failed".to_string(),
            });
        }
        *state.requests.entry(scope).or_insert(0) += 1;
        let answer = state
            .responses
            .get(&scope)
            .copied()
            .unwrap_or(PermissionStatus::Granted);
        state.status.insert(scope, answer);
        Ok(answer)
    }

    fn current_fix(&self, options: &FixOptions) -> Result<Coordinate, LocationError> {
        let mut state = self.state();
        state.fix_count += 1;
        state.last_fix_options = Some(options.clone());
        if !state.enabled {
            return Err(LocationError::ServiceUnavailable);
        }
        state.fix.clone()
    }

    fn watch(&self, options: &WatchOptions, on_update: PositionCallback) -> Result<WatchId, LocationError> {
        let mut state = self.state();
        if !state.enabled {
            return Err(LocationError::ServiceUnavailable);
        }
        if let Some(err) = state.fail_watch.clone() {
            return Err(err);
        }
        let id = WatchId(state.next_watch_id);
        state.next_watch_id += 1;
        state.last_watch_options = Some(options.clone());
        state.watches.insert(
            id,
            Watch {
                options: options.clone(),
                callback: on_update,
            },
        );
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) -> Result<(), LocationError> {
        self.state().watches.remove(&id);
        Ok(())
    }
}

impl std::fmt::Debug for SimulatedLocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SimulatedLocationService")
            .field("enabled", &state.enabled)
            .field(
                "watches",
                &state.watches.iter().map(|(id, w)| (id, &w.options)).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::location::Accuracy;

    fn opts() -> WatchOptions {
        WatchOptions {
            accuracy: Accuracy::Balanced,
            min_interval: Duration::from_secs(30),
            min_distance_meters: 50.0,
        }
    }

    #[test]
    fn push_reaches_every_live_watch() {
        let service = SimulatedLocationService::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = service
            .watch(&opts(), Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert_eq!(service.push(Coordinate::new(0.0, 0.0).unwrap()), 1);
        service.clear_watch(id).unwrap();
        assert_eq!(service.push(Coordinate::new(0.0, 0.0).unwrap()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_service_rejects_fix_and_watch() {
        let service = SimulatedLocationService::new();
        service.set_services_enabled(false);
        assert!(!service.services_enabled().unwrap());
        assert_eq!(
            service.watch(&opts(), Arc::new(|_| {})),
            Err(LocationError::ServiceUnavailable)
        );
    }

    #[test]
    fn permission_starts_undetermined() {
        let service = SimulatedLocationService::new();
        assert_eq!(
            service.permission(PermissionScope::Foreground).unwrap(),
            PermissionStatus::Undetermined
        );
        assert_eq!(
            service.request_permission(PermissionScope::Foreground).unwrap(),
            PermissionStatus::Granted
        );
        assert_eq!(
            service.permission(PermissionScope::Foreground).unwrap(),
            PermissionStatus::Granted
        );
    }
}
