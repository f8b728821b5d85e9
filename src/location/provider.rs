//! Location provider: permissions, one-shot fixes, and a single continuous
//! subscription over a platform `LocationService`.
//!
//! Every environmental failure is reported as a value. Nothing here panics or
//! treats a missing permission as exceptional.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinate::Coordinate;
use crate::error::LocationError;
use crate::permission::{PermissionScope, PermissionStatus};

use super::service::{Accuracy, FixOptions, LocationService, PositionCallback, WatchId, WatchOptions};

/// Tuning for the provider's platform requests.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationTuning {
    /// Accuracy requested for the continuous stream (battery first).
    pub stream_accuracy: Accuracy,
    /// Accuracy requested for one-shot fixes; tighter since they are infrequent.
    pub fix_accuracy: Accuracy,
    pub fix_max_age_secs: u64,
    pub fix_timeout_secs: u64,
    /// Ask for background permission after a foreground grant (best-effort).
    pub request_background: bool,
}

impl Default for LocationTuning {
    fn default() -> Self {
        Self {
            stream_accuracy: Accuracy::Balanced,
            fix_accuracy: Accuracy::High,
            fix_max_age_secs: 60,
            fix_timeout_secs: 15,
            request_background: true,
        }
    }
}

impl LocationTuning {
    /// Options for a one-shot fix.
    #[must_use]
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            accuracy: self.fix_accuracy,
            max_age: Duration::from_secs(self.fix_max_age_secs),
            timeout: Duration::from_secs(self.fix_timeout_secs),
        }
    }
}

/// Unique identifier for a provider subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the provider's active position stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    watch_id: WatchId,
}

impl SubscriptionHandle {
    /// The subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The platform watch backing this subscription.
    #[must_use]
    pub const fn watch_id(&self) -> WatchId {
        self.watch_id
    }
}

/// Wraps a `LocationService` with fail-closed permission handling and an
/// idempotent single-subscription stream.
pub struct LocationProvider {
    service: Arc<dyn LocationService>,
    tuning: LocationTuning,
    active: Mutex<Option<SubscriptionHandle>>,
}

impl LocationProvider {
    /// Create a provider with default tuning.
    #[must_use]
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self::with_tuning(service, LocationTuning::default())
    }

    /// Create a provider with explicit tuning.
    #[must_use]
    pub fn with_tuning(service: Arc<dyn LocationService>, tuning: LocationTuning) -> Self {
        Self {
            service,
            tuning,
            active: Mutex::new(None),
        }
    }

    /// The provider's tuning.
    #[must_use]
    pub const fn tuning(&self) -> &LocationTuning {
        &self.tuning
    }

    /// Whether the device location subsystem is enabled, independent of app
    /// permission. Errors read as disabled.
    pub fn services_enabled(&self) -> bool {
        match self.service.services_enabled() {
            Ok(enabled) => enabled,
            Err(err) => {
                tracing::warn!(error = %err, "location services check failed");
                false
            }
        }
    }

    /// Check, and if needed request, foreground permission.
    ///
    /// Background permission is then requested best-effort; its outcome never
    /// changes the result. Any platform error reads as "not granted".
    pub fn ensure_permission(&self) -> bool {
        let foreground = match self.service.permission(PermissionScope::Foreground) {
            Ok(PermissionStatus::Granted) => PermissionStatus::Granted,
            Ok(_) => match self.service.request_permission(PermissionScope::Foreground) {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(error = %err, "foreground permission request failed");
                    return false;
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "foreground permission query failed");
                return false;
            }
        };

        if !foreground.is_granted() {
            tracing::debug!(status = ?foreground, "foreground location permission not granted");
            return false;
        }

        if self.tuning.request_background {
            self.request_background();
        }
        true
    }

    fn request_background(&self) {
        let status = match self.service.permission(PermissionScope::Background) {
            Ok(PermissionStatus::Granted) => return,
            Ok(_) => self.service.request_permission(PermissionScope::Background),
            Err(err) => Err(err),
        };
        match status {
            Ok(status) => tracing::debug!(status = ?status, "background location permission"),
            Err(err) => tracing::debug!(error = %err, "background permission request failed"),
        }
    }

    /// Take a single position fix.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when permission is missing, `ServiceUnavailable` when
    /// the platform reports location disabled, and `TransientFixFailure` for any
    /// other failed fix. Callers treat all of these as "no signal this round".
    pub fn current_position(&self) -> Result<Coordinate, LocationError> {
        if !self.ensure_permission() {
            return Err(LocationError::PermissionDenied);
        }

        self.service
            .current_fix(&self.tuning.fix_options())
            .map_err(|err| match err {
                LocationError::Platform { message } => LocationError::TransientFixFailure { reason: message },
                other => other,
            })
    }

    /// Start the continuous position stream.
    ///
    /// Updates arrive at least every `min_interval` or after moving
    /// `min_distance_meters`. While a subscription is active this is a no-op
    /// returning the existing handle; `on_update` is then discarded.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` without foreground permission, otherwise whatever the
    /// platform reports when the watch cannot be started.
    pub fn subscribe(
        &self,
        on_update: PositionCallback,
        min_interval: Duration,
        min_distance_meters: f64,
    ) -> Result<SubscriptionHandle, LocationError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = *active {
            tracing::debug!(subscription = ?handle.id, "already subscribed");
            return Ok(handle);
        }

        if !self.ensure_permission() {
            return Err(LocationError::PermissionDenied);
        }

        let options = WatchOptions {
            accuracy: self.tuning.stream_accuracy,
            min_interval,
            min_distance_meters,
        };
        let watch_id = self.service.watch(&options, on_update)?;
        let handle = SubscriptionHandle {
            id: SubscriptionId::new(),
            watch_id,
        };
        *active = Some(handle);

        tracing::info!(
            subscription = ?handle.id,
            interval_secs = min_interval.as_secs(),
            distance_m = min_distance_meters,
            "location stream started"
        );
        Ok(handle)
    }

    /// Release the stream. Stale or repeated handles are a no-op.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref() != Some(handle) {
            tracing::debug!(subscription = ?handle.id, "ignoring stale unsubscribe");
            return;
        }
        *active = None;

        if let Err(err) = self.service.clear_watch(handle.watch_id) {
            tracing::warn!(subscription = ?handle.id, error = %err, "failed to clear location watch");
        } else {
            tracing::info!(subscription = ?handle.id, "location stream stopped");
        }
    }

    /// The active subscription, if any.
    #[must_use]
    pub fn active_subscription(&self) -> Option<SubscriptionHandle> {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LocationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationProvider")
            .field("tuning", &self.tuning)
            .field("active", &self.active_subscription())
            .finish_non_exhaustive()
    }
}
