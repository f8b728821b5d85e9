//! Platform location service contract.
//!
//! The OS location stack is a black box exposing permission state, a
//! one-shot fix, and a subscribable position stream. Adapters for a concrete
//! platform implement `LocationService`; `SimulatedLocationService` is the
//! in-process reference implementation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::LocationError;
use crate::permission::{PermissionScope, PermissionStatus};

/// Desired fix accuracy, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    /// City-level.
    Lowest,
    /// Neighbourhood-level.
    Low,
    /// Block-level; the default for continuous streams.
    Balanced,
    /// Building-level; the default for one-shot fixes.
    High,
    /// Best the hardware can do.
    Highest,
}

/// Hints for a one-shot position fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOptions {
    /// Requested accuracy.
    pub accuracy: Accuracy,
    /// Oldest cached fix the service may return instead of a fresh one.
    pub max_age: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

/// Delivery thresholds for a continuous position stream.
///
/// The service delivers an update at least every `min_interval` or after
/// moving `min_distance_meters`, whichever comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Requested accuracy.
    pub accuracy: Accuracy,
    /// Time threshold between updates.
    pub min_interval: Duration,
    /// Distance threshold between updates.
    pub min_distance_meters: f64,
}

/// Opaque identifier of a platform position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub u64);

/// Callback invoked by the platform for each streamed position.
///
/// Must not block: the platform may call it from its own delivery thread.
pub type PositionCallback = Arc<dyn Fn(Coordinate) + Send + Sync>;

/// Black-box platform location service.
pub trait LocationService: Send + Sync {
    /// Whether the device location subsystem is enabled at all.
    fn services_enabled(&self) -> Result<bool, LocationError>;

    /// Current permission state for `scope`, without prompting.
    fn permission(&self, scope: PermissionScope) -> Result<PermissionStatus, LocationError>;

    /// Prompt for `scope` if needed and return the resulting state.
    fn request_permission(&self, scope: PermissionScope) -> Result<PermissionStatus, LocationError>;

    /// Perform a single position fix.
    fn current_fix(&self, options: &FixOptions) -> Result<Coordinate, LocationError>;

    /// Start a continuous position stream delivering to `on_update`.
    fn watch(&self, options: &WatchOptions, on_update: PositionCallback) -> Result<WatchId, LocationError>;

    /// Stop a stream. Unknown ids are not an error.
    fn clear_watch(&self, id: WatchId) -> Result<(), LocationError>;
}
