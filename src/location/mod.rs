//! Location subsystem.
//!
//! `LocationService` is the platform boundary; `LocationProvider` layers
//! fail-closed permission handling and the single-subscription discipline on
//! top of it.

/// Permission-aware provider over a platform service.
pub mod provider;
/// Platform location contract.
pub mod service;
/// Scriptable in-process service.
pub mod simulated;

pub use provider::{LocationProvider, LocationTuning, SubscriptionHandle, SubscriptionId};
pub use service::{Accuracy, FixOptions, LocationService, PositionCallback, WatchId, WatchOptions};
pub use simulated::SimulatedLocationService;
