//! Background geofence monitoring.
//!
//! The monitor combines a distance-filtered location stream with a periodic
//! poll, evaluates each position against the current note targets, and emits
//! one proximity notification per entry into a geofence.

/// Monitor tuning.
pub mod config;
/// Monitor worker and public handle.
pub mod dispatcher;
/// Evaluation pass and entry deduplication.
pub mod evaluator;
/// Observer stream for trigger events.
pub mod stream;

pub use config::MonitorConfig;
pub use dispatcher::{GeofenceMonitor, MonitorStatus};
pub use evaluator::{DedupSet, Evaluator, PassOutcome};
pub use stream::TriggerStream;
