//! Geofence monitor tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Period of the safety-net poll.
    pub poll_interval_secs: u64,
    /// Millisecond override for `poll_interval_secs` (tests, simulation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    /// Continuous stream time threshold.
    pub stream_min_interval_secs: u64,
    /// Continuous stream distance threshold.
    pub stream_min_distance_m: f64,
    /// Max queued evaluation requests before push updates are dropped.
    pub update_queue_capacity: usize,
    /// Per-subscriber trigger event buffer.
    pub event_stream_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 120,
            poll_interval_ms: None,
            stream_min_interval_secs: 30,
            stream_min_distance_m: 50.0,
            update_queue_capacity: 64,
            event_stream_capacity: 256,
        }
    }
}

impl MonitorConfig {
    /// Effective poll period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map_or_else(|| Duration::from_secs(self.poll_interval_secs), Duration::from_millis)
    }

    /// Stream time threshold.
    #[must_use]
    pub const fn stream_min_interval(&self) -> Duration {
        Duration::from_secs(self.stream_min_interval_secs)
    }

    /// Reject settings the monitor cannot run with.
    ///
    /// # Errors
    ///
    /// `GeoError::Config` naming the offending field.
    pub fn validate(&self) -> GeoResult<()> {
        if self.poll_interval().is_zero() {
            return Err(GeoError::config("monitor poll interval must be positive"));
        }
        if !(self.stream_min_distance_m.is_finite() && self.stream_min_distance_m >= 0.0) {
            return Err(GeoError::config("stream_min_distance_m must be a non-negative number"));
        }
        if self.update_queue_capacity == 0 {
            return Err(GeoError::config("update_queue_capacity must be at least 1"));
        }
        if self.event_stream_capacity == 0 {
            return Err(GeoError::config("event_stream_capacity must be at least 1"));
        }
        Ok(())
    }
}
