//! Observer stream for geofence trigger events.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::target::TriggerEvent;

/// Observer handle for geofence entries.
///
/// Every notification the monitor emits is mirrored here. The buffer is
/// bounded; when the holder falls behind, newer events are dropped and counted
/// in `MonitorStatus::dropped_events`. A dropped stream is unregistered at
/// the next delivery.
#[derive(Debug)]
pub struct TriggerStream {
    rx: Receiver<TriggerEvent>,
}

impl TriggerStream {
    pub(crate) const fn new(rx: Receiver<TriggerEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event (blocking). `None` once the monitor is gone.
    #[must_use]
    pub fn recv(&self) -> Option<TriggerEvent> {
        self.rx.recv().ok()
    }

    /// Receive the next event, waiting at most `timeout`.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TriggerEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take every event already buffered without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<TriggerEvent> {
        self.rx.try_iter().collect()
    }
}
