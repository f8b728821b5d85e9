//! Abstract note-store contract consumed by the geofence monitor.
//!
//! The note store owns reminder records. The monitor only ever reads a
//! point-in-time snapshot of the geofence targets it should evaluate.

use thiserror::Error;

use crate::target::{GeofenceTarget, OwnerId};

/// Errors that can occur while reading the note store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Owner not found.
    #[error("Owner not found: {0}")]
    OwnerNotFound(OwnerId),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Read-only source of geofence targets.
///
/// Implementations must return a fresh snapshot on every call; the monitor
/// never caches targets between evaluation passes, so edits and deletions
/// take effect on the next pass. Errors are logged by the monitor and treated
/// like an empty snapshot.
pub trait TargetSource: Send + Sync {
    /// List every currently active geofence target.
    fn list_geofence_targets(&self) -> Result<Vec<GeofenceTarget>, StorageError>;
}

impl<F> TargetSource for F
where
    F: Fn() -> Vec<GeofenceTarget> + Send + Sync,
{
    fn list_geofence_targets(&self) -> Result<Vec<GeofenceTarget>, StorageError> {
        Ok(self())
    }
}
