//! In-memory target store.
//!
//! Thread-safe reference implementation of `TargetSource`, intended for
//! embedded usage, tests, and the simulator.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::storage::traits::{StorageError, TargetSource};
use crate::target::{GeofenceTarget, OwnerId};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory store of geofence targets keyed by owner.
///
/// Snapshots are ordered by owner id so evaluation order is deterministic.
#[derive(Debug, Default)]
pub struct InMemoryTargetStore {
    state: RwLock<BTreeMap<OwnerId, GeofenceTarget>>,
}

impl InMemoryTargetStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with targets. Later duplicates win.
    #[must_use]
    pub fn with_targets(targets: impl IntoIterator<Item = GeofenceTarget>) -> Self {
        let map = targets
            .into_iter()
            .map(|t| (t.owner_id.clone(), t))
            .collect();
        Self {
            state: RwLock::new(map),
        }
    }

    /// Insert or replace the target for its owner.
    pub fn upsert(&self, target: GeofenceTarget) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("target.upsert"))?;
        state.insert(target.owner_id.clone(), target);
        Ok(())
    }

    /// Remove the target owned by `owner_id`.
    pub fn remove(&self, owner_id: &OwnerId) -> Result<GeofenceTarget, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("target.remove"))?;
        state
            .remove(owner_id)
            .ok_or_else(|| StorageError::OwnerNotFound(owner_id.clone()))
    }

    /// Remove every target.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("target.clear"))?;
        state.clear();
        Ok(())
    }

    /// Number of stored targets.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("target.len"))?;
        Ok(state.len())
    }

    /// Returns true if no targets are stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl TargetSource for InMemoryTargetStore {
    fn list_geofence_targets(&self) -> Result<Vec<GeofenceTarget>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("target.list"))?;
        Ok(state.values().cloned().collect())
    }
}
