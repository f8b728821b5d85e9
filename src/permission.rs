//! Permission states shared by the location and notification services.

use serde::{Deserialize, Serialize};

/// Result of a permission query or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// The user granted the permission.
    Granted,
    /// The user refused the permission.
    Denied,
    /// The user has not been asked yet.
    #[default]
    Undetermined,
}

impl PermissionStatus {
    /// Returns true if the permission is granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Which location permission a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// While the app is in use.
    Foreground,
    /// While the app is backgrounded.
    Background,
}
