//! Error types for geonote.
//!
//! All errors are strongly typed using thiserror. Environmental conditions
//! (permissions, disabled services, flaky fixes) are separated from caller
//! input errors so callers can branch on them as normal control flow.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors that occur during input validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Latitude {value} is out of range [-90, 90]")]
    LatitudeOutOfRange {
        value: f64,
    },

    #[error("Longitude {value} is out of range [-180, 180]")]
    LongitudeOutOfRange {
        value: f64,
    },

    #[error("Geofence radius {value}m is out of range [{min}, {max}]")]
    RadiusOutOfRange {
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Owner id cannot be empty")]
    EmptyOwnerId,

    #[error("Label cannot be empty")]
    EmptyLabel,

    #[error("Notification title cannot be empty")]
    EmptyTitle,
}

/// Failures reported by the platform location service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location services are disabled")]
    ServiceUnavailable,

    #[error("Position fix failed: {reason}")]
    TransientFixFailure {
        reason: String,
    },

    #[error("Location platform error: {message}")]
    Platform {
        message: String,
    },
}

/// Failures reported by the platform notification service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Notification service is unavailable")]
    ServiceUnavailable,

    #[error("Unknown notification handle: {handle}")]
    UnknownHandle {
        handle: String,
    },

    #[error("Notification platform error: {message}")]
    Platform {
        message: String,
    },
}

/// Errors converting a reminder request into a scheduled notification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Reminder time {target} is not in the future (now: {now})")]
    InvalidSchedule {
        target: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Invalid reminder: {0}")]
    Validation(#[from] ValidationError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
}

/// Top-level error type for geonote.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl GeoError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the same call may succeed later without user action.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Location(e) => matches!(
                e,
                LocationError::TransientFixFailure { .. } | LocationError::Platform { .. }
            ),
            Self::Notification(e) => matches!(e, NotificationError::Platform { .. }),
            Self::Storage(_) => true,
            Self::Validation(_) | Self::Schedule(_) | Self::Config { .. } | Self::Internal { .. } => {
                false
            }
        }
    }

    /// Returns true if the user can fix the condition (grant a permission,
    /// enable a service, pick a different time).
    #[must_use]
    pub const fn is_user_actionable(&self) -> bool {
        match self {
            Self::Location(e) => matches!(
                e,
                LocationError::PermissionDenied | LocationError::ServiceUnavailable
            ),
            Self::Notification(e) => matches!(
                e,
                NotificationError::PermissionDenied | NotificationError::ServiceUnavailable
            ),
            Self::Schedule(e) => matches!(e, ScheduleError::InvalidSchedule { .. }),
            _ => false,
        }
    }
}

/// Result type alias for geonote operations.
pub type GeoResult<T> = Result<T, GeoError>;
