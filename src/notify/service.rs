//! Platform notification service contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotificationError;
use crate::permission::PermissionStatus;
use crate::target::OwnerId;

/// Opaque identifier returned by the platform for a scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    /// Wrap a platform identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// When the platform should present a notification.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Present now.
    Immediate,
    /// Present after a relative countdown.
    AfterSeconds { seconds: u64 },
}

/// Data carried with a notification for retrieval when it is opened.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A geofence entry.
    Location {
        #[serde(rename = "ownerId")]
        owner_id: OwnerId,
    },
    /// A wall-clock reminder on a note.
    Reminder {
        #[serde(rename = "noteId")]
        note_id: String,
    },
    /// Caller-defined data.
    Data { data: serde_json::Value },
}

/// A request to present a notification.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub trigger: NotificationTrigger,
    pub payload: NotificationPayload,
    pub channel_id: String,
}

/// A pending notification as reported by the platform.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub handle: NotificationHandle,
    pub request: NotificationRequest,
    pub scheduled_at: DateTime<Utc>,
}

/// Presentation priority of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelImportance {
    /// Regular priority.
    Default,
    /// Heads-up presentation.
    #[default]
    High,
}

/// Platform channel/category configured once at startup.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

/// Black-box platform notification service.
pub trait NotificationService: Send + Sync {
    /// Current permission state, without prompting.
    fn permission(&self) -> Result<PermissionStatus, NotificationError>;

    /// Prompt if needed and return the resulting state.
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError>;

    /// Create or update a channel. Platforms without channels accept and ignore it.
    fn configure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError>;

    /// Schedule a notification and return its handle.
    fn schedule(&self, request: NotificationRequest) -> Result<NotificationHandle, NotificationError>;

    /// Cancel one pending notification.
    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError>;

    /// Cancel every pending notification.
    fn cancel_all(&self) -> Result<(), NotificationError>;

    /// List pending notifications.
    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_payload_wire_shape() {
        let payload = NotificationPayload::Location {
            owner_id: OwnerId::new("note-7").unwrap(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"type": "location", "ownerId": "note-7"}));
    }

    #[test]
    fn trigger_wire_shape() {
        let json = serde_json::to_value(NotificationTrigger::AfterSeconds { seconds: 90 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "after_seconds", "seconds": 90}));
    }
}
