//! Reminder scheduling over a platform `NotificationService`.
//!
//! Absolute reminder times become relative countdown triggers; geofence entries
//! become immediate proximity notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotificationError, ScheduleError, ValidationError};
use crate::target::OwnerId;

use super::service::{
    ChannelImportance, NotificationChannel, NotificationHandle, NotificationPayload, NotificationRequest,
    NotificationService, NotificationTrigger, ScheduledNotification,
};

/// Channel and template settings for the scheduler.
///
/// Templates substitute `{label}` and `{distance}` (whole meters).
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub proximity_title: String,
    pub proximity_body: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            channel_id: "reminders".to_string(),
            channel_name: "Reminders".to_string(),
            proximity_title: "📍 {label}".to_string(),
            proximity_body: "You're {distance}m from \"{label}\"".to_string(),
        }
    }
}

/// A wall-clock reminder scheduled on behalf of a note.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub target_time: DateTime<Utc>,
    pub handle: NotificationHandle,
}

fn render(template: &str, label: &str, distance_meters: u32) -> String {
    template
        .replace("{label}", label)
        .replace("{distance}", &distance_meters.to_string())
}

/// Converts reminders into platform notifications.
pub struct ReminderScheduler {
    service: Arc<dyn NotificationService>,
    config: SchedulerConfig,
}

impl ReminderScheduler {
    /// Create a scheduler with default channel settings.
    #[must_use]
    pub fn new(service: Arc<dyn NotificationService>) -> Self {
        Self::with_config(service, SchedulerConfig::default())
    }

    /// Create a scheduler with explicit settings.
    #[must_use]
    pub fn with_config(service: Arc<dyn NotificationService>, config: SchedulerConfig) -> Self {
        Self { service, config }
    }

    /// The scheduler's settings.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One-time platform setup: registers the reminder channel.
    ///
    /// # Errors
    ///
    /// Propagates the platform failure; callers usually log and continue.
    pub fn initialize(&self) -> Result<(), NotificationError> {
        let channel = NotificationChannel {
            id: self.config.channel_id.clone(),
            name: self.config.channel_name.clone(),
            importance: ChannelImportance::High,
        };
        self.service.configure_channel(&channel)?;
        tracing::info!(channel = %channel.id, "notification channel configured");
        Ok(())
    }

    /// Check, and if needed request, notification permission. Fails closed.
    pub fn ensure_permission(&self) -> bool {
        let status = match self.service.permission() {
            Ok(status) if status.is_granted() => return true,
            Ok(_) => self.service.request_permission(),
            Err(err) => Err(err),
        };
        match status {
            Ok(status) => status.is_granted(),
            Err(err) => {
                tracing::warn!(error = %err, "notification permission check failed");
                false
            }
        }
    }

    /// Schedule a notification for an absolute time.
    ///
    /// # Errors
    ///
    /// `ScheduleError::InvalidSchedule` when `target_time` is not after now;
    /// nothing is scheduled in that case.
    pub fn schedule_absolute(
        &self,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<NotificationHandle, ScheduleError> {
        self.schedule_absolute_at(title, body, target_time, payload, Utc::now())
    }

    /// Schedule a notification for an absolute time, relative to `now`.
    ///
    /// The platform fires after `floor((target_time - now) / 1s)` seconds.
    ///
    /// # Errors
    ///
    /// `InvalidSchedule` when `target_time <= now`, `Validation` for a blank
    /// title, `Notification` when the platform refuses.
    pub fn schedule_absolute_at(
        &self,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
        payload: NotificationPayload,
        now: DateTime<Utc>,
    ) -> Result<NotificationHandle, ScheduleError> {
        if target_time <= now {
            return Err(ScheduleError::InvalidSchedule {
                target: target_time,
                now,
            });
        }
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let millis = (target_time - now).num_milliseconds();
        let seconds = u64::try_from(millis / 1000).unwrap_or(0);

        let handle = self.service.schedule(NotificationRequest {
            title: title.to_string(),
            body: body.to_string(),
            trigger: NotificationTrigger::AfterSeconds { seconds },
            payload,
            channel_id: self.config.channel_id.clone(),
        })?;

        tracing::debug!(handle = %handle, seconds, "reminder scheduled");
        Ok(handle)
    }

    /// Schedule a note's wall-clock reminder.
    ///
    /// # Errors
    ///
    /// Same as [`schedule_absolute`](Self::schedule_absolute).
    pub fn schedule_reminder(
        &self,
        note_id: &str,
        title: &str,
        body: &str,
        target_time: DateTime<Utc>,
    ) -> Result<ScheduledReminder, ScheduleError> {
        let payload = NotificationPayload::Reminder {
            note_id: note_id.to_string(),
        };
        let handle = self.schedule_absolute(title, body, target_time, payload)?;
        Ok(ScheduledReminder {
            target_time,
            handle,
        })
    }

    /// Present an immediate notification for a geofence entry.
    ///
    /// # Errors
    ///
    /// `Notification` when the platform refuses.
    pub fn emit_proximity_notification(
        &self,
        label: &str,
        owner_id: &OwnerId,
        distance_meters: u32,
    ) -> Result<NotificationHandle, ScheduleError> {
        let handle = self.service.schedule(NotificationRequest {
            title: render(&self.config.proximity_title, label, distance_meters),
            body: render(&self.config.proximity_body, label, distance_meters),
            trigger: NotificationTrigger::Immediate,
            payload: NotificationPayload::Location {
                owner_id: owner_id.clone(),
            },
            channel_id: self.config.channel_id.clone(),
        })?;

        tracing::info!(owner = %owner_id, distance_m = distance_meters, handle = %handle, "proximity notification emitted");
        Ok(handle)
    }

    /// Cancel one notification. Failures are logged only.
    pub fn cancel(&self, handle: &NotificationHandle) {
        if let Err(err) = self.service.cancel(handle) {
            tracing::warn!(handle = %handle, error = %err, "failed to cancel notification");
        }
    }

    /// Cancel every pending notification. Failures are logged only.
    pub fn cancel_all(&self) {
        if let Err(err) = self.service.cancel_all() {
            tracing::warn!(error = %err, "failed to cancel notifications");
        }
    }

    /// Pending notifications. Failures are logged and read as none.
    pub fn list_scheduled(&self) -> Vec<ScheduledNotification> {
        self.service.list_scheduled().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to list scheduled notifications");
            Vec::new()
        })
    }
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
