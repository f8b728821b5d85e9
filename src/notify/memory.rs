//! In-memory notification service.
//!
//! Records every request. Immediate notifications are "delivered" on the spot;
//! delayed ones stay pending until cancelled. Used by tests and the simulator.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::error::NotificationError;
use crate::permission::PermissionStatus;

use super::service::{
    NotificationChannel, NotificationHandle, NotificationRequest, NotificationService, NotificationTrigger,
    ScheduledNotification,
};

#[derive(Debug, Default)]
struct State {
    status: PermissionStatus,
    response: Option<PermissionStatus>,
    channels: Vec<NotificationChannel>,
    pending: Vec<ScheduledNotification>,
    delivered: Vec<NotificationRequest>,
    history: Vec<NotificationRequest>,
    fail_schedule: Option<NotificationError>,
}

/// Thread-safe recording `NotificationService`.
#[derive(Debug, Default)]
pub struct InMemoryNotificationService {
    state: Mutex<State>,
}

impl InMemoryNotificationService {
    /// Create an empty service that grants permission on request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer future permission requests with `status`, forgetting any
    /// previous answer.
    pub fn set_permission_response(&self, status: PermissionStatus) {
        let mut state = self.state();
        state.response = Some(status);
        state.status = PermissionStatus::Undetermined;
    }

    /// Make subsequent `schedule` calls fail with `err`; `None` restores success.
    pub fn fail_schedule(&self, err: Option<NotificationError>) {
        self.state().fail_schedule = err;
    }

    /// Immediate notifications presented so far, oldest first.
    pub fn delivered(&self) -> Vec<NotificationRequest> {
        self.state().delivered.clone()
    }

    /// Every accepted request, oldest first.
    pub fn history(&self) -> Vec<NotificationRequest> {
        self.state().history.clone()
    }

    /// Configured channels.
    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.state().channels.clone()
    }
}

impl NotificationService for InMemoryNotificationService {
    fn permission(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(self.state().status)
    }

    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        let mut state = self.state();
        let answer = state.response.unwrap_or(PermissionStatus::Granted);
        state.status = answer;
        Ok(answer)
    }

    fn configure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        let mut state = self.state();
        state.channels.retain(|c| c.id != channel.id);
        state.channels.push(channel.clone());
        Ok(())
    }

    fn schedule(&self, request: NotificationRequest) -> Result<NotificationHandle, NotificationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_schedule.clone() {
            return Err(err);
        }

        let handle = NotificationHandle::new(Uuid::new_v4().to_string());
        state.history.push(request.clone());
        match request.trigger {
            NotificationTrigger::Immediate => state.delivered.push(request),
            NotificationTrigger::AfterSeconds { .. } => state.pending.push(ScheduledNotification {
                handle: handle.clone(),
                request,
                scheduled_at: Utc::now(),
            }),
        }
        Ok(handle)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotificationError> {
        let mut state = self.state();
        let before = state.pending.len();
        state.pending.retain(|n| &n.handle != handle);
        if state.pending.len() == before {
            return Err(NotificationError::UnknownHandle {
                handle: handle.to_string(),
            });
        }
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotificationError> {
        self.state().pending.clear();
        Ok(())
    }

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        Ok(self.state().pending.clone())
    }
}
