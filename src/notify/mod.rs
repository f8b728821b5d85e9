//! Notification subsystem: the platform contract, the reminder scheduler on
//! top of it, and countdown formatting for reminder times.

/// Countdown text for reminder times.
pub mod countdown;
/// Recording in-process service.
pub mod memory;
/// Reminder scheduling and proximity notifications.
pub mod scheduler;
/// Platform notification contract.
pub mod service;

pub use countdown::{format_countdown, format_countdown_at, Countdown};
pub use memory::InMemoryNotificationService;
pub use scheduler::{ReminderScheduler, ScheduledReminder, SchedulerConfig};
pub use service::{
    ChannelImportance, NotificationChannel, NotificationHandle, NotificationPayload, NotificationRequest,
    NotificationService, NotificationTrigger, ScheduledNotification,
};
