//! # geonote - location-triggered note reminders
//!
//! Background monitoring core for a notes application: while enabled, it
//! tracks the device position with a battery-friendly stream plus a periodic
//! poll and raises one local notification each time the device enters the
//! geofence of a location-tagged note. It also schedules wall-clock reminder
//! notifications and formats countdowns to them.
//!
//! ## Components
//!
//! - **`LocationProvider`**: fail-closed permission handling, one-shot fixes and
//!   a single distance-filtered subscription over a platform `LocationService`
//! - **`ReminderScheduler`**: absolute-time reminders and immediate proximity
//!   notifications over a platform `NotificationService`
//! - **`GeofenceMonitor`**: serialized evaluation passes with entry deduplication
//! - **`TargetSource`**: the note store's view of current geofence targets
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use geonote::location::{LocationProvider, SimulatedLocationService};
//! use geonote::monitor::{GeofenceMonitor, MonitorConfig};
//! use geonote::notify::{InMemoryNotificationService, ReminderScheduler};
//! use geonote::storage::InMemoryTargetStore;
//! use geonote::{Coordinate, GeofenceTarget, OwnerId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = Arc::new(SimulatedLocationService::new());
//! let notifications = Arc::new(InMemoryNotificationService::new());
//!
//! let monitor = GeofenceMonitor::new(
//!     Arc::new(LocationProvider::new(platform.clone())),
//!     Arc::new(ReminderScheduler::new(notifications.clone())),
//!     MonitorConfig::default(),
//! );
//!
//! let notes = Arc::new(InMemoryTargetStore::new());
//! notes.upsert(GeofenceTarget::new(
//!     OwnerId::new("note-1")?,
//!     Coordinate::new(52.52, 13.405)?,
//!     150.0,
//!     "Pick up parcel",
//! )?)?;
//!
//! assert!(monitor.start(notes));
//! platform.push(Coordinate::new(52.5201, 13.405)?);
//! assert_eq!(monitor.status().dedup_count, 1);
//! assert_eq!(notifications.delivered().len(), 1);
//! monitor.stop();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod coordinate;
pub mod distance;
pub mod error;
pub mod permission;
pub mod target;

// Platform boundaries and services
pub mod location;
pub mod notify;
pub mod storage;

// Monitoring
pub mod monitor;

// Ambient
pub mod config;
pub mod logging;

pub use config::GeonoteConfig;
pub use coordinate::Coordinate;
pub use distance::{distance, EARTH_RADIUS_METERS};
pub use error::{GeoError, GeoResult, LocationError, NotificationError, ScheduleError, ValidationError};
pub use location::{LocationProvider, LocationService, SubscriptionHandle};
pub use monitor::{GeofenceMonitor, MonitorConfig, MonitorStatus, TriggerStream};
pub use notify::{format_countdown, format_countdown_at, NotificationService, ReminderScheduler, ScheduledReminder};
pub use permission::{PermissionScope, PermissionStatus};
pub use storage::{InMemoryTargetStore, StorageError, TargetSource};
pub use target::{GeofenceTarget, OwnerId, TriggerEvent, MAX_RADIUS_METERS, MIN_RADIUS_METERS};
