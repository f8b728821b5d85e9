//! Human-readable countdown until a reminder fires.

use std::fmt;

use chrono::{DateTime, Utc};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Time remaining until a target, bucketed for display.
///
/// Each bucket rounds to the nearest whole unit; a value that rounds up to the
/// next unit's size is promoted (59.5 minutes reads as 1 hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// The target is now or in the past.
    PastDue,
    /// Less than one minute away.
    UnderAMinute,
    /// Whole minutes, 1..=59.
    Minutes(i64),
    /// Whole hours, 1..=23.
    Hours(i64),
    /// Whole days, at least 1.
    Days(i64),
}

impl Countdown {
    /// Bucket the time from `now` until `target`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn between(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let ms = (target - now).num_milliseconds();
        if ms <= 0 {
            return Self::PastDue;
        }
        if ms < 60_000 {
            return Self::UnderAMinute;
        }

        let ms = ms as f64;
        let minutes = (ms / MS_PER_MINUTE).round() as i64;
        if minutes < 60 {
            return Self::Minutes(minutes);
        }
        let hours = (ms / MS_PER_HOUR).round() as i64;
        if hours < 24 {
            return Self::Hours(hours.max(1));
        }
        Self::Days((ms / MS_PER_DAY).round() as i64)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PastDue => f.write_str("Past due"),
            Self::UnderAMinute => f.write_str("In less than 1 minute"),
            Self::Minutes(n) => write!(f, "In {}", plural(n, "minute")),
            Self::Hours(n) => write!(f, "In {}", plural(n, "hour")),
            Self::Days(n) => write!(f, "In {}", plural(n, "day")),
        }
    }
}

/// Format the time remaining until `target`, relative to the current time.
#[must_use]
pub fn format_countdown(target: DateTime<Utc>) -> String {
    format_countdown_at(target, Utc::now())
}

/// Format the time remaining until `target`, relative to `now`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use geonote::format_countdown_at;
///
/// let now = Utc::now();
/// assert_eq!(format_countdown_at(now + Duration::minutes(90), now), "In 2 hours");
/// assert_eq!(format_countdown_at(now - Duration::minutes(5), now), "Past due");
/// ```
#[must_use]
pub fn format_countdown_at(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    Countdown::between(target, now).to_string()
}
