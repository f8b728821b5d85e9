//! Runtime configuration.
//!
//! Every section is optional in the JSON document; missing fields take the
//! battery-oriented defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};
use crate::location::LocationTuning;
use crate::monitor::MonitorConfig;
use crate::notify::SchedulerConfig;

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeonoteConfig {
    pub location: LocationTuning,
    pub monitor: MonitorConfig,
    pub scheduler: SchedulerConfig,
}

impl GeonoteConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// `GeoError::Config` on malformed JSON or invalid values.
    pub fn from_json_str(raw: &str) -> GeoResult<Self> {
        let cfg: Self =
            serde_json::from_str(raw).map_err(|e| GeoError::config(format!("invalid configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// `GeoError::Config` when the file cannot be read or fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> GeoResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GeoError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// `GeoError::Config` naming the first offending field.
    pub fn validate(&self) -> GeoResult<()> {
        self.monitor.validate()?;
        if self.location.fix_timeout_secs == 0 {
            return Err(GeoError::config("location.fix_timeout_secs must be positive"));
        }
        if self.scheduler.channel_id.trim().is_empty() {
            return Err(GeoError::config("scheduler.channel_id must not be empty"));
        }
        if self.scheduler.proximity_title.trim().is_empty() {
            return Err(GeoError::config("scheduler.proximity_title must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let cfg = GeonoteConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, GeonoteConfig::default());
    }

    #[test]
    fn sections_override_independently() {
        let cfg = GeonoteConfig::from_json_str(
            r#"{"monitor": {"poll_interval_ms": 500}, "scheduler": {"channel_id": "geo"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.monitor.poll_interval(), std::time::Duration::from_millis(500));
        assert_eq!(cfg.monitor.stream_min_interval_secs, 30);
        assert_eq!(cfg.scheduler.channel_id, "geo");
        assert_eq!(cfg.scheduler.channel_name, "Reminders");
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = GeonoteConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, GeoError::Config { .. }));
    }

    #[test]
    fn blank_channel_rejected() {
        let err = GeonoteConfig::from_json_str(r#"{"scheduler": {"channel_id": " "}}"#).unwrap_err();
        assert!(err.to_string().contains("channel_id"));
    }
}
