use std::io::Write;
use std::time::Duration;

use geonote::location::Accuracy;
use geonote::{GeoError, GeonoteConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_full_document() {
    let file = write_config(
        r#"{
            "location": {
                "stream_accuracy": "low",
                "fix_timeout_secs": 5,
                "request_background": false
            },
            "monitor": {
                "poll_interval_secs": 300,
                "stream_min_distance_m": 25.0
            },
            "scheduler": {
                "channel_id": "geo",
                "proximity_title": "Nearby: {label}"
            }
        }"#,
    );

    let cfg = GeonoteConfig::from_json_file(file.path()).unwrap();
    assert_eq!(cfg.location.stream_accuracy, Accuracy::Low);
    assert_eq!(cfg.location.fix_options().timeout, Duration::from_secs(5));
    assert!(!cfg.location.request_background);
    assert_eq!(cfg.monitor.poll_interval(), Duration::from_secs(300));
    assert_eq!(cfg.monitor.stream_min_distance_m, 25.0);
    assert_eq!(cfg.scheduler.channel_id, "geo");
    assert_eq!(cfg.scheduler.proximity_title, "Nearby: {label}");
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GeonoteConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GeoError::Config { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config(r#"{"monitor": {"update_queue_capacity": 0}}"#);
    let err = GeonoteConfig::from_json_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("update_queue_capacity"));
}

#[test]
fn config_round_trips_through_disk() {
    let cfg = GeonoteConfig::default();
    let file = write_config(&serde_json::to_string_pretty(&cfg).unwrap());
    assert_eq!(GeonoteConfig::from_json_file(file.path()).unwrap(), cfg);
}
