//! geonote simulator
//!
//! Drives the geofence monitor with a scripted track against simulated
//! location and notification services, and exposes the distance and countdown
//! helpers for quick checks.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use geonote::location::{LocationProvider, SimulatedLocationService};
use geonote::notify::{InMemoryNotificationService, ReminderScheduler};
use geonote::{
    distance, format_countdown, logging, Coordinate, GeoError, GeoResult, GeofenceMonitor, GeofenceTarget,
    GeonoteConfig, InMemoryTargetStore, OwnerId,
};

#[derive(Debug, Parser)]
#[command(name = "geonote-sim", version, about = "Simulate location-triggered note reminders")]
struct Cli {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "geonote=info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a track of positions through the monitor
    Replay {
        /// JSON array of targets: {"ownerId", "latitude", "longitude", "radiusMeters", "label"}
        #[arg(long)]
        targets: PathBuf,
        /// JSON array of [latitude, longitude] pairs, in order
        #[arg(long)]
        track: PathBuf,
        /// Also run a poll after each pushed position
        #[arg(long)]
        poll: bool,
    },
    /// Great-circle distance between two points, in meters
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    },
    /// Countdown text for an RFC 3339 time
    Countdown {
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetEntry {
    owner_id: String,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    label: String,
}

impl TargetEntry {
    fn into_target(self) -> GeoResult<GeofenceTarget> {
        let center = Coordinate::new(self.latitude, self.longitude)?;
        Ok(GeofenceTarget::new(
            OwnerId::new(self.owner_id)?,
            center,
            self.radius_meters,
            self.label,
        )?)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> GeoResult<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| GeoError::config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| GeoError::config(format!("invalid JSON in {}: {e}", path.display())))
}

fn replay(cfg: GeonoteConfig, targets: &Path, track: &Path, poll: bool) -> GeoResult<()> {
    let entries: Vec<TargetEntry> = read_json(targets)?;
    let store = Arc::new(InMemoryTargetStore::new());
    for entry in entries {
        store.upsert(entry.into_target()?)?;
    }

    let points: Vec<[f64; 2]> = read_json(track)?;
    let points = points
        .into_iter()
        .map(|[lat, lon]| Coordinate::new(lat, lon))
        .collect::<Result<Vec<_>, _>>()?;

    let platform = Arc::new(SimulatedLocationService::new());
    let notifications = Arc::new(InMemoryNotificationService::new());
    let provider = Arc::new(LocationProvider::with_tuning(platform.clone(), cfg.location));
    let scheduler = Arc::new(ReminderScheduler::with_config(notifications.clone(), cfg.scheduler));
    if let Err(err) = scheduler.initialize() {
        tracing::warn!(error = %err, "notification channel setup failed");
    }

    let monitor = GeofenceMonitor::new(provider, scheduler, cfg.monitor);
    let events = monitor.events();
    if !monitor.start(store) {
        return Err(GeoError::internal("monitor did not start"));
    }

    for (step, point) in points.into_iter().enumerate() {
        platform.set_fix(Ok(point));
        platform.push(point);
        if poll {
            monitor.poll_now();
        }
        let status = monitor.status();
        println!("#{step:<4} {point}  inside={}", status.dedup_count);
        while let Some(event) = events.recv_timeout(Duration::ZERO) {
            println!("      -> {} ({}) at {}m", event.label, event.owner_id, event.distance_meters);
        }
    }

    let status = monitor.status();
    monitor.stop();

    println!();
    println!("passes:        {}", status.passes);
    println!("notifications: {}", notifications.delivered().len());
    println!("dropped:       {}", status.dropped_updates);
    Ok(())
}

fn run(cli: Cli) -> GeoResult<()> {
    let cfg = match &cli.config {
        Some(path) => GeonoteConfig::from_json_file(path)?,
        None => GeonoteConfig::default(),
    };

    match cli.command {
        Command::Replay { targets, track, poll } => replay(cfg, &targets, &track, poll),
        Command::Distance { lat1, lon1, lat2, lon2 } => {
            let a = Coordinate::new(lat1, lon1)?;
            let b = Coordinate::new(lat2, lon2)?;
            println!("{:.1}", distance(a, b));
            Ok(())
        }
        Command::Countdown { at } => {
            println!("{}", format_countdown(at));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
