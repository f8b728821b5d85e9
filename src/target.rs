//! Geofence targets and the events they produce.
//!
//! A `GeofenceTarget` is a circular region tied to a note. Targets are
//! validated once at creation; the monitor trusts every snapshot it reads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::coordinate::Coordinate;
use crate::error::ValidationError;

/// Smallest accepted geofence radius in meters.
pub const MIN_RADIUS_METERS: f64 = 10.0;
/// Largest accepted geofence radius in meters.
pub const MAX_RADIUS_METERS: f64 = 1000.0;

/// Opaque identifier of the note that owns a geofence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl<'de> Deserialize<'de> for OwnerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Self::new(id).map_err(serde::de::Error::custom)
    }
}

impl OwnerId {
    /// Wraps a note identifier.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyOwnerId` for blank identifiers.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyOwnerId);
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A circular region whose entry fires a proximity notification.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGeofenceTarget")]
pub struct GeofenceTarget {
    pub owner_id: OwnerId,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub label: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeofenceTarget {
    owner_id: OwnerId,
    center: Coordinate,
    radius_meters: f64,
    label: String,
}

impl TryFrom<RawGeofenceTarget> for GeofenceTarget {
    type Error = ValidationError;

    fn try_from(raw: RawGeofenceTarget) -> Result<Self, Self::Error> {
        Self::new(raw.owner_id, raw.center, raw.radius_meters, raw.label)
    }
}

impl GeofenceTarget {
    /// Creates a validated target.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::RadiusOutOfRange` when the radius falls outside
    /// [`MIN_RADIUS_METERS`, `MAX_RADIUS_METERS`] and `ValidationError::EmptyLabel`
    /// for a blank label.
    pub fn new(
        owner_id: OwnerId,
        center: Coordinate,
        radius_meters: f64,
        label: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius_meters) {
            return Err(ValidationError::RadiusOutOfRange {
                value: radius_meters,
                min: MIN_RADIUS_METERS,
                max: MAX_RADIUS_METERS,
            });
        }
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        Ok(Self {
            owner_id,
            center,
            radius_meters,
            label,
        })
    }

    /// Returns true if a point `distance_meters` away from the center is inside
    /// the geofence. The boundary counts as inside.
    #[must_use]
    pub fn contains_distance(&self, distance_meters: f64) -> bool {
        distance_meters <= self.radius_meters
    }
}

/// A geofence entry observed during an evaluation pass.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub owner_id: OwnerId,
    pub label: String,
    /// Distance to the target center, rounded to the nearest meter.
    pub distance_meters: u32,
    pub observed_at: DateTime<Utc>,
}

/// Rounds a distance in meters to the nearest whole meter, saturating.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_meters(distance_meters: f64) -> u32 {
    // `as` saturates for out-of-range floats and maps NaN to 0.
    distance_meters.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(s: &str) -> OwnerId {
        OwnerId::new(s).unwrap()
    }

    #[test]
    fn radius_bounds_are_inclusive() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        assert!(GeofenceTarget::new(owner("a"), center, 10.0, "x").is_ok());
        assert!(GeofenceTarget::new(owner("a"), center, 1000.0, "x").is_ok());
        assert!(matches!(
            GeofenceTarget::new(owner("a"), center, 9.9, "x"),
            Err(ValidationError::RadiusOutOfRange { .. })
        ));
        assert!(GeofenceTarget::new(owner("a"), center, 1000.5, "x").is_err());
    }

    #[test]
    fn blank_owner_and_label_rejected() {
        assert_eq!(OwnerId::new("  "), Err(ValidationError::EmptyOwnerId));
        let center = Coordinate::new(0.0, 0.0).unwrap();
        assert_eq!(
            GeofenceTarget::new(owner("a"), center, 50.0, ""),
            Err(ValidationError::EmptyLabel)
        );
    }

    #[test]
    fn boundary_counts_as_inside() {
        let t = GeofenceTarget::new(owner("a"), Coordinate::new(40.0, -75.0).unwrap(), 100.0, "x")
            .unwrap();
        assert!(t.contains_distance(100.0));
        assert!(!t.contains_distance(100.1));
    }

    #[test]
    fn rounds_to_nearest_meter() {
        assert_eq!(round_meters(12.4), 12);
        assert_eq!(round_meters(12.5), 13);
        assert_eq!(round_meters(-3.0), 0);
        assert_eq!(round_meters(f64::NAN), 0);
    }

    #[test]
    fn target_serializes_camel_case() {
        let t = GeofenceTarget::new(owner("note-1"), Coordinate::new(1.0, 2.0).unwrap(), 50.0, "Shop")
            .unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["ownerId"], "note-1");
        assert_eq!(json["radiusMeters"], 50.0);

        let back: GeofenceTarget = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn deserialization_enforces_invariants() {
        let parse = |radius: f64, label: &str, owner: &str, lat: f64| {
            serde_json::from_value::<GeofenceTarget>(serde_json::json!({
                "ownerId": owner,
                "center": {"latitude": lat, "longitude": 0.0},
                "radiusMeters": radius,
                "label": label,
            }))
        };

        assert!(parse(100.0, "Shop", "n1", 0.0).is_ok());
        let err = parse(5000.0, "Shop", "n1", 0.0).unwrap_err();
        assert!(err.to_string().contains("radius"));
        assert!(parse(100.0, " ", "n1", 0.0).is_err());
        assert!(parse(100.0, "Shop", "", 0.0).is_err());
        assert!(parse(100.0, "Shop", "n1", 200.0).is_err());
    }
}
