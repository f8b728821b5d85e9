//! Geographic coordinate value type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum valid latitude in degrees.
pub const MIN_LATITUDE: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LATITUDE: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LONGITUDE: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// An immutable WGS84 position in decimal degrees.
///
/// # Examples
///
/// ```
/// use geonote::Coordinate;
///
/// let home = Coordinate::new(40.0, -75.0).unwrap();
/// assert_eq!(home.latitude(), 40.0);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LatitudeOutOfRange` or
    /// `ValidationError::LongitudeOutOfRange` for values outside the WGS84 bounds
    /// (NaN is always out of range).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange { value: latitude });
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates a coordinate without validation. Use with trusted inputs only.
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(ValidationError::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            Coordinate::new(0.0, -180.1),
            Err(ValidationError::LongitudeOutOfRange { .. })
        ));
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn deserializes_from_plain_object() {
        let c: Coordinate = serde_json::from_str(r#"{"latitude":1.5,"longitude":-2.25}"#).unwrap();
        assert_eq!(c, Coordinate::new_unchecked(1.5, -2.25));
        assert_eq!(c.to_string(), "(1.500000, -2.250000)");
    }

    #[test]
    fn deserialization_validates_range() {
        let err = serde_json::from_str::<Coordinate>(r#"{"latitude":200.0,"longitude":0.0}"#).unwrap_err();
        assert!(err.to_string().contains("Latitude"));
        assert!(serde_json::from_str::<Coordinate>(r#"{"latitude":0.0,"longitude":-181.0}"#).is_err());
    }
}
