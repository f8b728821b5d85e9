//! Great-circle distance.

use crate::coordinate::Coordinate;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine).
///
/// Total and symmetric. Accurate to a few meters at geofence scale.
///
/// # Examples
///
/// ```
/// use geonote::{distance, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(0.0, 1.0).unwrap();
/// let d = distance(a, b);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn assert_rel_eq(x: f64, y: f64) {
        let scale = x.abs().max(y.abs()).max(1.0);
        assert!((x - y).abs() / scale < 1e-6, "{x} != {y}");
    }

    #[test]
    fn zero_for_identical_points() {
        for p in [c(0.0, 0.0), c(40.0, -75.0), c(-89.9, 179.9), c(51.5, -0.12)] {
            assert_eq!(distance(p, p), 0.0);
        }
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (c(40.0, -75.0), c(40.001, -75.002)),
            (c(0.0, 0.0), c(1.0, 1.0)),
            (c(-33.86, 151.2), c(51.5, -0.12)),
            (c(89.0, 10.0), c(-89.0, -170.0)),
        ];
        for (a, b) in pairs {
            assert_rel_eq(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance(c(0.0, 0.0), c(0.0, 1.0));
        assert!((d - 111_194.93).abs() < 0.5, "got {d}");
    }

    #[test]
    fn diagonal_degree_is_about_157_km() {
        let d = distance(c(0.0, 0.0), c(1.0, 1.0));
        assert!((d - 157_249.4).abs() < 5.0, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance(c(0.0, 0.0), c(0.0, 180.0));
        assert_rel_eq(d, std::f64::consts::PI * EARTH_RADIUS_METERS);
    }
}
