//! Geographic primitives and angular math.
//!
//! Coordinates are WGS-84 latitude/longitude in degrees; headings are
//! compass bearings in degrees (0 = north, increasing clockwise).

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within WGS-84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another coordinate in meters (haversine).
    pub fn distance_m(&self, other: &GeoCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let h = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }
}

/// Normalize a heading to [0, 360).
#[inline]
pub fn wrap_360(degrees: f64) -> f64 {
    let mut a = degrees;
    while a < 0.0 {
        a += 360.0;
    }
    while a >= 360.0 {
        a -= 360.0;
    }
    a
}

/// Normalize an angular difference to [-180, 180].
#[inline]
pub fn wrap_180(degrees: f64) -> f64 {
    let mut a = degrees;
    while a > 180.0 {
        a -= 360.0;
    }
    while a < -180.0 {
        a += 360.0;
    }
    a
}

/// Shortest signed rotation from heading `from` to heading `to`, in degrees.
///
/// Crossing north takes the short way: `heading_diff(1.0, 359.0)` is `-2`,
/// not `358`.
#[inline]
pub fn heading_diff(from: f64, to: f64) -> f64 {
    wrap_180(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_360_identity() {
        assert_relative_eq!(wrap_360(0.0), 0.0);
        assert_relative_eq!(wrap_360(359.9), 359.9);
    }

    #[test]
    fn test_wrap_360_negative() {
        assert_relative_eq!(wrap_360(-10.0), 350.0);
        assert_relative_eq!(wrap_360(-370.0), 350.0);
    }

    #[test]
    fn test_wrap_360_overflow() {
        assert_relative_eq!(wrap_360(360.0), 0.0);
        assert_relative_eq!(wrap_360(725.0), 5.0);
    }

    #[test]
    fn test_wrap_180_boundaries() {
        assert_relative_eq!(wrap_180(180.0), 180.0);
        assert_relative_eq!(wrap_180(-180.0), -180.0);
        assert_relative_eq!(wrap_180(190.0), -170.0);
        assert_relative_eq!(wrap_180(-190.0), 170.0);
    }

    #[test]
    fn test_heading_diff_crossing_north() {
        assert_relative_eq!(heading_diff(1.0, 359.0), -2.0);
        assert_relative_eq!(heading_diff(359.0, 1.0), 2.0);
        assert_relative_eq!(heading_diff(90.0, 270.0), 180.0);
    }

    #[test]
    fn test_distance_one_hundredth_degree_latitude() {
        let a = GeoCoordinate::new(37.0, -122.0);
        let b = GeoCoordinate::new(37.01, -122.0);
        // 0.01° of latitude is ~1111.95 m on the mean sphere
        let d = a.distance_m(&b);
        assert!((d - 1111.95).abs() < 1.0, "expected ~1112 m, got {d}");
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = GeoCoordinate::new(48.1, 11.5);
        let b = GeoCoordinate::new(48.2, 11.6);
        assert_relative_eq!(a.distance_m(&b), b.distance_m(&a), epsilon = 1e-9);
        assert_relative_eq!(a.distance_m(&a), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(GeoCoordinate::new(37.0, -122.0).is_valid());
        assert!(GeoCoordinate::new(-90.0, 180.0).is_valid());
        assert!(!GeoCoordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoCoordinate::new(0.0, f64::INFINITY).is_valid());
        assert!(!GeoCoordinate::new(91.0, 0.0).is_valid());
        assert!(!GeoCoordinate::new(0.0, -180.5).is_valid());
    }
}
