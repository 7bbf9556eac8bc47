//! Route data model and polyline geometry.
//!
//! A [`Route`] is produced by the routing collaborator and is immutable once
//! built; a reroute replaces it wholesale. The geometry helpers here answer
//! the two questions the navigation engine asks on every location fix: how
//! far off the planned polyline is the user, and how much of the route is
//! left.

use serde::{Deserialize, Serialize};

use crate::geo::{EARTH_RADIUS_M, GeoCoordinate};

/// Segment distance below which the deviation scan stops early.
///
/// Once the user is within this distance of any segment they are on-route
/// for every purpose the engine cares about; scanning the rest of the
/// polyline would only refine a value that is already far below the reroute
/// threshold.
const ON_ROUTE_EARLY_EXIT_M: f64 = 5.0;

/// One maneuver of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Human-readable instruction ("Turn left onto Bay Rd").
    pub instruction: String,
    /// Length of this step in meters.
    pub distance_m: f64,
    /// Point at which the maneuver happens.
    pub anchor: GeoCoordinate,
}

/// A planned path from origin to destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Polyline of the path. Non-empty for any route a routing service returns.
    pub points: Vec<GeoCoordinate>,
    /// Ordered maneuvers along the path.
    pub steps: Vec<RouteStep>,
    pub total_distance_m: f64,
    pub expected_duration_secs: f64,
}

impl Route {
    /// Final point of the polyline.
    pub fn destination(&self) -> Option<GeoCoordinate> {
        self.points.last().copied()
    }

    /// Minimum distance from `point` to the route polyline, in meters.
    ///
    /// Scans consecutive point pairs and stops early once a segment within
    /// 5 m is found. With the early exit the returned value can be slightly
    /// larger than the true minimum when an even closer segment appears
    /// later in the polyline; both values are far below the reroute
    /// threshold, so the trade-off is kept for the common on-route case.
    pub fn deviation_from(&self, point: &GeoCoordinate) -> f64 {
        if self.points.len() < 2 {
            return self
                .points
                .first()
                .map(|p| p.distance_m(point))
                .unwrap_or(f64::INFINITY);
        }

        let mut min_distance = f64::INFINITY;
        for pair in self.points.windows(2) {
            let (distance, _) = segment_projection_m(point, &pair[0], &pair[1]);
            if distance < min_distance {
                min_distance = distance;
            }
            if min_distance < ON_ROUTE_EARLY_EXIT_M {
                break;
            }
        }
        min_distance
    }

    /// Remaining path length from `point` to the destination, in meters.
    ///
    /// Projects the point onto its nearest segment and sums the rest of the
    /// polyline from there.
    pub fn distance_remaining_from(&self, point: &GeoCoordinate) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }

        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        let mut best_t = 0.0;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (distance, t) = segment_projection_m(point, &pair[0], &pair[1]);
            if distance < best_distance {
                best_distance = distance;
                best_index = i;
                best_t = t;
            }
        }

        let segment_len = self.points[best_index].distance_m(&self.points[best_index + 1]);
        let mut remaining = segment_len * (1.0 - best_t);
        for pair in self.points[best_index + 1..].windows(2) {
            remaining += pair[0].distance_m(&pair[1]);
        }
        remaining
    }
}

/// Distance from `point` to the segment `a`→`b`, in meters.
///
/// A zero-length segment degenerates to the point-to-point distance.
pub fn point_to_segment_distance_m(
    point: &GeoCoordinate,
    a: &GeoCoordinate,
    b: &GeoCoordinate,
) -> f64 {
    segment_projection_m(point, a, b).0
}

/// Distance to the segment plus the clamped projection parameter `t` in [0, 1].
///
/// Works on a local tangent plane centered at `a`; accurate at the scales a
/// navigation polyline spans between consecutive points.
fn segment_projection_m(point: &GeoCoordinate, a: &GeoCoordinate, b: &GeoCoordinate) -> (f64, f64) {
    let (px, py) = to_local_m(a, point);
    let (bx, by) = to_local_m(a, b);

    let len2 = bx * bx + by * by;
    if len2 <= f64::EPSILON {
        return (point.distance_m(a), 0.0);
    }

    let t = ((px * bx + py * by) / len2).clamp(0.0, 1.0);
    let dx = px - t * bx;
    let dy = py - t * by;
    ((dx * dx + dy * dy).sqrt(), t)
}

/// Equirectangular east/north offsets of `p` from `origin`, in meters.
fn to_local_m(origin: &GeoCoordinate, p: &GeoCoordinate) -> (f64, f64) {
    let east = (p.longitude - origin.longitude).to_radians()
        * origin.latitude.to_radians().cos()
        * EARTH_RADIUS_M;
    let north = (p.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
    (east, north)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route() -> Route {
        let points = vec![
            GeoCoordinate::new(37.0, -122.0),
            GeoCoordinate::new(37.01, -122.0),
        ];
        Route {
            steps: vec![
                RouteStep {
                    instruction: "Head north".to_string(),
                    distance_m: 1112.0,
                    anchor: points[0],
                },
                RouteStep {
                    instruction: "Arrive at destination".to_string(),
                    distance_m: 0.0,
                    anchor: points[1],
                },
            ],
            points,
            total_distance_m: 1112.0,
            expected_duration_secs: 160.0,
        }
    }

    #[test]
    fn test_point_on_segment_is_zero() {
        let route = straight_route();
        let midpoint = GeoCoordinate::new(37.005, -122.0);
        let d = route.deviation_from(&midpoint);
        assert!(d < 0.01, "expected ~0 for a point on the polyline, got {d}");
    }

    #[test]
    fn test_perpendicular_offset_distance() {
        let route = straight_route();
        // ~50 m east of the midpoint (0.00056° of longitude at 37° N)
        let offset = GeoCoordinate::new(37.005, -122.0 + 0.00056);
        let d = route.deviation_from(&offset);
        assert!((45.0..55.0).contains(&d), "expected ~50 m, got {d}");
    }

    #[test]
    fn test_degenerate_segment_falls_back_to_point_distance() {
        let p = GeoCoordinate::new(37.0, -122.0);
        let query = GeoCoordinate::new(37.001, -122.0);
        let d = point_to_segment_distance_m(&query, &p, &p);
        assert!((d - query.distance_m(&p)).abs() < 1e-6);
    }

    #[test]
    fn test_projection_clamps_past_segment_end() {
        let a = GeoCoordinate::new(37.0, -122.0);
        let b = GeoCoordinate::new(37.001, -122.0);
        // Well past b along the segment direction: nearest point is b itself.
        let query = GeoCoordinate::new(37.003, -122.0);
        let d = point_to_segment_distance_m(&query, &a, &b);
        assert!((d - query.distance_m(&b)).abs() < 0.5);
    }

    #[test]
    fn test_early_exit_returns_first_on_route_segment() {
        // Query point ~3 m east of the first segment; a later segment passes
        // exactly through the query point. The early exit keeps the first
        // (sub-5 m) answer instead of scanning on to find the true zero.
        let query = GeoCoordinate::new(37.0005, -122.0 + 0.000034);
        let route = Route {
            points: vec![
                GeoCoordinate::new(37.0, -122.0),
                GeoCoordinate::new(37.001, -122.0),
                GeoCoordinate::new(37.0005, -121.999),
                query,
                GeoCoordinate::new(37.002, -122.0),
            ],
            steps: Vec::new(),
            total_distance_m: 0.0,
            expected_duration_secs: 0.0,
        };
        let d = route.deviation_from(&query);
        assert!(
            (1.0..5.0).contains(&d),
            "expected the first segment's ~3 m, not the later exact hit, got {d}"
        );
    }

    #[test]
    fn test_single_point_polyline() {
        let p = GeoCoordinate::new(37.0, -122.0);
        let route = Route {
            points: vec![p],
            steps: Vec::new(),
            total_distance_m: 0.0,
            expected_duration_secs: 0.0,
        };
        let query = GeoCoordinate::new(37.001, -122.0);
        let d = route.deviation_from(&query);
        assert!((d - query.distance_m(&p)).abs() < 1e-6);
    }

    #[test]
    fn test_distance_remaining_at_midpoint_is_half() {
        let route = straight_route();
        let midpoint = GeoCoordinate::new(37.005, -122.0);
        let remaining = route.distance_remaining_from(&midpoint);
        assert!(
            (remaining - 556.0).abs() < 5.0,
            "expected ~556 m, got {remaining}"
        );
    }

    #[test]
    fn test_distance_remaining_at_destination_is_zero() {
        let route = straight_route();
        let remaining = route.distance_remaining_from(&route.destination().unwrap());
        assert!(remaining < 1.0, "expected ~0, got {remaining}");
    }

    #[test]
    fn test_destination_is_last_point() {
        let route = straight_route();
        assert_eq!(
            route.destination(),
            Some(GeoCoordinate::new(37.01, -122.0))
        );
    }
}
