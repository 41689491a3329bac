//! # Geographic Utilities
//!
//! Great-circle distance and track geometry helpers shared by the estimation
//! pipeline and the activity summary.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_km`] | Great-circle distance between two points, in kilometres |
//! | [`haversine_distance`] | Great-circle distance between two points, in metres |
//! | [`compute_bounds`] | Bounding box of a track |
//!
//! ## Example
//!
//! ```rust
//! use activity_kinematics::{GpsPoint, geo_utils};
//!
//! let start = GpsPoint::new(-20.8789, 55.4481);   // Saint-Denis
//! let next = GpsPoint::new(-20.87881, 55.4481);   // ~10 m north
//!
//! let meters = geo_utils::haversine_distance(&start, &next);
//! assert!((meters - 10.0).abs() < 0.5);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distances use the haversine formula on a sphere with the mean Earth radius
//! (6,371,008.8 m). Degenerate input is not rejected: a NaN coordinate yields
//! a NaN distance, and callers compare it against thresholds in a way that
//! NaN never passes.

use geo::{Point, Haversine, Distance};
use crate::{GpsPoint, Bounds};

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two GPS points, in metres.
///
/// # Example
///
/// ```rust
/// use activity_kinematics::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Great-circle distance between two GPS points, in kilometres.
///
/// Total and symmetric: `distance_km(a, a) == 0.0` and
/// `distance_km(a, b) == distance_km(b, a)`.
#[inline]
pub fn distance_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_distance(p1, p2) / 1000.0
}

// =============================================================================
// Bounding Box
// =============================================================================

/// Compute the bounding box of a track.
///
/// For empty input the result holds MIN/MAX sentinels; use
/// [`Bounds::from_points`] when an `Option` is preferable.
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds { min_lat, max_lat, min_lng, max_lng }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let points = [
            GpsPoint::new(51.5074, -0.1278),
            GpsPoint::new(-20.8789, 55.4481),
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(89.9, 179.9),
        ];
        for p in &points {
            assert_eq!(distance_km(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GpsPoint::new(-21.0, 55.5);
        let b = GpsPoint::new(-21.1, 55.7);
        assert_eq!(distance_km(&a, &b), distance_km(&b, &a));
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_small_northward_step() {
        // 0.00009 degrees of latitude is about 10 m
        let a = GpsPoint::new(-20.8789, 55.4481);
        let b = GpsPoint::new(-20.8789 + 0.00009, 55.4481);
        assert!(approx_eq(haversine_distance(&a, &b), 10.0, 0.1));
    }

    #[test]
    fn test_nan_coordinate_propagates() {
        let a = GpsPoint::new(f64::NAN, 55.4481);
        let b = GpsPoint::new(-20.8789, 55.4481);
        assert!(distance_km(&a, &b).is_nan());
    }

    #[test]
    fn test_compute_bounds() {
        let track = vec![
            GpsPoint::new(51.50, -0.13),
            GpsPoint::new(51.52, -0.11),
        ];
        let bounds = compute_bounds(&track);
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lng, -0.11);

        let center = bounds.center();
        assert!(approx_eq(center.latitude, 51.51, 0.001));
        assert!(approx_eq(center.longitude, -0.12, 0.001));
    }
}
