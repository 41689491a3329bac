//! Cumulative distance and the simplified tracked path.
//!
//! A delta only counts once it clears an adaptive movement quantum. The
//! quantum grows with reported accuracy so a coarse receiver jittering in
//! place does not accumulate phantom distance.

use log::debug;

use crate::geo_utils::distance_km;
use crate::profile::{ActivityProfile, ProfileParams};
use crate::{Fix, TrackedPoint};

/// Path points closer than this to the previous one are not stored (meters).
pub const PATH_SPACING_M: f64 = 2.0;

/// Quantum used by slow on-foot profiles while acquiring (meters).
pub const EARLY_MOTION_MIN_DISTANCE_M: f64 = 0.5;

/// The acquisition phase ends after this many path points...
const ACQUISITION_MIN_POINTS: usize = 3;
/// ...and this much distance (meters).
const ACQUISITION_MIN_DISTANCE_M: f64 = 50.0;

/// Accuracy divisor and clamp for the accuracy-scaled quantum.
const ACCURACY_SCALE_DIVISOR: f64 = 40.0;
const ACCURACY_SCALE_MIN_M: f64 = 0.5;
const ACCURACY_SCALE_MAX_M: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct DistanceAccumulator {
    profile: ActivityProfile,
    params: ProfileParams,
    total_km: f64,
    path: Vec<TrackedPoint>,
}

impl DistanceAccumulator {
    pub fn new(profile: ActivityProfile) -> Self {
        Self {
            profile,
            params: profile.params(),
            total_km: 0.0,
            path: Vec::new(),
        }
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn path(&self) -> &[TrackedPoint] {
        &self.path
    }

    /// True until the path has a few points and some real distance.
    pub fn is_acquiring(&self) -> bool {
        self.path.len() < ACQUISITION_MIN_POINTS
            || self.total_km * 1000.0 < ACQUISITION_MIN_DISTANCE_M
    }

    /// Movement quantum for a fix reporting `accuracy`.
    ///
    /// # Example
    /// ```
    /// use activity_kinematics::{ActivityProfile, DistanceAccumulator};
    ///
    /// let walking = DistanceAccumulator::new(ActivityProfile::Walking);
    /// assert_eq!(walking.min_distance_m(Some(30.0)), 0.5); // acquiring
    /// ```
    pub fn min_distance_m(&self, accuracy: Option<f64>) -> f64 {
        if self.is_acquiring() && self.profile.captures_early_motion() {
            return EARLY_MOTION_MIN_DISTANCE_M;
        }
        let scaled = accuracy
            .filter(|a| a.is_finite())
            .map_or(ACCURACY_SCALE_MIN_M, |a| {
                (a / ACCURACY_SCALE_DIVISOR).clamp(ACCURACY_SCALE_MIN_M, ACCURACY_SCALE_MAX_M)
            });
        self.params.min_distance_m.max(scaled)
    }

    /// Start the path at the first usable fix.
    pub fn seed(&mut self, fix: &Fix) {
        if self.path.is_empty() {
            self.path.push(TrackedPoint::from(fix));
        }
    }

    /// Commit `delta_m` if it clears the movement quantum. Returns whether
    /// the cumulative distance changed.
    pub fn commit(&mut self, delta_m: f64, fix: &Fix) -> bool {
        let min_m = self.min_distance_m(fix.accuracy);
        // Written negated so a NaN delta is refused too
        if !(delta_m >= min_m) {
            debug!("[Distance] {:.2}m below quantum {:.2}m", delta_m, min_m);
            return false;
        }

        self.total_km += delta_m / 1000.0;
        self.push_path_point(TrackedPoint::from(fix));
        true
    }

    fn push_path_point(&mut self, point: TrackedPoint) {
        if let Some(last) = self.path.last() {
            if distance_km(&last.point(), &point.point()) * 1000.0 < PATH_SPACING_M {
                return;
            }
        }
        self.path.push(point);
    }

    /// Replace totals with host-persisted values.
    pub fn restore(&mut self, total_km: Option<f64>, path: Option<Vec<TrackedPoint>>) {
        if let Some(total_km) = total_km {
            self.total_km = total_km;
        }
        if let Some(path) = path {
            self.path = path;
        }
    }

    pub fn reset(&mut self) {
        self.total_km = 0.0;
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn fix(lat: f64, ts: i64, accuracy: f64) -> Fix {
        Fix::new(lat, 55.4481, ts).with_accuracy(accuracy)
    }

    #[test]
    fn test_commit_accumulates() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Trail);
        acc.seed(&fix(-20.8789, 0, 5.0));
        assert!(acc.commit(10.0, &fix(-20.87881, 1_000, 5.0)));
        assert!(acc.commit(10.0, &fix(-20.87872, 2_000, 5.0)));
        assert!(approx_eq(acc.total_km(), 0.020, 1e-9));
        assert_eq!(acc.path().len(), 3);
    }

    #[test]
    fn test_small_delta_not_committed() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Cycling);
        acc.seed(&fix(-20.8789, 0, 5.0));
        assert!(!acc.commit(2.5, &fix(-20.878878, 1_000, 5.0)));
        assert_eq!(acc.total_km(), 0.0);
    }

    #[test]
    fn test_nan_delta_never_committed() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Walking);
        assert!(!acc.commit(f64::NAN, &fix(-20.8789, 0, 5.0)));
        assert_eq!(acc.total_km(), 0.0);
    }

    #[test]
    fn test_quantum_scales_with_accuracy_after_acquisition() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Walking);
        acc.restore(
            Some(0.2),
            Some(vec![
                TrackedPoint::new(0.0, 0.0, 0),
                TrackedPoint::new(0.001, 0.0, 1),
                TrackedPoint::new(0.002, 0.0, 2),
            ]),
        );
        assert!(!acc.is_acquiring());
        assert_eq!(acc.min_distance_m(Some(4.0)), 1.0); // base wins
        assert_eq!(acc.min_distance_m(Some(60.0)), 1.5);
        assert_eq!(acc.min_distance_m(Some(400.0)), 2.0); // clamped
        assert_eq!(acc.min_distance_m(None), 1.0);
    }

    #[test]
    fn test_early_motion_quantum_only_for_slow_profiles() {
        let walking = DistanceAccumulator::new(ActivityProfile::Walking);
        let cycling = DistanceAccumulator::new(ActivityProfile::Cycling);
        assert_eq!(walking.min_distance_m(Some(10.0)), EARLY_MOTION_MIN_DISTANCE_M);
        assert_eq!(cycling.min_distance_m(Some(10.0)), 3.0);
    }

    #[test]
    fn test_path_skips_points_within_spacing() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Walking);
        acc.seed(&fix(-20.8789, 0, 5.0));
        // ~1.1 m north: distance counts, path does not grow
        assert!(acc.commit(1.1, &fix(-20.87889, 1_000, 5.0)));
        assert_eq!(acc.path().len(), 1);
        // ~3.3 m from the stored point: path grows
        assert!(acc.commit(2.2, &fix(-20.87887, 2_000, 5.0)));
        assert_eq!(acc.path().len(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut acc = DistanceAccumulator::new(ActivityProfile::Trail);
        acc.seed(&fix(-20.8789, 0, 5.0));
        acc.commit(10.0, &fix(-20.87881, 1_000, 5.0));
        acc.reset();
        assert_eq!(acc.total_km(), 0.0);
        assert!(acc.path().is_empty());
        assert!(acc.is_acquiring());
    }
}
