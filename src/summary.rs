//! End-of-activity summary handed to the host for upload.
//!
//! The tracked path is simplified with Douglas-Peucker and capped in point
//! count so the payload stays small regardless of activity length.

use geo::{algorithm::simplify::Simplify, Coord, LineString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::session::TrackingSession;
use crate::splits::{Split, SplitStats};
use crate::{Bounds, GpsPoint};

/// Path simplification settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryConfig {
    /// Douglas-Peucker tolerance in degrees (~11 m at 0.0001)
    pub simplification_tolerance: f64,
    /// Upper bound on points in the simplified path
    pub max_points: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            simplification_tolerance: 0.0001,
            max_points: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActivitySummary {
    pub profile_id: String,
    pub distance_km: f64,
    /// Active time, pauses excluded
    pub duration_ms: i64,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub min_altitude_m: Option<f64>,
    pub max_altitude_m: Option<f64>,
    /// Simplified path
    pub path: Vec<GpsPoint>,
    pub bounds: Bounds,
    pub center: GpsPoint,
    pub splits: Vec<Split>,
    pub split_stats: Option<SplitStats>,
}

impl ActivitySummary {
    /// Summarize a session. Returns `None` with fewer than two tracked points.
    pub fn from_session(session: &TrackingSession, config: &SummaryConfig) -> Option<Self> {
        let raw: Vec<GpsPoint> = session.tracked_path().iter().map(|p| p.point()).collect();
        let path = simplify_path(&raw, config)?;

        let bounds = Bounds::from_points(&path)?;
        let center = bounds.center();
        let snapshot = session.snapshot();

        Some(Self {
            profile_id: session.profile().id().to_string(),
            distance_km: snapshot.distance_km,
            duration_ms: snapshot.elapsed_ms,
            avg_speed_kmh: snapshot.avg_speed_kmh,
            max_speed_kmh: snapshot.max_speed_kmh,
            elevation_gain_m: snapshot.elevation_gain_m,
            elevation_loss_m: snapshot.elevation_loss_m,
            min_altitude_m: snapshot.min_altitude_m,
            max_altitude_m: snapshot.max_altitude_m,
            path,
            bounds,
            center,
            splits: snapshot.splits,
            split_stats: session.split_calculator().stats(),
        })
    }
}

/// Douglas-Peucker simplification capped at `config.max_points` by uniform
/// sampling. Invalid points are dropped first.
///
/// Returns `None` if fewer than 2 valid points remain.
///
/// # Example
/// ```
/// use activity_kinematics::{GpsPoint, SummaryConfig, summary::simplify_path};
///
/// // Straight line: the middle points are redundant
/// let line: Vec<GpsPoint> = (0..50)
///     .map(|i| GpsPoint::new(-20.8789 + i as f64 * 0.0001, 55.4481))
///     .collect();
///
/// let simplified = simplify_path(&line, &SummaryConfig::default()).unwrap();
/// assert_eq!(simplified.len(), 2);
/// ```
pub fn simplify_path(points: &[GpsPoint], config: &SummaryConfig) -> Option<Vec<GpsPoint>> {
    let coords: Vec<Coord> = points
        .iter()
        .filter(|p| p.is_valid())
        .map(|p| Coord { x: p.longitude, y: p.latitude })
        .collect();

    if coords.len() < 2 {
        return None;
    }

    let simplified = LineString::new(coords).simplify(&config.simplification_tolerance);

    let max_points = config.max_points.max(2) as usize;
    let final_coords: Vec<Coord> = if simplified.0.len() > max_points {
        let step = simplified.0.len() as f64 / max_points as f64;
        (0..max_points)
            .map(|i| simplified.0[(i as f64 * step) as usize])
            .collect()
    } else {
        simplified.0
    };

    if final_coords.len() < 2 {
        return None;
    }

    Some(final_coords.iter().map(|c| GpsPoint::new(c.y, c.x)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ActivityProfile;
    use crate::Fix;

    fn zigzag(n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| {
                let offset = if i % 2 == 0 { 0.0 } else { 0.001 };
                GpsPoint::new(-20.8789 + i as f64 * 0.001, 55.4481 + offset)
            })
            .collect()
    }

    #[test]
    fn test_simplify_caps_point_count() {
        let config = SummaryConfig { simplification_tolerance: 0.00001, max_points: 20 };
        let simplified = simplify_path(&zigzag(200), &config).unwrap();
        assert_eq!(simplified.len(), 20);
    }

    #[test]
    fn test_simplify_drops_invalid_points() {
        let points = vec![
            GpsPoint::new(f64::NAN, 0.0),
            GpsPoint::new(-20.8789, 55.4481),
            GpsPoint::new(95.0, 55.4481),
        ];
        assert!(simplify_path(&points, &SummaryConfig::default()).is_none());
    }

    #[test]
    fn test_summary_requires_two_points() {
        let mut session = TrackingSession::new(ActivityProfile::Trail);
        session.start(0).unwrap();
        session.ingest(&Fix::new(-20.8789, 55.4481, 0).with_accuracy(5.0));
        assert!(session.summary(&SummaryConfig::default()).is_none());
    }

    #[test]
    fn test_summary_of_short_walk() {
        let mut session = TrackingSession::new(ActivityProfile::Walking);
        session.start(0).unwrap();
        for i in 0..30 {
            let fix = Fix::new(-20.8789 + i as f64 * 0.00009, 55.4481, i * 10_000)
                .with_accuracy(5.0)
                .with_altitude(100.0 + i as f64 * 2.0);
            session.ingest(&fix);
        }
        session.stop(290_000).unwrap();

        let summary = session.summary(&SummaryConfig::default()).unwrap();
        assert_eq!(summary.profile_id, "walking");
        assert_eq!(summary.duration_ms, 290_000);
        assert!(summary.distance_km > 0.28 && summary.distance_km < 0.3);
        assert!(summary.elevation_gain_m > 50.0);
        assert!(summary.path.len() >= 2);
        assert!(summary.bounds.min_lat < summary.bounds.max_lat);
        assert!(summary.split_stats.is_none());
    }
}
