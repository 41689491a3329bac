//! # Activity Kinematics
//!
//! Real-time distance, speed, elevation and split estimation from noisy GPS
//! fixes recorded during outdoor activities.
//!
//! This library provides:
//! - Accuracy-aware fix admission and teleport rejection
//! - Cumulative distance with an adaptive movement quantum
//! - Median + EMA smoothed instantaneous speed with stop detection
//! - Elevation gain/loss with an altitude-band noise threshold
//! - Per-kilometer and manual splits
//! - A [`TrackingSession`] orchestrating all of the above per fix
//!
//! ## Features
//!
//! - **`serde`** - Serialize snapshots and hydration state
//! - **`parallel`** - Replay recorded tracks in parallel with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use activity_kinematics::{ActivityProfile, Fix, TrackingSession};
//!
//! let mut session = TrackingSession::new(ActivityProfile::Trail);
//! session.start(0).unwrap();
//!
//! // Two fixes ~10 m apart, 5 s apart
//! session.ingest(&Fix::new(-20.8789, 55.4481, 0).with_accuracy(5.0));
//! let snapshot = session.ingest(&Fix::new(-20.87881, 55.4481, 5_000).with_accuracy(5.0));
//!
//! assert!(snapshot.distance_km > 0.009);
//! assert!(snapshot.instant_speed_kmh > 0.0);
//!
//! // Host timer: no fix for more than 6 s drops speed to zero
//! let snapshot = session.tick(12_000);
//! assert_eq!(snapshot.instant_speed_kmh, 0.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod geo_utils;

// Per-sport thresholds
pub mod profile;
pub use profile::{ActivityProfile, ProfileParams};

// Estimation pipeline, leaf first
pub mod admission;
pub use admission::{Admission, FixAdmissionFilter, RejectReason};

pub mod jump;
pub use jump::JumpRejector;

pub mod distance;
pub use distance::DistanceAccumulator;

pub mod speed;
pub use speed::{SpeedEstimator, SpeedSample};

pub mod elevation;
pub use elevation::{ElevationState, ElevationTracker};

pub mod splits;
pub use splits::{Split, SplitCalculator, SplitKind, SplitStats};

// Orchestration and outputs
pub mod session;
pub use session::{
    ChartSample, HydrationState, MetricsSnapshot, SessionStatus, TrackingSession,
    TransitionError,
};

pub mod summary;
pub use summary::{ActivitySummary, SummaryConfig};

pub mod replay;
pub use replay::{replay_track, replay_track_with_config, replay_tracks, RecordedTrack, ReplayResult};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("ActivityKinematics"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use activity_kinematics::GpsPoint;
/// let point = GpsPoint::new(-20.8789, 55.4481); // Saint-Denis, Réunion
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One raw positioning sample from the device. Never mutated by the engine.
///
/// # Example
/// ```
/// use activity_kinematics::Fix;
///
/// let fix = Fix::new(-20.8789, 55.4481, 1_000)
///     .with_accuracy(4.0)
///     .with_altitude(12.0)
///     .with_speed(2.5);
/// assert_eq!(fix.native_speed_kmh(), Some(9.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level
    pub altitude: Option<f64>,
    /// Horizontal accuracy, 1 sigma (meters)
    pub accuracy: Option<f64>,
    /// Device-reported speed (m/s)
    pub speed: Option<f64>,
    /// Host monotonic clock (ms)
    pub timestamp: i64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed: None,
            timestamp,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed = Some(speed_mps);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// Device speed in km/h, if reported and physically meaningful.
    pub fn native_speed_kmh(&self) -> Option<f64> {
        self.speed
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s * 3.6)
    }
}

/// An accepted point retained for path reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackedPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl TrackedPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self { latitude, longitude, timestamp }
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

impl From<&Fix> for TrackedPoint {
    fn from(fix: &Fix) -> Self {
        Self::new(fix.latitude, fix.longitude, fix.timestamp)
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    /// Process-wide session. The mutex serializes fix delivery against
    /// metric reads from the UI thread.
    static TRACKING_ENGINE: Lazy<Mutex<Option<TrackingSession>>> =
        Lazy::new(|| Mutex::new(None));

    fn with_tracking_session<F, R>(f: F) -> Option<R>
    where
        F: FnOnce(&mut TrackingSession) -> R,
    {
        let mut guard = match TRACKING_ENGINE.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("[TrackingFfi] Engine lock poisoned");
                return None;
            }
        };
        guard.as_mut().map(f)
    }

    /// Create a fresh session for `profile`, replacing any previous one.
    #[uniffi::export]
    pub fn tracker_init(profile: ActivityProfile) -> bool {
        init_logging();
        match TRACKING_ENGINE.lock() {
            Ok(mut guard) => {
                *guard = Some(TrackingSession::new(profile));
                info!("[TrackingFfi] Initialized ({})", profile.id());
                true
            }
            Err(_) => {
                warn!("[TrackingFfi] Engine lock poisoned, init skipped");
                false
            }
        }
    }

    #[uniffi::export]
    pub fn tracker_is_initialized() -> bool {
        TRACKING_ENGINE
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    #[uniffi::export]
    pub fn tracker_start(now_ms: i64) -> bool {
        with_tracking_session(|s| s.start(now_ms).is_ok()).unwrap_or(false)
    }

    #[uniffi::export]
    pub fn tracker_pause(now_ms: i64) -> bool {
        with_tracking_session(|s| s.pause(now_ms).is_ok()).unwrap_or(false)
    }

    #[uniffi::export]
    pub fn tracker_resume(now_ms: i64) -> bool {
        with_tracking_session(|s| s.resume(now_ms).is_ok()).unwrap_or(false)
    }

    #[uniffi::export]
    pub fn tracker_stop(now_ms: i64) -> bool {
        with_tracking_session(|s| s.stop(now_ms).is_ok()).unwrap_or(false)
    }

    #[uniffi::export]
    pub fn tracker_ingest(fix: Fix) -> Option<MetricsSnapshot> {
        with_tracking_session(|s| s.ingest(&fix))
    }

    /// Call about once a second so signal loss drops speed to zero.
    #[uniffi::export]
    pub fn tracker_tick(now_ms: i64) -> Option<MetricsSnapshot> {
        with_tracking_session(|s| s.tick(now_ms))
    }

    #[uniffi::export]
    pub fn tracker_manual_split(now_ms: i64) -> Option<Split> {
        with_tracking_session(|s| s.manual_split(now_ms)).flatten()
    }

    #[uniffi::export]
    pub fn tracker_reset() {
        if with_tracking_session(|s| s.reset()).is_some() {
            info!("[TrackingFfi] Reset");
        }
    }

    #[uniffi::export]
    pub fn tracker_snapshot() -> Option<MetricsSnapshot> {
        with_tracking_session(|s| s.snapshot())
    }

    #[uniffi::export]
    pub fn tracker_chart_samples() -> Vec<ChartSample> {
        with_tracking_session(|s| s.chart_samples()).unwrap_or_default()
    }

    #[uniffi::export]
    pub fn tracker_summary() -> Option<ActivitySummary> {
        with_tracking_session(|s| s.summary(&SummaryConfig::default())).flatten()
    }

    /// Engine state as JSON, for the host's crash-recovery storage.
    #[uniffi::export]
    pub fn tracker_export_state_json() -> Option<String> {
        let state = with_tracking_session(|s| s.export_state())?;
        serde_json::to_string(&state).ok()
    }

    /// Restore state previously produced by [`tracker_export_state_json`].
    #[uniffi::export]
    pub fn tracker_hydrate_json(json: String) -> bool {
        let state: HydrationState = match serde_json::from_str(&json) {
            Ok(state) => state,
            Err(e) => {
                warn!("[TrackingFfi] Hydration JSON rejected: {}", e);
                return false;
            }
        };
        with_tracking_session(|s| s.hydrate(state)).is_some()
    }

    #[uniffi::export]
    pub fn profile_from_sport_name(name: String) -> ActivityProfile {
        ActivityProfile::from_sport_name(&name)
    }

    #[uniffi::export]
    pub fn profile_params(profile: ActivityProfile) -> ProfileParams {
        profile.params()
    }

    /// Recompute metrics for archived activities in one call.
    #[uniffi::export]
    pub fn ffi_replay_tracks(tracks: Vec<RecordedTrack>) -> Vec<ReplayResult> {
        init_logging();
        info!("[TrackingFfi] Replaying {} tracks", tracks.len());
        replay_tracks(&tracks)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        // The engine is process-wide, so the whole flow lives in one test
        #[test]
        fn test_tracker_flow() {
            assert!(tracker_init(profile_from_sport_name("Trail".to_string())));
            assert!(tracker_is_initialized());
            assert!(tracker_start(0));
            assert!(!tracker_start(0));

            for i in 0..5 {
                let fix = Fix::new(-20.8789 + i as f64 * 0.00009, 55.4481, i * 5_000)
                    .with_accuracy(5.0);
                assert!(tracker_ingest(fix).is_some());
            }
            let json = tracker_export_state_json().unwrap();

            tracker_reset();
            assert_eq!(tracker_snapshot().unwrap().distance_km, 0.0);
            assert!(tracker_hydrate_json(json));
            assert!(tracker_snapshot().unwrap().distance_km > 0.03);
            assert!(!tracker_hydrate_json("not json".to_string()));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
