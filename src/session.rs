//! Tracking session: owns every estimator and runs the per-fix pipeline.
//!
//! Pipeline order for one fix: admission, jump check, distance, then speed
//! and splits. Elevation is fed from every fix carrying an altitude,
//! independently of admission.
//!
//! The session is not internally synchronized. Hosts delivering fixes from
//! one thread and reading metrics from another wrap it in a mutex (the FFI
//! layer does exactly that).

use std::collections::VecDeque;

use log::{debug, info, warn};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::admission::{Admission, FixAdmissionFilter, RejectReason};
use crate::distance::DistanceAccumulator;
use crate::elevation::ElevationTracker;
use crate::geo_utils::haversine_distance;
use crate::jump::JumpRejector;
use crate::profile::ActivityProfile;
use crate::speed::{SpeedEstimator, SpeedSample, STALE_AFTER_MS};
use crate::splits::{Split, SplitCalculator};
use crate::summary::{ActivitySummary, SummaryConfig};
use crate::{Fix, TrackedPoint};

/// Active time between two chart samples (ms).
pub const CHART_SAMPLE_INTERVAL_MS: i64 = 5_000;

/// Chart samples kept, most recent first to survive.
pub const MAX_CHART_SAMPLES: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Refused lifecycle transition. The session is left unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session not running")]
    NotRunning,

    #[error("Session not paused")]
    NotPaused,

    #[error("Session not active")]
    NotActive,
}

/// Metrics returned after every ingest and tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricsSnapshot {
    pub status: SessionStatus,
    pub distance_km: f64,
    pub instant_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Distance over active time
    pub avg_speed_kmh: f64,
    /// Active time, pauses excluded
    pub elapsed_ms: i64,
    pub tracked_path: Vec<TrackedPoint>,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub min_altitude_m: Option<f64>,
    pub max_altitude_m: Option<f64>,
    pub splits: Vec<Split>,
}

/// Host-persisted engine state. Every field is optional; absent fields keep
/// their current value on [`TrackingSession::hydrate`].
///
/// Speed smoothing (smoothed speed, median window, low-speed counter, resume
/// flag) is not part of it and restarts cold: after a restart the last speed
/// is stale anyway.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HydrationState {
    pub distance_km: Option<f64>,
    pub max_speed_kmh: Option<f64>,
    pub tracked_path: Option<Vec<TrackedPoint>>,
    pub elevation_gain_m: Option<f64>,
    pub elevation_loss_m: Option<f64>,
    pub min_altitude_m: Option<f64>,
    pub max_altitude_m: Option<f64>,
    pub last_altitude_m: Option<f64>,
    pub splits: Option<Vec<Split>>,
    pub last_km_passed: Option<u32>,
    pub last_fix: Option<Fix>,
    pub elapsed_ms: Option<i64>,
    pub chart_samples: Option<Vec<ChartSample>>,
}

/// One point of the live altitude/speed chart.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChartSample {
    pub elapsed_ms: i64,
    pub altitude_m: Option<f64>,
    pub speed_kmh: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct TrackingSession {
    profile: ActivityProfile,
    status: SessionStatus,
    admission: FixAdmissionFilter,
    jump: JumpRejector,
    distance: DistanceAccumulator,
    speed: SpeedEstimator,
    elevation: ElevationTracker,
    splits: SplitCalculator,
    last_fix: Option<Fix>,
    /// Timestamp of the last fix that passed admission and the jump check
    last_accepted_ms: Option<i64>,
    /// Active time of the last distance commit, for split interpolation
    last_commit_active_ms: i64,
    accumulated_active_ms: i64,
    running_since_ms: Option<i64>,
    /// Latest host time seen by any call
    clock_ms: i64,
    chart: VecDeque<ChartSample>,
}

impl TrackingSession {
    pub fn new(profile: ActivityProfile) -> Self {
        Self {
            profile,
            status: SessionStatus::Idle,
            admission: FixAdmissionFilter::new(profile),
            jump: JumpRejector::new(profile),
            distance: DistanceAccumulator::new(profile),
            speed: SpeedEstimator::new(profile),
            elevation: ElevationTracker::new(),
            splits: SplitCalculator::new(),
            last_fix: None,
            last_accepted_ms: None,
            last_commit_active_ms: 0,
            accumulated_active_ms: 0,
            running_since_ms: None,
            clock_ms: 0,
            chart: VecDeque::new(),
        }
    }

    pub fn profile(&self) -> ActivityProfile {
        self.profile
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn splits(&self) -> &[Split] {
        self.splits.splits()
    }

    pub fn split_calculator(&self) -> &SplitCalculator {
        &self.splits
    }

    pub fn tracked_path(&self) -> &[TrackedPoint] {
        self.distance.path()
    }

    fn touch(&mut self, now_ms: i64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    /// Active time at `now_ms`, paused intervals excluded.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        let running = self
            .running_since_ms
            .map_or(0, |since| now_ms.saturating_sub(since).max(0));
        self.accumulated_active_ms.saturating_add(running)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn start(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Idle {
            warn!("[Session] start refused while {:?}", self.status);
            return Err(TransitionError::AlreadyStarted);
        }
        self.touch(now_ms);
        self.status = SessionStatus::Running;
        self.running_since_ms = Some(now_ms);
        info!("[Session] Started ({})", self.profile.id());
        Ok(())
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Running {
            warn!("[Session] pause refused while {:?}", self.status);
            return Err(TransitionError::NotRunning);
        }
        self.touch(now_ms);
        self.accumulated_active_ms = self.elapsed_ms(now_ms);
        self.running_since_ms = None;
        self.speed.force_stop();
        self.status = SessionStatus::Paused;
        info!("[Session] Paused at {}ms active", self.accumulated_active_ms);
        Ok(())
    }

    /// Resume after a pause. Motion during the pause is not counted: the
    /// next fix only re-anchors the position.
    pub fn resume(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Paused {
            warn!("[Session] resume refused while {:?}", self.status);
            return Err(TransitionError::NotPaused);
        }
        self.touch(now_ms);
        self.running_since_ms = Some(now_ms);
        self.last_fix = None;
        self.status = SessionStatus::Running;
        info!("[Session] Resumed");
        Ok(())
    }

    pub fn stop(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        if !matches!(self.status, SessionStatus::Running | SessionStatus::Paused) {
            warn!("[Session] stop refused while {:?}", self.status);
            return Err(TransitionError::NotActive);
        }
        self.touch(now_ms);
        self.accumulated_active_ms = self.elapsed_ms(now_ms);
        self.running_since_ms = None;
        self.speed.force_stop();
        self.status = SessionStatus::Stopped;
        info!(
            "[Session] Stopped: {:.3} km in {}ms",
            self.distance.total_km(),
            self.accumulated_active_ms
        );
        Ok(())
    }

    /// Zero every component and return to `Idle`. Valid from any state.
    pub fn reset(&mut self) {
        self.distance.reset();
        self.speed.reset();
        self.elevation.reset();
        self.splits.reset();
        self.status = SessionStatus::Idle;
        self.last_fix = None;
        self.last_accepted_ms = None;
        self.last_commit_active_ms = 0;
        self.accumulated_active_ms = 0;
        self.running_since_ms = None;
        self.clock_ms = 0;
        self.chart.clear();
        info!("[Session] Reset");
    }

    // ------------------------------------------------------------------
    // Fix pipeline
    // ------------------------------------------------------------------

    /// Process one fix and return the resulting metrics. Ignored unless the
    /// session is running.
    pub fn ingest(&mut self, fix: &Fix) -> MetricsSnapshot {
        if self.status != SessionStatus::Running {
            debug!("[Session] Fix ignored while {:?}", self.status);
            return self.snapshot();
        }
        self.touch(fix.timestamp);

        let acquiring = self.distance.is_acquiring();
        match self.admission.admit(fix, self.last_fix.as_ref(), acquiring) {
            Admission::First => {
                self.distance.seed(fix);
                self.last_fix = Some(*fix);
                self.last_accepted_ms = Some(fix.timestamp);
                self.last_commit_active_ms = self.elapsed_ms(fix.timestamp);
            }
            Admission::Rejected(reason) => self.on_rejected(fix, reason),
            Admission::Accepted { time_diff_s } => self.on_accepted(fix, time_diff_s),
        }

        self.elevation.update(fix.altitude);
        self.record_chart_sample(fix);
        self.snapshot()
    }

    fn on_rejected(&mut self, fix: &Fix, reason: RejectReason) {
        if reason.advances_position() {
            self.last_fix = Some(*fix);
        }
    }

    fn on_accepted(&mut self, fix: &Fix, time_diff_s: f64) {
        let Some(previous) = self.last_fix.replace(*fix) else {
            return;
        };
        let delta_m = haversine_distance(&previous.point(), &fix.point());

        if let Some(ceiling_m) = self.jump.check(delta_m, time_diff_s, fix.accuracy) {
            self.on_rejected(fix, RejectReason::Teleport { delta_m, ceiling_m });
            return;
        }
        self.last_accepted_ms = Some(fix.timestamp);

        let previous_km = self.distance.total_km();
        if self.distance.commit(delta_m, fix) {
            let active_ms = self.elapsed_ms(fix.timestamp);
            self.splits.on_distance(
                previous_km,
                self.last_commit_active_ms,
                self.distance.total_km(),
                active_ms,
            );
            self.last_commit_active_ms = active_ms;
        }

        self.speed.update(&SpeedSample {
            delta_m,
            time_diff_s,
            accuracy: fix.accuracy,
            native_kmh: fix.native_speed_kmh(),
        });
    }

    fn record_chart_sample(&mut self, fix: &Fix) {
        let elapsed_ms = self.elapsed_ms(fix.timestamp);
        let due = self
            .chart
            .back()
            .map_or(true, |last| {
                elapsed_ms.saturating_sub(last.elapsed_ms) >= CHART_SAMPLE_INTERVAL_MS
            });
        if !due {
            return;
        }
        self.chart.push_back(ChartSample {
            elapsed_ms,
            altitude_m: fix.altitude.filter(|a| a.is_finite()),
            speed_kmh: self.speed.instant_kmh(),
            distance_km: self.distance.total_km(),
        });
        while self.chart.len() > MAX_CHART_SAMPLES {
            self.chart.pop_front();
        }
    }

    /// Host-driven timer. Forces speed to zero once no fix has been accepted
    /// for more than [`STALE_AFTER_MS`].
    pub fn tick(&mut self, now_ms: i64) -> MetricsSnapshot {
        self.touch(now_ms);
        if self.status == SessionStatus::Running && self.speed.instant_kmh() > 0.0 {
            if let Some(last_ms) = self.last_accepted_ms {
                let silent_ms = now_ms.saturating_sub(last_ms);
                if silent_ms > STALE_AFTER_MS {
                    info!("[Session] No fix for {}ms, speed forced to 0", silent_ms);
                    self.speed.force_stop();
                }
            }
        }
        self.snapshot()
    }

    /// User-triggered split at the current distance. `None` when debounced or
    /// when the session is not running.
    pub fn manual_split(&mut self, now_ms: i64) -> Option<Split> {
        if self.status != SessionStatus::Running {
            return None;
        }
        self.touch(now_ms);
        let active_ms = self.elapsed_ms(now_ms);
        self.splits.manual(self.distance.total_km(), active_ms)
    }

    // ------------------------------------------------------------------
    // Output and persistence
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> MetricsSnapshot {
        let elevation = self.elevation.state();
        let distance_km = self.distance.total_km();
        let elapsed_ms = self.elapsed_ms(self.clock_ms);
        let avg_speed_kmh = if elapsed_ms > 0 {
            distance_km / (elapsed_ms as f64 / 3_600_000.0)
        } else {
            0.0
        };

        MetricsSnapshot {
            status: self.status,
            distance_km,
            instant_speed_kmh: self.speed.instant_kmh(),
            max_speed_kmh: self.speed.max_kmh(),
            avg_speed_kmh,
            elapsed_ms,
            tracked_path: self.distance.path().to_vec(),
            elevation_gain_m: elevation.gain_m,
            elevation_loss_m: elevation.loss_m,
            min_altitude_m: elevation.min_altitude_m,
            max_altitude_m: elevation.max_altitude_m,
            splits: self.splits.splits().to_vec(),
        }
    }

    pub fn chart_samples(&self) -> Vec<ChartSample> {
        self.chart.iter().copied().collect()
    }

    /// Everything [`hydrate`](Self::hydrate) needs to rebuild this session.
    pub fn export_state(&self) -> HydrationState {
        let elevation = self.elevation.state();
        HydrationState {
            distance_km: Some(self.distance.total_km()),
            max_speed_kmh: Some(self.speed.max_kmh()),
            tracked_path: Some(self.distance.path().to_vec()),
            elevation_gain_m: Some(elevation.gain_m),
            elevation_loss_m: Some(elevation.loss_m),
            min_altitude_m: elevation.min_altitude_m,
            max_altitude_m: elevation.max_altitude_m,
            last_altitude_m: elevation.last_altitude_m,
            splits: Some(self.splits.splits().to_vec()),
            last_km_passed: Some(self.splits.last_km_passed()),
            last_fix: self.last_fix,
            elapsed_ms: Some(self.elapsed_ms(self.clock_ms)),
            chart_samples: Some(self.chart_samples()),
        }
    }

    /// Restore host-persisted state. Not validated beyond its shape.
    pub fn hydrate(&mut self, state: HydrationState) {
        self.distance.restore(state.distance_km, state.tracked_path);
        if let Some(max_kmh) = state.max_speed_kmh {
            self.speed.restore_max(max_kmh);
        }
        self.elevation.restore(
            state.elevation_gain_m,
            state.elevation_loss_m,
            state.min_altitude_m,
            state.max_altitude_m,
            state.last_altitude_m,
        );
        self.splits.restore(state.splits, state.last_km_passed);
        if let Some(fix) = state.last_fix {
            self.last_fix = Some(fix);
            self.last_accepted_ms = Some(fix.timestamp);
        }
        if let Some(elapsed_ms) = state.elapsed_ms {
            self.accumulated_active_ms = elapsed_ms;
            self.last_commit_active_ms = elapsed_ms;
            if self.running_since_ms.is_some() {
                self.running_since_ms = Some(self.clock_ms);
            }
        }
        if let Some(samples) = state.chart_samples {
            let skip = samples.len().saturating_sub(MAX_CHART_SAMPLES);
            self.chart = samples.into_iter().skip(skip).collect();
        }
        info!(
            "[Session] Hydrated: {:.3} km, {} splits",
            self.distance.total_km(),
            self.splits.splits().len()
        );
    }

    pub fn summary(&self, config: &SummaryConfig) -> Option<ActivitySummary> {
        ActivitySummary::from_session(self, config)
    }
}
