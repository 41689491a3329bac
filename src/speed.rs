//! Instantaneous speed estimation.
//!
//! Every fix that produced a usable delta yields a raw speed candidate
//! (device-reported speed or distance over time). The candidate goes through
//! a short median window and an exponential moving average, then a low-speed
//! clamp pins the display to zero while the user stands still.
//!
//! High-frequency profiles skip the EMA and surface the raw candidate
//! directly, trading smoothness for responsiveness.

use std::collections::VecDeque;

use log::debug;

use crate::profile::{ActivityProfile, ProfileParams};

/// Speeds under this are noise, not slow motion (km/h).
pub const NOISE_FLOOR_KMH: f64 = 0.5;

/// Weight of the previous smoothed value in the EMA.
pub const EMA_PREVIOUS_WEIGHT: f64 = 0.4;

/// Without an accepted fix for this long, speed is forced to zero (ms).
pub const STALE_AFTER_MS: i64 = 6_000;

/// Native speed is trusted only below this accuracy (meters).
const NATIVE_SPEED_MAX_ACCURACY_M: f64 = 50.0;

/// Resume-from-stop triggers.
const RESUME_NATIVE_KMH: f64 = 1.0;
const RESUME_DELTA_M: f64 = 5.0;

/// Accuracy at or under which default profiles use the wider window (meters).
const WIDE_WINDOW_MAX_ACCURACY_M: f64 = 20.0;

/// Inputs derived from one accepted fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// Straight-line distance from the previous fix (meters)
    pub delta_m: f64,
    /// Seconds since the previous fix, > 0
    pub time_diff_s: f64,
    /// Reported horizontal accuracy (meters)
    pub accuracy: Option<f64>,
    /// Device-reported speed converted to km/h
    pub native_kmh: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    params: ProfileParams,
    window: VecDeque<f64>,
    instant_kmh: f64,
    max_kmh: f64,
    low_speed_ms: f64,
    resuming: bool,
}

impl SpeedEstimator {
    pub fn new(profile: ActivityProfile) -> Self {
        let params = profile.params();
        Self {
            params,
            window: VecDeque::with_capacity(params.speed_window.max(1) as usize + 1),
            instant_kmh: 0.0,
            max_kmh: 0.0,
            low_speed_ms: 0.0,
            resuming: false,
        }
    }

    /// Displayed speed (km/h).
    pub fn instant_kmh(&self) -> f64 {
        self.instant_kmh
    }

    pub fn max_kmh(&self) -> f64 {
        self.max_kmh
    }

    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    fn interval_floor_s(&self) -> f64 {
        if self.params.is_high_frequency { 0.2 } else { 0.5 }
    }

    fn low_speed_clamp_ms(&self) -> f64 {
        if self.params.is_high_frequency { 200.0 } else { 300.0 }
    }

    fn is_plausible(&self, kmh: f64) -> bool {
        kmh.is_finite() && kmh >= NOISE_FLOOR_KMH && kmh <= 2.0 * self.params.max_speed_kmh
    }

    fn window_capacity(&self, accuracy: Option<f64>) -> usize {
        let widest = self.params.speed_window.max(1) as usize;
        if self.params.is_high_frequency {
            return 1;
        }
        match accuracy {
            Some(a) if a <= WIDE_WINDOW_MAX_ACCURACY_M => widest,
            _ => 1,
        }
    }

    /// Raw speed candidate for a sample, in km/h.
    ///
    /// Returns 0 for sensor faults (above twice the profile maximum) and for
    /// values under [`NOISE_FLOOR_KMH`].
    pub fn raw_speed_kmh(&self, sample: &SpeedSample) -> f64 {
        let path_kmh =
            (sample.delta_m / sample.time_diff_s.max(self.interval_floor_s()) * 3.6).max(0.0);

        let trusted_native = sample
            .native_kmh
            .filter(|_| sample.accuracy.map_or(false, |a| a < NATIVE_SPEED_MAX_ACCURACY_M));

        let raw = match trusted_native {
            Some(native) if self.params.is_high_frequency => native.max(path_kmh),
            Some(native) => native,
            None => path_kmh,
        };

        if self.is_plausible(raw) { raw } else { 0.0 }
    }

    /// Feed one sample and return the speed to display (km/h).
    pub fn update(&mut self, sample: &SpeedSample) -> f64 {
        let raw = self.raw_speed_kmh(sample);

        let stopped = self.instant_kmh == 0.0;
        let resume = stopped
            && (sample.native_kmh.map_or(false, |v| v > RESUME_NATIVE_KMH)
                || sample.delta_m > RESUME_DELTA_M);
        let mut seeded = false;
        if resume && !self.resuming {
            self.window.clear();
            if let Some(native) = sample.native_kmh.filter(|v| self.is_plausible(*v)) {
                self.window.push_back(native);
                seeded = true;
            }
            self.low_speed_ms = 0.0;
            debug!(
                "[Speed] Resume from stop (native {:?} km/h, delta {:.1}m)",
                sample.native_kmh, sample.delta_m
            );
        }
        self.resuming = resume;

        // The seed must survive this sample even in a single-slot window
        let capacity = self.window_capacity(sample.accuracy);
        let capacity = if seeded { capacity.max(2) } else { capacity };
        self.window.push_back(raw);
        while self.window.len() > capacity {
            self.window.pop_front();
        }
        let median = median(&self.window);

        let candidate = if self.params.is_high_frequency {
            raw
        } else if stopped {
            median
        } else {
            (1.0 - EMA_PREVIOUS_WEIGHT) * median + EMA_PREVIOUS_WEIGHT * self.instant_kmh
        };

        if raw < NOISE_FLOOR_KMH && !self.resuming {
            self.low_speed_ms += sample.time_diff_s * 1000.0;
        } else {
            self.low_speed_ms = 0.0;
        }

        let mut displayed = candidate;
        if self.low_speed_ms >= self.low_speed_clamp_ms() {
            displayed = 0.0;
            self.window.clear();
        }
        if !(displayed >= NOISE_FLOOR_KMH) {
            displayed = 0.0;
        }

        self.instant_kmh = displayed;
        if displayed > NOISE_FLOOR_KMH {
            self.max_kmh = self.max_kmh.max(displayed);
        }
        displayed
    }

    /// Signal loss: drop displayed speed to zero, keep the maximum.
    pub fn force_stop(&mut self) {
        self.instant_kmh = 0.0;
        self.window.clear();
        self.low_speed_ms = 0.0;
        self.resuming = false;
    }

    pub fn restore_max(&mut self, max_kmh: f64) {
        self.max_kmh = max_kmh;
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.instant_kmh = 0.0;
        self.max_kmh = 0.0;
        self.low_speed_ms = 0.0;
        self.resuming = false;
    }
}

fn median(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
