//! Teleport rejection.
//!
//! A fix whose straight-line distance from the previous one implies an
//! impossible speed is a receiver glitch. The ceiling loosens when the
//! receiver reports poor accuracy, so genuinely fast motion measured by a
//! noisy receiver is not thrown away.

use log::debug;

use crate::profile::ActivityProfile;

/// Accuracy above which the loose ceiling applies (meters).
pub const POOR_ACCURACY_M: f64 = 50.0;

/// Per-second distance ceilings (m/s) for default profiles.
const DEFAULT_CEILING_GOOD_MPS: f64 = 20.0;
const DEFAULT_CEILING_POOR_MPS: f64 = 50.0;

/// Per-second distance ceilings (m/s) for high-frequency profiles.
const HIGH_FREQUENCY_CEILING_GOOD_MPS: f64 = 30.0;
const HIGH_FREQUENCY_CEILING_POOR_MPS: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct JumpRejector {
    high_frequency: bool,
}

impl JumpRejector {
    pub fn new(profile: ActivityProfile) -> Self {
        Self { high_frequency: profile.params().is_high_frequency }
    }

    /// Distance one second of motion may cover at the given accuracy.
    pub fn per_second_ceiling(&self, accuracy: Option<f64>) -> f64 {
        let poor = accuracy.map_or(false, |a| a > POOR_ACCURACY_M);
        match (self.high_frequency, poor) {
            (true, true) => HIGH_FREQUENCY_CEILING_POOR_MPS,
            (true, false) => HIGH_FREQUENCY_CEILING_GOOD_MPS,
            (false, true) => DEFAULT_CEILING_POOR_MPS,
            (false, false) => DEFAULT_CEILING_GOOD_MPS,
        }
    }

    /// Largest delta still considered physical over `time_diff_s`.
    /// Intervals under one second are treated as one second.
    pub fn max_plausible_distance_m(&self, accuracy: Option<f64>, time_diff_s: f64) -> f64 {
        self.per_second_ceiling(accuracy) * time_diff_s.max(1.0)
    }

    /// Returns the ceiling that was exceeded, or `None` for a plausible delta.
    /// A NaN delta counts as a jump.
    pub fn check(&self, delta_m: f64, time_diff_s: f64, accuracy: Option<f64>) -> Option<f64> {
        let ceiling_m = self.max_plausible_distance_m(accuracy, time_diff_s);
        if delta_m <= ceiling_m {
            return None;
        }
        debug!(
            "[Jump] Rejected {:.1}m in {:.2}s (ceiling {:.1}m)",
            delta_m, time_diff_s, ceiling_m
        );
        Some(ceiling_m)
    }
}
