//! Elevation gain/loss with an altitude-band noise threshold.
//!
//! Altitude noise grows with elevation (thinner air for barometers, worse
//! vertical geometry for GNSS), so the minimum step that counts towards
//! gain or loss grows with it.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Persisted elevation bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElevationState {
    pub gain_m: f64,
    pub loss_m: f64,
    pub min_altitude_m: Option<f64>,
    pub max_altitude_m: Option<f64>,
    pub last_altitude_m: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ElevationTracker {
    state: ElevationState,
}

impl ElevationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest step (meters) counted at `altitude_m`.
    ///
    /// # Example
    /// ```
    /// use activity_kinematics::ElevationTracker;
    ///
    /// assert_eq!(ElevationTracker::threshold_for(450.0), 1.0);
    /// assert_eq!(ElevationTracker::threshold_for(1500.0), 2.0);
    /// assert_eq!(ElevationTracker::threshold_for(2400.0), 3.0);
    /// ```
    pub fn threshold_for(altitude_m: f64) -> f64 {
        if altitude_m > 2000.0 {
            3.0
        } else if altitude_m > 1000.0 {
            2.0
        } else {
            1.0
        }
    }

    pub fn state(&self) -> ElevationState {
        self.state
    }

    pub fn gain_m(&self) -> f64 {
        self.state.gain_m
    }

    pub fn loss_m(&self) -> f64 {
        self.state.loss_m
    }

    /// Feed one altitude sample. Absent or non-finite altitudes are ignored.
    pub fn update(&mut self, altitude_m: Option<f64>) {
        let Some(altitude) = altitude_m.filter(|a| a.is_finite()) else {
            return;
        };

        let state = &mut self.state;
        let Some(last) = state.last_altitude_m else {
            state.min_altitude_m = Some(altitude);
            state.max_altitude_m = Some(altitude);
            state.last_altitude_m = Some(altitude);
            return;
        };

        state.min_altitude_m = Some(state.min_altitude_m.map_or(altitude, |m| m.min(altitude)));
        state.max_altitude_m = Some(state.max_altitude_m.map_or(altitude, |m| m.max(altitude)));

        let delta = altitude - last;
        let threshold = Self::threshold_for(altitude);
        if delta.abs() > threshold {
            if delta > 0.0 {
                state.gain_m += delta;
            } else {
                state.loss_m += -delta;
            }
        } else {
            debug!("[Elevation] {:+.2}m within {:.0}m noise band", delta, threshold);
        }

        // Always advance, so sub-threshold noise never compounds
        state.last_altitude_m = Some(altitude);
    }

    /// Overwrite the fields that are present, keep the others.
    pub fn restore(
        &mut self,
        gain_m: Option<f64>,
        loss_m: Option<f64>,
        min_altitude_m: Option<f64>,
        max_altitude_m: Option<f64>,
        last_altitude_m: Option<f64>,
    ) {
        if let Some(gain) = gain_m {
            self.state.gain_m = gain;
        }
        if let Some(loss) = loss_m {
            self.state.loss_m = loss;
        }
        if min_altitude_m.is_some() {
            self.state.min_altitude_m = min_altitude_m;
        }
        if max_altitude_m.is_some() {
            self.state.max_altitude_m = max_altitude_m;
        }
        if last_altitude_m.is_some() {
            self.state.last_altitude_m = last_altitude_m;
        }
    }

    pub fn reset(&mut self) {
        self.state = ElevationState::default();
    }
}
