//! Per-kilometer and manual splits.
//!
//! Split times are expressed on the session's active clock (milliseconds of
//! running time since start), so a pause never inflates a split.

use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum spacing between a manual split and the previous split (ms).
pub const MANUAL_SPLIT_DEBOUNCE_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SplitKind {
    /// Emitted when a whole kilometer is crossed
    Auto,
    /// Requested by the user
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Split {
    /// Kilometer mark: whole for automatic splits, two decimals for manual ones
    pub index: f64,
    /// Active time at which the split happened (ms)
    pub occurred_at_ms: i64,
    /// Time since the previous split (ms)
    pub duration_ms: i64,
    pub avg_speed_kmh: f64,
    pub kind: SplitKind,
}

/// Aggregate timing over the automatic splits.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitStats {
    pub best_duration_ms: i64,
    pub worst_duration_ms: i64,
    pub mean_duration_ms: f64,
    pub total_count: u32,
    pub auto_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SplitCalculator {
    splits: Vec<Split>,
    last_km_passed: u32,
}

impl SplitCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn last_km_passed(&self) -> u32 {
        self.last_km_passed
    }

    fn previous_split_ms(&self) -> i64 {
        self.splits.last().map_or(0, |s| s.occurred_at_ms)
    }

    fn last_auto_index(&self) -> f64 {
        self.splits
            .iter()
            .rev()
            .find(|s| s.kind == SplitKind::Auto)
            .map_or(0.0, |s| s.index)
    }

    /// Record the distance moving from `previous_km` (at `previous_ms`) to
    /// `current_km` (at `current_ms`). Returns the automatic splits emitted.
    ///
    /// When several kilometers are crossed at once, the last one is stamped
    /// with `current_ms` and the earlier ones are interpolated along the
    /// segment.
    pub fn on_distance(
        &mut self,
        previous_km: f64,
        previous_ms: i64,
        current_km: f64,
        current_ms: i64,
    ) -> Vec<Split> {
        if !current_km.is_finite() {
            return Vec::new();
        }
        let whole_km = current_km.floor().max(0.0) as u32;
        if whole_km <= self.last_km_passed || whole_km == 0 {
            return Vec::new();
        }

        let span_km = current_km - previous_km;
        let mut emitted = Vec::new();
        for km in (self.last_km_passed + 1)..=whole_km {
            let candidate_ms = if km == whole_km || !(span_km > 0.0) {
                current_ms
            } else {
                let fraction = ((km as f64 - previous_km) / span_km).clamp(0.0, 1.0);
                let span_ms = current_ms.saturating_sub(previous_ms) as f64;
                previous_ms.saturating_add((span_ms * fraction).round() as i64)
            };

            let previous_split_ms = self.previous_split_ms();
            let occurred_at_ms = if !self.splits.is_empty() && candidate_ms <= previous_split_ms {
                previous_split_ms.saturating_add(1)
            } else {
                candidate_ms
            };
            let duration_ms = occurred_at_ms.saturating_sub(previous_split_ms);
            let avg_speed_kmh = if duration_ms > 0 {
                3_600_000.0 / duration_ms as f64
            } else {
                0.0
            };

            let split = Split {
                index: km as f64,
                occurred_at_ms,
                duration_ms,
                avg_speed_kmh,
                kind: SplitKind::Auto,
            };
            info!(
                "[Splits] km {} in {}ms ({:.2} km/h)",
                km, duration_ms, avg_speed_kmh
            );
            self.splits.push(split.clone());
            emitted.push(split);
        }
        self.last_km_passed = whole_km;
        emitted
    }

    /// User-triggered split at `distance_km`. Debounced against the previous
    /// split of either kind.
    ///
    /// # Example
    /// ```
    /// use activity_kinematics::SplitCalculator;
    ///
    /// let mut splits = SplitCalculator::new();
    /// assert!(splits.manual(0.4, 12_000).is_some());
    /// assert!(splits.manual(0.45, 15_000).is_none()); // 3 s later
    /// ```
    pub fn manual(&mut self, distance_km: f64, now_ms: i64) -> Option<Split> {
        let previous_split_ms = self.previous_split_ms();
        let duration_ms = now_ms.saturating_sub(previous_split_ms);
        if duration_ms < MANUAL_SPLIT_DEBOUNCE_MS {
            debug!("[Splits] Manual split ignored, {}ms since previous", duration_ms);
            return None;
        }

        // Same-kilometer manual splits do not move the per-km baseline
        let since_auto_km = distance_km - self.last_auto_index();
        let avg_speed_kmh = if duration_ms > 0 {
            since_auto_km * 3_600_000.0 / duration_ms as f64
        } else {
            0.0
        };

        let split = Split {
            index: (distance_km * 100.0).round() / 100.0,
            occurred_at_ms: now_ms,
            duration_ms,
            avg_speed_kmh,
            kind: SplitKind::Manual,
        };
        info!("[Splits] Manual split at {:.2} km", split.index);
        self.splits.push(split.clone());
        Some(split)
    }

    /// Best, worst and mean automatic split. `None` before the first kilometer.
    pub fn stats(&self) -> Option<SplitStats> {
        let durations: Vec<i64> = self
            .splits
            .iter()
            .filter(|s| s.kind == SplitKind::Auto)
            .map(|s| s.duration_ms)
            .collect();

        let best_duration_ms = *durations.iter().min()?;
        let worst_duration_ms = *durations.iter().max()?;
        let mean_duration_ms = durations.iter().sum::<i64>() as f64 / durations.len() as f64;

        Some(SplitStats {
            best_duration_ms,
            worst_duration_ms,
            mean_duration_ms,
            total_count: self.splits.len() as u32,
            auto_count: durations.len() as u32,
        })
    }

    /// Replace the split list and/or kilometer counter with persisted values.
    /// Without an explicit counter, it is derived from the restored splits.
    pub fn restore(&mut self, splits: Option<Vec<Split>>, last_km_passed: Option<u32>) {
        if let Some(splits) = splits {
            self.splits = splits;
            if last_km_passed.is_none() {
                self.last_km_passed = self.last_auto_index().max(0.0) as u32;
            }
        }
        if let Some(km) = last_km_passed {
            self.last_km_passed = km;
        }
    }

    pub fn reset(&mut self) {
        self.splits.clear();
        self.last_km_passed = 0;
    }
}
