//! Fix admission: decides whether an incoming fix is usable at all.
//!
//! Rejections here are expected and frequent (duplicate callbacks, clock
//! jitter, bad sky view), so they are reported as values and logged at
//! debug level rather than surfaced as errors.

use log::debug;

use crate::profile::{ActivityProfile, ProfileParams};
use crate::Fix;

/// Accuracy gate floor while the receiver is still acquiring (meters).
pub const ACQUISITION_ACCURACY_FLOOR_M: f64 = 60.0;

/// Uniform accuracy ceiling for high-frequency profiles (meters).
pub const HIGH_FREQUENCY_ACCURACY_CEILING_M: f64 = 80.0;

/// Why a fix was kept out of the metrics computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Same timestamp as the previous fix
    DuplicateTimestamp,
    /// Timestamp at or before the previous fix
    NonPositiveInterval,
    /// Reported accuracy worse than the current gate
    PoorAccuracy { accuracy_m: f64, threshold_m: f64 },
    /// Implied motion exceeds the plausible per-second ceiling
    Teleport { delta_m: f64, ceiling_m: f64 },
}

impl RejectReason {
    /// Whether the previous-position bookkeeping should move to the rejected
    /// fix. Timing rejections keep the old anchor so the next interval is
    /// still measured against a sane clock.
    pub fn advances_position(&self) -> bool {
        matches!(self, RejectReason::PoorAccuracy { .. } | RejectReason::Teleport { .. })
    }
}

/// Outcome of running a fix through [`FixAdmissionFilter::admit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// No previous fix: this one only establishes the starting position.
    First,
    /// Usable fix, `time_diff_s` seconds after the previous one.
    Accepted { time_diff_s: f64 },
    Rejected(RejectReason),
}

/// Accuracy, duplicate and interval gate.
#[derive(Debug, Clone)]
pub struct FixAdmissionFilter {
    params: ProfileParams,
}

impl FixAdmissionFilter {
    pub fn new(profile: ActivityProfile) -> Self {
        Self { params: profile.params() }
    }

    /// Accuracy gate for the current phase.
    ///
    /// High-frequency profiles always allow at least
    /// [`HIGH_FREQUENCY_ACCURACY_CEILING_M`]. Other profiles relax to
    /// [`ACQUISITION_ACCURACY_FLOOR_M`] while `acquiring` and use their base
    /// gate afterwards.
    pub fn accuracy_threshold(&self, acquiring: bool) -> f64 {
        let base = self.params.accuracy_threshold_m;
        if self.params.is_high_frequency {
            base.max(HIGH_FREQUENCY_ACCURACY_CEILING_M)
        } else if acquiring {
            base.max(ACQUISITION_ACCURACY_FLOOR_M)
        } else {
            base
        }
    }

    /// Classify `fix` against the previous usable position.
    ///
    /// `acquiring` is true during the initial acquisition phase (short path or
    /// little distance so far).
    pub fn admit(&self, fix: &Fix, last: Option<&Fix>, acquiring: bool) -> Admission {
        if let Some(last) = last {
            if fix.timestamp == last.timestamp {
                debug!("[Admission] Duplicate fix at t={}", fix.timestamp);
                return Admission::Rejected(RejectReason::DuplicateTimestamp);
            }

            // Gaps that do not fit in i64 are treated like a broken clock
            let time_diff_s = match fix.timestamp.checked_sub(last.timestamp) {
                Some(diff_ms) if diff_ms > 0 => diff_ms as f64 / 1000.0,
                _ => {
                    debug!(
                        "[Admission] Unusable interval {} -> {}, fix dropped",
                        last.timestamp, fix.timestamp
                    );
                    return Admission::Rejected(RejectReason::NonPositiveInterval);
                }
            };

            if let Some(reason) = self.check_accuracy(fix, acquiring) {
                return Admission::Rejected(reason);
            }

            return Admission::Accepted { time_diff_s };
        }

        match self.check_accuracy(fix, acquiring) {
            Some(reason) => Admission::Rejected(reason),
            None => Admission::First,
        }
    }

    fn check_accuracy(&self, fix: &Fix, acquiring: bool) -> Option<RejectReason> {
        let accuracy_m = fix.accuracy?;
        let threshold_m = self.accuracy_threshold(acquiring);
        if accuracy_m > threshold_m {
            debug!(
                "[Admission] Accuracy {:.1}m above gate {:.1}m, metrics skipped",
                accuracy_m, threshold_m
            );
            return Some(RejectReason::PoorAccuracy { accuracy_m, threshold_m });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_at(ts: i64, accuracy: f64) -> Fix {
        Fix::new(-20.8789, 55.4481, ts).with_accuracy(accuracy)
    }

    #[test]
    fn test_first_fix_establishes_position() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Trail);
        assert_eq!(filter.admit(&fix_at(1_000, 5.0), None, true), Admission::First);
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Trail);
        let last = fix_at(1_000, 5.0);
        assert_eq!(
            filter.admit(&fix_at(1_000, 5.0), Some(&last), false),
            Admission::Rejected(RejectReason::DuplicateTimestamp)
        );
    }

    #[test]
    fn test_clock_regression_rejected_without_advancing() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Trail);
        let last = fix_at(5_000, 5.0);
        let verdict = filter.admit(&fix_at(4_000, 5.0), Some(&last), false);
        assert_eq!(verdict, Admission::Rejected(RejectReason::NonPositiveInterval));
        assert!(!RejectReason::NonPositiveInterval.advances_position());
    }

    #[test]
    fn test_overflowing_interval_rejected() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Trail);
        let last = fix_at(i64::MIN + 1, 5.0);
        assert_eq!(
            filter.admit(&fix_at(i64::MAX, 5.0), Some(&last), false),
            Admission::Rejected(RejectReason::NonPositiveInterval)
        );
        let last = fix_at(1_000, 5.0);
        assert_eq!(
            filter.admit(&fix_at(i64::MIN + 1, 5.0), Some(&last), false),
            Admission::Rejected(RejectReason::NonPositiveInterval)
        );
    }

    #[test]
    fn test_accepted_reports_interval() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Trail);
        let last = fix_at(1_000, 5.0);
        assert_eq!(
            filter.admit(&fix_at(3_500, 5.0), Some(&last), false),
            Admission::Accepted { time_diff_s: 2.5 }
        );
    }

    #[test]
    fn test_poor_accuracy_rejected_for_default_profile() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Cycling);
        let last = fix_at(1_000, 5.0);
        let verdict = filter.admit(&fix_at(2_000, 100.0), Some(&last), true);
        match verdict {
            Admission::Rejected(reason @ RejectReason::PoorAccuracy { .. }) => {
                assert!(reason.advances_position());
            }
            other => panic!("expected accuracy rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_acquisition_relaxes_gate() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Cycling);
        let last = fix_at(1_000, 5.0);
        let noisy = fix_at(2_000, 40.0);
        assert!(matches!(filter.admit(&noisy, Some(&last), true), Admission::Accepted { .. }));
        assert!(matches!(filter.admit(&noisy, Some(&last), false), Admission::Rejected(_)));
    }

    #[test]
    fn test_high_frequency_uses_wide_ceiling() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Running);
        assert_eq!(filter.accuracy_threshold(false), HIGH_FREQUENCY_ACCURACY_CEILING_M);
        let last = fix_at(1_000, 5.0);
        assert!(matches!(
            filter.admit(&fix_at(2_000, 70.0), Some(&last), false),
            Admission::Accepted { .. }
        ));
        assert!(matches!(
            filter.admit(&fix_at(3_000, 95.0), Some(&last), false),
            Admission::Rejected(RejectReason::PoorAccuracy { .. })
        ));
    }

    #[test]
    fn test_missing_accuracy_is_admitted() {
        let filter = FixAdmissionFilter::new(ActivityProfile::Cycling);
        let last = Fix::new(-20.8789, 55.4481, 1_000);
        let fix = Fix::new(-20.8788, 55.4481, 2_000);
        assert!(matches!(filter.admit(&fix, Some(&last), false), Admission::Accepted { .. }));
    }
}
