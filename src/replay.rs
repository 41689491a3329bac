//! Offline replay of recorded fix sequences.
//!
//! Used to recompute metrics for archived activities (for example after a
//! threshold change) and to exercise the whole pipeline in tests.

use log::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::profile::ActivityProfile;
use crate::session::{MetricsSnapshot, TrackingSession};
use crate::summary::{ActivitySummary, SummaryConfig};
use crate::Fix;

/// A recorded activity: raw fixes in arrival order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordedTrack {
    pub activity_id: String,
    pub profile: ActivityProfile,
    pub fixes: Vec<Fix>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayResult {
    pub activity_id: String,
    pub snapshot: MetricsSnapshot,
    pub summary: Option<ActivitySummary>,
}

/// Run a track through a fresh session, started at the first fix and
/// stopped at the last one.
///
/// # Example
/// ```
/// use activity_kinematics::{ActivityProfile, Fix, RecordedTrack, replay_track};
///
/// let fixes = (0..20)
///     .map(|i| Fix::new(-20.8789 + i as f64 * 0.00009, 55.4481, i * 5_000).with_accuracy(5.0))
///     .collect();
/// let track = RecordedTrack {
///     activity_id: "morning-walk".to_string(),
///     profile: ActivityProfile::Walking,
///     fixes,
/// };
///
/// let result = replay_track(&track);
/// assert!(result.snapshot.distance_km > 0.18);
/// assert!(result.summary.is_some());
/// ```
pub fn replay_track(track: &RecordedTrack) -> ReplayResult {
    replay_track_with_config(track, &SummaryConfig::default())
}

pub fn replay_track_with_config(track: &RecordedTrack, config: &SummaryConfig) -> ReplayResult {
    let start_ms = track.fixes.first().map_or(0, |f| f.timestamp);
    let end_ms = track
        .fixes
        .iter()
        .map(|f| f.timestamp)
        .max()
        .unwrap_or(start_ms);

    let mut session = TrackingSession::new(track.profile);
    // A fresh session is idle, so neither transition can be refused
    let _ = session.start(start_ms);
    for fix in &track.fixes {
        session.ingest(fix);
    }
    let _ = session.stop(end_ms);

    ReplayResult {
        activity_id: track.activity_id.clone(),
        snapshot: session.snapshot(),
        summary: session.summary(config),
    }
}

/// Replay many tracks. Runs in parallel with the `parallel` feature.
pub fn replay_tracks(tracks: &[RecordedTrack]) -> Vec<ReplayResult> {
    let start = std::time::Instant::now();

    #[cfg(feature = "parallel")]
    let results: Vec<ReplayResult> = {
        use rayon::prelude::*;
        tracks.par_iter().map(replay_track).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<ReplayResult> = tracks.iter().map(replay_track).collect();

    info!(
        "[Replay] Replayed {} tracks in {:?}",
        results.len(),
        start.elapsed()
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_track(id: &str, profile: ActivityProfile, n: i64, interval_ms: i64) -> RecordedTrack {
        RecordedTrack {
            activity_id: id.to_string(),
            profile,
            fixes: (0..n)
                .map(|i| {
                    Fix::new(-20.8789 + i as f64 * 0.00009, 55.4481, 1_000_000 + i * interval_ms)
                        .with_accuracy(5.0)
                })
                .collect(),
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let track = straight_track("a", ActivityProfile::Trail, 50, 3_000);
        assert_eq!(replay_track(&track), replay_track(&track));
    }

    #[test]
    fn test_replay_uses_track_clock() {
        let track = straight_track("a", ActivityProfile::Trail, 11, 3_000);
        let result = replay_track(&track);
        assert_eq!(result.snapshot.elapsed_ms, 30_000);
        assert!((result.snapshot.distance_km * 1000.0 - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_replay_empty_track() {
        let track = RecordedTrack {
            activity_id: "empty".to_string(),
            profile: ActivityProfile::Generic,
            fixes: Vec::new(),
        };
        let result = replay_track(&track);
        assert_eq!(result.snapshot.distance_km, 0.0);
        assert!(result.summary.is_none());
    }

    #[test]
    fn test_replay_tracks_keeps_order() {
        let tracks = vec![
            straight_track("first", ActivityProfile::Running, 30, 2_000),
            straight_track("second", ActivityProfile::Cycling, 30, 1_000),
            straight_track("third", ActivityProfile::Hiking, 30, 5_000),
        ];
        let results = replay_tracks(&tracks);
        let ids: Vec<&str> = results.iter().map(|r| r.activity_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
