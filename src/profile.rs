//! Per-sport tuning of the estimation pipeline.
//!
//! A profile is picked once when the activity starts and stays fixed for the
//! lifetime of the session. Adding a sport means adding a variant here; every
//! threshold consumer matches on [`ProfileParams`], never on free-form data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed catalog of supported activity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActivityProfile {
    /// Road running. High-frequency profile: relaxed gates, no smoothing.
    Running,
    /// Trail running on rough terrain.
    Trail,
    Walking,
    Hiking,
    MountainBiking,
    /// Road cycling.
    Cycling,
    /// Fallback for sports without dedicated tuning (paddling, climbing, ...).
    Generic,
}

/// Numeric thresholds a profile feeds into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileParams {
    /// Base horizontal accuracy gate (meters, 1 sigma)
    pub accuracy_threshold_m: f64,
    /// Base minimum movement committed to distance (meters)
    pub min_distance_m: f64,
    /// Highest plausible sustained speed (km/h). Always > 0.
    pub max_speed_kmh: f64,
    /// Permissive profile: larger gates, raw speed surfaced without smoothing
    pub is_high_frequency: bool,
    /// Upper bound on the speed median window
    pub speed_window: u32,
}

impl ActivityProfile {
    pub const ALL: [ActivityProfile; 7] = [
        ActivityProfile::Running,
        ActivityProfile::Trail,
        ActivityProfile::Walking,
        ActivityProfile::Hiking,
        ActivityProfile::MountainBiking,
        ActivityProfile::Cycling,
        ActivityProfile::Generic,
    ];

    /// Stable identifier, suitable for persistence and backend payloads.
    pub fn id(&self) -> &'static str {
        match self {
            ActivityProfile::Running => "running",
            ActivityProfile::Trail => "trail",
            ActivityProfile::Walking => "walking",
            ActivityProfile::Hiking => "hiking",
            ActivityProfile::MountainBiking => "mountain_biking",
            ActivityProfile::Cycling => "cycling",
            ActivityProfile::Generic => "generic",
        }
    }

    /// Thresholds for this profile.
    ///
    /// # Example
    /// ```
    /// use activity_kinematics::ActivityProfile;
    ///
    /// let cycling = ActivityProfile::Cycling.params();
    /// assert!(cycling.max_speed_kmh > ActivityProfile::Hiking.params().max_speed_kmh);
    /// ```
    pub fn params(&self) -> ProfileParams {
        let (accuracy_threshold_m, min_distance_m, max_speed_kmh) = match self {
            ActivityProfile::Running => (15.0, 1.0, 25.0),
            ActivityProfile::Trail => (20.0, 1.5, 20.0),
            ActivityProfile::Walking => (20.0, 1.0, 8.0),
            ActivityProfile::Hiking => (25.0, 1.0, 10.0),
            ActivityProfile::MountainBiking => (20.0, 3.0, 45.0),
            ActivityProfile::Cycling => (15.0, 3.0, 50.0),
            ActivityProfile::Generic => (20.0, 2.0, 35.0),
        };
        let is_high_frequency = matches!(self, ActivityProfile::Running);

        ProfileParams {
            accuracy_threshold_m,
            min_distance_m,
            max_speed_kmh,
            is_high_frequency,
            speed_window: if is_high_frequency { 1 } else { 2 },
        }
    }

    /// Slow on-foot profiles lower the movement quantum while the receiver
    /// is still acquiring, so the first metres of a walk are not lost.
    pub fn captures_early_motion(&self) -> bool {
        matches!(self, ActivityProfile::Walking | ActivityProfile::Hiking)
    }

    /// Map a host sport label onto a profile. Accepts English names and the
    /// French labels used by the mobile app; unknown labels give `Generic`.
    ///
    /// # Example
    /// ```
    /// use activity_kinematics::ActivityProfile;
    ///
    /// assert_eq!(ActivityProfile::from_sport_name("Course"), ActivityProfile::Running);
    /// assert_eq!(ActivityProfile::from_sport_name("VTT"), ActivityProfile::MountainBiking);
    /// assert_eq!(ActivityProfile::from_sport_name("Kayak"), ActivityProfile::Generic);
    /// ```
    pub fn from_sport_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();

        // Order matters: "vtt" and "mountain bike" before the generic bike labels.
        if lower.contains("vtt") || lower.contains("mtb") || lower.contains("mountain") {
            return ActivityProfile::MountainBiking;
        }
        if lower.contains("vélo") || lower.contains("velo") || lower.contains("cycl")
            || lower.contains("bike")
        {
            return ActivityProfile::Cycling;
        }
        if lower.contains("trail") {
            return ActivityProfile::Trail;
        }
        if lower.contains("randonn") || lower.contains("hik") {
            return ActivityProfile::Hiking;
        }
        if lower.contains("marche") || lower.contains("walk") {
            return ActivityProfile::Walking;
        }
        if lower.contains("course") || lower.contains("run") {
            return ActivityProfile::Running;
        }

        ActivityProfile::Generic
    }
}

impl Default for ActivityProfile {
    fn default() -> Self {
        ActivityProfile::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_speed_is_positive_for_every_profile() {
        for profile in ActivityProfile::ALL {
            assert!(profile.params().max_speed_kmh > 0.0, "{:?}", profile);
        }
    }

    #[test]
    fn test_only_running_is_high_frequency() {
        for profile in ActivityProfile::ALL {
            let params = profile.params();
            assert_eq!(params.is_high_frequency, profile == ActivityProfile::Running);
            let expected_window = if params.is_high_frequency { 1 } else { 2 };
            assert_eq!(params.speed_window, expected_window);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<&str> = ActivityProfile::ALL.iter().map(|p| p.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ActivityProfile::ALL.len());
    }

    #[test]
    fn test_from_sport_name_french_labels() {
        assert_eq!(ActivityProfile::from_sport_name("Course"), ActivityProfile::Running);
        assert_eq!(ActivityProfile::from_sport_name("Trail"), ActivityProfile::Trail);
        assert_eq!(ActivityProfile::from_sport_name("Marche"), ActivityProfile::Walking);
        assert_eq!(ActivityProfile::from_sport_name("Randonnée"), ActivityProfile::Hiking);
        assert_eq!(ActivityProfile::from_sport_name("VTT"), ActivityProfile::MountainBiking);
        assert_eq!(ActivityProfile::from_sport_name("Vélo"), ActivityProfile::Cycling);
        assert_eq!(ActivityProfile::from_sport_name("Escalade"), ActivityProfile::Generic);
    }

    #[test]
    fn test_from_sport_name_english_labels() {
        assert_eq!(ActivityProfile::from_sport_name(" running "), ActivityProfile::Running);
        assert_eq!(ActivityProfile::from_sport_name("Mountain Bike"), ActivityProfile::MountainBiking);
        assert_eq!(ActivityProfile::from_sport_name("Road cycling"), ActivityProfile::Cycling);
        assert_eq!(ActivityProfile::from_sport_name("Hiking"), ActivityProfile::Hiking);
        assert_eq!(ActivityProfile::from_sport_name("walk"), ActivityProfile::Walking);
    }
}
