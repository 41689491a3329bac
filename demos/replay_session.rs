//! Replay a synthetic trail run through a tracking session.
//!
//! Run with: cargo run --example replay_session

use activity_kinematics::{
    ActivityProfile, Fix, SessionStatus, SummaryConfig, TrackingSession,
};

/// Deterministic pseudo-noise in [-1, 1], so the demo output is stable.
fn jitter(i: i64) -> f64 {
    ((i * 7919) % 200) as f64 / 100.0 - 1.0
}

fn main() {
    let mut session = TrackingSession::new(ActivityProfile::from_sport_name("Trail"));
    session.start(0).expect("fresh session starts");

    // ~3 m/s northward with a slow climb, one fix per second for 10 minutes
    let mut last = session.snapshot();
    for i in 0..600i64 {
        let mut fix = Fix::new(
            -20.8789 + i as f64 * 0.000027 + jitter(i) * 0.000005,
            55.4481 + jitter(i + 13) * 0.000005,
            i * 1_000,
        )
        .with_accuracy(4.0 + jitter(i + 29).abs() * 6.0)
        .with_altitude(120.0 + i as f64 * 0.15 + jitter(i + 41));

        // A glitch every two minutes: far away, terrible accuracy
        if i > 0 && i % 120 == 0 {
            fix.latitude += 0.01;
            fix.accuracy = Some(150.0);
        }

        last = session.ingest(&fix);

        if i % 60 == 0 {
            println!(
                "t={:>3}s  dist={:.3} km  speed={:>5.2} km/h  gain={:>5.1} m",
                i,
                last.distance_km,
                last.instant_speed_kmh,
                last.elevation_gain_m
            );
        }
    }

    // Signal lost for 8 seconds
    let stale = session.tick(607_000);
    println!("\nAfter signal loss: speed={:.2} km/h", stale.instant_speed_kmh);

    session.stop(607_000).expect("running session stops");
    assert_eq!(session.status(), SessionStatus::Stopped);

    println!("\nSplits:");
    for split in &last.splits {
        println!(
            "   {:?} {:.2} km  {} ms  {:.2} km/h",
            split.kind, split.index, split.duration_ms, split.avg_speed_kmh
        );
    }

    if let Some(summary) = session.summary(&SummaryConfig::default()) {
        println!("\nSummary ({}):", summary.profile_id);
        println!("   Distance: {:.3} km", summary.distance_km);
        println!("   Duration: {} s", summary.duration_ms / 1000);
        println!("   Avg/max speed: {:.2} / {:.2} km/h", summary.avg_speed_kmh, summary.max_speed_kmh);
        println!("   Elevation: +{:.1} m / -{:.1} m", summary.elevation_gain_m, summary.elevation_loss_m);
        println!("   Simplified path: {} points", summary.path.len());
    }
}
