//! Feeds a synthetic landmark sequence through a `WorkoutSession` and prints
//! snapshots — a camera-free way to exercise the pipeline, replacing the
//! teacher's `camera_test.rs` slot now that there is no camera in scope.

use anyhow::{Context, Result};
use repcount_core::{Landmark, LandmarkFrame, WorkoutSession};

fn synthetic_frame(t: f64) -> LandmarkFrame {
    // Oscillate the elbow angle between roughly contracted and extended so
    // Bicep Curl calibration and counting both have something to see.
    let mut landmarks = vec![Landmark::new(0.0, 0.0, 1.0); 33];
    let angle_deg = 100.0 + 70.0 * (t * 0.6).sin();
    let rad = angle_deg.to_radians();

    for (shoulder, elbow, wrist) in [(11, 13, 15), (12, 14, 16)] {
        landmarks[shoulder] = Landmark::new(0.0, 0.0, 0.95);
        landmarks[elbow] = Landmark::new(0.5, 0.5, 0.95);
        landmarks[wrist] = Landmark::new(0.5 + rad.cos() * 0.3, 0.5 + rad.sin() * 0.3, 0.95);
    }

    LandmarkFrame::new(landmarks, t)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut session = WorkoutSession::default();
    session.start("Bicep Curl", 0.0).context("starting simulated session")?;

    let dt = 1.0 / 30.0;
    let mut t = 0.0;
    for frame_index in 0..900 {
        let frame = synthetic_frame(t);
        let keep_going = session.process_frame(Some(&frame), t);
        if frame_index % 30 == 0 {
            let snapshot = session.snapshot();
            println!(
                "t={t:.2}s phase={:?} right_reps={} left_reps={} right_feedback={:?}",
                snapshot.phase, snapshot.metrics.right.rep_count, snapshot.metrics.left.rep_count, snapshot.metrics.right.feedback
            );
        }
        if !keep_going {
            break;
        }
        t += dt;
    }

    let report = session.stop(t);
    println!(
        "final: exercise={} duration={:.1}s right_reps={} left_reps={}",
        report.exercise, report.duration, report.summary.right.total_reps, report.summary.left.total_reps
    );
    Ok(())
}
