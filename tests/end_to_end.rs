//! End-to-end scenarios from the rep-counting contract, driven through the
//! full `WorkoutSession` pipeline (calibration -> countdown -> active)
//! instead of poking `RepCounter` directly.

use repcount_core::{ExerciseConfig, Landmark, LandmarkFrame, WorkoutPhase};
use repcount_core::rep_counter::ArmStage;

const DT: f64 = 1.0 / 30.0;

/// Places landmarks so the interior angle at the triple's vertex is exactly
/// `angle_deg`: `A` sits along the vertex's local +x axis, `C` sits
/// `angle_deg` degrees around from it, so the raw angle (before smoothing)
/// equals `angle_deg` for any value in `[0, 180]`.
fn frame_at(preset: &ExerciseConfig, right_deg: f64, left_deg: f64, t: f64) -> LandmarkFrame {
    let mut landmarks = vec![Landmark::new(0.0, 0.0, 1.0); 33];
    let place = |landmarks: &mut Vec<Landmark>, triple: repcount_core::config::LandmarkTriple, deg: f64| {
        let b = (0.5, 0.5);
        landmarks[triple.b] = Landmark::new(b.0, b.1, 0.95);
        landmarks[triple.a] = Landmark::new(b.0 + 0.3, b.1, 0.95);
        let rad = deg.to_radians();
        landmarks[triple.c] = Landmark::new(b.0 + 0.3 * rad.cos(), b.1 + 0.3 * rad.sin(), 0.95);
    };
    place(&mut landmarks, preset.triples.right, right_deg);
    place(&mut landmarks, preset.triples.left, left_deg);
    LandmarkFrame::new(landmarks, t)
}

/// Drives a session from `start()` through calibration (holding `extended_deg`
/// then `contracted_deg` on both sides long enough to finalize) and the fixed
/// countdown, landing in `Active`. Returns the session and the time reached.
fn calibrate_to_active(
    session: &mut repcount_core::WorkoutSession,
    preset: &ExerciseConfig,
    extended_deg: f64,
    contracted_deg: f64,
) -> f64 {
    let mut t = 0.0;
    // Comfortably clears the 5s hold and the 20-sample floor at 30fps.
    for _ in 0..170 {
        let frame = frame_at(preset, extended_deg, extended_deg, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    for _ in 0..170 {
        let frame = frame_at(preset, contracted_deg, contracted_deg, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    assert_eq!(session.phase(), WorkoutPhase::Countdown, "calibration should have finalized");

    // Neutral frames just to advance the clock through the fixed countdown.
    for _ in 0..170 {
        let frame = frame_at(preset, (extended_deg + contracted_deg) / 2.0, (extended_deg + contracted_deg) / 2.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    assert_eq!(session.phase(), WorkoutPhase::Active, "countdown should have elapsed");
    t
}

#[test]
fn happy_bicep_curl_credits_exactly_one_rep() {
    let preset = ExerciseConfig::bicep_curl();
    let mut session = repcount_core::WorkoutSession::default();
    session.start("Bicep Curl", 0.0).unwrap();

    // extended=163 -> extended_threshold = floor(163) - 8 = 155
    // contracted=47 -> contracted_threshold = floor(47) + 8 = 55
    let mut t = calibrate_to_active(&mut session, &preset, 163.0, 47.0);

    let sequence = [160.0, 158.0, 150.0, 120.0, 90.0, 60.0, 50.0, 48.0, 50.0, 70.0, 110.0, 150.0, 160.0];
    for &deg in &sequence {
        for _ in 0..20 {
            let frame = frame_at(&preset, deg, 170.0, t);
            session.process_frame(Some(&frame), t);
            t += DT;
        }
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.metrics.right.rep_count, 1);
    assert_eq!(snapshot.metrics.left.rep_count, 0);
}

#[test]
fn jitter_near_threshold_credits_nothing_end_to_end() {
    let preset = ExerciseConfig::bicep_curl();
    let mut session = repcount_core::WorkoutSession::default();
    session.start("Bicep Curl", 0.0).unwrap();
    let mut t = calibrate_to_active(&mut session, &preset, 163.0, 47.0);

    // contracted_threshold is 55; alternate just either side of it at 30fps
    // for 2s. Hysteresis should prevent any settled transition, let alone a
    // credited rep.
    for i in 0..60 {
        let deg = if i % 2 == 0 { 54.0 } else { 56.0 };
        let frame = frame_at(&preset, deg, 110.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.metrics.right.rep_count, 0);
}

#[test]
fn tracking_dropout_mid_rep_credits_once_on_the_downstroke() {
    let preset = ExerciseConfig::bicep_curl();
    let mut session = repcount_core::WorkoutSession::default();
    session.start("Bicep Curl", 0.0).unwrap();
    let mut t = calibrate_to_active(&mut session, &preset, 163.0, 47.0);

    // Descend from extended toward contracted over ~0.8s, settle there.
    for step in 0..24 {
        let deg = 160.0 - (100.0 * step as f64 / 23.0);
        let frame = frame_at(&preset, deg, 170.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    for _ in 0..20 {
        let frame = frame_at(&preset, 50.0, 170.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    assert_eq!(session.snapshot().metrics.right.stage, ArmStage::Up);

    // Ten frames of total tracking loss (whole-frame dropout, well under the
    // 1s LOST_TRACKING_TIMEOUT).
    for _ in 0..10 {
        session.process_frame(None, t);
        t += DT;
    }

    // Ascend back to extended over ~0.8s and settle.
    for step in 0..24 {
        let deg = 50.0 + (110.0 * step as f64 / 23.0);
        let frame = frame_at(&preset, deg, 170.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }
    for _ in 0..20 {
        let frame = frame_at(&preset, 160.0, 170.0, t);
        session.process_frame(Some(&frame), t);
        t += DT;
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.metrics.right.rep_count, 1);
    assert_eq!(snapshot.metrics.left.rep_count, 0);
}

#[test]
fn degenerate_calibration_falls_back_and_warns_end_to_end() {
    let preset = ExerciseConfig::knee_lift();
    let mut session = repcount_core::WorkoutSession::default();
    session.start("Knee Lift", 0.0).unwrap();

    // A 10-degree range (100 vs 90) is well under the 40-degree safety
    // floor, so calibration should fall back to the shared defaults.
    let _t = calibrate_to_active(&mut session, &preset, 100.0, 90.0);

    let snapshot = session.snapshot();
    assert!(snapshot.calibration_message.contains("WARNING"));
}

#[test]
fn phase_sequencing_reaches_active_and_stop_returns_to_inactive() {
    let preset = ExerciseConfig::squat();
    let mut session = repcount_core::WorkoutSession::default();
    session.start("Squat", 0.0).unwrap();
    assert_eq!(session.phase(), WorkoutPhase::Calibration);

    let t = calibrate_to_active(&mut session, &preset, 170.0, 80.0);
    assert_eq!(session.phase(), WorkoutPhase::Active);

    let report = session.stop(t);
    assert_eq!(session.phase(), WorkoutPhase::Inactive);
    assert_eq!(report.exercise, "Squat");
}
