//! Orchestrates the pipeline: `WorkoutPhase` machine, per-side `ArmMetrics`,
//! calibration, and session history, grounded in
//! `original_source/app.py`'s session-driving loop and `ai_engine.py`'s
//! metrics bookkeeping.

use crate::angle::AngleCalculator;
use crate::calibration::{CalibrationManager, CalibrationPhase};
use crate::collaborators::{AlwaysGoodForm, FormClassifier};
use crate::config::{ExerciseConfig, WORKOUT_COUNTDOWN_TIME};
use crate::error::WorkoutError;
use crate::landmark::{LandmarkFrame, Sided, Side};
use crate::pose::PoseProcessor;
use crate::rep_counter::{ArmMetrics, ComplimentChooser, RandomComplimentChooser, RepCounter};

/// `INACTIVE → CALIBRATION → COUNTDOWN → ACTIVE → INACTIVE`. Single-writer:
/// only `WorkoutSession` mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutPhase {
    Inactive,
    Calibration,
    Countdown,
    Active,
}

/// Append-only per-frame history recorded while `ACTIVE`; cleared on reset.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    pub time: Vec<f64>,
    pub right_angle: Vec<Option<i32>>,
    pub left_angle: Vec<Option<i32>>,
    pub right_feedback_count: u32,
    pub left_feedback_count: u32,
}

impl SessionHistory {
    fn record(&mut self, now: f64, angles: &Sided<Option<i32>>) {
        self.time.push(now);
        self.right_angle.push(angles.right);
        self.left_angle.push(angles.left);
    }

    fn bump_feedback_count(&mut self, side: Side) {
        match side {
            Side::Right => self.right_feedback_count += 1,
            Side::Left => self.left_feedback_count += 1,
        }
    }
}

/// A serializable copy of session state produced per frame for external
/// consumers (transport, UI, logging sinks).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: WorkoutPhase,
    pub frame_counter: u64,
    pub metrics: Sided<ArmMetrics>,
    pub calibration_progress: f64,
    pub calibration_message: String,
    pub form_ok: bool,
}

/// Per-side summary handed to the host's persistence collaborator on stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideSummary {
    pub total_reps: u32,
    pub error_count: u32,
}

/// The final report produced on `stop()`. The core hands this to the host;
/// it does not talk to storage itself.
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub duration: f64,
    pub exercise: String,
    pub summary: Sided<SideSummary>,
}

/// Pure data shaping for the commentary collaborator's input context —
/// assembled here so every host integrates it the same way, but the
/// `generate(...)` call itself stays outside the core.
#[derive(Debug, Clone)]
pub struct CommentaryContext {
    pub reps: u32,
    pub right_reps: u32,
    pub left_reps: u32,
    pub errors: u32,
    pub feedback: String,
    pub exercise: String,
}

pub struct WorkoutSession {
    phase: WorkoutPhase,
    pose: Option<PoseProcessor>,
    calibration: CalibrationManager,
    rep_counter: RepCounter,
    metrics: Sided<ArmMetrics>,
    history: SessionHistory,
    compliments: Box<dyn ComplimentChooser>,
    form_classifier: Option<Box<dyn FormClassifier>>,
    form_ok: bool,
    countdown_start: Option<f64>,
    session_start: Option<f64>,
    frame_counter: u64,
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("phase", &self.phase)
            .field("frame_counter", &self.frame_counter)
            .finish_non_exhaustive()
    }
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new(Box::new(RandomComplimentChooser), Some(Box::new(AlwaysGoodForm)))
    }
}

impl WorkoutSession {
    pub fn new(
        compliments: Box<dyn ComplimentChooser>,
        form_classifier: Option<Box<dyn FormClassifier>>,
    ) -> Self {
        Self {
            phase: WorkoutPhase::Inactive,
            pose: None,
            calibration: CalibrationManager::new(),
            rep_counter: RepCounter::new(),
            metrics: Sided::new(ArmMetrics::new(0.0), ArmMetrics::new(0.0)),
            history: SessionHistory::default(),
            compliments,
            form_classifier,
            form_ok: true,
            countdown_start: None,
            session_start: None,
            frame_counter: 0,
        }
    }

    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    /// Starts a session against one of the built-in presets.
    pub fn start(&mut self, preset_name: &str, now: f64) -> Result<(), WorkoutError> {
        self.start_with_config(ExerciseConfig::by_name(preset_name)?, now)
    }

    /// Starts a session against a caller-supplied exercise configuration,
    /// so a host can register exercises the built-in presets don't cover.
    pub fn start_with_config(&mut self, config: ExerciseConfig, now: f64) -> Result<(), WorkoutError> {
        if self.phase != WorkoutPhase::Inactive {
            return Err(WorkoutError::AlreadyActive);
        }
        config.validate()?;

        self.pose = Some(PoseProcessor::new(config));
        self.calibration = CalibrationManager::new();
        self.calibration.start(now);
        self.rep_counter.reset();
        self.metrics = Sided::new(ArmMetrics::new(now), ArmMetrics::new(now));
        self.history = SessionHistory::default();
        self.form_ok = true;
        self.countdown_start = None;
        self.session_start = Some(now);
        self.frame_counter = 0;
        self.phase = WorkoutPhase::Calibration;
        tracing::debug!("workout session started, entering calibration");
        Ok(())
    }

    /// Advances the pipeline by one frame. Returns whether the host should
    /// keep feeding frames (`false` once the session has gone `Inactive`).
    pub fn process_frame(&mut self, landmarks: Option<&LandmarkFrame>, now: f64) -> bool {
        self.frame_counter += 1;

        if self.pose.is_none() {
            return self.phase != WorkoutPhase::Inactive;
        }
        // The borrow of `self.pose` ends with this call — only its owned
        // return value survives, leaving the rest of `self` free to borrow.
        let angles = self.pose.as_mut().unwrap().process(landmarks);

        match self.phase {
            WorkoutPhase::Calibration => {
                if self.calibration.process(now, &angles) {
                    self.phase = WorkoutPhase::Countdown;
                    self.countdown_start = Some(now);
                    tracing::debug!("calibration finalized, entering countdown");
                }
            }
            WorkoutPhase::Countdown => {
                let start = self.countdown_start.get_or_insert(now);
                if now - *start >= WORKOUT_COUNTDOWN_TIME {
                    self.phase = WorkoutPhase::Active;
                    tracing::debug!("countdown elapsed, workout active");
                }
            }
            WorkoutPhase::Active => {
                self.advance_active(&angles, landmarks, now);
            }
            WorkoutPhase::Inactive => {}
        }

        self.phase != WorkoutPhase::Inactive
    }

    fn advance_active(&mut self, angles: &Sided<Option<i32>>, landmarks: Option<&LandmarkFrame>, now: f64) {
        let data = self.calibration.data();
        let thresholds = (data.contracted_threshold, data.extended_threshold);
        let safe_range = (data.safe_angle_min, data.safe_angle_max);

        for side in Side::BOTH {
            let metrics = self.metrics.get_mut(side);
            match angles.get(side) {
                Some(angle) => {
                    let outcome = self.rep_counter.process_rep(
                        side,
                        now,
                        *angle,
                        thresholds,
                        safe_range,
                        metrics,
                        self.compliments.as_mut(),
                    );
                    if outcome.hard_error {
                        self.history.bump_feedback_count(side);
                    }
                }
                None => self.rep_counter.mark_absent(side, now, metrics),
            }
        }

        self.history.record(now, angles);

        if let (Some(frame), Some(classifier)) = (landmarks, self.form_classifier.as_mut()) {
            let features = self.pose.as_ref().unwrap().config().ai_features(frame);
            self.form_ok = classifier.predict_form(features);
        }
    }

    /// Stops the session, returning the host's persistence payload. The
    /// session returns to `INACTIVE` after this call.
    pub fn stop(&mut self, now: f64) -> FinalReport {
        let duration = match self.session_start {
            Some(start) => now - start,
            None => 0.0,
        };
        let exercise = self
            .pose
            .as_ref()
            .map(|p| p.config().name.clone())
            .unwrap_or_default();
        let report = FinalReport {
            duration,
            exercise,
            summary: Sided::new(
                SideSummary { total_reps: self.metrics.right.rep_count, error_count: self.metrics.right.errors },
                SideSummary { total_reps: self.metrics.left.rep_count, error_count: self.metrics.left.errors },
            ),
        };
        self.phase = WorkoutPhase::Inactive;
        self.pose = None;
        self.metrics = Sided::new(ArmMetrics::new(now), ArmMetrics::new(now));
        self.history = SessionHistory::default();
        tracing::debug!(duration, "workout session stopped");
        report
    }

    /// A serializable copy of the current state for external consumers.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            frame_counter: self.frame_counter,
            metrics: self.metrics.clone(),
            calibration_progress: self.calibration.data().progress,
            calibration_message: self.calibration.data().message.clone(),
            form_ok: self.form_ok,
        }
    }

    /// Shapes the commentary collaborator's input context. Pure data —
    /// the actual `generate(...)` call is a host-side black box.
    pub fn commentary_context(&self) -> CommentaryContext {
        let right = &self.metrics.right;
        let left = &self.metrics.left;
        CommentaryContext {
            reps: right.rep_count + left.rep_count,
            right_reps: right.rep_count,
            left_reps: left.rep_count,
            errors: right.errors + left.errors,
            feedback: if right.feedback.is_empty() { left.feedback.clone() } else { right.feedback.clone() },
            exercise: self.pose.as_ref().map(|p| p.config().name.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use crate::rep_counter::{ArmStage, SeededComplimentChooser};

    fn session() -> WorkoutSession {
        WorkoutSession::new(Box::new(SeededComplimentChooser::new(7)), Some(Box::new(AlwaysGoodForm)))
    }

    fn frame_for(preset: &ExerciseConfig, right_angle_deg: f64, left_angle_deg: f64, t: f64) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 1.0); 33];
        let place = |landmarks: &mut Vec<Landmark>, triple: crate::config::LandmarkTriple, angle_deg: f64| {
            landmarks[triple.a] = Landmark::new(0.0, 0.0, 1.0);
            landmarks[triple.b] = Landmark::new(0.5, 0.5, 1.0);
            let rad = angle_deg.to_radians();
            landmarks[triple.c] = Landmark::new(0.5 + rad.cos() * 0.3, 0.5 + rad.sin() * 0.3, 1.0);
        };
        place(&mut landmarks, preset.triples.right, right_angle_deg);
        place(&mut landmarks, preset.triples.left, left_angle_deg);
        LandmarkFrame::new(landmarks, t)
    }

    #[test]
    fn phase_sequencing_goes_through_full_lifecycle() {
        let mut session = session();
        session.start("Knee Lift", 0.0).unwrap();
        assert_eq!(session.phase(), WorkoutPhase::Calibration);

        let preset = ExerciseConfig::knee_lift();
        let mut t = 0.0;
        for _ in 0..200 {
            let frame = frame_for(&preset, 170.0, 170.0, t);
            session.process_frame(Some(&frame), t);
            t += 1.0 / 30.0;
        }
        assert_eq!(session.phase(), WorkoutPhase::Calibration);

        for _ in 0..200 {
            let frame = frame_for(&preset, 40.0, 40.0, t);
            session.process_frame(Some(&frame), t);
            t += 1.0 / 30.0;
        }
        assert_eq!(session.phase(), WorkoutPhase::Countdown);

        for _ in 0..200 {
            let frame = frame_for(&preset, 100.0, 100.0, t);
            session.process_frame(Some(&frame), t);
            t += 1.0 / 30.0;
        }
        assert_eq!(session.phase(), WorkoutPhase::Active);

        let reps_before_stop = session.metrics.right.rep_count + session.metrics.left.rep_count;
        let report = session.stop(t);
        assert_eq!(session.phase(), WorkoutPhase::Inactive);
        assert_eq!(
            report.summary.right.total_reps + report.summary.left.total_reps,
            reps_before_stop
        );
        // ArmMetrics resets on stop, matching the data model's lifecycle note.
        assert_eq!(session.metrics.right.rep_count, 0);
        assert_eq!(session.metrics.right.stage, ArmStage::Down);
    }

    #[test]
    fn starting_twice_is_rejected() {
        let mut session = session();
        session.start("Squat", 0.0).unwrap();
        assert!(matches!(session.start("Squat", 1.0), Err(WorkoutError::AlreadyActive)));
    }

    #[test]
    fn unknown_preset_is_rejected_before_calibration() {
        let mut session = session();
        assert!(session.start("Not A Real Exercise", 0.0).is_err());
        assert_eq!(session.phase(), WorkoutPhase::Inactive);
    }
}
