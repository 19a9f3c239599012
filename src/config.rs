//! Tunable constants and exercise presets, grounded in
//! `original_source/constants.py`.

use crate::landmark::Sided;

/// Seconds a calibration phase (extend or contract) must be held before it
/// can finalize, given enough samples on both sides.
pub const CALIBRATION_HOLD_TIME: f64 = 5.0;

/// Seconds the pre-workout countdown runs once calibration finalizes.
pub const WORKOUT_COUNTDOWN_TIME: f64 = 5.0;

/// Width of the per-side raw-angle median window feeding the EMA smoother.
pub const SMOOTHING_WINDOW: usize = 7;

/// EMA smoothing factor applied to the window median.
pub const SMOOTHING_ALPHA: f64 = 0.5;

/// Degrees added/subtracted off calibrated thresholds to derive the safety
/// range (`safe_angle_min`/`safe_angle_max`).
pub const SAFETY_MARGIN: f64 = 15.0;

/// Visibility floor below which a landmark is treated as "not tracked".
pub const MIN_DETECTION_CONFIDENCE: f64 = 0.7;
pub const MIN_TRACKING_CONFIDENCE: f64 = 0.7;
pub const VISIBILITY_FLOOR: f64 = 0.6;

/// Minimum elapsed time between two rep credits on the same side.
pub const MIN_REP_DURATION: f64 = 0.6;

/// Degrees of overshoot required to leave a terminal stage.
pub const REP_HYSTERESIS_MARGIN: f64 = 5.0;

/// Minimum samples per side before a calibration phase is allowed to finalize.
pub const MIN_CALIBRATION_SAMPLES: usize = 20;

/// Minimum acceptable calibrated ROM in degrees; below this, calibration
/// falls back to defaults and raises a warning. Resolved from the spec's
/// open question in favor of the stricter variant.
pub const MIN_SAFE_ROM_DEGREES: f64 = 40.0;

/// Seconds a side must go untracked before its rep state machine enters
/// `ArmStage::Lost`.
pub const LOST_TRACKING_TIMEOUT: f64 = 1.0;

/// Fallback thresholds used when a calibrated ROM is degenerate.
pub const DEFAULT_CONTRACTED_THRESHOLD: i32 = 50;
pub const DEFAULT_EXTENDED_THRESHOLD: i32 = 160;
pub const DEFAULT_SAFE_ANGLE_MIN: i32 = 30;
pub const DEFAULT_SAFE_ANGLE_MAX: i32 = 175;

/// Window, in angle samples, used to estimate short-term angular velocity
/// for the motion-settling gate.
pub const VELOCITY_WINDOW: usize = 4;

/// Angular velocity (degrees/frame) below which a proposed stage transition
/// may be confirmed.
pub const VELOCITY_SETTLED_THRESHOLD: f64 = 15.0;

/// Angular velocity (degrees/frame) below which form feedback is evaluated
/// at all (avoids labeling mid-motion).
pub const FEEDBACK_VELOCITY_THRESHOLD: f64 = 20.0;

/// Minimum time a proposed stage must be requested before it is confirmed.
pub const STATE_HOLD_TIME: f64 = 0.15;

/// Seconds after a credited rep during which a compliment is shown.
pub const POST_REP_COMPLIMENT_WINDOW: f64 = 2.0;

/// Seconds of cooldown after a RED message during which "Maintain Form" is
/// shown instead of re-evaluating hard errors.
pub const RED_COOLDOWN: f64 = 3.0;

/// Degrees past a threshold used for interior ROM-guidance messages
/// ("Curl Higher" / "Extend Fully").
pub const ROM_GUIDANCE_MARGIN: f64 = 10.0;

/// The tracked joint family for an exercise preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseJoint {
    Elbow,
    Knee,
    Shoulder,
    Hip,
    Ankle,
}

/// A landmark-index triple `(A, B, C)` where `B` is the angle vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkTriple {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl LandmarkTriple {
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    /// The degenerate-triple invariant from the data model: the vertex must
    /// differ from both endpoints.
    pub fn is_degenerate(&self) -> bool {
        self.b == self.a || self.b == self.c
    }
}

/// Immutable preset describing which landmarks define the tracked joint on
/// each side, plus the 8-landmark selection handed to the external
/// form-classifier collaborator.
#[derive(Debug, Clone)]
pub struct ExerciseConfig {
    pub name: String,
    pub joint: ExerciseJoint,
    pub triples: Sided<LandmarkTriple>,
    pub ai_feature_landmarks: [usize; 8],
}

impl ExerciseConfig {
    /// Validates the data-model invariant that every triple's vertex is
    /// distinct from its endpoints.
    pub fn validate(&self) -> Result<(), crate::error::WorkoutError> {
        for (side, triple) in self.triples.iter() {
            if triple.is_degenerate() {
                return Err(crate::error::WorkoutError::DegenerateJointTriple {
                    side,
                    vertex: triple.b,
                });
            }
        }
        Ok(())
    }

    /// Flattens the `(x, y)` of this preset's 8 AI-feature landmarks out of a
    /// frame, for the form-classifier collaborator. Missing landmarks are
    /// filled with `0.0`, matching the original's defensive indexing.
    pub fn ai_features(&self, frame: &crate::landmark::LandmarkFrame) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (i, &idx) in self.ai_feature_landmarks.iter().enumerate() {
            if let Some(lm) = frame.get(idx) {
                out[i * 2] = lm.x;
                out[i * 2 + 1] = lm.y;
            }
        }
        out
    }

    /// MediaPipe Pose landmark indices, matching the teacher's
    /// `tracking.rs::process_pose_with_kalman` and `original_source/constants.py`.
    pub fn bicep_curl() -> Self {
        Self {
            name: "Bicep Curl".to_string(),
            joint: ExerciseJoint::Elbow,
            triples: Sided::new(
                LandmarkTriple::new(12, 14, 16), // right shoulder-elbow-wrist
                LandmarkTriple::new(11, 13, 15), // left shoulder-elbow-wrist
            ),
            ai_feature_landmarks: [11, 12, 13, 14, 15, 16, 23, 24],
        }
    }

    pub fn knee_lift() -> Self {
        Self {
            name: "Knee Lift".to_string(),
            joint: ExerciseJoint::Knee,
            triples: Sided::new(
                LandmarkTriple::new(24, 26, 28), // right hip-knee-ankle
                LandmarkTriple::new(23, 25, 27), // left hip-knee-ankle
            ),
            ai_feature_landmarks: [23, 24, 25, 26, 27, 28, 11, 12],
        }
    }

    pub fn shoulder_press() -> Self {
        Self {
            name: "Shoulder Press".to_string(),
            joint: ExerciseJoint::Shoulder,
            triples: Sided::new(
                LandmarkTriple::new(24, 12, 14), // right hip-shoulder-elbow
                LandmarkTriple::new(23, 11, 13), // left hip-shoulder-elbow
            ),
            ai_feature_landmarks: [11, 12, 13, 14, 15, 16, 23, 24],
        }
    }

    pub fn squat() -> Self {
        Self {
            name: "Squat".to_string(),
            joint: ExerciseJoint::Hip,
            triples: Sided::new(
                LandmarkTriple::new(12, 24, 26), // right shoulder-hip-knee
                LandmarkTriple::new(11, 23, 25), // left shoulder-hip-knee
            ),
            ai_feature_landmarks: [11, 12, 23, 24, 25, 26, 27, 28],
        }
    }

    pub fn standing_row() -> Self {
        Self {
            name: "Standing Row".to_string(),
            joint: ExerciseJoint::Shoulder,
            triples: Sided::new(
                LandmarkTriple::new(14, 12, 24), // right elbow-shoulder-hip
                LandmarkTriple::new(13, 11, 23), // left elbow-shoulder-hip
            ),
            ai_feature_landmarks: [11, 12, 13, 14, 23, 24, 15, 16],
        }
    }

    /// Looks up one of the five built-in presets by name, matching the
    /// original's `EXERCISE_PRESETS` dict lookup.
    pub fn by_name(name: &str) -> Result<Self, crate::error::WorkoutError> {
        match name {
            "Bicep Curl" => Ok(Self::bicep_curl()),
            "Knee Lift" => Ok(Self::knee_lift()),
            "Shoulder Press" => Ok(Self::shoulder_press()),
            "Squat" => Ok(Self::squat()),
            "Standing Row" => Ok(Self::standing_row()),
            other => Err(crate::error::WorkoutError::UnknownPreset(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_presets_are_valid() {
        for preset in [
            ExerciseConfig::bicep_curl(),
            ExerciseConfig::knee_lift(),
            ExerciseConfig::shoulder_press(),
            ExerciseConfig::squat(),
            ExerciseConfig::standing_row(),
        ] {
            assert!(preset.validate().is_ok());
        }
    }

    #[test]
    fn by_name_rejects_unknown_preset() {
        assert!(ExerciseConfig::by_name("Nonexistent").is_err());
    }

    #[test]
    fn degenerate_triple_is_detected() {
        let t = LandmarkTriple::new(1, 1, 2);
        assert!(t.is_degenerate());
    }
}
