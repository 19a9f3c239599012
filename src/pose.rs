//! From a `LandmarkFrame`, emit per-side smoothed angles using the active
//! `ExerciseConfig`. Grounded in `original_source/pose_processor.py`.

use crate::angle::AngleCalculator;
use crate::config::{ExerciseConfig, VISIBILITY_FLOOR};
use crate::landmark::{LandmarkFrame, Side};

#[derive(Debug, Clone)]
pub struct PoseProcessor {
    config: ExerciseConfig,
    calculator: AngleCalculator,
}

impl PoseProcessor {
    pub fn new(config: ExerciseConfig) -> Self {
        Self { config, calculator: AngleCalculator::new() }
    }

    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    /// Emits the smoothed angle for each side, or `None` where the frame is
    /// missing, the triple's indices can't be read, or any of the three
    /// landmarks falls below the visibility floor. Absence is never an
    /// error — the caller treats it as "tracking lost for this side".
    pub fn process(&mut self, frame: Option<&LandmarkFrame>) -> crate::landmark::Sided<Option<i32>> {
        let mut out = crate::landmark::Sided::default_pair();
        let Some(frame) = frame else {
            return out;
        };
        for side in Side::BOTH {
            *out.get_mut(side) = self.angle_for_side(frame, side);
        }
        out
    }

    fn angle_for_side(&mut self, frame: &LandmarkFrame, side: Side) -> Option<i32> {
        let triple = *self.config.triples.get(side);
        let a = frame.get(triple.a)?;
        let b = frame.get(triple.b)?;
        let c = frame.get(triple.c)?;
        if a.visibility < VISIBILITY_FLOOR || b.visibility < VISIBILITY_FLOOR || c.visibility < VISIBILITY_FLOOR {
            return None;
        }
        let raw = AngleCalculator::raw_angle(a, b, c);
        Some(self.calculator.smooth(side, raw))
    }

    pub fn reset(&mut self) {
        self.calculator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;

    fn frame_with(visible: f64) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 1.0); 33];
        let preset = ExerciseConfig::bicep_curl();
        for side in Side::BOTH {
            let t = *preset.triples.get(side);
            landmarks[t.a] = Landmark::new(0.0, 0.0, visible);
            landmarks[t.b] = Landmark::new(0.1, 0.1, visible);
            landmarks[t.c] = Landmark::new(0.2, 0.0, visible);
        }
        LandmarkFrame::new(landmarks, 0.0)
    }

    #[test]
    fn returns_none_for_both_sides_without_a_frame() {
        let mut pp = PoseProcessor::new(ExerciseConfig::bicep_curl());
        let out = pp.process(None);
        assert!(out.right.is_none());
        assert!(out.left.is_none());
    }

    #[test]
    fn low_visibility_yields_none() {
        let mut pp = PoseProcessor::new(ExerciseConfig::bicep_curl());
        let frame = frame_with(0.1);
        let out = pp.process(Some(&frame));
        assert!(out.right.is_none());
        assert!(out.left.is_none());
    }

    #[test]
    fn visible_landmarks_yield_an_angle() {
        let mut pp = PoseProcessor::new(ExerciseConfig::bicep_curl());
        let frame = frame_with(0.9);
        let out = pp.process(Some(&frame));
        assert!(out.right.is_some());
        assert!(out.left.is_some());
    }

    #[test]
    fn missing_index_yields_none_not_error() {
        let mut config = ExerciseConfig::bicep_curl();
        config.triples.right.a = 999;
        let mut pp = PoseProcessor::new(config);
        let frame = frame_with(0.9);
        let out = pp.process(Some(&frame));
        assert!(out.right.is_none());
    }
}
