//! Two-phase (extend, then contract) range-of-motion calibration, grounded
//! in `original_source/calibration.py`. Deviates from that source in one
//! respect: the original averages right+left into one combined angle before
//! deriving thresholds, but the per-side buffers and per-side thresholds
//! documented in the data model are the more rigorous of the two observed
//! variants, so per-side tracking is kept here (see DESIGN.md).

use crate::config::{
    CALIBRATION_HOLD_TIME, DEFAULT_CONTRACTED_THRESHOLD, DEFAULT_EXTENDED_THRESHOLD,
    DEFAULT_SAFE_ANGLE_MAX, DEFAULT_SAFE_ANGLE_MIN, MIN_CALIBRATION_SAMPLES, MIN_SAFE_ROM_DEGREES,
    SAFETY_MARGIN,
};
use crate::landmark::{Sided, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Extend,
    Contract,
    Complete,
}

/// Calibration state exposed to the rest of the session: buffers while
/// active, finalized thresholds once `phase == Complete`.
#[derive(Debug, Clone)]
pub struct CalibrationData {
    pub active: bool,
    pub phase: CalibrationPhase,
    pub extended_angles: Sided<Vec<f64>>,
    pub contracted_angles: Sided<Vec<f64>>,
    pub message: String,
    pub progress: f64,
    pub contracted_threshold: i32,
    pub extended_threshold: i32,
    pub safe_angle_min: i32,
    pub safe_angle_max: i32,
}

impl Default for CalibrationData {
    fn default() -> Self {
        Self {
            active: false,
            phase: CalibrationPhase::Extend,
            extended_angles: Sided::default_pair(),
            contracted_angles: Sided::default_pair(),
            message: String::new(),
            progress: 0.0,
            contracted_threshold: DEFAULT_CONTRACTED_THRESHOLD,
            extended_threshold: DEFAULT_EXTENDED_THRESHOLD,
            safe_angle_min: DEFAULT_SAFE_ANGLE_MIN,
            safe_angle_max: DEFAULT_SAFE_ANGLE_MAX,
        }
    }
}

/// Linear-interpolation percentile, matching the common `numpy.percentile`
/// default method.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// Robust average via IQR outlier rejection: discards samples outside
/// `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` and averages the survivors. Falls back to
/// the arithmetic mean of all samples when fewer than 3 are given, since
/// quartiles are meaningless at that size.
pub fn iqr_filtered_mean(samples: &[f64]) -> f64 {
    if samples.len() < 3 {
        return samples.iter().sum::<f64>() / samples.len().max(1) as f64;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    let survivors: Vec<f64> = sorted.iter().copied().filter(|&v| v >= lower && v <= upper).collect();
    if survivors.is_empty() {
        sorted.iter().sum::<f64>() / sorted.len() as f64
    } else {
        survivors.iter().sum::<f64>() / survivors.len() as f64
    }
}

/// Drives `CalibrationData` through the extend/contract hold protocol.
#[derive(Debug, Clone, Default)]
pub struct CalibrationManager {
    phase_start: Option<f64>,
    data: CalibrationData,
}

impl CalibrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &CalibrationData {
        &self.data
    }

    pub fn start(&mut self, now: f64) {
        self.data = CalibrationData::default();
        self.data.active = true;
        self.data.message = "Hold your arms fully extended".to_string();
        self.phase_start = Some(now);
    }

    /// Feeds one frame's per-side angles. Returns `true` once calibration
    /// has finalized (`phase == Complete`).
    pub fn process(&mut self, now: f64, angles: &Sided<Option<i32>>) -> bool {
        if !self.data.active {
            return false;
        }
        match self.data.phase {
            CalibrationPhase::Extend => self.process_phase(now, angles, true),
            CalibrationPhase::Contract => self.process_phase(now, angles, false),
            CalibrationPhase::Complete => true,
        }
    }

    fn process_phase(&mut self, now: f64, angles: &Sided<Option<i32>>, is_extend: bool) -> bool {
        let start = *self.phase_start.get_or_insert(now);
        let elapsed = now - start;

        for side in Side::BOTH {
            if let Some(angle) = angles.get(side) {
                let buf = if is_extend {
                    self.data.extended_angles.get_mut(side)
                } else {
                    self.data.contracted_angles.get_mut(side)
                };
                buf.push(*angle as f64);
            }
        }

        self.data.progress = (100.0 * elapsed / CALIBRATION_HOLD_TIME).min(100.0);

        let have_enough_samples = Side::BOTH.iter().all(|&side| {
            let buf = if is_extend {
                self.data.extended_angles.get(side)
            } else {
                self.data.contracted_angles.get(side)
            };
            buf.len() >= MIN_CALIBRATION_SAMPLES
        });

        if elapsed >= CALIBRATION_HOLD_TIME && have_enough_samples {
            if is_extend {
                self.data.phase = CalibrationPhase::Contract;
                self.data.message = "Now hold your arms fully contracted".to_string();
                self.phase_start = Some(now);
                self.data.progress = 0.0;
                tracing::debug!("calibration: extend phase complete, entering contract phase");
                false
            } else {
                self.finalize();
                tracing::debug!(
                    contracted = self.data.contracted_threshold,
                    extended = self.data.extended_threshold,
                    "calibration: finalized"
                );
                true
            }
        } else if elapsed >= CALIBRATION_HOLD_TIME {
            // Time elapsed but samples insufficient: reset the phase clock
            // and prompt for a longer, steadier hold.
            self.phase_start = Some(now);
            self.data.message = "Hold longer and keep your joints visible".to_string();
            false
        } else {
            false
        }
    }

    fn finalize(&mut self) {
        let right_ext = iqr_filtered_mean(&self.data.extended_angles.right);
        let left_ext = iqr_filtered_mean(&self.data.extended_angles.left);
        let right_con = iqr_filtered_mean(&self.data.contracted_angles.right);
        let left_con = iqr_filtered_mean(&self.data.contracted_angles.left);

        let extended_threshold = right_ext.min(left_ext).floor() as i32 - 8;
        let contracted_threshold = right_con.max(left_con).floor() as i32 + 8;

        if (extended_threshold - contracted_threshold) as f64 >= MIN_SAFE_ROM_DEGREES {
            self.data.extended_threshold = extended_threshold;
            self.data.contracted_threshold = contracted_threshold;
            self.data.safe_angle_min = (contracted_threshold as f64 - SAFETY_MARGIN).max(15.0) as i32;
            self.data.safe_angle_max = (extended_threshold as f64 + SAFETY_MARGIN).min(175.0) as i32;
            self.data.message = "Calibration complete".to_string();
        } else {
            tracing::warn!(
                range = extended_threshold - contracted_threshold,
                "calibration: degenerate range, falling back to defaults"
            );
            self.data.extended_threshold = DEFAULT_EXTENDED_THRESHOLD;
            self.data.contracted_threshold = DEFAULT_CONTRACTED_THRESHOLD;
            self.data.safe_angle_min = DEFAULT_SAFE_ANGLE_MIN;
            self.data.safe_angle_max = DEFAULT_SAFE_ANGLE_MAX;
            self.data.message =
                "WARNING: calibrated range too small, using default thresholds".to_string();
        }

        self.data.phase = CalibrationPhase::Complete;
        self.data.active = false;
        self.data.progress = 100.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn iqr_rejects_single_outlier() {
        let samples = [150.0, 151.0, 152.0, 149.0, 151.0, 40.0];
        assert_relative_eq!(iqr_filtered_mean(&samples), 150.6, epsilon = 1e-9);
    }

    #[test]
    fn iqr_with_no_outliers_returns_arithmetic_mean() {
        let samples = [100.0, 101.0, 99.0, 100.0, 102.0];
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert_relative_eq!(iqr_filtered_mean(&samples), mean, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_range_falls_back_and_warns() {
        let mut mgr = CalibrationManager::new();
        mgr.start(0.0);
        let extend_angles = Sided::new(Some(100), Some(100));
        for i in 0..25 {
            mgr.process(i as f64 * 0.2, &extend_angles);
        }
        let contract_angles = Sided::new(Some(90), Some(90));
        let mut finalized = false;
        for i in 0..25 {
            finalized = mgr.process(5.0 + i as f64 * 0.2, &contract_angles);
        }
        assert!(finalized);
        assert_eq!(mgr.data().contracted_threshold, DEFAULT_CONTRACTED_THRESHOLD);
        assert_eq!(mgr.data().extended_threshold, DEFAULT_EXTENDED_THRESHOLD);
        assert!(mgr.data().message.contains("WARNING"));
    }

    #[test]
    fn healthy_range_finalizes_without_warning() {
        let mut mgr = CalibrationManager::new();
        mgr.start(0.0);
        let extend_angles = Sided::new(Some(160), Some(160));
        for i in 0..25 {
            mgr.process(i as f64 * 0.2, &extend_angles);
        }
        let contract_angles = Sided::new(Some(50), Some(50));
        let mut finalized = false;
        for i in 0..25 {
            finalized = mgr.process(5.0 + i as f64 * 0.2, &contract_angles);
        }
        assert!(finalized);
        assert!(mgr.data().extended_threshold > mgr.data().contracted_threshold);
        assert!(!mgr.data().message.contains("WARNING"));
    }
}
