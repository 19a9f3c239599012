//! Real-time, camera-agnostic physiotherapy rep-counting engine.
//!
//! Ingests a stream of pose-landmark frames, derives a smoothed joint angle
//! per side, calibrates a patient-specific range of motion, and counts
//! repetitions with hysteresis and temporal confirmation so counts stay
//! stable under jitter and brief tracking dropout. See [`WorkoutSession`]
//! for the orchestrating entry point.

pub mod angle;
pub mod calibration;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod landmark;
pub mod pose;
pub mod rep_counter;
pub mod report;
pub mod session;

pub use angle::AngleCalculator;
pub use calibration::{CalibrationData, CalibrationManager, CalibrationPhase};
pub use collaborators::{AlwaysGoodForm, FormClassifier};
pub use config::ExerciseConfig;
pub use error::WorkoutError;
pub use landmark::{Landmark, LandmarkFrame, Side, Sided};
pub use pose::PoseProcessor;
pub use rep_counter::{ArmMetrics, ArmStage, ComplimentChooser, FeedbackColor, RandomComplimentChooser, RepCounter};
pub use report::SessionRecord;
pub use session::{CommentaryContext, FinalReport, SideSummary, Snapshot, WorkoutPhase, WorkoutSession};
