//! Pure, I/O-free shaping of the final persistence payload, grounded in
//! `original_source/app.py`'s `session_doc` dict and the teacher's
//! `data.rs::DataExporter`, which performs the analogous shaping before an
//! I/O step this crate does not replicate (persistence itself is an
//! explicitly out-of-scope collaborator).

use serde::Serialize;

use crate::session::FinalReport;

/// The record shape a persistence collaborator would store, matching §6's
/// documented payload: `{email, date, timestamp, exercise, duration,
/// total_reps, right_reps, left_reps, total_errors}`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub email: String,
    pub date: String,
    pub timestamp: String,
    pub exercise: String,
    pub duration: f64,
    pub total_reps: u32,
    pub right_reps: u32,
    pub left_reps: u32,
    pub total_errors: u32,
}

impl FinalReport {
    /// Shapes this report into a `SessionRecord` ready for a host's
    /// persistence collaborator to store. Takes the host-supplied email and
    /// wall-clock completion time explicitly — the core has no clock or
    /// identity concept of its own.
    pub fn to_session_record(&self, email: impl Into<String>, completed_at: chrono::DateTime<chrono::Utc>) -> SessionRecord {
        SessionRecord {
            email: email.into(),
            date: completed_at.format("%Y-%m-%d").to_string(),
            timestamp: completed_at.to_rfc3339(),
            exercise: self.exercise.clone(),
            duration: self.duration,
            total_reps: self.summary.right.total_reps + self.summary.left.total_reps,
            right_reps: self.summary.right.total_reps,
            left_reps: self.summary.left.total_reps,
            total_errors: self.summary.right.error_count + self.summary.left.error_count,
        }
    }
}
