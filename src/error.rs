use thiserror::Error;

/// Fatal, session-start-only errors. Everything recoverable during a running
/// session (tracking loss, short calibration holds, degenerate ROM) is
/// absorbed locally and surfaces only through `feedback`/`calibration.message`.
#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("unknown exercise preset: {0}")]
    UnknownPreset(String),

    #[error("landmark triple for {side:?} is degenerate: vertex index {vertex} collides with endpoint")]
    DegenerateJointTriple { side: crate::landmark::Side, vertex: usize },

    #[error("a session is already active; stop it before starting another")]
    AlreadyActive,

    #[error("no session is active")]
    NotActive,
}
