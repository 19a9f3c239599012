//! The one external collaborator with a well-defined function shape the
//! core actually calls: the ML form classifier. Modeled as a capability
//! object constructed once by the host and passed by borrow, per the
//! teacher's preference for injected collaborators over singletons (cf.
//! `tracking.rs::MediaPipeWrapper`, held by `ArmTracker` rather than
//! reached for globally).
//!
//! The detector (raw frame → `LandmarkFrame`) is modeled implicitly as
//! `Option<&LandmarkFrame>` at the `WorkoutSession::process_frame` call
//! site rather than as a trait — giving it one would require inventing a
//! speculative raw-frame type that is explicitly out of scope. Commentary
//! and persistence stay pure data-shaping methods (`WorkoutSession::commentary_context`,
//! `FinalReport::to_session_record`) with no trait of their own, since the
//! spec treats both as consultative black boxes the core never calls.

/// `predict_form(features) → form is OK`. Queried at most once per frame
/// by `WorkoutSession`; absence defaults to "OK".
pub trait FormClassifier: std::fmt::Debug {
    fn predict_form(&mut self, features: [f64; 16]) -> bool;
}

/// The conservative default used when no classifier is wired up, matching
/// §6's "absence of the classifier defaults to 1".
#[derive(Debug, Default)]
pub struct AlwaysGoodForm;

impl FormClassifier for AlwaysGoodForm {
    fn predict_form(&mut self, _features: [f64; 16]) -> bool {
        true
    }
}
