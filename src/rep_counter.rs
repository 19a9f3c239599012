//! Per-side hysteresis-gated, temporally-confirmed rep counting state
//! machine — the heart of the engine. Grounded in
//! `original_source/rep_counter.py`, restructured per the teacher's
//! preference for exhaustive enum matching over string-typed state (cf.
//! `tracking.rs::GestureType`).

use crate::angle::RingBuffer;
use crate::config::{
    FEEDBACK_VELOCITY_THRESHOLD, MIN_REP_DURATION, POST_REP_COMPLIMENT_WINDOW, RED_COOLDOWN,
    REP_HYSTERESIS_MARGIN, ROM_GUIDANCE_MARGIN, STATE_HOLD_TIME, VELOCITY_SETTLED_THRESHOLD,
    VELOCITY_WINDOW, LOST_TRACKING_TIMEOUT,
};
use crate::landmark::{Sided, Side};

/// The current per-side automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmStage {
    Up,
    Down,
    MovingUp,
    MovingDown,
    Lost,
}

/// Form-feedback severity, kept as a tag rather than a string — only the
/// transport boundary needs text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackColor {
    Gray,
    Green,
    Yellow,
    Red,
}

/// One side's counters and live feedback, as exposed in a session snapshot.
#[derive(Debug, Clone)]
pub struct ArmMetrics {
    pub rep_count: u32,
    pub stage: ArmStage,
    pub angle: i32,
    pub accuracy: i32,
    pub rep_time: f64,
    pub min_rep_time: Option<f64>,
    pub curr_rep_time: f64,
    pub feedback: String,
    pub feedback_color: FeedbackColor,
    pub last_down_time: f64,
    pub stage_start_time: f64,
    pub errors: u32,
}

impl ArmMetrics {
    pub fn new(start_time: f64) -> Self {
        Self {
            rep_count: 0,
            stage: ArmStage::Down,
            angle: 0,
            accuracy: 100,
            rep_time: 0.0,
            min_rep_time: None,
            curr_rep_time: 0.0,
            feedback: String::new(),
            feedback_color: FeedbackColor::Gray,
            last_down_time: start_time,
            stage_start_time: start_time,
            errors: 0,
        }
    }

    fn recompute_accuracy(&mut self) {
        self.accuracy = if self.rep_count == 0 {
            100
        } else {
            (100 * (self.rep_count as i64 - self.errors as i64) / self.rep_count as i64)
                .clamp(0, 100) as i32
        };
    }
}

/// A pluggable source of post-rep compliment strings. Constructed once by
/// the host and passed by borrow on every call, rather than reached for as
/// a process-wide singleton.
pub trait ComplimentChooser: std::fmt::Debug {
    fn choose(&mut self) -> String;
}

const COMPLIMENTS: &[&str] = &[
    "Great rep!",
    "Nice control!",
    "Solid form!",
    "Keep it up!",
    "Excellent range!",
];

/// Production chooser backed by the thread-local PRNG.
#[derive(Debug, Default)]
pub struct RandomComplimentChooser;

impl ComplimentChooser for RandomComplimentChooser {
    fn choose(&mut self) -> String {
        use rand::seq::SliceRandom;
        COMPLIMENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Great rep!")
            .to_string()
    }
}

/// Deterministic, seeded chooser for tests that need reproducible output.
#[derive(Debug)]
pub struct SeededComplimentChooser {
    rng: rand::rngs::StdRng,
}

impl SeededComplimentChooser {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self { rng: rand::rngs::StdRng::seed_from_u64(seed) }
    }
}

impl ComplimentChooser for SeededComplimentChooser {
    fn choose(&mut self) -> String {
        use rand::seq::SliceRandom;
        COMPLIMENTS.choose(&mut self.rng).copied().unwrap_or("Great rep!").to_string()
    }
}

/// Outcome of processing one frame for one side, used by the caller to keep
/// `SessionHistory`'s feedback counters in sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepOutcome {
    pub hard_error: bool,
}

#[derive(Debug, Clone)]
struct SideState {
    pending_stage: Option<ArmStage>,
    pending_since: Option<f64>,
    angle_history: RingBuffer<{ VELOCITY_WINDOW + 1 }>,
    last_seen: Option<f64>,
    credited_until: Option<f64>,
    red_until: Option<f64>,
}

impl Default for SideState {
    fn default() -> Self {
        Self {
            pending_stage: None,
            pending_since: None,
            angle_history: RingBuffer::default(),
            last_seen: None,
            credited_until: None,
            red_until: None,
        }
    }
}

impl SideState {
    /// `|last − 4-frames-prior| / 3`, or `0.0` (treated as settled) until
    /// enough history has accumulated.
    fn velocity(&self) -> f64 {
        if self.angle_history.len() < VELOCITY_WINDOW + 1 {
            return 0.0;
        }
        let samples: Vec<f64> = self.angle_history.iter().collect();
        (samples[samples.len() - 1] - samples[0]).abs() / VELOCITY_WINDOW as f64
    }
}

/// `τ(angle, current)`: the stage a side would move to given its smoothed
/// angle and its current stage. `Lost` falls back to the `Down` branch — a
/// side regaining tracking must re-confirm extension before it can be
/// considered contracted again.
fn target_stage(angle: i32, current: ArmStage, contracted: i32, extended: i32, hysteresis: i32) -> ArmStage {
    if angle <= contracted - hysteresis {
        return ArmStage::Up;
    }
    if angle >= extended + hysteresis {
        return ArmStage::Down;
    }
    match current {
        ArmStage::Up => {
            if angle < contracted + hysteresis {
                ArmStage::Up
            } else {
                ArmStage::MovingDown
            }
        }
        ArmStage::Down | ArmStage::Lost => {
            if angle > extended - hysteresis {
                ArmStage::Down
            } else {
                ArmStage::MovingUp
            }
        }
        ArmStage::MovingUp => ArmStage::MovingUp,
        ArmStage::MovingDown => ArmStage::MovingDown,
    }
}

/// Per-side state machine driving `ArmMetrics` from a stream of smoothed
/// angles.
#[derive(Debug, Clone, Default)]
pub struct RepCounter {
    state: Sided<SideState>,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.state = Sided::default();
    }

    /// Marks a side as having gone untracked this frame. After
    /// `LOST_TRACKING_TIMEOUT` seconds of continuous absence, transitions
    /// the side into `ArmStage::Lost`.
    pub fn mark_absent(&mut self, side: Side, now: f64, metrics: &mut ArmMetrics) {
        let state = self.state.get_mut(side);
        if let Some(last_seen) = state.last_seen {
            if now - last_seen >= LOST_TRACKING_TIMEOUT && metrics.stage != ArmStage::Lost {
                metrics.stage = ArmStage::Lost;
                metrics.feedback_color = FeedbackColor::Gray;
                if metrics.feedback != "Tracking lost" {
                    metrics.feedback = "Tracking lost".to_string();
                }
                tracing::debug!(?side, "tracking lost, side entering Lost stage");
            }
        }
    }

    /// Feeds one smoothed angle sample for `side` and advances its state
    /// machine, crediting reps and updating feedback as the contract in
    /// §4.4 dictates.
    #[allow(clippy::too_many_arguments)]
    pub fn process_rep(
        &mut self,
        side: Side,
        now: f64,
        angle: i32,
        thresholds: (i32, i32),
        safe_range: (i32, i32),
        metrics: &mut ArmMetrics,
        compliments: &mut dyn ComplimentChooser,
    ) -> RepOutcome {
        let (contracted, extended) = thresholds;
        let hysteresis = REP_HYSTERESIS_MARGIN as i32;

        {
            let state = self.state.get_mut(side);
            state.last_seen = Some(now);
            state.angle_history.push(angle as f64);
        }
        metrics.angle = angle;

        let velocity = self.state.get(side).velocity();
        let target = target_stage(angle, metrics.stage, contracted, extended, hysteresis);

        if target != metrics.stage {
            let confirm_now = {
                let state = self.state.get_mut(side);
                if state.pending_stage != Some(target) {
                    state.pending_stage = Some(target);
                    state.pending_since = Some(now);
                }
                let held_long_enough = now - state.pending_since.unwrap() >= STATE_HOLD_TIME;
                held_long_enough && velocity < VELOCITY_SETTLED_THRESHOLD
            };
            if confirm_now {
                self.confirm_transition(side, now, metrics, target);
                let state = self.state.get_mut(side);
                state.pending_stage = None;
                state.pending_since = None;
            }
        } else {
            let state = self.state.get_mut(side);
            state.pending_stage = None;
            state.pending_since = None;
        }

        metrics.curr_rep_time = now - metrics.last_down_time;

        let mut outcome = RepOutcome::default();
        if velocity < FEEDBACK_VELOCITY_THRESHOLD {
            outcome = self.update_feedback(side, now, angle, safe_range, contracted, extended, metrics, compliments);
        }
        outcome
    }

    fn confirm_transition(&mut self, side: Side, now: f64, metrics: &mut ArmMetrics, target: ArmStage) {
        let prev = metrics.stage;
        metrics.stage = target;
        metrics.stage_start_time = now;
        tracing::debug!(?side, ?prev, ?target, "stage transition confirmed");

        let credits = prev == ArmStage::Up && matches!(target, ArmStage::MovingDown | ArmStage::Down);
        if credits {
            let elapsed = now - metrics.last_down_time;
            if elapsed >= MIN_REP_DURATION {
                metrics.rep_count += 1;
                metrics.rep_time = elapsed;
                metrics.min_rep_time = Some(match metrics.min_rep_time {
                    Some(prev_min) => prev_min.min(elapsed),
                    None => elapsed,
                });
                metrics.last_down_time = now;
                metrics.curr_rep_time = 0.0;
                metrics.recompute_accuracy();
                self.state.get_mut(side).credited_until = Some(now + POST_REP_COMPLIMENT_WINDOW);
                tracing::debug!(?side, rep_count = metrics.rep_count, rep_time = elapsed, "rep credited");
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update_feedback(
        &mut self,
        side: Side,
        now: f64,
        angle: i32,
        safe_range: (i32, i32),
        contracted: i32,
        extended: i32,
        metrics: &mut ArmMetrics,
        compliments: &mut dyn ComplimentChooser,
    ) -> RepOutcome {
        let (safe_min, safe_max) = safe_range;
        let state = self.state.get_mut(side);
        let mut outcome = RepOutcome::default();

        let (text, color) = if state.credited_until.map_or(false, |t| now < t) {
            (compliments.choose(), FeedbackColor::Green)
        } else if state.red_until.map_or(false, |t| now < t) {
            ("Maintain Form".to_string(), FeedbackColor::Green)
        } else if angle < safe_min {
            state.red_until = Some(now + RED_COOLDOWN);
            outcome.hard_error = true;
            ("Over Curling".to_string(), FeedbackColor::Red)
        } else if angle > safe_max {
            state.red_until = Some(now + RED_COOLDOWN);
            outcome.hard_error = true;
            ("Over Extending".to_string(), FeedbackColor::Red)
        } else if matches!(metrics.stage, ArmStage::Up | ArmStage::MovingUp)
            && (angle as f64) > contracted as f64 + ROM_GUIDANCE_MARGIN
        {
            ("Curl Higher".to_string(), FeedbackColor::Yellow)
        } else if matches!(metrics.stage, ArmStage::Down | ArmStage::MovingDown)
            && (angle as f64) < extended as f64 - ROM_GUIDANCE_MARGIN
        {
            ("Extend Fully".to_string(), FeedbackColor::Yellow)
        } else {
            let color = match metrics.stage {
                ArmStage::Up | ArmStage::Down => FeedbackColor::Green,
                ArmStage::MovingUp | ArmStage::MovingDown => FeedbackColor::Yellow,
                ArmStage::Lost => FeedbackColor::Gray,
            };
            ("Maintain Form".to_string(), color)
        };

        if outcome.hard_error {
            metrics.errors += 1;
            metrics.recompute_accuracy();
        }
        if text != metrics.feedback {
            metrics.feedback = text;
        }
        metrics.feedback_color = color;
        outcome
    }
}
