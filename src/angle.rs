//! Interior-angle computation and median-then-EMA smoothing, grounded in
//! `original_source/angle_calculator.py` and restructured per the teacher's
//! appetite for fixed-capacity, allocation-free buffers (cf.
//! `tracking.rs::KalmanFilter`'s fixed `Matrix6`/`Vector6` state).

use crate::config::{SMOOTHING_ALPHA, SMOOTHING_WINDOW};
use crate::landmark::{Landmark, Sided, Side};

/// A fixed-capacity ring buffer of `f64` samples. Replaces the teacher's
/// `VecDeque` history fields with something that never allocates past
/// construction — there's no upper bound on session length, so an
/// ever-growing `Vec` would be a slow leak.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    data: [f64; N],
    len: usize,
    head: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self { data: [0.0; N], len: 0, head: 0 }
    }
}

impl<const N: usize> RingBuffer<N> {
    pub fn push(&mut self, value: f64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.head = 0;
    }

    /// Samples oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.len < N { 0 } else { self.head };
        (0..self.len).map(move |i| self.data[(start + i) % N])
    }

    /// The median of the buffered samples. `None` when empty.
    pub fn median(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.iter().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mid = sorted.len() / 2;
        Some(if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        })
    }
}

/// Per-side smoothing state: the raw-sample window feeding the median, and
/// the running EMA.
#[derive(Debug, Clone, Default)]
struct SmoothingState {
    window: RingBuffer<SMOOTHING_WINDOW>,
    ema: Option<f64>,
}

/// Converts three 2-D points into the interior angle at the vertex, then
/// smooths the per-side series via sliding median followed by EMA.
#[derive(Debug, Clone, Default)]
pub struct AngleCalculator {
    state: Sided<SmoothingState>,
}

impl AngleCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `θ = |atan2(C.y−B.y, C.x−B.x) − atan2(A.y−B.y, A.x−B.x)|`, folded to
    /// `[0, 180]`.
    pub fn raw_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
        let ang_a = (a.y - b.y).atan2(a.x - b.x);
        let ang_c = (c.y - b.y).atan2(c.x - b.x);
        let mut theta = (ang_c - ang_a).to_degrees().abs();
        if theta > 180.0 {
            theta = 360.0 - theta;
        }
        theta
    }

    /// Feeds one raw angle sample for `side` and returns the smoothed,
    /// rounded integer degree.
    pub fn smooth(&mut self, side: Side, raw: f64) -> i32 {
        let state = self.state.get_mut(side);
        state.window.push(raw);
        let median = state.window.median().expect("just pushed a sample");

        let ema = match state.ema {
            Some(prev) => SMOOTHING_ALPHA * median + (1.0 - SMOOTHING_ALPHA) * prev,
            None => median,
        };
        state.ema = Some(ema);
        ema.round() as i32
    }

    /// Clears both sides' window buffers and EMA state.
    pub fn reset(&mut self) {
        self.state = Sided::default();
    }
}
