//! Shared data model: normalized 2-D landmarks and the two-sided map that
//! replaces the teacher's `HashMap<String, T>` keyed by `"left"`/`"right"`.

use serde::{Deserialize, Serialize};

/// A normalized 2-D point with a detector confidence, matching the detector
/// collaborator's output shape (`x, y ∈ [0,1]`, `visibility ∈ [0,1]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }
}

/// A dense, indexed set of landmarks for a single instant, plus the
/// monotonically increasing capture timestamp in seconds.
#[derive(Debug, Clone, Default)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
    pub timestamp: f64,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>, timestamp: f64) -> Self {
        Self { landmarks, timestamp }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

/// One side of a bilaterally-tracked body. Exhaustive, unlike the teacher's
/// `&str` side keys — the compiler enforces both sides are handled everywhere
/// that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Right,
    Left,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Right, Side::Left];

    pub fn label(self) -> &'static str {
        match self {
            Side::Right => "right",
            Side::Left => "left",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A two-entry map keyed by `Side`, generalizing the per-side `HashMap`s the
/// teacher scatters across `palm_history`/`rotation_history`/`active_arms`
/// into a single reusable, allocation-free container.
#[derive(Debug, Clone, Default)]
pub struct Sided<T> {
    pub right: T,
    pub left: T,
}

impl<T> Sided<T> {
    pub fn new(right: T, left: T) -> Self {
        Self { right, left }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Right => &self.right,
            Side::Left => &self.left,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Right => &mut self.right,
            Side::Left => &mut self.left,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Right, &self.right), (Side::Left, &self.left)].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Side, &mut T)> {
        [(Side::Right, &mut self.right), (Side::Left, &mut self.left)].into_iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> Sided<U> {
        Sided {
            right: f(Side::Right, &self.right),
            left: f(Side::Left, &self.left),
        }
    }
}

impl<T> Sided<T>
where
    T: Default,
{
    pub fn default_pair() -> Self {
        Self { right: T::default(), left: T::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sided_get_matches_side() {
        let s = Sided::new(1, 2);
        assert_eq!(*s.get(Side::Right), 1);
        assert_eq!(*s.get(Side::Left), 2);
    }

    #[test]
    fn sided_iter_visits_both() {
        let s = Sided::new("r", "l");
        let collected: Vec<_> = s.iter().collect();
        assert_eq!(collected, vec![(Side::Right, &"r"), (Side::Left, &"l")]);
    }
}
