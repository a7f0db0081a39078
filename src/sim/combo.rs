//! Combo tracking
//!
//! A pop within the combo window of the previous successful pop extends the
//! combo; otherwise it restarts at 1. Misses are never reported here, so
//! they neither reset nor pause the window.

use serde::{Deserialize, Serialize};

/// Result of registering one pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopScore {
    /// Combo value at the time of this pop
    pub combo: u32,
    /// Points awarded for this pop (`points_per_pop * combo`)
    pub points: u64,
}

/// Running combo, score and best combo for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboTracker {
    window_ms: u64,
    points_per_pop: u64,
    last_pop_ms: Option<u64>,
    combo: u32,
    max_combo: u32,
    score: u64,
}

impl ComboTracker {
    pub fn new(window_ms: u64, points_per_pop: u64) -> Self {
        Self {
            window_ms,
            points_per_pop,
            ..Default::default()
        }
    }

    /// Register a successful pop at `now_ms`
    pub fn register_pop(&mut self, now_ms: u64) -> PopScore {
        let chained = self
            .last_pop_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.window_ms);
        self.combo = if chained { self.combo + 1 } else { 1 };
        self.last_pop_ms = Some(now_ms);
        self.max_combo = self.max_combo.max(self.combo);

        let points = self.points_per_pop * u64::from(self.combo);
        self.score += points;

        PopScore {
            combo: self.combo,
            points,
        }
    }

    /// Combo reached by the most recent pop (0 before any pop)
    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn score(&self) -> u64 {
        self.score
    }
}
