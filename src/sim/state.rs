//! Session state and core simulation types
//!
//! Objects and particles live in id-ordered vectors that the tick rebuilds
//! each frame; nothing outside the session mutates them.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Created, not started
    Idle,
    /// Countdown running, objects spawning
    Running,
    /// Countdown reached zero; stats emitted
    Ended,
}

/// Measured size of the play area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// False until the host has laid the area out with a real size
    pub fn is_laid_out(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// True while any part of a `size`-wide box at `pos` (top-left) can still be on screen
    pub fn contains(&self, pos: Vec2, size: f32) -> bool {
        pos.x > -size && pos.x < self.width + size && pos.y > -size && pos.y < self.height + size
    }
}

/// A poppable target. `pos` is the top-left corner of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: u32,
    pub pos: Vec2,
    /// Per-frame velocity; `vel.y` is always negative (rising)
    pub vel: Vec2,
    pub size: f32,
    pub color: String,
}

impl GameObject {
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }
}

/// A short-lived burst fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: String,
    /// Frames left to live
    pub life: u32,
}

/// Final result of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub score: u64,
    pub max_combo: u32,
}

/// Feedback-worthy things that happened during a session
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// An object was popped
    Popped {
        id: u32,
        at: Vec2,
        combo: u32,
        points: u64,
    },
    /// Difficulty tier went up
    DifficultyChanged { tier: u32 },
    /// Frenzy mode started
    FrenzyStarted,
}

/// Mutable per-session world
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    /// Live objects, sorted by id
    pub objects: Vec<GameObject>,
    /// Live particles
    pub particles: Vec<Particle>,
    /// Simulation frames advanced
    pub frames: u64,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            objects: Vec::new(),
            particles: Vec::new(),
            frames: 0,
            next_id: 1,
        }
    }

    /// Allocate a new object id
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Look up a live object by id
    pub fn object(&self, id: u32) -> Option<&GameObject> {
        self.objects
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|i| &self.objects[i])
    }

    /// Remove and return a live object by id
    pub fn take_object(&mut self, id: u32) -> Option<GameObject> {
        let idx = self.objects.binary_search_by_key(&id, |o| o.id).ok()?;
        Some(self.objects.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: u32) -> GameObject {
        GameObject {
            id,
            pos: Vec2::new(10.0, 10.0),
            vel: Vec2::new(0.0, -1.0),
            size: 20.0,
            color: "#ff0000".to_string(),
        }
    }

    #[test]
    fn test_play_area_layout() {
        assert!(!PlayArea::default().is_laid_out());
        assert!(!PlayArea::new(300.0, 0.0).is_laid_out());
        assert!(PlayArea::new(300.0, 500.0).is_laid_out());
    }

    #[test]
    fn test_contains_uses_size_margin() {
        let area = PlayArea::new(100.0, 100.0);
        assert!(area.contains(Vec2::new(-19.0, 50.0), 20.0));
        assert!(!area.contains(Vec2::new(-20.0, 50.0), 20.0));
        assert!(area.contains(Vec2::new(50.0, 119.0), 20.0));
        assert!(!area.contains(Vec2::new(50.0, 120.0), 20.0));
        assert!(!area.contains(Vec2::new(120.0, 50.0), 20.0));
        assert!(!area.contains(Vec2::new(50.0, -20.0), 20.0));
    }

    #[test]
    fn test_take_object_by_id() {
        let mut state = GameState::new(7);
        for _ in 0..3 {
            let id = state.next_entity_id();
            state.objects.push(object(id));
        }
        assert_eq!(state.object(2).map(|o| o.id), Some(2));
        assert_eq!(state.take_object(2).map(|o| o.id), Some(2));
        assert!(state.object(2).is_none());
        assert!(state.take_object(2).is_none());
        assert_eq!(state.objects.len(), 2);
    }

    #[test]
    fn test_center() {
        assert_eq!(object(1).center(), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_stats_json_is_camel_case() {
        let json = serde_json::to_string(&GameStats {
            score: 30,
            max_combo: 2,
        })
        .unwrap();
        assert_eq!(json, r#"{"score":30,"maxCombo":2}"#);
    }
}
