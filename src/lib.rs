//! Estoura Tudo - a 60-second pop-the-targets arcade game
//!
//! Core modules:
//! - `sim`: Session simulation (spawning, motion, combo scoring, difficulty ramp)
//! - `persistence`: Key-value record store with corruption recovery
//! - `registry`: Player records and the master player list
//! - `neighborhoods`: Per-neighborhood score aggregation
//! - `ranking`: Leaderboard queries
//! - `app`: Screen flow and session orchestration
//! - `tuning`: Data-driven game balance

pub mod app;
pub mod neighborhoods;
pub mod persistence;
pub mod ranking;
pub mod registry;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{App, AppError, Feedback, LogFeedback, Screen};
pub use neighborhoods::{NeighborhoodAggregator, NeighborhoodStats};
pub use persistence::{MemoryStore, Store, StoreError};
pub use ranking::RankingEngine;
pub use registry::{Player, PlayerRegistry, RegistryError};
pub use sim::{GameSession, GameStats, PlayArea};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Session length in seconds
    pub const SESSION_SECS: u32 = 60;
    /// Seconds of play per difficulty tier
    pub const DIFFICULTY_STEP_SECS: u32 = 20;
    /// Frenzy mode starts when this many seconds (or fewer) remain
    pub const FRENZY_SECS: u32 = 10;
    /// Spawn cadence multiplier while in frenzy
    pub const FRENZY_MULTIPLIER: u32 = 2;

    /// Two pops closer together than this keep the combo going (ms)
    pub const COMBO_WINDOW_MS: u64 = 1500;
    /// Base points per pop, multiplied by the combo
    pub const POINTS_PER_POP: u64 = 10;

    /// Spawn interval at difficulty 1 (ms)
    pub const BASE_SPAWN_INTERVAL_MS: u64 = 1000;
    /// Spawn interval floor (ms)
    pub const MIN_SPAWN_INTERVAL_MS: u64 = 100;
    /// Countdown resolution (ms)
    pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;
    /// Animation frame interval (~60 Hz)
    pub const FRAME_INTERVAL_MS: u64 = 16;

    /// Particles per pop burst
    pub const BURST_PARTICLES: usize = 20;
    /// Particle lifetime in frames
    pub const PARTICLE_LIFE: u32 = 30;
    /// Per-frame particle shrink factor
    pub const PARTICLE_DECAY: f32 = 0.95;
}

/// Current wall-clock time in milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

/// Current wall-clock time in milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
