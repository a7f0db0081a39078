//! Session simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Millisecond virtual clock driven by the host
//! - Seeded RNG only
//! - Stable iteration order (by object id)

pub mod combo;
pub mod scheduler;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use combo::{ComboTracker, PopScore};
pub use scheduler::{Scheduler, TimerHandle, TimerKind};
pub use session::{GameSession, PopOutcome};
pub use spawn::{burst, spawn_object};
pub use state::{GameEvent, GameObject, GamePhase, GameState, GameStats, Particle, PlayArea};
pub use tick::tick;
