//! Data-driven game balance
//!
//! Every number the session simulation uses lives here. Defaults mirror
//! [`crate::consts`]; a JSON override can be loaded at startup.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Upper bound for object and particle sizes (px)
const MAX_OBJECT_SIZE: f32 = 500.0;
/// Upper bound for any speed (px per frame)
const MAX_SPEED: f32 = 100.0;

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session timing ===
    /// Session length in seconds
    pub session_secs: u32,
    /// Seconds of elapsed play per difficulty tier
    pub difficulty_step_secs: u32,
    /// Frenzy starts at this many remaining seconds
    pub frenzy_secs: u32,
    /// Spawn cadence multiplier during frenzy
    pub frenzy_multiplier: u32,
    /// Countdown tick (ms)
    pub countdown_interval_ms: u64,
    /// Animation frame tick (ms)
    pub frame_interval_ms: u64,

    // === Spawning ===
    pub base_spawn_interval_ms: u64,
    pub min_spawn_interval_ms: u64,
    pub min_object_size: f32,
    pub max_object_size: f32,
    /// Horizontal speed spread per difficulty tier (vx in +-spread/2)
    pub horizontal_speed_spread: f32,
    /// Upward speed range per difficulty tier
    pub min_rise_speed: f32,
    pub max_rise_speed: f32,
    /// Object colors (CSS hex)
    pub colors: Vec<String>,

    // === Scoring ===
    pub combo_window_ms: u64,
    pub points_per_pop: u64,

    // === Particles ===
    pub burst_particles: usize,
    pub particle_speed: f32,
    pub min_particle_size: f32,
    pub max_particle_size: f32,
    pub particle_life: u32,
    pub particle_decay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            session_secs: SESSION_SECS,
            difficulty_step_secs: DIFFICULTY_STEP_SECS,
            frenzy_secs: FRENZY_SECS,
            frenzy_multiplier: FRENZY_MULTIPLIER,
            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,
            frame_interval_ms: FRAME_INTERVAL_MS,

            base_spawn_interval_ms: BASE_SPAWN_INTERVAL_MS,
            min_spawn_interval_ms: MIN_SPAWN_INTERVAL_MS,
            min_object_size: 20.0,
            max_object_size: 50.0,
            horizontal_speed_spread: 3.0,
            min_rise_speed: 1.5,
            max_rise_speed: 3.5,
            colors: vec![
                "#ff0000".to_string(),
                "#f2c94c".to_string(),
                "#00eaff".to_string(),
            ],

            combo_window_ms: COMBO_WINDOW_MS,
            points_per_pop: POINTS_PER_POP,

            burst_particles: BURST_PARTICLES,
            particle_speed: 10.0,
            min_particle_size: 2.0,
            max_particle_size: 7.0,
            particle_life: PARTICLE_LIFE,
            particle_decay: PARTICLE_DECAY,
        }
    }
}

impl Tuning {
    /// Clamp values that would make the simulation degenerate
    /// (zero intervals, inverted ranges, empty palette). Non-finite floats
    /// fall back to their defaults.
    pub fn validated(mut self) -> Self {
        let d = Self::default();

        self.session_secs = self.session_secs.max(1);
        self.difficulty_step_secs = self.difficulty_step_secs.max(1);
        self.frenzy_multiplier = self.frenzy_multiplier.max(1);
        self.countdown_interval_ms = self.countdown_interval_ms.max(1);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self.min_spawn_interval_ms = self.min_spawn_interval_ms.max(1);
        self.base_spawn_interval_ms = self.base_spawn_interval_ms.max(self.min_spawn_interval_ms);

        self.min_object_size = finite_or(self.min_object_size, d.min_object_size)
            .clamp(1.0, MAX_OBJECT_SIZE);
        self.max_object_size = finite_or(self.max_object_size, d.max_object_size)
            .clamp(self.min_object_size, MAX_OBJECT_SIZE);
        self.horizontal_speed_spread =
            finite_or(self.horizontal_speed_spread, d.horizontal_speed_spread)
                .clamp(0.0, MAX_SPEED);
        self.min_rise_speed =
            finite_or(self.min_rise_speed, d.min_rise_speed).clamp(0.1, MAX_SPEED);
        self.max_rise_speed = finite_or(self.max_rise_speed, d.max_rise_speed)
            .clamp(self.min_rise_speed, MAX_SPEED);
        if self.colors.is_empty() {
            self.colors = d.colors;
        }

        self.particle_speed =
            finite_or(self.particle_speed, d.particle_speed).clamp(0.0, MAX_SPEED);
        self.min_particle_size =
            finite_or(self.min_particle_size, d.min_particle_size).clamp(0.0, MAX_OBJECT_SIZE);
        self.max_particle_size = finite_or(self.max_particle_size, d.max_particle_size)
            .clamp(self.min_particle_size, MAX_OBJECT_SIZE);
        self.particle_decay = finite_or(self.particle_decay, d.particle_decay).clamp(0.0, 1.0);
        self
    }

    /// Env var naming a JSON tuning file (native only)
    #[allow(dead_code)]
    const TUNING_ENV: &'static str = "ESTOURA_TUDO_TUNING";

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "estoura_tudo_tuning";

    /// Parse a JSON override; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Tuning>(json).map(Tuning::validated)
    }

    /// Load tuning from the file named by `ESTOURA_TUDO_TUNING`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::TUNING_ENV) else {
            log::info!("Using default tuning");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning file {}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Invalid stored tuning: {}, using defaults", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let t = Tuning::default();
        assert_eq!(t.session_secs, 60);
        assert_eq!(t.combo_window_ms, 1500);
        assert_eq!(t.points_per_pop, 10);
        assert_eq!(t.burst_particles, 20);
        assert_eq!(t, t.clone().validated());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "session_secs": 30 }"#).unwrap();
        assert_eq!(t.session_secs, 30);
        assert_eq!(t.frenzy_secs, FRENZY_SECS);
        assert_eq!(t.colors.len(), 3);
    }

    #[test]
    fn test_validated_fixes_degenerate_values() {
        let t = Tuning {
            min_spawn_interval_ms: 0,
            base_spawn_interval_ms: 0,
            min_object_size: 40.0,
            max_object_size: 10.0,
            colors: Vec::new(),
            ..Default::default()
        }
        .validated();
        assert_eq!(t.min_spawn_interval_ms, 1);
        assert!(t.base_spawn_interval_ms >= t.min_spawn_interval_ms);
        assert_eq!(t.max_object_size, 40.0);
        assert!(!t.colors.is_empty());
    }

    #[test]
    fn test_overflowing_floats_fall_back() {
        // 1e39 overflows f32 and parses as infinity
        let t = Tuning::from_json(r#"{ "max_object_size": 1e39, "max_rise_speed": -1e39 }"#)
            .unwrap();
        assert_eq!(t.max_object_size, Tuning::default().max_object_size);
        assert_eq!(t.max_rise_speed, Tuning::default().max_rise_speed);

        let t = Tuning {
            min_object_size: f32::NAN,
            particle_decay: f32::INFINITY,
            horizontal_speed_spread: 1.0e30,
            ..Default::default()
        }
        .validated();
        assert_eq!(t.min_object_size, Tuning::default().min_object_size);
        assert_eq!(t.particle_decay, PARTICLE_DECAY);
        assert_eq!(t.horizontal_speed_spread, MAX_SPEED);
    }

    #[test]
    fn test_overflowing_tuning_still_spawns() {
        use crate::sim::{GameSession, PlayArea};

        let tuning = Tuning::from_json(r#"{ "max_object_size": 1e39 }"#).unwrap();
        let mut session = GameSession::new(tuning, 3);
        session.set_play_area(PlayArea::new(400.0, 800.0));
        assert!(session.start());
        assert_eq!(session.advance(1_000), None);
        assert!(!session.objects().is_empty());
        assert!(session.objects().iter().all(|o| o.size.is_finite()));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Tuning::from_json("not json").is_err());
    }
}
