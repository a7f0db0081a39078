//! Browser bindings
//!
//! Exposes [`App`] to the page script. The page owns rendering, audio and
//! form input; it calls `frame` from `requestAnimationFrame` with the
//! measured play-area size and `pop` when a target is clicked.

use wasm_bindgen::prelude::*;

use crate::app::{App, Feedback, Screen};
use crate::persistence::LocalStorageStore;
use crate::ranking::DEFAULT_LIMIT;
use crate::sim::PlayArea;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Estoura Tudo (web) starting...");
}

/// Queues feedback cues for the page to play
#[derive(Default)]
struct CueQueue {
    cues: Vec<String>,
}

impl Feedback for CueQueue {
    fn pop(&mut self, _at: glam::Vec2) {
        self.cues.push("pop".to_string());
    }

    fn click(&mut self) {
        self.cues.push("click".to_string());
    }

    fn screen_changed(&mut self, screen: Screen) {
        self.cues.push(format!("music:{}", screen_name(screen)));
    }
}

fn screen_name(screen: Screen) -> &'static str {
    match screen {
        Screen::Welcome => "welcome",
        Screen::Game => "game",
        Screen::Result => "result",
        Screen::Ranking => "ranking",
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebApp {
    app: App<LocalStorageStore, CueQueue>,
}

#[wasm_bindgen]
impl WebApp {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebApp, JsValue> {
        let store = LocalStorageStore::open().map_err(to_js_error)?;
        let app = App::new(store, Tuning::load(), CueQueue::default()).map_err(to_js_error)?;
        Ok(WebApp { app })
    }

    pub fn login(&mut self, name: &str, neighborhood: &str, whatsapp: &str) -> Result<(), JsValue> {
        self.app
            .login(name, neighborhood, whatsapp)
            .map(|_| ())
            .map_err(to_js_error)
    }

    pub fn play(&mut self) -> Result<(), JsValue> {
        self.app.play(crate::now_millis()).map_err(to_js_error)
    }

    pub fn play_again(&mut self) -> Result<(), JsValue> {
        self.app.play_again(crate::now_millis()).map_err(to_js_error)
    }

    /// Advance by `dt_ms`; returns the result JSON on the finishing frame
    pub fn frame(&mut self, dt_ms: f64, width: f32, height: f32) -> Option<String> {
        let dt_ms = dt_ms.clamp(0.0, 1000.0) as u64;
        self.app
            .frame(dt_ms, PlayArea::new(width, height))
            .and_then(|stats| serde_json::to_string(&stats).ok())
    }

    /// Returns the new score, or `None` if the target was already gone
    pub fn pop(&mut self, id: u32) -> Option<f64> {
        self.app.pop(id).map(|outcome| outcome.score as f64)
    }

    pub fn back_to_welcome(&mut self) {
        self.app.back_to_welcome();
    }

    pub fn show_ranking(&mut self) {
        self.app.show_ranking();
    }

    pub fn back_from_ranking(&mut self) {
        self.app.back_from_ranking();
    }

    pub fn screen(&self) -> String {
        screen_name(self.app.screen()).to_string()
    }

    pub fn player_json(&self) -> Option<String> {
        self.app
            .player()
            .and_then(|p| serde_json::to_string(p).ok())
    }

    /// HUD, objects and particles for the current session
    pub fn session_json(&self) -> Option<String> {
        let session = self.app.session()?;
        let snapshot = serde_json::json!({
            "score": session.score(),
            "timeLeft": session.time_left(),
            "combo": session.combo(),
            "frenzy": session.is_frenzy(),
            "difficulty": session.difficulty(),
            "objects": session.objects(),
            "particles": session.particles(),
        });
        Some(snapshot.to_string())
    }

    pub fn last_stats_json(&self) -> Option<String> {
        self.app
            .last_stats()
            .and_then(|stats| serde_json::to_string(&stats).ok())
    }

    pub fn neighborhood_rank(&mut self) -> Option<u32> {
        match self.app.neighborhood_rank() {
            Ok(rank) => rank.map(|rank| rank as u32),
            Err(e) => {
                log::error!("Failed to load neighborhood rank: {}", e);
                None
            }
        }
    }

    pub fn ranking_json(&mut self) -> Result<String, JsValue> {
        let board = self.app.ranking_board(DEFAULT_LIMIT).map_err(to_js_error)?;
        let snapshot = serde_json::json!({
            "players": board.players,
            "neighborhoods": board.neighborhoods,
        });
        Ok(snapshot.to_string())
    }

    /// Feedback cues queued since the last call ("pop", "click", "music:<screen>")
    pub fn take_cues(&mut self) -> Vec<String> {
        std::mem::take(&mut self.app.feedback_mut().cues)
    }
}
