//! Application flow
//!
//! `App` owns everything the screens share: the store, the current player,
//! the live session and the last result. Screens call into it; nothing is
//! held in ambient globals.

use glam::Vec2;

use crate::neighborhoods::{NeighborhoodAggregator, NeighborhoodStats};
use crate::persistence::{Store, StoreError};
use crate::ranking::RankingEngine;
use crate::registry::{Player, PlayerRegistry};
use crate::sim::{GameEvent, GameSession, GameStats, PlayArea, PopOutcome};
use crate::tuning::Tuning;

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Game,
    Result,
    Ranking,
}

/// Audio/visual feedback sink. Every hook defaults to a no-op.
pub trait Feedback {
    /// An object was popped at `at`
    fn pop(&mut self, _at: Vec2) {}
    /// A button was pressed
    fn click(&mut self) {}
    /// The visible screen changed (music cue)
    fn screen_changed(&mut self, _screen: Screen) {}
}

/// Feedback that only logs
#[derive(Debug, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn pop(&mut self, at: Vec2) {
        log::debug!("pop at ({:.0}, {:.0})", at.x, at.y);
    }

    fn click(&mut self) {
        log::debug!("click");
    }

    fn screen_changed(&mut self, screen: Screen) {
        log::debug!("screen -> {:?}", screen);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("name and neighborhood are required")]
    InvalidRegistration,
    #[error("no player registered")]
    NoPlayer,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Leaderboard data for the ranking screen
#[derive(Debug, Clone, PartialEq)]
pub struct RankingBoard {
    pub players: Vec<Player>,
    pub neighborhoods: Vec<NeighborhoodStats>,
}

pub struct App<S: Store, F: Feedback> {
    store: S,
    feedback: F,
    tuning: Tuning,
    screen: Screen,
    player: Option<Player>,
    session: Option<GameSession>,
    last_stats: Option<GameStats>,
}

impl<S: Store, F: Feedback> App<S, F> {
    /// Start on the welcome screen with any previously saved player
    pub fn new(mut store: S, tuning: Tuning, feedback: F) -> Result<Self, AppError> {
        let player = PlayerRegistry::new(&mut store).current_player()?;
        if let Some(p) = &player {
            log::info!("Welcome back, {}", p.name);
        }
        Ok(Self {
            store,
            feedback,
            tuning: tuning.validated(),
            screen: Screen::Welcome,
            player,
            session: None,
            last_stats: None,
        })
    }

    /// Register a new player from the welcome form
    pub fn login(&mut self, name: &str, neighborhood: &str, whatsapp: &str) -> Result<&Player, AppError> {
        self.feedback.click();
        if name.trim().is_empty() || neighborhood.trim().is_empty() {
            return Err(AppError::InvalidRegistration);
        }
        let whatsapp = Some(whatsapp.trim()).filter(|w| !w.is_empty());
        let player = PlayerRegistry::new(&mut self.store).create_player(name, neighborhood, whatsapp)?;
        Ok(self.player.insert(player))
    }

    /// Start a new session and switch to the game screen
    pub fn play(&mut self, seed: u64) -> Result<(), AppError> {
        if self.player.is_none() {
            return Err(AppError::NoPlayer);
        }
        self.last_stats = None;
        let mut session = GameSession::new(self.tuning.clone(), seed);
        session.start();
        self.session = Some(session);
        self.set_screen(Screen::Game);
        Ok(())
    }

    /// Drive the running session by `dt_ms` of wall time.
    ///
    /// Returns the result on the frame the session completes.
    pub fn frame(&mut self, dt_ms: u64, area: PlayArea) -> Option<GameStats> {
        let session = self.session.as_mut()?;
        session.set_play_area(area);
        let finished = session.advance(dt_ms);
        self.dispatch_events();
        if let Some(stats) = finished {
            self.finish_session(stats);
        }
        finished
    }

    /// Pop input from the play area
    pub fn pop(&mut self, id: u32) -> Option<PopOutcome> {
        let outcome = self.session.as_mut()?.pop(id);
        self.dispatch_events();
        outcome
    }

    fn dispatch_events(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for event in session.drain_events() {
            if let GameEvent::Popped { at, .. } = event {
                self.feedback.pop(at);
            }
        }
    }

    /// Persist a finished session and move to the result screen. An
    /// unknown player sends the user back to the welcome screen instead.
    pub fn finish_session(&mut self, stats: GameStats) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let neighborhood = player.neighborhood.clone();

        let updated = PlayerRegistry::new(&mut self.store).update_player_stats(&player.id, stats.score);
        match updated {
            Ok(updated) => {
                if let Err(e) =
                    NeighborhoodAggregator::new(&mut self.store).record_score(&neighborhood, stats.score)
                {
                    log::error!("Failed to record neighborhood score: {}", e);
                }
                self.player = Some(updated);
                self.last_stats = Some(stats);
                self.set_screen(Screen::Result);
            }
            Err(e) => {
                log::error!("Failed to update player stats ({}). Returning to welcome screen.", e);
                self.set_screen(Screen::Welcome);
            }
        }
        self.session = None;
    }

    pub fn play_again(&mut self, seed: u64) -> Result<(), AppError> {
        self.feedback.click();
        self.play(seed)
    }

    pub fn back_to_welcome(&mut self) {
        self.feedback.click();
        self.last_stats = None;
        self.session = None;
        self.set_screen(Screen::Welcome);
    }

    pub fn show_ranking(&mut self) {
        self.feedback.click();
        self.set_screen(Screen::Ranking);
    }

    /// Back to the result screen if a result is showing, else welcome
    pub fn back_from_ranking(&mut self) {
        self.feedback.click();
        let screen = if self.last_stats.is_some() {
            Screen::Result
        } else {
            Screen::Welcome
        };
        self.set_screen(screen);
    }

    /// Current player's neighborhood position for the result screen
    pub fn neighborhood_rank(&mut self) -> Result<Option<usize>, StoreError> {
        let Some(player) = self.player.as_ref() else {
            return Ok(None);
        };
        let neighborhood = player.neighborhood.clone();
        RankingEngine::new(&mut self.store).rank_of(&neighborhood)
    }

    pub fn ranking_board(&mut self, limit: usize) -> Result<RankingBoard, StoreError> {
        let mut ranking = RankingEngine::new(&mut self.store);
        Ok(RankingBoard {
            players: ranking.top_players(limit)?,
            neighborhoods: ranking.top_neighborhoods(limit)?,
        })
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.feedback.screen_changed(screen);
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn last_stats(&self) -> Option<GameStats> {
        self.last_stats
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }
}
