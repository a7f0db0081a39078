//! A single timed play session
//!
//! `GameSession` is the Idle -> Running -> Ended state machine. The host
//! feeds it elapsed wall time through [`GameSession::advance`] and pop input
//! through [`GameSession::pop`]; three repeating timers (countdown, spawn,
//! frame) drive everything else. Input and timer handlers both take
//! `&mut self`, so a pop can never interleave with a frame.

use super::combo::{ComboTracker, PopScore};
use super::scheduler::{Scheduler, TimerHandle, TimerKind};
use super::spawn::{burst, spawn_object};
use super::state::{GameEvent, GameObject, GamePhase, GameState, GameStats, Particle, PlayArea};
use super::tick::tick;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, Default)]
struct Timers {
    countdown: Option<TimerHandle>,
    spawn: Option<TimerHandle>,
    frame: Option<TimerHandle>,
}

/// Outcome of a successful pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopOutcome {
    pub id: u32,
    pub combo: u32,
    pub points: u64,
    pub score: u64,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    tuning: Tuning,
    phase: GamePhase,
    state: GameState,
    area: PlayArea,
    scheduler: Scheduler,
    timers: Timers,
    combo: ComboTracker,
    time_left: u32,
    /// Spawn cadence inputs the current spawn timer was built for
    cadence: (u32, bool),
    events: Vec<GameEvent>,
    result_emitted: bool,
}

impl GameSession {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = tuning.validated();
        let combo = ComboTracker::new(tuning.combo_window_ms, tuning.points_per_pop);
        let time_left = tuning.session_secs;
        Self {
            tuning,
            phase: GamePhase::Idle,
            state: GameState::new(seed),
            area: PlayArea::default(),
            scheduler: Scheduler::new(),
            timers: Timers::default(),
            combo,
            time_left,
            cadence: (1, false),
            events: Vec::new(),
            result_emitted: false,
        }
    }

    /// Idle -> Running. Installs the countdown, spawn and frame timers.
    /// Returns false if the session was already started.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.phase = GamePhase::Running;
        self.timers.countdown = Some(
            self.scheduler
                .every(TimerKind::Countdown, self.tuning.countdown_interval_ms),
        );
        self.timers.frame = Some(
            self.scheduler
                .every(TimerKind::Frame, self.tuning.frame_interval_ms),
        );
        self.cadence = (self.difficulty(), self.is_frenzy());
        let interval = self.spawn_interval_ms();
        self.timers.spawn = Some(self.scheduler.every(TimerKind::Spawn, interval));
        log::info!(
            "Session started (seed {}, {}s)",
            self.state.seed,
            self.tuning.session_secs
        );
        true
    }

    /// Update the measured play area (on layout or resize)
    pub fn set_play_area(&mut self, area: PlayArea) {
        self.area = area;
    }

    /// Advance wall time by `dt_ms`, firing every timer that comes due.
    ///
    /// Returns the session result exactly once: on the call during which
    /// the countdown reaches zero.
    pub fn advance(&mut self, dt_ms: u64) -> Option<GameStats> {
        if self.phase != GamePhase::Running {
            return None;
        }
        let deadline = self.scheduler.now_ms().saturating_add(dt_ms);

        while let Some((_, kind)) = self.scheduler.next_due(deadline) {
            match kind {
                TimerKind::Countdown => {
                    if let Some(stats) = self.on_countdown() {
                        return Some(stats);
                    }
                }
                TimerKind::Spawn => {
                    let difficulty = self.difficulty();
                    spawn_object(&mut self.state, self.area, difficulty, &self.tuning);
                }
                TimerKind::Frame => {
                    tick(&mut self.state, self.area, self.tuning.particle_decay);
                }
            }
        }
        self.scheduler.settle(deadline);
        None
    }

    /// Handle a pop aimed at object `id`. A missing object (already popped
    /// or drifted away) and any pop outside the Running phase are no-ops.
    pub fn pop(&mut self, id: u32) -> Option<PopOutcome> {
        if self.phase != GamePhase::Running {
            return None;
        }
        let obj = self.state.take_object(id)?;

        let PopScore { combo, points } = self.combo.register_pop(self.scheduler.now_ms());
        let at = obj.center();
        burst(&mut self.state, at, &obj.color, &self.tuning);
        self.events.push(GameEvent::Popped {
            id,
            at,
            combo,
            points,
        });

        Some(PopOutcome {
            id,
            combo,
            points,
            score: self.combo.score(),
        })
    }

    /// Take the feedback events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn on_countdown(&mut self) -> Option<GameStats> {
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return self.finish();
        }

        let cadence = (self.difficulty(), self.is_frenzy());
        if cadence != self.cadence {
            if cadence.0 != self.cadence.0 {
                log::debug!("Difficulty tier {}", cadence.0);
                self.events.push(GameEvent::DifficultyChanged { tier: cadence.0 });
            }
            if cadence.1 && !self.cadence.1 {
                log::info!("Frenzy! {}s left", self.time_left);
                self.events.push(GameEvent::FrenzyStarted);
            }
            self.cadence = cadence;
            let interval = self.spawn_interval_ms();
            self.timers.spawn =
                Some(self.scheduler.reschedule(self.timers.spawn, TimerKind::Spawn, interval));
        }
        None
    }

    /// Running -> Ended. Cancels all three timers together.
    fn finish(&mut self) -> Option<GameStats> {
        if self.result_emitted {
            return None;
        }
        let Timers {
            countdown,
            spawn,
            frame,
        } = std::mem::take(&mut self.timers);
        for handle in [countdown, spawn, frame].into_iter().flatten() {
            self.scheduler.cancel(handle);
        }
        debug_assert_eq!(self.scheduler.active_count(TimerKind::Countdown), 0);
        self.phase = GamePhase::Ended;
        self.result_emitted = true;

        let stats = self.stats();
        log::info!(
            "Session ended: score {}, max combo {}",
            stats.score,
            stats.max_combo
        );
        Some(stats)
    }

    /// Current spawn cadence: `max(min, base / (difficulty * frenzy))`
    pub fn spawn_interval_ms(&self) -> u64 {
        let frenzy = if self.is_frenzy() {
            self.tuning.frenzy_multiplier
        } else {
            1
        };
        let divisor = u64::from(self.difficulty()) * u64::from(frenzy);
        (self.tuning.base_spawn_interval_ms / divisor.max(1)).max(self.tuning.min_spawn_interval_ms)
    }

    /// Difficulty tier: `floor(elapsed / step) + 1`
    pub fn difficulty(&self) -> u32 {
        let elapsed = self.tuning.session_secs - self.time_left;
        elapsed / self.tuning.difficulty_step_secs + 1
    }

    pub fn is_frenzy(&self) -> bool {
        self.time_left <= self.tuning.frenzy_secs
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whole seconds remaining
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn score(&self) -> u64 {
        self.combo.score()
    }

    pub fn combo(&self) -> u32 {
        self.combo.combo()
    }

    pub fn max_combo(&self) -> u32 {
        self.combo.max_combo()
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            score: self.combo.score(),
            max_combo: self.combo.max_combo(),
        }
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.state.objects
    }

    pub fn particles(&self) -> &[Particle] {
        &self.state.particles
    }

    pub fn play_area(&self) -> PlayArea {
        self.area
    }

    /// Session clock in ms since start
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Number of live timers of a kind (for invariant checks)
    pub fn active_timers(&self, kind: TimerKind) -> usize {
        self.scheduler.active_count(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// No sideways drift and a tall area, so spawned objects stay poppable
    fn steady() -> Tuning {
        Tuning {
            horizontal_speed_spread: 0.0,
            ..Default::default()
        }
    }

    fn running(seed: u64) -> GameSession {
        let mut s = GameSession::new(steady(), seed);
        s.set_play_area(PlayArea::new(400.0, 100_000.0));
        assert!(s.start());
        s
    }

    /// Step in frame-sized chunks, collecting every emitted result
    fn run_for(s: &mut GameSession, ms: u64) -> Vec<GameStats> {
        let mut results = Vec::new();
        let mut left = ms;
        while left > 0 {
            let step = left.min(16);
            results.extend(s.advance(step));
            left -= step;
        }
        results
    }

    #[test]
    fn test_idle_until_started() {
        let mut s = GameSession::new(Tuning::default(), 1);
        s.set_play_area(PlayArea::new(400.0, 800.0));
        assert_eq!(s.phase(), GamePhase::Idle);
        assert_eq!(s.advance(5_000), None);
        assert!(s.objects().is_empty());
        assert_eq!(s.time_left(), 60);
        assert!(s.start());
        assert!(!s.start());
        assert_eq!(s.phase(), GamePhase::Running);
    }

    #[test]
    fn test_session_without_pops_ends_once_with_zero_stats() {
        let mut s = running(1);
        let results = run_for(&mut s, 70_000);
        assert_eq!(results, vec![GameStats { score: 0, max_combo: 0 }]);
        assert_eq!(s.phase(), GamePhase::Ended);
        assert_eq!(s.time_left(), 0);
        assert_eq!(s.now_ms(), 60_000);
    }

    #[test]
    fn test_large_step_still_ends_exactly_once() {
        let mut s = running(2);
        assert!(s.advance(120_000).is_some());
        assert!(s.advance(1_000).is_none());
    }

    #[test]
    fn test_end_cancels_every_timer_and_freezes_state() {
        let mut s = running(3);
        run_for(&mut s, 60_000);
        assert_eq!(s.phase(), GamePhase::Ended);
        for kind in [TimerKind::Countdown, TimerKind::Spawn, TimerKind::Frame] {
            assert_eq!(s.active_timers(kind), 0);
        }
        let objects = s.objects().to_vec();
        let particles = s.particles().len();
        assert!(s.advance(10_000).is_none());
        assert_eq!(s.objects(), &objects[..]);
        assert_eq!(s.particles().len(), particles);
        if let Some(obj) = objects.first() {
            assert!(s.pop(obj.id).is_none());
        }
    }

    #[test]
    fn test_difficulty_and_frenzy_schedule() {
        let mut s = running(4);
        assert_eq!((s.difficulty(), s.is_frenzy(), s.spawn_interval_ms()), (1, false, 1000));
        run_for(&mut s, 20_000);
        assert_eq!((s.difficulty(), s.is_frenzy(), s.spawn_interval_ms()), (2, false, 500));
        run_for(&mut s, 20_000);
        assert_eq!((s.difficulty(), s.is_frenzy(), s.spawn_interval_ms()), (3, false, 333));
        run_for(&mut s, 10_000);
        assert_eq!(s.time_left(), 10);
        assert_eq!((s.difficulty(), s.is_frenzy(), s.spawn_interval_ms()), (3, true, 166));
    }

    #[test]
    fn test_spawn_timer_is_never_duplicated() {
        let mut s = running(5);
        for _ in 0..59 {
            run_for(&mut s, 1_000);
            assert_eq!(s.active_timers(TimerKind::Spawn), 1);
            assert_eq!(s.active_timers(TimerKind::Countdown), 1);
            assert_eq!(s.active_timers(TimerKind::Frame), 1);
        }
    }

    #[test]
    fn test_tier_change_events() {
        let mut s = running(6);
        run_for(&mut s, 59_000);
        let events = s.drain_events();
        let tiers: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DifficultyChanged { tier } => Some(*tier),
                _ => None,
            })
            .collect();
        assert_eq!(tiers, vec![2, 3]);
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::FrenzyStarted).count(),
            1
        );
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_objects_spawn_at_cadence() {
        let mut s = running(7);
        s.advance(999);
        assert!(s.objects().is_empty());
        s.advance(1);
        assert_eq!(s.objects().len(), 1);
        s.advance(4_000);
        assert_eq!(s.objects().len(), 5);
    }

    #[test]
    fn test_no_spawn_before_layout() {
        let mut s = GameSession::new(Tuning::default(), 8);
        s.start();
        run_for(&mut s, 5_000);
        assert!(s.objects().is_empty());
        s.set_play_area(PlayArea::new(400.0, 800.0));
        run_for(&mut s, 1_000);
        assert_eq!(s.objects().len(), 1);
    }

    #[test]
    fn test_pop_scores_combo_and_bursts() {
        let mut s = running(9);
        run_for(&mut s, 3_000);
        let ids: Vec<u32> = s.objects().iter().map(|o| o.id).collect();
        assert!(ids.len() >= 2);

        let first = s.pop(ids[0]).unwrap();
        assert_eq!((first.combo, first.points, first.score), (1, 10, 10));
        assert!(s.objects().iter().all(|o| o.id != ids[0]));
        assert_eq!(s.particles().len(), 20);

        run_for(&mut s, 1_000);
        let second = s.pop(ids[1]).unwrap();
        assert_eq!((second.combo, second.points, second.score), (2, 20, 30));
        assert_eq!(s.max_combo(), 2);

        let popped = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Popped { .. }))
            .count();
        assert_eq!(popped, 2);
    }

    #[test]
    fn test_pop_missing_object_is_noop() {
        let mut s = running(10);
        run_for(&mut s, 2_000);
        let id = s.objects()[0].id;
        assert!(s.pop(id).is_some());
        assert!(s.pop(id).is_none());
        assert!(s.pop(9_999).is_none());
        assert_eq!(s.score(), 10);
        assert_eq!(s.combo(), 1);
    }

    #[test]
    fn test_combo_resets_after_window() {
        let mut s = running(11);
        run_for(&mut s, 5_000);
        let ids: Vec<u32> = s.objects().iter().map(|o| o.id).collect();

        s.pop(ids[0]);
        s.pop(ids[1]);
        run_for(&mut s, 1_500);
        let after_gap = s.pop(ids[2]).unwrap();
        assert_eq!(after_gap.combo, 1);
        assert_eq!(s.max_combo(), 2);

        let stats = run_for(&mut s, 60_000);
        assert_eq!(stats, vec![GameStats { score: 40, max_combo: 2 }]);
    }

    #[test]
    fn test_objects_leave_play_area() {
        let mut s = running(12);
        s.set_play_area(PlayArea::new(400.0, 50.0));
        run_for(&mut s, 1_000);
        assert_eq!(s.objects().len(), 1);
        // Slowest rise is 1.5 px/frame; 50 + 50 px of margin clears in < 70 frames
        run_for(&mut s, 16 * 70);
        assert!(s.objects().iter().all(|o| o.id != 1));
    }
}
