//! Game loop driver
//!
//! The host calls [`Driver::frame`] once per display refresh with a
//! timestamp. The driver turns that into a clamped delta, runs the update
//! phase, hands discrete events to the audio and persistence collaborators
//! and finally draws. Grid games additionally run fixed steps off an
//! [`IntervalTimer`] whose period depends on the score.
//!
//! Cancellation goes through a shared [`LoopHandle`]: once cancelled, every
//! later frame callback returns immediately without touching game state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::audio::{AudioSink, SoundEffect};
use crate::consts::{FIRST_FRAME_DT, MAX_FRAME_DT};
use crate::highscores::{HighScores, Recorded, SessionSummary};
use crate::persistence::ScoreStore;
use crate::platform::{Identity, InputSnapshot, Key};
use crate::renderer::{Align, RenderSurface, draw_arena, draw_grid, draw_score_table};
use crate::sim::{Direction, GameEvent, GameOverReason, GameState, GridGame, Session, TickInput, tick};

/// Fixed steps allowed to run in one frame before the backlog is dropped
const MAX_CATCH_UP_STEPS: u32 = 4;

/// Wall clock in milliseconds since the epoch, for score timestamps
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Frame timestamps in, clamped deltas out
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call. The first call after a reset reports
    /// one nominal frame; anything longer than `MAX_FRAME_DT` is clamped and
    /// a clock that runs backwards reports zero.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => FIRST_FRAME_DT,
        };
        self.last = Some(now_ms);
        dt.clamp(0.0, MAX_FRAME_DT)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Accumulates elapsed time and fires whenever a full interval has passed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntervalTimer {
    acc_ms: f32,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, elapsed_ms: f32) {
        self.acc_ms += elapsed_ms.max(0.0);
    }

    /// Consume one interval if enough time has built up
    pub fn try_fire(&mut self, interval_ms: f32) -> bool {
        if interval_ms <= 0.0 || self.acc_ms < interval_ms {
            return false;
        }
        self.acc_ms -= interval_ms;
        true
    }

    pub fn pending_ms(&self) -> f32 {
        self.acc_ms
    }

    pub fn reset(&mut self) {
        self.acc_ms = 0.0;
    }
}

#[derive(Debug, Default)]
struct LoopShared {
    cancelled: Cell<bool>,
    /// Id of the frame request currently scheduled with the host
    pending: Cell<Option<i32>>,
}

/// Shared cancellation flag for a running loop. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    inner: Rc<LoopShared>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Remember the host's id for the next scheduled frame
    pub fn set_pending(&self, id: i32) {
        if !self.is_cancelled() {
            self.inner.pending.set(Some(id));
        }
    }

    /// Forget the scheduled frame (it has started running)
    pub fn take_pending(&self) -> Option<i32> {
        self.inner.pending.take()
    }

    /// Stop the loop. Safe to call any number of times; only the first call
    /// returns the pending frame id for the host to cancel.
    pub fn cancel(&self) -> Option<i32> {
        if self.inner.cancelled.replace(true) {
            return None;
        }
        log::info!("Game loop cancelled");
        self.inner.pending.take()
    }
}

/// Why a session could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// The identity collaborator says no
    Unauthorized,
    /// The loop has been torn down
    Cancelled,
    /// This session already ran; restart it instead
    AlreadyRan,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::Unauthorized => write!(f, "player is not authorized to play"),
            StartError::Cancelled => write!(f, "game loop has been cancelled"),
            StartError::AlreadyRan => write!(f, "session already ran, restart it first"),
        }
    }
}

impl std::error::Error for StartError {}

/// A game the driver can run
pub trait Simulation {
    /// Key for persisted scores
    fn game_id(&self) -> &'static str;

    /// Back to `NotStarted` with nothing carried over
    fn restart(&mut self);

    /// `NotStarted -> Playing`; false if that transition is not available
    fn start(&mut self) -> bool;

    fn session(&self) -> &Session;

    /// Variable-delta part of the update phase
    fn update(&mut self, input: &InputSnapshot, dt: f32);

    /// Period of fixed steps, for games that move on a grid
    fn step_interval_ms(&self) -> Option<f32> {
        None
    }

    fn fixed_step(&mut self) {}

    fn drain_events(&mut self) -> Vec<GameEvent>;

    fn force_game_over(&mut self, reason: GameOverReason) -> bool;

    fn summary(&self) -> SessionSummary;

    fn draw(&self, surface: &mut dyn RenderSurface);
}

impl Simulation for GameState {
    fn game_id(&self) -> &'static str {
        "arena"
    }

    fn restart(&mut self) {
        GameState::restart(self);
    }

    fn start(&mut self) -> bool {
        GameState::start(self)
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn update(&mut self, input: &InputSnapshot, dt: f32) {
        let controls = TickInput {
            turn: input.steer(),
            thrust: input.is_down(Key::Up),
            fire: input.is_down(Key::Fire),
        };
        tick(self, &controls, dt);
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        GameState::drain_events(self)
    }

    fn force_game_over(&mut self, reason: GameOverReason) -> bool {
        GameState::force_game_over(self, reason)
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.session.score,
            level: self.level(),
            shots_fired: self.session.shots_fired,
            hits: self.session.hits,
        }
    }

    fn draw(&self, surface: &mut dyn RenderSurface) {
        draw_arena(self, surface);
    }
}

impl Simulation for GridGame {
    fn game_id(&self) -> &'static str {
        "snake"
    }

    fn restart(&mut self) {
        GridGame::restart(self);
    }

    fn start(&mut self) -> bool {
        GridGame::start(self)
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn update(&mut self, input: &InputSnapshot, _dt: f32) {
        let turns = [
            (Key::Up, Direction::Up),
            (Key::Down, Direction::Down),
            (Key::Left, Direction::Left),
            (Key::Right, Direction::Right),
        ];
        if let Some((_, dir)) = turns.iter().find(|(key, _)| input.was_pressed(*key)) {
            self.set_direction(*dir);
        }
    }

    fn step_interval_ms(&self) -> Option<f32> {
        Some(self.interval_ms())
    }

    fn fixed_step(&mut self) {
        self.step();
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        GridGame::drain_events(self)
    }

    fn force_game_over(&mut self, reason: GameOverReason) -> bool {
        GridGame::force_game_over(self, reason)
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.session.score,
            level: self.snake.len() as u32,
            shots_fired: 0,
            hits: 0,
        }
    }

    fn draw(&self, surface: &mut dyn RenderSurface) {
        draw_grid(self, surface);
    }
}

/// Collaborators handed to the driver at construction
pub struct Services {
    pub audio: Box<dyn AudioSink>,
    pub store: Box<dyn ScoreStore>,
    pub identity: Box<dyn Identity>,
}

pub struct Driver<S: Simulation> {
    pub sim: S,
    services: Services,
    clock: FrameClock,
    timer: IntervalTimer,
    handle: LoopHandle,
    /// Best score on record for this game, shown on the HUD
    high_score: u64,
    /// Outcome of the last filed session
    last_record: Option<Recorded>,
    /// Top-10 table for this game, shown on the game over screen
    table: HighScores,
}

impl<S: Simulation> Driver<S> {
    pub fn new(sim: S, services: Services) -> Self {
        let mut driver = Self {
            sim,
            services,
            clock: FrameClock::new(),
            timer: IntervalTimer::new(),
            handle: LoopHandle::new(),
            high_score: 0,
            last_record: None,
            table: HighScores::new(),
        };
        driver.refresh_scores();
        driver
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn last_record(&self) -> Option<Recorded> {
        self.last_record
    }

    pub fn table(&self) -> &HighScores {
        &self.table
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.services.store.as_ref()
    }

    /// Begin a session from `NotStarted`. A session that is playing or over
    /// is left alone and reported as `AlreadyRan`.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.handle.is_cancelled() {
            return Err(StartError::Cancelled);
        }
        if !self.services.identity.is_authorized() {
            log::warn!("Start refused: not authorized");
            return Err(StartError::Unauthorized);
        }
        if !self.sim.start() {
            log::debug!("Start ignored: session already ran");
            return Err(StartError::AlreadyRan);
        }
        self.clock.reset();
        self.timer.reset();
        self.services.audio.start_music();
        Ok(())
    }

    /// Throw the current session away and begin a fresh one
    pub fn restart(&mut self) -> Result<(), StartError> {
        if self.handle.is_cancelled() {
            return Err(StartError::Cancelled);
        }
        if !self.services.identity.is_authorized() {
            log::warn!("Restart refused: not authorized");
            return Err(StartError::Unauthorized);
        }
        self.services.audio.stop_music();
        self.sim.restart();
        self.last_record = None;
        self.refresh_scores();
        self.start()
    }

    /// Run one frame. Returns false once the loop is cancelled, in which case
    /// nothing was touched.
    pub fn frame(
        &mut self,
        now_ms: f64,
        input: &InputSnapshot,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        if self.handle.is_cancelled() {
            return false;
        }
        let dt = self.clock.tick(now_ms);

        if input.was_pressed(Key::Start) && !self.sim.session().is_playing() {
            let result = if self.sim.session().is_game_over() {
                self.restart()
            } else {
                self.start()
            };
            if let Err(e) = result {
                log::warn!("Could not start: {e}");
            }
        }

        if self.sim.session().is_playing() && !self.services.identity.is_authorized() {
            log::warn!("Authorization revoked mid-session");
            self.sim.force_game_over(GameOverReason::Revoked);
        }

        self.sim.update(input, dt);
        self.run_fixed_steps(dt);
        self.dispatch_events();

        self.sim.draw(surface);
        self.draw_overlay(surface);
        true
    }

    /// Tear the loop down. Returns the host frame id still to cancel, if any.
    pub fn shutdown(&mut self) -> Option<i32> {
        let pending = self.handle.cancel();
        self.services.audio.stop_music();
        pending
    }

    fn run_fixed_steps(&mut self, dt: f32) {
        let Some(mut interval) = self.sim.step_interval_ms() else {
            return;
        };
        if !self.sim.session().is_playing() {
            self.timer.reset();
            return;
        }
        self.timer.accumulate(dt * 1000.0);
        let mut steps = 0;
        while self.sim.session().is_playing() && self.timer.try_fire(interval) {
            self.sim.fixed_step();
            steps += 1;
            if steps >= MAX_CATCH_UP_STEPS {
                self.timer.reset();
                break;
            }
            // Speed-ups apply from the next step on
            interval = self.sim.step_interval_ms().unwrap_or(interval);
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.sim.drain_events() {
            let sound = match event {
                GameEvent::SessionStarted | GameEvent::LevelStarted { .. } => None,
                GameEvent::ShotFired => Some(SoundEffect::Shoot),
                GameEvent::HazardDestroyed { .. } => Some(SoundEffect::HazardHit),
                GameEvent::HazardEscaped { .. } | GameEvent::PlayerHit { .. } => {
                    Some(SoundEffect::PlayerHit)
                }
                GameEvent::BonusSpawned => None,
                GameEvent::BonusCollected => Some(SoundEffect::Bonus),
                GameEvent::LevelCleared { level, bonus } => {
                    log::info!("Level {} cleared (+{})", level, bonus);
                    Some(SoundEffect::LevelComplete)
                }
                GameEvent::SnakeAte { .. } => Some(SoundEffect::SnakeEat),
                GameEvent::GameOver { score, reason } => {
                    log::info!("Game over ({}): {} points", reason.as_str(), score);
                    self.services.audio.play(SoundEffect::GameOver);
                    self.services.audio.stop_music();
                    self.file_session();
                    None
                }
            };
            if let Some(sound) = sound {
                self.services.audio.play(sound);
            }
        }
    }

    /// Persist the finished session. Storage trouble is logged and skipped.
    fn file_session(&mut self) {
        let game = self.sim.game_id();
        let summary = self.sim.summary();
        let mut book = match self.services.store.load(game) {
            Ok(book) => book,
            Err(e) => {
                log::warn!("Not saving '{}' scores: {}", game, e);
                self.high_score = self.high_score.max(summary.score);
                return;
            }
        };
        let recorded = book.record(&summary, now_ms());
        self.high_score = book.high_score;
        self.last_record = Some(recorded);
        self.table = book.table.clone();
        if let Err(e) = self.services.store.save(game, &book) {
            log::warn!("Failed to save '{}' scores: {}", game, e);
        }
        if recorded.new_high {
            log::info!("New high score for '{}': {}", game, book.high_score);
            self.services.audio.play(SoundEffect::HighScore);
        }
    }

    fn refresh_scores(&mut self) {
        let game = self.sim.game_id();
        match self.services.store.load(game) {
            Ok(book) => {
                self.high_score = book.high_score;
                self.table = book.table;
            }
            Err(e) => log::warn!("Could not read '{}' scores: {}", game, e),
        }
    }

    fn draw_overlay(&self, surface: &mut dyn RenderSurface) {
        let size = surface.size();
        surface.text(
            glam::Vec2::new(size.x - 10.0, 46.0),
            &format!("BEST {}", self.high_score),
            14.0,
            Align::Right,
            [1.0, 1.0, 1.0, 0.5],
        );
        if self.sim.session().is_game_over() {
            let rank = self.last_record.and_then(|r| r.rank);
            draw_score_table(&self.table, rank, surface);
        }
    }
}
