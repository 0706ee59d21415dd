//! Score / life / game-over controller
//!
//! `NotStarted -> Playing -> GameOver`. Game over is terminal: only a full
//! reset (a fresh `Session`) leaves it.

use serde::{Deserialize, Serialize};

use crate::consts::STARTING_LIVES;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    LivesExhausted,
    /// Level countdown ran out with targets left
    TimeUp,
    /// Identity collaborator withdrew authorization mid-run
    Revoked,
    /// Final level cleared
    Completed,
    /// Grid game: ran into a wall, itself or a danger block
    Crashed,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::LivesExhausted => "Out of lives",
            GameOverReason::TimeUp => "Time up",
            GameOverReason::Revoked => "Session revoked",
            GameOverReason::Completed => "All levels cleared",
            GameOverReason::Crashed => "Crashed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Playing,
    GameOver(GameOverReason),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub phase: SessionPhase,
    pub score: u64,
    pub lives: u8,
    /// Countdown for timed levels (seconds)
    pub time_remaining: Option<f32>,
    pub shots_fired: u32,
    pub hits: u32,
    /// Hazard points are doubled while set
    pub multiplier: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(STARTING_LIVES)
    }
}

impl Session {
    pub fn new(lives: u8) -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            score: 0,
            lives,
            time_remaining: None,
            shots_fired: 0,
            hits: 0,
            multiplier: false,
        }
    }

    /// Enter `Playing`. Only valid from `NotStarted`.
    pub fn start(&mut self, time_limit: Option<f32>) -> bool {
        if self.phase != SessionPhase::NotStarted {
            return false;
        }
        self.phase = SessionPhase::Playing;
        self.time_remaining = time_limit;
        true
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, SessionPhase::GameOver(_))
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        match self.phase {
            SessionPhase::GameOver(reason) => Some(reason),
            _ => None,
        }
    }

    /// Add points as-is. Ignored unless playing. Returns points awarded.
    pub fn add_score(&mut self, points: u64) -> u64 {
        if !self.is_playing() {
            return 0;
        }
        self.score = self.score.saturating_add(points);
        points
    }

    /// Points for destroying a target, doubled under the multiplier
    pub fn award_hit(&mut self, points: u64) -> u64 {
        if !self.is_playing() {
            return 0;
        }
        self.hits += 1;
        let points = if self.multiplier { points * 2 } else { points };
        self.add_score(points)
    }

    pub fn record_shot(&mut self) {
        if self.is_playing() {
            self.shots_fired += 1;
        }
    }

    /// Percentage of shots that hit, rounded. 100 before the first shot.
    pub fn accuracy(&self) -> u32 {
        if self.shots_fired == 0 {
            return 100;
        }
        ((self.hits as f64 / self.shots_fired as f64) * 100.0).round() as u32
    }

    /// Take one life. Returns true if that ended the run.
    pub fn lose_life(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.end(GameOverReason::LivesExhausted);
            return true;
        }
        false
    }

    /// Run the level countdown. Returns true if time ran out with targets
    /// still on the board.
    pub fn tick_timer(&mut self, dt: f32, targets_remain: bool) -> bool {
        if !self.is_playing() {
            return false;
        }
        let Some(t) = self.time_remaining.as_mut() else {
            return false;
        };
        *t = (*t - dt).max(0.0);
        if *t <= 0.0 && targets_remain {
            self.end(GameOverReason::TimeUp);
            return true;
        }
        false
    }

    /// Move to game over. No-op unless playing.
    pub fn end(&mut self, reason: GameOverReason) -> bool {
        if !self.is_playing() {
            return false;
        }
        log::info!("Game over ({}): score {}", reason.as_str(), self.score);
        self.phase = SessionPhase::GameOver(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> Session {
        let mut s = Session::default();
        assert!(s.start(None));
        s
    }

    #[test]
    fn test_score_only_while_playing() {
        let mut s = Session::default();
        assert_eq!(s.add_score(10), 0);
        s.start(None);
        assert_eq!(s.add_score(10), 10);
        s.end(GameOverReason::TimeUp);
        assert_eq!(s.add_score(10), 0);
        assert_eq!(s.score, 10);
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut s = playing();
        assert!(s.end(GameOverReason::Revoked));
        assert!(!s.start(None));
        assert!(!s.end(GameOverReason::Completed));
        assert_eq!(s.game_over_reason(), Some(GameOverReason::Revoked));
    }

    #[test]
    fn test_lives_run_out_on_third_hit() {
        let mut s = playing();
        assert!(!s.lose_life());
        assert!(!s.lose_life());
        assert!(s.lose_life());
        assert_eq!(s.game_over_reason(), Some(GameOverReason::LivesExhausted));
        assert!(!s.lose_life());
        assert_eq!(s.lives, 0);
    }

    #[test]
    fn test_multiplier_doubles_hits() {
        let mut s = playing();
        s.multiplier = true;
        assert_eq!(s.award_hit(50), 100);
        assert_eq!(s.add_score(100), 100);
        assert_eq!(s.score, 200);
    }

    #[test]
    fn test_timer_only_ends_with_targets_left() {
        let mut s = Session::default();
        s.start(Some(1.0));
        assert!(!s.tick_timer(2.0, false));
        assert!(s.is_playing());

        let mut s = Session::default();
        s.start(Some(1.0));
        assert!(!s.tick_timer(0.5, true));
        assert!(s.tick_timer(0.5, true));
        assert_eq!(s.game_over_reason(), Some(GameOverReason::TimeUp));
    }

    #[test]
    fn test_accuracy() {
        let mut s = playing();
        assert_eq!(s.accuracy(), 100);
        for _ in 0..3 {
            s.record_shot();
        }
        s.award_hit(10);
        assert_eq!(s.accuracy(), 33);
    }
}
