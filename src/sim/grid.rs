//! Grid snake game
//!
//! Moves one cell per fixed tick instead of by a frame delta. The tick
//! interval shrinks as the score grows (see [`interval_ms`]); the driver's
//! `IntervalTimer` decides when `step` runs.

use std::collections::VecDeque;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::session::{GameOverReason, Session};
use super::state::GameEvent;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Obstacle that ends the run on contact, gone after its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerBlock {
    pub pos: IVec2,
    pub remaining_ms: f32,
}

/// Milliseconds between steps at a given score
pub fn interval_ms(score: u64) -> f32 {
    let steps = (score / GRID_SPEEDUP_EVERY) as f32;
    (GRID_INITIAL_INTERVAL_MS - GRID_SPEEDUP_STEP_MS * steps).max(GRID_MIN_INTERVAL_MS)
}

/// Chance that eating spawns a danger block: 5% from 30 points, rising to 15%
pub fn danger_chance(score: u64) -> f64 {
    if score < GRID_DANGER_MIN_SCORE {
        return 0.0;
    }
    0.05 + ((score - GRID_DANGER_MIN_SCORE) as f64 / 1000.0).min(0.10)
}

const START_CELL: IVec2 = IVec2::new(10, 10);

#[derive(Debug, Clone)]
pub struct GridGame {
    pub seed: u64,
    pub rng: Pcg32,
    /// Cells per side
    pub size: i32,
    pub session: Session,
    /// Head first
    pub snake: VecDeque<IVec2>,
    /// Direction of the last move
    pub direction: Direction,
    /// Applied on the next step
    next_direction: Direction,
    pub food: IVec2,
    pub dangers: Vec<DangerBlock>,
    pub events: Vec<GameEvent>,
    pub steps: u64,
}

impl GridGame {
    pub fn new(seed: u64) -> Self {
        Self::with_size(seed, GRID_SIZE)
    }

    pub fn with_size(seed: u64, size: i32) -> Self {
        let size = size.max(1);
        let start = START_CELL.min(IVec2::splat(size / 2));
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            size,
            session: Session::new(1),
            snake: VecDeque::from([start]),
            direction: Direction::Right,
            next_direction: Direction::Right,
            food: IVec2::new(-1, -1),
            dangers: Vec::new(),
            events: Vec::new(),
            steps: 0,
        }
    }

    pub fn restart(&mut self) {
        *self = Self::with_size(self.seed, self.size);
        log::info!("Grid session reset (seed {})", self.seed);
    }

    pub fn start(&mut self) -> bool {
        if !self.session.start(None) {
            return false;
        }
        self.respawn_food();
        self.events.push(GameEvent::SessionStarted);
        log::info!("Grid session started");
        true
    }

    pub fn head(&self) -> IVec2 {
        self.snake.front().copied().unwrap_or(START_CELL)
    }

    /// Current step interval
    pub fn interval_ms(&self) -> f32 {
        interval_ms(self.session.score)
    }

    /// Queue a turn. Reversing onto the body is ignored.
    pub fn set_direction(&mut self, dir: Direction) {
        if dir != self.direction.opposite() {
            self.next_direction = dir;
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn force_game_over(&mut self, reason: GameOverReason) -> bool {
        if !self.session.end(reason) {
            return false;
        }
        self.events.push(GameEvent::GameOver {
            score: self.session.score,
            reason,
        });
        true
    }

    /// Advance one cell
    pub fn step(&mut self) {
        if !self.session.is_playing() {
            return;
        }
        let elapsed = self.interval_ms();
        self.steps += 1;
        self.direction = self.next_direction;

        let head = self.head() + self.direction.delta();
        let eats = head == self.food;
        if !eats {
            // The tail moves out of the way first
            self.snake.pop_back();
        }

        let hit_wall = head.x < 0 || head.x >= self.size || head.y < 0 || head.y >= self.size;
        let hit_self = self.snake.contains(&head);
        let hit_danger = self.dangers.iter().any(|d| d.pos == head);
        if hit_wall || hit_self || hit_danger {
            log::debug!("Snake crashed at {head} (wall {hit_wall}, self {hit_self}, danger {hit_danger})");
            self.force_game_over(GameOverReason::Crashed);
            return;
        }
        self.snake.push_front(head);

        if eats {
            self.session.add_score(GRID_FOOD_POINTS);
            self.events.push(GameEvent::SnakeAte {
                length: self.snake.len(),
            });
            if !self.respawn_food() {
                self.force_game_over(GameOverReason::Completed);
                return;
            }
            self.maybe_spawn_danger();
        }

        for d in &mut self.dangers {
            d.remaining_ms -= elapsed;
        }
        self.dangers.retain(|d| d.remaining_ms > 0.0);
    }

    fn occupied(&self, cell: IVec2) -> bool {
        self.snake.contains(&cell) || self.dangers.iter().any(|d| d.pos == cell)
    }

    /// Pick a random free cell
    fn free_cell(&mut self, exclude_food: bool) -> Option<IVec2> {
        let free: Vec<IVec2> = (0..self.size)
            .flat_map(|y| (0..self.size).map(move |x| IVec2::new(x, y)))
            .filter(|c| !self.occupied(*c) && !(exclude_food && *c == self.food))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.random_range(0..free.len())])
    }

    /// Place food off the snake. False when the board is full.
    fn respawn_food(&mut self) -> bool {
        match self.free_cell(false) {
            Some(cell) => {
                self.food = cell;
                true
            }
            None => false,
        }
    }

    fn maybe_spawn_danger(&mut self) {
        let chance = danger_chance(self.session.score);
        if chance <= 0.0 || !self.rng.random_bool(chance) {
            return;
        }
        if let Some(pos) = self.free_cell(true) {
            self.dangers.push(DangerBlock {
                pos,
                remaining_ms: GRID_DANGER_LIFETIME_MS,
            });
            log::debug!("Danger block at {pos}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn started() -> GridGame {
        let mut game = GridGame::new(11);
        assert!(game.start());
        game
    }

    #[test]
    fn test_interval_speeds_up_with_score() {
        assert_eq!(interval_ms(0), 200.0);
        assert_eq!(interval_ms(49), 200.0);
        assert_eq!(interval_ms(50), 180.0);
        assert_eq!(interval_ms(300), 80.0);
        assert_eq!(interval_ms(10_000), 80.0);
    }

    #[test]
    fn test_danger_chance() {
        assert_eq!(danger_chance(20), 0.0);
        assert!((danger_chance(30) - 0.05).abs() < 1e-9);
        assert!((danger_chance(80) - 0.10).abs() < 1e-9);
        assert!((danger_chance(5_000) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_is_ignored() {
        let mut game = started();
        game.food = IVec2::new(0, 0);
        game.set_direction(Direction::Left);
        game.step();
        assert_eq!(game.head(), START_CELL + IVec2::X);
        assert!(game.session.is_playing());
    }

    #[test]
    fn test_wall_is_exclusive_of_size() {
        let mut game = started();
        game.food = IVec2::new(0, 0);
        for _ in 0..(GRID_SIZE - 1 - START_CELL.x) {
            game.step();
        }
        assert_eq!(game.head().x, GRID_SIZE - 1);
        assert!(game.session.is_playing());
        game.step();
        assert_eq!(game.session.game_over_reason(), Some(GameOverReason::Crashed));
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut game = started();
        game.food = START_CELL + IVec2::X;
        game.step();
        assert_eq!(game.snake.len(), 2);
        assert_eq!(game.session.score, GRID_FOOD_POINTS);
        assert!(!game.snake.contains(&game.food));
        assert!(game
            .drain_events()
            .contains(&GameEvent::SnakeAte { length: 2 }));
    }

    #[test]
    fn test_running_into_danger_ends_run() {
        let mut game = started();
        game.food = IVec2::new(0, 0);
        game.dangers.push(DangerBlock {
            pos: START_CELL + IVec2::X,
            remaining_ms: 1000.0,
        });
        game.step();
        assert!(game.session.is_game_over());
    }

    #[test]
    fn test_danger_blocks_expire() {
        let mut game = started();
        game.food = IVec2::new(0, 0);
        game.dangers.push(DangerBlock {
            pos: IVec2::new(0, 19),
            remaining_ms: 300.0,
        });
        game.step();
        assert_eq!(game.dangers.len(), 1);
        game.step();
        assert!(game.dangers.is_empty());
    }

    #[test]
    fn test_tail_cell_is_free_to_enter() {
        let mut game = started();
        game.food = IVec2::new(0, 0);
        game.snake = VecDeque::from([
            IVec2::new(5, 5),
            IVec2::new(6, 5),
            IVec2::new(6, 6),
            IVec2::new(5, 6),
        ]);
        game.direction = Direction::Down;
        game.next_direction = Direction::Down;
        game.step();
        assert!(game.session.is_playing());
        assert_eq!(game.head(), IVec2::new(5, 6));
    }

    #[test]
    fn test_restart_is_fresh() {
        let mut game = started();
        game.food = START_CELL + IVec2::X;
        game.step();
        game.restart();
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.session.score, 0);
        assert!(!game.session.is_playing());
        assert!(game.dangers.is_empty());
    }

    proptest! {
        #[test]
        fn prop_interval_never_below_floor(score in 0u64..1_000_000) {
            let ms = interval_ms(score);
            prop_assert!(ms >= GRID_MIN_INTERVAL_MS && ms <= GRID_INITIAL_INTERVAL_MS);
            prop_assert!(interval_ms(score + 1) <= ms);
        }

        #[test]
        fn prop_food_never_on_snake(seed in any::<u64>()) {
            let mut game = GridGame::with_size(seed, 6);
            game.start();
            prop_assert!(!game.snake.contains(&game.food));
        }
    }
}
