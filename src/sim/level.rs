//! Level configuration and the spawner state machine
//!
//! `LevelConfig` is a pure function of the level number. The `Spawner` walks
//! `Empty -> Spawning -> Full -> Cleared -> NextLevel` and re-enters
//! `Spawning` straight away with the next level's configuration.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::HazardKind;
use super::entity::{EntityId, Playfield};
use crate::consts::*;
use crate::random_between_excluding;

/// Difficulty knobs for one level. Derived, never stored or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    /// Hazards that must be removed to clear the level
    pub entity_count: u32,
    /// Hazard speed before the per-variant factor (pixels/s). 0 = stationary.
    pub base_speed: f32,
    /// Seconds between trickle spawns once the initial batch is out
    pub spawn_interval: f32,
    /// Hazards placed the moment the level starts
    pub initial_spawn: u32,
    /// Hazard variants that may appear, in unlock order
    pub variants: Vec<HazardKind>,
    /// Countdown for the level, if timed (seconds)
    pub time_limit: Option<f32>,
    /// Whether the multiplier pickup may appear
    pub bonus_enabled: bool,
}

impl LevelConfig {
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let entity_count = 2u32.saturating_mul(level - 1).saturating_add(4).min(40);
        // The first two levels are a static shooting gallery on the clock
        let moving = level >= 3;
        let base_speed = if moving {
            (40.0 + 15.0 * (level - 3) as f32).min(400.0)
        } else {
            0.0
        };
        let initial_spawn = if moving {
            (entity_count / 2).max(1)
        } else {
            entity_count
        };

        Self {
            level,
            entity_count,
            base_speed,
            spawn_interval: (2.5 - 0.15 * (level - 1) as f32).max(0.4),
            initial_spawn,
            variants: HazardKind::ALL
                .into_iter()
                .filter(|k| k.unlock_level() <= level)
                .collect(),
            time_limit: if moving { None } else { Some(20.0) },
            bonus_enabled: level >= 5,
        }
    }
}

/// Where the spawner is within the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPhase {
    /// Nothing spawned yet for this level
    Empty,
    /// Initial batch out, trickling in the rest
    Spawning,
    /// All hazards of the level have been spawned
    Full,
    /// Every hazard of the level was removed
    Cleared,
    /// Level counter advanced; re-enters `Spawning` on the same step
    NextLevel,
}

/// Something the spawner wants placed in the world
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOrder {
    Hazard { kind: HazardKind, pos: Vec2, vel: Vec2 },
    Bonus { pos: Vec2, vel: Vec2 },
}

/// Whether this level's multiplier pickup is out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BonusSlot {
    #[default]
    Open,
    /// Ordered this step, not yet placed in the world
    Ordered,
    Live(EntityId),
}

/// Reported when the last hazard of a level is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCleared {
    pub level: u32,
    /// The level now being spawned, or `None` after the final level
    pub next: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub level: u32,
    pub config: LevelConfig,
    pub phase: SpawnPhase,
    /// Hazards of this level not yet removed (spawned or still to come)
    pub remaining: u32,
    pub spawned: u32,
    /// Countdown to the next trickle spawn
    timer: f32,
    /// This level's bonus pickup, if one was spawned and is unresolved
    bonus: BonusSlot,
    /// Clearing this level ends the run
    final_level: u32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(FINAL_LEVEL)
    }
}

impl Spawner {
    pub fn new(final_level: u32) -> Self {
        let config = LevelConfig::for_level(1);
        Self {
            level: 1,
            remaining: config.entity_count,
            spawned: 0,
            timer: config.spawn_interval,
            config,
            phase: SpawnPhase::Empty,
            bonus: BonusSlot::Open,
            final_level,
        }
    }

    /// Account one hazard leaving play (shot, crashed, escaped)
    pub fn hazard_removed(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// The ordered bonus now exists as entity `id`
    pub fn bonus_placed(&mut self, id: EntityId) {
        if self.bonus == BonusSlot::Ordered {
            self.bonus = BonusSlot::Live(id);
        }
    }

    /// Bonus `id` was collected or is gone. Only this level's own pickup
    /// reopens the slot; a leftover from an earlier level does not.
    pub fn release_bonus(&mut self, id: EntityId) {
        if self.bonus == BonusSlot::Live(id) {
            self.bonus = BonusSlot::Open;
        }
    }

    pub fn bonus_latched(&self) -> bool {
        self.bonus != BonusSlot::Open
    }

    /// Advance the state machine. Placement needs the player's position, so
    /// without a player this does nothing.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player: Option<Vec2>,
        field: &Playfield,
        rng: &mut R,
        out: &mut Vec<SpawnOrder>,
    ) -> Option<LevelCleared> {
        let player = player?;

        match self.phase {
            SpawnPhase::Empty | SpawnPhase::NextLevel => {
                self.spawn_initial(player, field, rng, out);
            }
            SpawnPhase::Spawning => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.timer += self.config.spawn_interval;
                    self.spawn_hazard(player, field, rng, out);
                    self.roll_bonus(field, rng, out);
                    if self.spawned >= self.config.entity_count {
                        self.phase = SpawnPhase::Full;
                    }
                }
            }
            SpawnPhase::Full | SpawnPhase::Cleared => {}
        }

        if self.phase == SpawnPhase::Full && self.remaining == 0 {
            self.phase = SpawnPhase::Cleared;
            let cleared = self.level;
            if cleared >= self.final_level {
                log::info!("Final level {} cleared", cleared);
                return Some(LevelCleared {
                    level: cleared,
                    next: None,
                });
            }

            self.advance();
            self.spawn_initial(player, field, rng, out);
            return Some(LevelCleared {
                level: cleared,
                next: Some(self.level),
            });
        }
        None
    }

    fn advance(&mut self) {
        self.level += 1;
        self.config = LevelConfig::for_level(self.level);
        self.remaining = self.config.entity_count;
        self.spawned = 0;
        self.timer = self.config.spawn_interval;
        self.bonus = BonusSlot::Open;
        self.phase = SpawnPhase::NextLevel;
        log::info!(
            "Level {}: {} hazards, speed {:.0}",
            self.level,
            self.config.entity_count,
            self.config.base_speed
        );
    }

    fn spawn_initial<R: Rng + ?Sized>(
        &mut self,
        player: Vec2,
        field: &Playfield,
        rng: &mut R,
        out: &mut Vec<SpawnOrder>,
    ) {
        for _ in 0..self.config.initial_spawn {
            self.spawn_hazard(player, field, rng, out);
        }
        self.phase = if self.spawned >= self.config.entity_count {
            SpawnPhase::Full
        } else {
            SpawnPhase::Spawning
        };
    }

    fn spawn_hazard<R: Rng + ?Sized>(
        &mut self,
        player: Vec2,
        field: &Playfield,
        rng: &mut R,
        out: &mut Vec<SpawnOrder>,
    ) {
        if self.spawned >= self.config.entity_count || self.config.variants.is_empty() {
            return;
        }
        let kind = self.config.variants[rng.random_range(0..self.config.variants.len())];
        let margin = kind.radius();
        let pos = Vec2::new(
            random_between_excluding(
                rng,
                margin,
                field.width - margin,
                player.x - SPAWN_EXCLUSION,
                player.x + SPAWN_EXCLUSION,
            ),
            random_between_excluding(
                rng,
                margin,
                field.height - margin,
                player.y - SPAWN_EXCLUSION,
                player.y + SPAWN_EXCLUSION,
            ),
        );

        let speed = self.config.base_speed * kind.speed_factor();
        let vel = if speed > 0.0 {
            // Head roughly through the middle so the hazard crosses the field
            let aim = field.center()
                + Vec2::new(
                    rng.random_range(-0.25..0.25f32) * field.width,
                    rng.random_range(-0.25..0.25f32) * field.height,
                );
            (aim - pos).normalize_or_zero() * speed
        } else {
            Vec2::ZERO
        };

        out.push(SpawnOrder::Hazard { kind, pos, vel });
        self.spawned += 1;
    }

    fn roll_bonus<R: Rng + ?Sized>(&mut self, field: &Playfield, rng: &mut R, out: &mut Vec<SpawnOrder>) {
        if !self.config.bonus_enabled || self.bonus_latched() || !rng.random_bool(BONUS_CHANCE) {
            return;
        }
        let x = rng.random_range(BONUS_RADIUS..field.width - BONUS_RADIUS);
        let fall = (self.config.base_speed * 1.5).max(BONUS_MIN_SPEED);
        out.push(SpawnOrder::Bonus {
            pos: Vec2::new(x, 0.0),
            vel: Vec2::new(0.0, fall),
        });
        self.bonus = BonusSlot::Ordered;
        log::debug!("Bonus spawned on level {}", self.level);
    }
}
