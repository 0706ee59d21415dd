//! Retro Arcade - shared real-time engine for the arcade's browser games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, spawning, session state)
//! - `driver`: Frame loop scheduling, delta clamping and cancellation
//! - `platform`: Input snapshots and the identity (wallet) gate
//! - `persistence`: Storage backends and the high score store
//! - `renderer`: Surface-agnostic draw pass
//! - `audio`: Fire-and-forget sound effects

pub mod audio;
pub mod driver;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Default playfield dimensions (logical pixels)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Largest frame delta fed to the simulation (seconds). Covers tab switches.
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Delta used for the very first frame, before a previous timestamp exists
    pub const FIRST_FRAME_DT: f32 = 1.0 / 60.0;

    /// Player ship
    pub const SHIP_RADIUS: f32 = 20.0;
    pub const SHIP_TURN_SPEED: f32 = 4.5; // radians per second
    pub const SHIP_THRUST: f32 = 300.0; // pixels/s²
    pub const SHIP_INERTIA: f32 = 0.99; // per 1/60 s
    pub const SHIP_FIRE_COOLDOWN: f32 = 0.3;
    pub const STARTING_LIVES: u8 = 3;

    /// Bullets
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 600.0;
    pub const ENEMY_BULLET_SPEED: f32 = 260.0;
    /// Muzzle offset from ship center
    pub const BULLET_MUZZLE: f32 = 20.0;

    /// Hazards keep this far from the player when spawned
    pub const SPAWN_EXCLUSION: f32 = 60.0;
    /// Saucer reload time between shots
    pub const SAUCER_FIRE_INTERVAL: f32 = 2.0;

    /// Bonus multiplier pickup
    pub const BONUS_CHANCE: f64 = 0.15;
    pub const BONUS_RADIUS: f32 = 12.5;
    pub const BONUS_LIFETIME: f32 = 8.0;
    pub const BONUS_MIN_SPEED: f32 = 60.0;

    /// Score rules
    pub const LEVEL_CLEAR_BONUS: u64 = 100;
    pub const FINAL_LEVEL: u32 = 30;
    pub const FINAL_LEVEL_BONUS: u64 = 500;

    /// Particles
    pub const PARTICLE_POOL_CAPACITY: usize = 100;
    pub const PARTICLE_INERTIA: f32 = 0.98; // per 1/60 s
    pub const PARTICLE_SHRINK: f32 = 6.0; // radius units per second
    pub const PARTICLE_MIN_SIZE: f32 = 0.1;

    /// Grid game timing (milliseconds)
    pub const GRID_SIZE: i32 = 20;
    pub const GRID_INITIAL_INTERVAL_MS: f32 = 200.0;
    pub const GRID_MIN_INTERVAL_MS: f32 = 80.0;
    /// Interval shrinks by this much for every `GRID_SPEEDUP_EVERY` points
    pub const GRID_SPEEDUP_STEP_MS: f32 = 20.0;
    pub const GRID_SPEEDUP_EVERY: u64 = 50;
    pub const GRID_FOOD_POINTS: u64 = 10;
    pub const GRID_DANGER_MIN_SCORE: u64 = 30;
    pub const GRID_DANGER_LIFETIME_MS: f32 = 30_000.0;
}

/// Rotate `point` around `center` by `angle` radians
#[inline]
pub fn rotate_point(point: Vec2, center: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(point - center) + center
}

/// Unit direction for a heading angle, where angle 0 points "up" the screen
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    rotate_point(Vec2::new(0.0, -1.0), Vec2::ZERO, angle)
}

/// Uniform sample from `[min, max]` that avoids the open band `(ex_min, ex_max)`.
///
/// Falls back to the nearest admissible edge when the band covers the whole range.
pub fn random_between_excluding<R: Rng + ?Sized>(
    rng: &mut R,
    min: f32,
    max: f32,
    ex_min: f32,
    ex_max: f32,
) -> f32 {
    let ex_min = ex_min.clamp(min, max);
    let ex_max = ex_max.clamp(min, max);
    let left = ex_min - min;
    let right = max - ex_max;
    let total = left + right;
    if total <= 0.0 {
        // Band swallows the range; pick whichever edge is farther from its center
        let mid = (ex_min + ex_max) * 0.5;
        return if mid - min > max - mid { min } else { max };
    }
    let roll = rng.random::<f32>() * total;
    if roll < left {
        min + roll
    } else {
        ex_max + (roll - left)
    }
}
