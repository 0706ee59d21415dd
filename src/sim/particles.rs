//! Explosion particles backed by the object pool
//!
//! Purely visual: nothing in here feeds back into gameplay, and bursts draw
//! from their own RNG so the particle cap never shifts the gameplay stream.
//! Records come out
//! of a [`Pool`] when a burst fires and go back once they fade, shrink below
//! visibility or drift off the playfield.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::Playfield;
use super::pool::{Pool, Recycle};
use crate::consts::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Seconds left to live
    pub life: f32,
    pub max_life: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub color: [u8; 3],
}

impl Recycle for Particle {
    fn recycle(&mut self) {
        *self = Particle::default();
    }
}

impl Particle {
    /// Advance one step. Returns false once the particle should go back to
    /// the pool.
    pub fn step(&mut self, dt: f32, field: &Playfield) -> bool {
        self.vel.y += self.gravity * dt;
        self.vel *= PARTICLE_INERTIA.powf(dt * 60.0);
        self.pos += self.vel * dt;
        self.radius -= PARTICLE_SHRINK * dt;
        self.life -= dt;
        self.life > 0.0 && self.radius >= PARTICLE_MIN_SIZE && !field.is_outside(self.pos)
    }

    /// Remaining life in 0..=1, for fading
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// Shape of one explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub count: usize,
    /// Maximum launch speed; each particle gets a random fraction of it
    pub speed: f32,
    pub radius: f32,
    pub life: f32,
    pub gravity: f32,
    pub color: [u8; 3],
}

impl Burst {
    /// Debris from a destroyed hazard
    pub fn debris(color: [u8; 3]) -> Self {
        Self {
            count: 12,
            speed: 160.0,
            radius: 3.0,
            life: 0.6,
            gravity: 0.0,
            color,
        }
    }

    /// Sparks when the player is hit
    pub fn sparks() -> Self {
        Self {
            count: 20,
            speed: 220.0,
            radius: 2.5,
            life: 0.8,
            gravity: 120.0,
            color: [255, 80, 40],
        }
    }
}

/// Stream id for the particle RNG, distinct from the gameplay stream
const PARTICLE_STREAM: u64 = 0x5eed_f1a5;

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    live: Vec<Particle>,
    pool: Pool<Particle>,
    rng: Pcg32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(PARTICLE_POOL_CAPACITY)
    }
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self::seeded(0, capacity)
    }

    /// Particle system whose spray follows the session seed
    pub fn seeded(seed: u64, capacity: usize) -> Self {
        Self {
            live: Vec::with_capacity(capacity),
            pool: Pool::new(capacity),
            rng: Pcg32::new(seed, PARTICLE_STREAM),
        }
    }

    /// Emit up to `burst.count` particles at `at`. Stops early when the pool
    /// runs dry; returns how many were emitted.
    pub fn burst(&mut self, at: Vec2, burst: &Burst) -> usize {
        let mut emitted = 0;
        for _ in 0..burst.count {
            let Some(mut p) = self.pool.acquire() else {
                break;
            };
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = burst.speed * self.rng.random_range(0.3..1.0f32);
            p.pos = at;
            p.vel = Vec2::from_angle(angle) * speed;
            p.radius = burst.radius * self.rng.random_range(0.6..1.0f32);
            p.life = burst.life;
            p.max_life = burst.life;
            p.gravity = burst.gravity;
            p.color = burst.color;
            self.live.push(p);
            emitted += 1;
        }
        emitted
    }

    pub fn update(&mut self, dt: f32, field: &Playfield) {
        for i in (0..self.live.len()).rev() {
            if !self.live[i].step(dt, field) {
                // Order does not matter for particles
                let done = self.live.swap_remove(i);
                self.pool.release(done);
            }
        }
    }

    /// Return every live particle to the pool
    pub fn clear(&mut self) {
        for p in self.live.drain(..) {
            self.pool.release(p);
        }
    }

    /// Change the live particle cap (quality settings)
    pub fn set_capacity(&mut self, capacity: usize) {
        self.pool.set_capacity(capacity);
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.live.iter()
    }
}
