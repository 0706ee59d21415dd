//! Entity contract shared by every simulated object
//!
//! An entity advances itself by a time delta and flags itself dead when it
//! leaves the playfield, runs out of lifespan or shrinks out of sight. Dead
//! entities are never revived; the owning `EntityList` drops them on its next
//! sweep.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};

/// Stable entity identifier, unique within a session
pub type EntityId = u32;

/// Rectangular playfield with its origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT)
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True once a point is strictly past any edge. A point exactly on an
    /// edge is still inside.
    #[inline]
    pub fn is_outside(&self, p: Vec2) -> bool {
        p.x < 0.0 || p.x > self.width || p.y < 0.0 || p.y > self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Wrap a point around the edges (toroidal playfield)
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }
}

/// Why an entity left play. Drives scoring and level bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fate {
    /// Destroyed by a projectile
    Shot,
    /// Left the playfield
    Escaped,
    /// Rammed the player
    Crashed,
    /// Lifespan ran out
    Expired,
}

/// Request from an entity to create another one. Fulfilled by the world at
/// the start of the next frame so no list grows while it is being swept.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    PlayerShot { pos: Vec2, vel: Vec2, rotation: f32 },
    EnemyShot { owner: EntityId, pos: Vec2, vel: Vec2 },
}

/// Everything an entity may read or emit during its update
pub struct FrameCtx<'a> {
    pub dt: f32,
    pub field: &'a Playfield,
    /// Player position, if a player exists
    pub target: Option<Vec2>,
    /// Deferred creation queue (the injected factory)
    pub spawns: &'a mut Vec<SpawnRequest>,
}

impl FrameCtx<'_> {
    pub fn spawn(&mut self, request: SpawnRequest) {
        self.spawns.push(request);
    }
}

/// Per-frame contract for simulated objects
pub trait Entity {
    fn id(&self) -> EntityId;

    /// Advance by `ctx.dt` seconds
    fn update(&mut self, ctx: &mut FrameCtx<'_>);

    fn is_alive(&self) -> bool;

    /// Flag for removal. Idempotent; the first fate recorded wins.
    fn destroy(&mut self, fate: Fate);

    /// How the entity died, if it has
    fn fate(&self) -> Option<Fate>;
}
