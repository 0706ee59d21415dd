//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only, no wall clock
//! - Stable iteration order (collections keep insertion order)
//! - No rendering or platform dependencies

pub mod collection;
pub mod collision;
pub mod entities;
pub mod entity;
pub mod grid;
pub mod level;
pub mod particles;
pub mod pool;
pub mod session;
pub mod state;
pub mod tick;

pub use collection::EntityList;
pub use collision::{Aabb, Circle, Collidable, Shape, collide, sweep};
pub use entities::{Bonus, Bullet, Hazard, HazardKind, Owner, Ship, ShipControls};
pub use entity::{Entity, EntityId, Fate, FrameCtx, Playfield, SpawnRequest};
pub use grid::{DangerBlock, Direction, GridGame};
pub use level::{LevelCleared, LevelConfig, SpawnOrder, SpawnPhase, Spawner};
pub use particles::{Burst, Particle, ParticleSystem};
pub use pool::{Pool, Recycle};
pub use session::{GameOverReason, Session, SessionPhase};
pub use state::{GameEvent, GameState};
pub use tick::{TickInput, tick};
