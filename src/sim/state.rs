//! Arena shooter world state
//!
//! Everything a session needs lives here: the seeded RNG, the session
//! controller, the spawner and one collection per entity category.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collection::EntityList;
use super::entities::{Bonus, Bullet, Hazard, HazardKind, Owner, Ship};
use super::entity::{EntityId, Playfield, SpawnRequest};
use super::level::{SpawnOrder, Spawner};
use super::particles::ParticleSystem;
use super::session::{GameOverReason, Session};
use crate::consts::{FINAL_LEVEL_BONUS, LEVEL_CLEAR_BONUS, PARTICLE_POOL_CAPACITY};

/// Discrete things that happened during a tick. Drained by the driver for
/// audio and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    ShotFired,
    HazardDestroyed { kind: HazardKind, points: u64, pos: Vec2 },
    HazardEscaped { kind: HazardKind },
    PlayerHit { lives: u8 },
    BonusSpawned,
    BonusCollected,
    LevelCleared { level: u32, bonus: u64 },
    LevelStarted { level: u32 },
    GameOver { score: u64, reason: GameOverReason },
    /// Grid game: food eaten
    SnakeAte { length: usize },
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed; restart replays from it
    pub seed: u64,
    pub rng: Pcg32,
    pub field: Playfield,
    pub session: Session,
    pub spawner: Spawner,
    /// Player collection: empty until the session starts
    pub ships: EntityList<Ship>,
    pub bullets: EntityList<Bullet>,
    pub enemy_bullets: EntityList<Bullet>,
    pub hazards: EntityList<Hazard>,
    pub bonuses: EntityList<Bonus>,
    /// Visual only
    pub particles: ParticleSystem,
    /// Creation requests raised by entities during the last update
    pub spawns: Vec<SpawnRequest>,
    pub events: Vec<GameEvent>,
    /// Simulated seconds since start
    pub time: f64,
    next_id: EntityId,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::with_field(seed, Playfield::default())
    }

    pub fn with_field(seed: u64, field: Playfield) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            field,
            session: Session::default(),
            spawner: Spawner::default(),
            ships: EntityList::new(),
            bullets: EntityList::new(),
            enemy_bullets: EntityList::new(),
            hazards: EntityList::new(),
            bonuses: EntityList::new(),
            particles: ParticleSystem::seeded(seed, PARTICLE_POOL_CAPACITY),
            spawns: Vec::new(),
            events: Vec::new(),
            time: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Throw the whole session away and go back to `NotStarted`. Nothing
    /// survives except the seed, playfield and particle cap.
    pub fn restart(&mut self) {
        let capacity = self.particles.capacity();
        *self = Self::with_field(self.seed, self.field);
        self.particles.set_capacity(capacity);
        log::info!("Session reset (seed {})", self.seed);
    }

    /// `NotStarted -> Playing`: place the ship and level 1's opening batch.
    /// Returns false if a session already ran.
    pub fn start(&mut self) -> bool {
        if !self.session.start(self.spawner.config.time_limit) {
            return false;
        }
        let id = self.next_entity_id();
        self.ships.push(Ship::new(id, self.field.center()));
        self.ships.flush();
        self.events.push(GameEvent::SessionStarted);
        self.events.push(GameEvent::LevelStarted {
            level: self.spawner.level,
        });

        self.run_spawner(0.0);
        self.flush_all();
        log::info!(
            "Session started: level {}, {} hazards",
            self.spawner.level,
            self.hazards.len()
        );
        true
    }

    pub fn ship(&self) -> Option<&Ship> {
        self.ships.first()
    }

    pub fn player_pos(&self) -> Option<Vec2> {
        self.ship().map(|s| s.pos)
    }

    pub fn level(&self) -> u32 {
        self.spawner.level
    }

    /// Every collection is empty (staged entities included)
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
            && self.ships.pending_len() == 0
            && self.bullets.is_empty()
            && self.bullets.pending_len() == 0
            && self.enemy_bullets.is_empty()
            && self.enemy_bullets.pending_len() == 0
            && self.hazards.is_empty()
            && self.hazards.pending_len() == 0
            && self.bonuses.is_empty()
            && self.bonuses.pending_len() == 0
    }

    /// Hazards of the current level are still alive on the board or yet to
    /// spawn. Reads live state, so targets hit this frame no longer count.
    pub fn targets_remain(&self) -> bool {
        self.hazards.alive_count() > 0
            || self.hazards.pending_len() > 0
            || self.spawner.spawned < self.spawner.config.entity_count
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the run from outside the simulation (authorization revoked)
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

    /// Turn queued entity requests into entities
    pub(super) fn fulfil_spawns(&mut self) {
        for request in std::mem::take(&mut self.spawns) {
            match request {
                SpawnRequest::PlayerShot { pos, vel, .. } => {
                    let id = self.next_entity_id();
                    self.bullets.push(Bullet::new(id, Owner::Player, pos, vel));
                    self.session.record_shot();
                    self.events.push(GameEvent::ShotFired);
                }
                SpawnRequest::EnemyShot { owner, pos, vel } => {
                    let id = self.next_entity_id();
                    // The shooter may have died since it asked
                    let Some(shooter) = self.hazards.get_mut(owner).filter(|h| h.live_shot.is_none())
                    else {
                        continue;
                    };
                    shooter.attach_shot(id);
                    self.enemy_bullets.push(Bullet::new(id, Owner::Enemy(owner), pos, vel));
                }
            }
        }
    }

    /// Step the spawner and stage whatever it orders
    pub(super) fn run_spawner(&mut self, dt: f32) {
        let mut orders = Vec::new();
        let player = self.player_pos();
        let cleared = self
            .spawner
            .step(dt, player, &self.field, &mut self.rng, &mut orders);

        for order in orders {
            let id = self.next_entity_id();
            match order {
                SpawnOrder::Hazard { kind, pos, vel } => {
                    let mut hazard = Hazard::new(id, kind, pos, vel);
                    hazard.spin = (id % 7) as f32 * 0.2 - 0.6;
                    self.hazards.push(hazard);
                }
                SpawnOrder::Bonus { pos, vel } => {
                    self.bonuses.push(Bonus::new(id, pos, vel));
                    self.spawner.bonus_placed(id);
                    self.events.push(GameEvent::BonusSpawned);
                }
            }
        }

        if let Some(cleared) = cleared {
            let mut bonus = self.session.add_score(LEVEL_CLEAR_BONUS);
            self.session.multiplier = false;
            match cleared.next {
                Some(next) => {
                    self.session.time_remaining = self.spawner.config.time_limit;
                    self.events.push(GameEvent::LevelCleared {
                        level: cleared.level,
                        bonus,
                    });
                    self.events.push(GameEvent::LevelStarted { level: next });
                }
                None => {
                    bonus += self.session.add_score(FINAL_LEVEL_BONUS);
                    self.events.push(GameEvent::LevelCleared {
                        level: cleared.level,
                        bonus,
                    });
                    self.force_game_over(GameOverReason::Completed);
                }
            }
        }
    }

    pub(super) fn flush_all(&mut self) {
        self.ships.flush();
        self.bullets.flush();
        self.enemy_bullets.flush();
        self.hazards.flush();
        self.bonuses.flush();
    }
}
