//! Concrete arena entities: ship, bullets, hazards and the bonus pickup

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Circle, Collidable, Shape};
use super::entity::{Entity, EntityId, Fate, FrameCtx, SpawnRequest};
use crate::consts::*;
use crate::heading;

/// Player steering for one frame, derived from the input snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipControls {
    /// -1 turns left, 1 turns right
    pub turn: f32,
    pub thrust: bool,
    pub fire: bool,
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Heading in radians, 0 = up
    pub rotation: f32,
    pub radius: f32,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
    pub controls: ShipControls,
    fate: Option<Fate>,
}

impl Ship {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            radius: SHIP_RADIUS,
            fire_cooldown: 0.0,
            controls: ShipControls::default(),
            fate: None,
        }
    }

    /// Move back to a safe spot after taking a hit
    pub fn respawn_at(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.rotation = 0.0;
    }
}

impl Entity for Ship {
    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        self.rotation += self.controls.turn.clamp(-1.0, 1.0) * SHIP_TURN_SPEED * dt;
        if self.controls.thrust {
            self.vel += heading(self.rotation) * SHIP_THRUST * dt;
        }
        self.vel *= SHIP_INERTIA.powf(dt * 60.0);
        // The ship wraps instead of leaving play
        self.pos = ctx.field.wrap(self.pos + self.vel * dt);

        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        if self.controls.fire && self.fire_cooldown <= 0.0 {
            let dir = heading(self.rotation);
            ctx.spawn(SpawnRequest::PlayerShot {
                pos: self.pos + dir * BULLET_MUZZLE,
                vel: dir * BULLET_SPEED,
                rotation: self.rotation,
            });
            self.fire_cooldown = SHIP_FIRE_COOLDOWN;
        }
    }

    fn is_alive(&self) -> bool {
        self.fate.is_none()
    }

    fn destroy(&mut self, fate: Fate) {
        self.fate.get_or_insert(fate);
    }

    fn fate(&self) -> Option<Fate> {
        self.fate
    }
}

impl Collidable for Ship {
    fn shape(&self) -> Option<Shape> {
        Some(Shape::Circle(Circle::new(self.pos, self.radius)))
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    /// Fired by the hazard with this id
    Enemy(EntityId),
}

/// A straight-flying projectile
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub radius: f32,
    pub owner: Owner,
    fate: Option<Fate>,
}

impl Bullet {
    pub fn new(id: EntityId, owner: Owner, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            rotation: vel.x.atan2(-vel.y),
            radius: BULLET_RADIUS,
            owner,
            fate: None,
        }
    }
}

impl Entity for Bullet {
    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        self.pos += self.vel * ctx.dt;
        if ctx.field.is_outside(self.pos) {
            self.destroy(Fate::Escaped);
        }
    }

    fn is_alive(&self) -> bool {
        self.fate.is_none()
    }

    fn destroy(&mut self, fate: Fate) {
        self.fate.get_or_insert(fate);
    }

    fn fate(&self) -> Option<Fate> {
        self.fate
    }
}

impl Collidable for Bullet {
    fn shape(&self) -> Option<Shape> {
        Some(Shape::Circle(Circle::new(self.pos, self.radius)))
    }
}

/// Hazard variants, unlocked as levels progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Big slow rock
    Boulder,
    Rock,
    /// Small fast rock
    Pebble,
    /// Boxy flyer that shoots back
    Saucer,
}

impl HazardKind {
    pub const ALL: [HazardKind; 4] = [
        HazardKind::Boulder,
        HazardKind::Rock,
        HazardKind::Pebble,
        HazardKind::Saucer,
    ];

    /// First level this variant may appear on
    pub fn unlock_level(self) -> u32 {
        match self {
            HazardKind::Boulder => 1,
            HazardKind::Rock => 2,
            HazardKind::Pebble => 4,
            HazardKind::Saucer => 6,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            HazardKind::Boulder => 40.0,
            HazardKind::Rock => 25.0,
            HazardKind::Pebble => 14.0,
            HazardKind::Saucer => 18.0,
        }
    }

    pub fn points(self) -> u64 {
        match self {
            HazardKind::Boulder => 20,
            HazardKind::Rock => 50,
            HazardKind::Pebble => 100,
            HazardKind::Saucer => 150,
        }
    }

    /// Multiplier on the level's base speed
    pub fn speed_factor(self) -> f32 {
        match self {
            HazardKind::Boulder => 1.0,
            HazardKind::Rock => 1.3,
            HazardKind::Pebble => 1.6,
            HazardKind::Saucer => 0.8,
        }
    }

    /// Base color, shared by the sprite and its debris
    pub fn tint(self) -> [u8; 3] {
        match self {
            HazardKind::Boulder => [170, 150, 120],
            HazardKind::Rock => [200, 200, 210],
            HazardKind::Pebble => [120, 200, 255],
            HazardKind::Saucer => [120, 255, 120],
        }
    }

    /// Saucer hitbox (width, height)
    pub const SAUCER_SIZE: Vec2 = Vec2::new(36.0, 18.0);
}

/// Something the player must shoot before it escapes or rams them
#[derive(Debug, Clone)]
pub struct Hazard {
    pub id: EntityId,
    pub kind: HazardKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rotation: f32,
    /// Radians per second, cosmetic
    pub spin: f32,
    /// Seconds until a saucer may fire again
    pub reload: f32,
    /// The one enemy bullet this hazard has in flight. Non-owning: the bullet
    /// lives in the enemy bullet list and clears this when it dies.
    pub live_shot: Option<EntityId>,
    fate: Option<Fate>,
}

impl Hazard {
    pub fn new(id: EntityId, kind: HazardKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            radius: kind.radius(),
            rotation: 0.0,
            spin: 0.0,
            reload: SAUCER_FIRE_INTERVAL,
            live_shot: None,
            fate: None,
        }
    }

    pub fn points(&self) -> u64 {
        self.kind.points()
    }

    /// Link the bullet fired on our behalf
    pub fn attach_shot(&mut self, shot: EntityId) {
        self.live_shot = Some(shot);
    }

    /// Forget a bullet that has died, if it is ours
    pub fn release_shot(&mut self, shot: EntityId) {
        if self.live_shot == Some(shot) {
            self.live_shot = None;
        }
    }
}

impl Entity for Hazard {
    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        self.pos += self.vel * dt;
        self.rotation += self.spin * dt;
        if ctx.field.is_outside(self.pos) {
            self.destroy(Fate::Escaped);
            return;
        }

        if self.kind == HazardKind::Saucer {
            self.reload -= dt;
            if self.reload <= 0.0 && self.live_shot.is_none() {
                if let Some(target) = ctx.target {
                    let dir = (target - self.pos).normalize_or_zero();
                    ctx.spawn(SpawnRequest::EnemyShot {
                        owner: self.id,
                        pos: self.pos,
                        vel: dir * ENEMY_BULLET_SPEED,
                    });
                }
                self.reload = SAUCER_FIRE_INTERVAL;
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.fate.is_none()
    }

    fn destroy(&mut self, fate: Fate) {
        self.fate.get_or_insert(fate);
    }

    fn fate(&self) -> Option<Fate> {
        self.fate
    }
}

impl Collidable for Hazard {
    fn shape(&self) -> Option<Shape> {
        Some(match self.kind {
            HazardKind::Saucer => Shape::Rect(Aabb::centered(self.pos, HazardKind::SAUCER_SIZE)),
            _ => Shape::Circle(Circle::new(self.pos, self.radius)),
        })
    }
}

/// Score multiplier pickup. Shooting it doubles hazard points for the rest
/// of the level.
#[derive(Debug, Clone)]
pub struct Bonus {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Seconds left before it fizzles
    pub life: f32,
    fate: Option<Fate>,
}

impl Bonus {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: BONUS_RADIUS,
            life: BONUS_LIFETIME,
            fate: None,
        }
    }
}

impl Entity for Bonus {
    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        self.pos += self.vel * ctx.dt;
        self.life -= ctx.dt;
        if ctx.field.is_outside(self.pos) {
            self.destroy(Fate::Escaped);
        } else if self.life <= 0.0 {
            self.destroy(Fate::Expired);
        }
    }

    fn is_alive(&self) -> bool {
        self.fate.is_none()
    }

    fn destroy(&mut self, fate: Fate) {
        self.fate.get_or_insert(fate);
    }

    fn fate(&self) -> Option<Fate> {
        self.fate
    }
}

impl Collidable for Bonus {
    fn shape(&self) -> Option<Shape> {
        Some(Shape::Circle(Circle::new(self.pos, self.radius)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Playfield;

    fn step<E: Entity>(entity: &mut E, dt: f32, target: Option<Vec2>) -> Vec<SpawnRequest> {
        let field = Playfield::new(100.0, 100.0);
        let mut spawns = Vec::new();
        let mut ctx = FrameCtx {
            dt,
            field: &field,
            target,
            spawns: &mut spawns,
        };
        entity.update(&mut ctx);
        spawns
    }

    #[test]
    fn test_bullet_dies_on_first_update_past_edge() {
        let mut bullet = Bullet::new(1, Owner::Player, Vec2::new(50.0, 95.0), Vec2::new(0.0, 5.0));
        step(&mut bullet, 1.0, None);
        // Exactly on the edge: retained
        assert!(bullet.is_alive());
        step(&mut bullet, 1.0, None);
        assert!(!bullet.is_alive());
        assert_eq!(bullet.fate(), Some(Fate::Escaped));
    }

    #[test]
    fn test_first_fate_wins() {
        let mut hazard = Hazard::new(1, HazardKind::Rock, Vec2::splat(50.0), Vec2::ZERO);
        hazard.destroy(Fate::Shot);
        hazard.destroy(Fate::Crashed);
        assert_eq!(hazard.fate(), Some(Fate::Shot));
    }

    #[test]
    fn test_ship_fire_respects_cooldown() {
        let mut ship = Ship::new(1, Vec2::splat(50.0));
        ship.controls.fire = true;
        assert_eq!(step(&mut ship, 0.01, None).len(), 1);
        assert!(step(&mut ship, 0.01, None).is_empty());
        // Let the cooldown run out
        assert_eq!(step(&mut ship, SHIP_FIRE_COOLDOWN, None).len(), 1);
    }

    #[test]
    fn test_ship_wraps_around() {
        let mut ship = Ship::new(1, Vec2::new(99.0, 50.0));
        ship.vel = Vec2::new(120.0, 0.0);
        step(&mut ship, 0.05, None);
        assert!(ship.is_alive());
        assert!(ship.pos.x < 10.0);
    }

    #[test]
    fn test_saucer_holds_fire_while_shot_in_flight() {
        let mut saucer = Hazard::new(7, HazardKind::Saucer, Vec2::splat(50.0), Vec2::ZERO);
        saucer.reload = 0.0;
        let spawns = step(&mut saucer, 0.01, Some(Vec2::new(50.0, 90.0)));
        assert_eq!(spawns.len(), 1);
        match &spawns[0] {
            SpawnRequest::EnemyShot { owner, vel, .. } => {
                assert_eq!(*owner, 7);
                assert!(vel.y > 0.0);
            }
            other => panic!("unexpected spawn {other:?}"),
        }

        saucer.attach_shot(99);
        saucer.reload = 0.0;
        assert!(step(&mut saucer, 0.01, Some(Vec2::new(50.0, 90.0))).is_empty());

        saucer.release_shot(12); // someone else's bullet
        assert_eq!(saucer.live_shot, Some(99));
        saucer.release_shot(99);
        assert_eq!(saucer.live_shot, None);
    }

    #[test]
    fn test_bonus_expires() {
        let mut bonus = Bonus::new(3, Vec2::splat(50.0), Vec2::ZERO);
        step(&mut bonus, BONUS_LIFETIME + 0.1, None);
        assert_eq!(bonus.fate(), Some(Fate::Expired));
    }
}
