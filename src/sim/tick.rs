//! Variable timestep simulation tick
//!
//! One call is one frame of the update phase:
//! 1. entities requested last frame join their lists
//! 2. dead entities are removed, the rest move
//! 3. the spawner runs
//! 4. collision sweeps (shots x hazards, shots x bonus, player x hazards)
//! 5. the level countdown is checked

use super::collision::{collide, sweep};
use super::entities::{Owner, ShipControls};
use super::entity::{Entity, Fate, FrameCtx};
use super::particles::Burst;
use super::session::{GameOverReason, Session};
use super::state::{GameEvent, GameState};
use crate::consts::MAX_FRAME_DT;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// -1 = rotate left, 1 = rotate right
    pub turn: f32,
    pub thrust: bool,
    pub fire: bool,
}

/// Advance the game state by `dt` seconds (clamped to `MAX_FRAME_DT`)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    // Debris keeps fading on the game over screen
    state.particles.update(dt, &state.field);

    if !state.session.is_playing() {
        return;
    }
    state.time += dt as f64;

    state.fulfil_spawns();
    state.flush_all();

    update_entities(state, input, dt);

    state.run_spawner(dt);
    if !state.session.is_playing() {
        return;
    }

    resolve_collisions(state);

    let targets_remain = state.targets_remain();
    if state.session.tick_timer(dt, targets_remain) {
        state.events.push(GameEvent::GameOver {
            score: state.session.score,
            reason: GameOverReason::TimeUp,
        });
    }
}

/// Sweep every collection: drop the flagged, update the rest
fn update_entities(state: &mut GameState, input: &TickInput, dt: f32) {
    let GameState {
        field,
        session,
        spawner,
        ships,
        bullets,
        enemy_bullets,
        hazards,
        bonuses,
        spawns,
        events,
        ..
    } = state;

    if let Some(ship) = ships.first_mut() {
        ship.controls = ShipControls {
            turn: input.turn,
            thrust: input.thrust,
            fire: input.fire,
        };
    }

    let mut ctx = FrameCtx {
        dt,
        field: &*field,
        target: ships.first().map(|s| s.pos),
        spawns,
    };

    ships.sweep(&mut ctx, |_| {});

    hazards.sweep(&mut ctx, |hazard| {
        spawner.hazard_removed();
        if hazard.fate() == Some(Fate::Escaped) {
            log::debug!("{:?} {} escaped", hazard.kind, hazard.id);
            events.push(GameEvent::HazardEscaped { kind: hazard.kind });
            lose_life(session, events);
        }
    });

    bonuses.sweep(&mut ctx, |bonus| spawner.release_bonus(bonus.id()));

    bullets.sweep(&mut ctx, |_| {});

    enemy_bullets.sweep(&mut ctx, |bullet| {
        if let Owner::Enemy(owner) = bullet.owner {
            if let Some(shooter) = hazards.get_mut(owner) {
                shooter.release_shot(bullet.id);
            }
        }
    });
}

fn resolve_collisions(state: &mut GameState) {
    let GameState {
        field,
        session,
        ships,
        bullets,
        enemy_bullets,
        hazards,
        bonuses,
        particles,
        events,
        ..
    } = state;

    // Player shots against hazards. A shot landing on a wreck that was
    // already hit this frame is absorbed without scoring.
    sweep(bullets.as_mut_slice(), hazards.as_mut_slice(), |bullet, hazard| {
        bullet.destroy(Fate::Shot);
        if !hazard.is_alive() {
            return;
        }
        hazard.destroy(Fate::Shot);
        let points = session.award_hit(hazard.points());
        particles.burst(hazard.pos, &Burst::debris(hazard.kind.tint()));
        events.push(GameEvent::HazardDestroyed {
            kind: hazard.kind,
            points,
            pos: hazard.pos,
        });
    });

    // Player shots against the multiplier pickup
    sweep(bullets.as_mut_slice(), bonuses.as_mut_slice(), |bullet, bonus| {
        bullet.destroy(Fate::Shot);
        if bonus.is_alive() && session.is_playing() {
            bonus.destroy(Fate::Shot);
            session.multiplier = true;
            events.push(GameEvent::BonusCollected);
            log::debug!("Multiplier active");
        }
    });

    let Some(ship) = ships.first_mut() else {
        return;
    };

    // One hit per frame: the ship is moved to safety right after
    if let Some(hazard) = hazards
        .iter_mut()
        .rev()
        .find(|h| h.is_alive() && collide(&*ship, &**h))
    {
        hazard.destroy(Fate::Crashed);
        particles.burst(ship.pos, &Burst::sparks());
        ship.respawn_at(field.center());
        player_hit(session, events);
        return;
    }

    if let Some(shot) = enemy_bullets
        .iter_mut()
        .rev()
        .find(|b| b.is_alive() && collide(&*ship, &**b))
    {
        shot.destroy(Fate::Crashed);
        particles.burst(ship.pos, &Burst::sparks());
        ship.respawn_at(field.center());
        player_hit(session, events);
    }
}

fn player_hit(session: &mut Session, events: &mut Vec<GameEvent>) {
    if !session.is_playing() {
        return;
    }
    events.push(GameEvent::PlayerHit {
        lives: session.lives.saturating_sub(1),
    });
    lose_life(session, events);
}

fn lose_life(session: &mut Session, events: &mut Vec<GameEvent>) {
    if session.lose_life() {
        events.push(GameEvent::GameOver {
            score: session.score,
            reason: GameOverReason::LivesExhausted,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::entities::{Bonus, Bullet, Hazard, HazardKind};
    use crate::sim::session::SessionPhase;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn started(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        assert!(state.start());
        state
    }

    /// Replace the board with a single hazard
    fn lone_hazard(state: &mut GameState, kind: HazardKind, pos: Vec2, vel: Vec2) -> u32 {
        state.hazards.clear();
        let id = state.next_entity_id();
        state.hazards.push(Hazard::new(id, kind, pos, vel));
        state.hazards.flush();
        id
    }

    #[test]
    fn test_not_started_does_nothing() {
        let mut state = GameState::new(5);
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.is_empty());
        assert_eq!(state.session.phase, SessionPhase::NotStarted);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = started(5);
        tick(&mut state, &TickInput::default(), 10.0);
        assert!((state.time - MAX_FRAME_DT as f64).abs() < 1e-6);
    }

    #[test]
    fn test_fire_counts_shot_next_frame() {
        let mut state = started(5);
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, DT);
        assert!(state.bullets.is_empty());
        assert_eq!(state.spawns.len(), 1);

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.session.shots_fired, 1);
        assert!(state.drain_events().contains(&GameEvent::ShotFired));
    }

    #[test]
    fn test_escaped_hazard_costs_life_and_counts_as_removed() {
        let mut state = started(5);
        let remaining = state.spawner.remaining;
        let field = state.field;
        lone_hazard(
            &mut state,
            HazardKind::Rock,
            Vec2::new(field.width - 1.0, 50.0),
            Vec2::new(600.0, 0.0),
        );

        tick(&mut state, &TickInput::default(), DT); // flagged
        assert_eq!(state.session.lives, STARTING_LIVES);
        tick(&mut state, &TickInput::default(), DT); // removed
        assert_eq!(state.session.lives, STARTING_LIVES - 1);
        assert_eq!(state.spawner.remaining, remaining - 1);
    }

    #[test]
    fn test_second_shot_on_same_wreck_scores_nothing() {
        let mut state = started(5);
        let target = Vec2::new(100.0, 100.0);
        lone_hazard(&mut state, HazardKind::Boulder, target, Vec2::ZERO);
        for _ in 0..2 {
            let id = state.next_entity_id();
            state
                .bullets
                .push(Bullet::new(id, Owner::Player, target + Vec2::new(0.0, 30.0), Vec2::ZERO));
        }
        state.bullets.flush();

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.bullets.iter().all(|b| !b.is_alive()));
        assert_eq!(state.session.score, HazardKind::Boulder.points());
        assert_eq!(state.session.hits, 1);
    }

    #[test]
    fn test_bonus_doubles_points_until_level_ends() {
        let mut state = started(5);
        let target = Vec2::new(700.0, 100.0);
        lone_hazard(&mut state, HazardKind::Rock, target, Vec2::ZERO);

        let bonus_pos = Vec2::new(100.0, 500.0);
        let id = state.next_entity_id();
        state.bonuses.push(Bonus::new(id, bonus_pos, Vec2::ZERO));
        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(id, Owner::Player, bonus_pos, Vec2::ZERO));
        state.flush_all();

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.session.multiplier);

        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(id, Owner::Player, target, Vec2::ZERO));
        state.bullets.flush();
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.session.score, HazardKind::Rock.points() * 2);
    }

    #[test]
    fn test_enemy_bullet_hits_player_and_frees_shooter() {
        let mut state = started(5);
        let ship_pos = state.player_pos().unwrap();
        let saucer = lone_hazard(&mut state, HazardKind::Saucer, Vec2::new(100.0, 100.0), Vec2::ZERO);
        let id = state.next_entity_id();
        state.hazards.get_mut(saucer).unwrap().attach_shot(id);
        state
            .enemy_bullets
            .push(Bullet::new(id, Owner::Enemy(saucer), ship_pos, Vec2::ZERO));
        state.enemy_bullets.flush();

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.session.lives, STARTING_LIVES - 1);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.enemy_bullets.get(id).is_none());
        assert_eq!(state.hazards.get(saucer).unwrap().live_shot, None);
    }

    #[test]
    fn test_timed_level_runs_out() {
        let mut state = started(5);
        for _ in 0..(21.0 / MAX_FRAME_DT) as usize {
            tick(&mut state, &TickInput::default(), MAX_FRAME_DT);
        }
        assert_eq!(
            state.session.game_over_reason(),
            Some(GameOverReason::TimeUp)
        );
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                reason: GameOverReason::TimeUp,
                ..
            }
        )));
    }

    #[test]
    fn test_last_targets_shot_as_clock_runs_out() {
        let mut state = started(5);
        state.session.time_remaining = Some(0.01);
        let corners = [
            Vec2::new(100.0, 100.0),
            Vec2::new(700.0, 100.0),
            Vec2::new(100.0, 500.0),
            Vec2::new(700.0, 500.0),
        ];
        assert_eq!(state.hazards.len(), corners.len());
        for (hazard, pos) in state.hazards.iter_mut().zip(corners) {
            hazard.pos = pos;
        }
        for pos in corners {
            let id = state.next_entity_id();
            state.bullets.push(Bullet::new(id, Owner::Player, pos, Vec2::ZERO));
        }
        state.bullets.flush();

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.hazards.alive_count(), 0);
        assert!(state.session.is_playing());
        assert_eq!(state.session.score, HazardKind::Boulder.points() * 4);

        // The removals land next frame and clear the level
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.level(), 2);
        assert!(state.session.is_playing());
    }

    #[test]
    fn test_level_clear_awards_bonus() {
        let mut state = started(5);
        for h in state.hazards.iter_mut() {
            h.destroy(Fate::Shot);
        }
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.level(), 2);
        assert_eq!(state.session.score, LEVEL_CLEAR_BONUS);
        // Fresh countdown for the new level
        assert!(state.session.time_remaining.is_some_and(|t| t > 19.9));
    }

    #[test]
    fn test_game_over_freezes_world() {
        let mut state = started(5);
        state.force_game_over(GameOverReason::Revoked);
        let hazards = state.hazards.len();
        let time = state.time;
        tick(&mut state, &TickInput { fire: true, ..Default::default() }, DT);
        assert_eq!(state.hazards.len(), hazards);
        assert_eq!(state.time, time);
    }
}
