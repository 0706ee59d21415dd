use std::cell::RefCell;
use std::rc::Rc;

use glam::{IVec2, Vec2};

use retro_arcade::audio::{AudioSink, SoundEffect};
use retro_arcade::consts::*;
use retro_arcade::driver::{Driver, Services, StartError};
use retro_arcade::persistence::{BookStore, MemoryBackend, ScoreStore};
use retro_arcade::platform::{AlwaysAuthorized, Identity, InputSnapshot, SharedFlag};
use retro_arcade::renderer::DrawList;
use retro_arcade::sim::*;

const DT: f32 = 1.0 / 60.0;

/// Audio sink that remembers what it was asked to do
#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    fn heard(&self, what: &str) -> bool {
        self.0.borrow().iter().any(|s| s == what)
    }
}

impl AudioSink for Recorder {
    fn play(&mut self, effect: SoundEffect) {
        self.0.borrow_mut().push(format!("{effect:?}"));
    }
    fn start_music(&mut self) {
        self.0.borrow_mut().push("music on".into());
    }
    fn stop_music(&mut self) {
        self.0.borrow_mut().push("music off".into());
    }
}

fn services(store: BookStore<MemoryBackend>, identity: impl Identity + 'static) -> Services {
    Services {
        audio: Box::new(Recorder::default()),
        store: Box::new(store),
        identity: Box::new(identity),
    }
}

fn surface() -> DrawList {
    DrawList::new(Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT))
}

/// Empty the board except for one hazard
fn lone_hazard(state: &mut GameState, kind: HazardKind, pos: Vec2) -> EntityId {
    state.hazards.clear();
    let id = state.next_entity_id();
    state.hazards.push(Hazard::new(id, kind, pos, Vec2::ZERO));
    state.hazards.flush();
    id
}

#[test]
fn test_session_start_spawns_initial_batch() {
    let mut state = GameState::new(11);
    assert!(state.start());

    let config = LevelConfig::for_level(1);
    assert_eq!(state.hazards.len() as u32, config.initial_spawn);
    assert_eq!(state.hazards.len(), 4);
    assert_eq!(state.ships.len(), 1);
    // Nobody spawns on top of the player
    let ship = state.player_pos().unwrap();
    assert!(
        state
            .hazards
            .iter()
            .all(|h| h.pos.distance(ship) >= SPAWN_EXCLUSION)
    );
}

#[test]
fn test_shot_scores_on_the_frame_after_firing() {
    let mut state = GameState::new(3);
    state.start();
    assert_eq!(state.player_pos(), Some(Vec2::new(400.0, 300.0)));
    lone_hazard(&mut state, HazardKind::Boulder, Vec2::new(400.0, 235.0));

    let fire = TickInput {
        fire: true,
        ..Default::default()
    };
    tick(&mut state, &fire, DT);
    assert_eq!(state.session.score, 0);

    tick(&mut state, &TickInput::default(), DT);
    assert_eq!(state.session.score, HazardKind::Boulder.points());
    assert_eq!(state.session.score, 20);
    assert_eq!(state.session.accuracy(), 100);
    assert!(
        state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::HazardDestroyed { points: 20, .. }))
    );
}

#[test]
fn test_third_collision_ends_the_session() {
    let mut state = GameState::new(3);
    state.start();
    let center = state.field.center();

    for hit in 1..=3u8 {
        lone_hazard(&mut state, HazardKind::Rock, center);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.session.lives, STARTING_LIVES - hit);
        if hit < 3 {
            assert!(state.session.is_playing(), "over after {hit} hits");
        }
    }
    assert_eq!(
        state.session.phase,
        SessionPhase::GameOver(GameOverReason::LivesExhausted)
    );
    let overs = state
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::GameOver { .. }))
        .count();
    assert_eq!(overs, 1);
}

#[test]
fn test_game_over_persists_greater_high_score() {
    let mut store = BookStore::new(MemoryBackend::new());
    store.set_high_score("arena", 500).unwrap();
    let recorder = Recorder::default();
    let mut driver = Driver::new(
        GameState::new(9),
        Services {
            audio: Box::new(recorder.clone()),
            store: Box::new(store),
            identity: Box::new(AlwaysAuthorized),
        },
    );
    assert_eq!(driver.high_score(), 500);
    driver.start().unwrap();

    driver.sim.session.add_score(620);
    driver.sim.session.lives = 1;
    let center = driver.sim.field.center();
    lone_hazard(&mut driver.sim, HazardKind::Boulder, center);

    let mut surface = surface();
    driver.frame(0.0, &InputSnapshot::default(), &mut surface);

    assert!(driver.sim.session.is_game_over());
    assert_eq!(driver.store().high_score("arena").unwrap(), 620);
    assert_eq!(driver.high_score(), 620);
    assert!(driver.last_record().is_some_and(|r| r.new_high));
    assert!(recorder.heard("GameOver"));
    assert!(recorder.heard("HighScore"));
    assert!(recorder.heard("music off"));
    assert!(surface.texts().any(|t| t == "GAME OVER"));
    assert!(
        surface
            .texts()
            .any(|t| t.starts_with("1.") && t.contains("620") && t.ends_with("Just now"))
    );
    assert_eq!(driver.table().top_score(), Some(620));

    let stats = driver.store().stats("arena").unwrap();
    assert_eq!(stats.sessions_played, 1);
    assert_eq!(stats.total_score, 620);
}

#[test]
fn test_lower_score_keeps_stored_best() {
    let mut store = BookStore::new(MemoryBackend::new());
    store.set_high_score("arena", 500).unwrap();
    let mut driver = Driver::new(GameState::new(9), services(store, AlwaysAuthorized));
    driver.start().unwrap();
    driver.sim.force_game_over(GameOverReason::LivesExhausted);
    driver.frame(0.0, &InputSnapshot::default(), &mut surface());

    assert_eq!(driver.store().high_score("arena").unwrap(), 500);
    assert!(driver.last_record().is_some_and(|r| !r.new_high));
}

#[test]
fn test_clearing_level_one_advances() {
    let mut state = GameState::new(21);
    state.start();
    for hazard in state.hazards.iter_mut() {
        hazard.destroy(Fate::Shot);
    }
    tick(&mut state, &TickInput::default(), DT);

    assert_eq!(state.level(), 2);
    assert!(state.spawner.config.entity_count >= 4);
    // The new batch joins the board at the start of the next frame
    let staged = state.hazards.len() + state.hazards.pending_len();
    assert_eq!(staged as u32, state.spawner.config.initial_spawn);
    let events = state.drain_events();
    assert!(events.contains(&GameEvent::LevelStarted { level: 2 }));
}

/// Shoot every level 1 hazard in one volley and return level 2's layout
fn level_two_opening(seed: u64, particle_cap: usize) -> Vec<Vec2> {
    let mut state = GameState::new(seed);
    state.particles.set_capacity(particle_cap);
    state.start();
    let corners = [
        Vec2::new(100.0, 100.0),
        Vec2::new(700.0, 100.0),
        Vec2::new(100.0, 500.0),
        Vec2::new(700.0, 500.0),
    ];
    for (hazard, pos) in state.hazards.iter_mut().zip(corners) {
        hazard.pos = pos;
    }
    for pos in corners {
        let id = state.next_entity_id();
        state
            .bullets
            .push(Bullet::new(id, Owner::Player, pos, Vec2::ZERO));
    }
    state.bullets.flush();

    for _ in 0..3 {
        tick(&mut state, &TickInput::default(), DT);
    }
    assert_eq!(state.level(), 2);
    state.hazards.iter().map(|h| h.pos).collect()
}

#[test]
fn test_particle_cap_does_not_change_spawns() {
    let full = level_two_opening(5, PARTICLE_POOL_CAPACITY);
    let none = level_two_opening(5, 0);
    assert_eq!(full.len(), 6);
    assert_eq!(full, none);
}

#[test]
fn test_restart_twice_is_identical() {
    let mut state = GameState::new(77);
    state.start();
    for _ in 0..30 {
        tick(
            &mut state,
            &TickInput {
                fire: true,
                turn: 1.0,
                thrust: true,
            },
            DT,
        );
    }

    state.restart();
    let first = state.session.clone();
    assert!(state.is_empty());
    state.restart();
    assert!(state.is_empty());
    assert_eq!(state.session, first);
    assert_eq!(state.session.score, 0);
    assert_eq!(state.session.lives, STARTING_LIVES);
    assert_eq!(state.level(), 1);
    assert_eq!(state.session.phase, SessionPhase::NotStarted);

    // Same seed, same opening
    state.start();
    let opening: Vec<Vec2> = state.hazards.iter().map(|h| h.pos).collect();
    state.restart();
    state.start();
    let again: Vec<Vec2> = state.hazards.iter().map(|h| h.pos).collect();
    assert_eq!(opening, again);
}

#[test]
fn test_cancelled_driver_ignores_frames() {
    let store = BookStore::new(MemoryBackend::new());
    let mut driver = Driver::new(GameState::new(4), services(store, AlwaysAuthorized));
    driver.start().unwrap();
    let mut surface = surface();
    assert!(driver.frame(0.0, &InputSnapshot::default(), &mut surface));
    let time = driver.sim.time;

    let handle = driver.handle();
    handle.set_pending(12);
    assert_eq!(driver.shutdown(), Some(12));
    assert_eq!(handle.cancel(), None);

    surface.cmds.clear();
    assert!(!driver.frame(16.0, &InputSnapshot::default(), &mut surface));
    assert_eq!(driver.sim.time, time);
    assert!(surface.cmds.is_empty());
    assert_eq!(driver.restart(), Err(StartError::Cancelled));
}

#[test]
fn test_unauthorized_player_cannot_start() {
    let flag = SharedFlag::new(false);
    let store = BookStore::new(MemoryBackend::new());
    let mut driver = Driver::new(GameState::new(4), services(store, flag.clone()));

    assert_eq!(driver.start(), Err(StartError::Unauthorized));
    assert_eq!(driver.sim.session.phase, SessionPhase::NotStarted);
    assert!(driver.sim.is_empty());

    flag.set(true);
    assert_eq!(driver.start(), Ok(()));
    assert!(driver.sim.session.is_playing());
}

#[test]
fn test_revoked_mid_session_forces_game_over() {
    let flag = SharedFlag::new(true);
    let store = BookStore::new(MemoryBackend::new());
    let mut driver = Driver::new(GameState::new(4), services(store, flag.clone()));
    driver.start().unwrap();
    driver.frame(0.0, &InputSnapshot::default(), &mut surface());

    flag.set(false);
    driver.frame(16.0, &InputSnapshot::default(), &mut surface());
    assert_eq!(
        driver.sim.session.game_over_reason(),
        Some(GameOverReason::Revoked)
    );
    assert_eq!(driver.store().stats("arena").unwrap().sessions_played, 1);
    assert_eq!(driver.restart(), Err(StartError::Unauthorized));
}

#[test]
fn test_grid_game_steps_on_its_interval() {
    let store = BookStore::new(MemoryBackend::new());
    let mut driver = Driver::new(GridGame::new(8), services(store, AlwaysAuthorized));
    driver.start().unwrap();
    let start = driver.sim.head();
    let mut surface = surface();

    // First frame counts as one nominal frame, then 20 ms per frame
    let mut now = 0.0;
    for _ in 0..5 {
        driver.frame(now, &InputSnapshot::default(), &mut surface);
        now += 20.0;
    }
    assert_eq!(driver.sim.head(), start);

    for _ in 0..10 {
        driver.frame(now, &InputSnapshot::default(), &mut surface);
        now += 20.0;
    }
    assert_eq!(driver.sim.head(), start + IVec2::new(1, 0));
}

#[test]
fn test_grid_game_over_is_filed_under_its_own_id() {
    let store = BookStore::new(MemoryBackend::new());
    let mut driver = Driver::new(GridGame::new(8), services(store, AlwaysAuthorized));
    driver.start().unwrap();
    driver.sim.session.add_score(30);
    driver.sim.force_game_over(GameOverReason::Crashed);
    driver.frame(0.0, &InputSnapshot::default(), &mut surface());

    assert_eq!(driver.store().high_score("snake").unwrap(), 30);
    assert_eq!(driver.store().high_score("arena").unwrap(), 0);
}
