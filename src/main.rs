//! Retro Arcade entry point
//!
//! On the web this wires the canvas, keyboard and storage into a driver and
//! runs it off `requestAnimationFrame`. Natively there is no window; a short
//! scripted headless run of both games is played and logged instead.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent};

    use retro_arcade::Settings;
    use retro_arcade::audio::{Mixer, WebAudio};
    use retro_arcade::driver::{Driver, Services, Simulation};
    use retro_arcade::persistence::{BookStore, LocalStorageBackend, MemoryBackend, ScoreStore};
    use retro_arcade::platform::{InputState, Key, SharedFlag};
    use retro_arcade::renderer::canvas::CanvasSurface;
    use retro_arcade::sim::{GameState, GridGame};

    thread_local! {
        static AUTHORIZED: SharedFlag = SharedFlag::new(true);
    }

    /// Host page hook: the wallet connection flips this
    #[wasm_bindgen]
    pub fn set_authorized(authorized: bool) {
        AUTHORIZED.with(|flag| flag.set(authorized));
    }

    struct App<S: Simulation> {
        driver: Driver<S>,
        input: InputState,
        surface: CanvasSurface,
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Retro Arcade starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };
        let game = canvas.get_attribute("data-game").unwrap_or_default();

        let Some(surface) = CanvasSurface::new(canvas) else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let storage = LocalStorageBackend::open();
        let settings = match &storage {
            Ok(backend) => Settings::load(backend),
            Err(e) => {
                log::warn!("Storage unavailable, scores will not persist: {e}");
                Settings::default()
            }
        };
        let store: Box<dyn ScoreStore> = match storage {
            Ok(backend) => Box::new(BookStore::new(backend)),
            Err(_) => Box::new(BookStore::new(MemoryBackend::new())),
        };
        let services = Services {
            audio: Box::new(WebAudio::new(Mixer::from_settings(&settings))),
            store,
            identity: Box::new(AUTHORIZED.with(|flag| flag.clone())),
        };

        let seed = js_sys::Date::now() as u64;
        log::info!("Game '{}' initialized with seed: {}", game, seed);
        if game == "snake" {
            launch(GridGame::new(seed), services, surface);
        } else {
            let mut state = GameState::new(seed);
            state.particles.set_capacity(settings.max_particles());
            launch(state, services, surface);
        }
    }

    fn launch<S: Simulation + 'static>(sim: S, services: Services, surface: CanvasSurface) {
        let app = Rc::new(RefCell::new(App {
            driver: Driver::new(sim, services),
            input: InputState::new(),
            surface,
        }));
        setup_input_handlers(app.clone());
        setup_teardown(app.clone());
        request_animation_frame(app);
        log::info!("Retro Arcade running!");
    }

    fn setup_input_handlers<S: Simulation + 'static>(app: Rc<RefCell<App<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    event.prevent_default();
                    app.borrow_mut().input.press(key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    app.borrow_mut().input.release(key);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keys held while focus leaves never get their keyup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().input.reset();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_teardown<S: Simulation + 'static>(app: Rc<RefCell<App<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let pending = app.borrow_mut().driver.shutdown();
            if let (Some(id), Some(window)) = (pending, web_sys::window()) {
                let _ = window.cancel_animation_frame(id);
            }
        });
        let _ =
            window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame<S: Simulation + 'static>(app: Rc<RefCell<App<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let handle = app.borrow().driver.handle();
        if handle.is_cancelled() {
            return;
        }
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => handle.set_pending(id),
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop<S: Simulation + 'static>(app: Rc<RefCell<App<S>>>, time: f64) {
        let keep_going = {
            let mut guard = app.borrow_mut();
            let App {
                driver,
                input,
                surface,
            } = &mut *guard;
            driver.handle().take_pending();
            let snapshot = input.snapshot();
            input.end_frame();
            driver.frame(time, &snapshot, surface)
        };

        if keep_going {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Retro Arcade (native) starting...");
    log::info!("Native mode is headless - serve the wasm build for the playable version");

    headless::run_arena(42);
    headless::run_snake(42);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use retro_arcade::audio::NullAudio;
    use retro_arcade::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
    use retro_arcade::driver::{Driver, Services, Simulation};
    use retro_arcade::persistence::{BookStore, MemoryBackend};
    use retro_arcade::platform::{AlwaysAuthorized, InputState, Key};
    use retro_arcade::renderer::DrawList;
    use retro_arcade::sim::{GameState, GridGame};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;

    fn services() -> Services {
        Services {
            audio: Box::new(NullAudio),
            store: Box::new(BookStore::new(MemoryBackend::new())),
            identity: Box::new(AlwaysAuthorized),
        }
    }

    /// Drive `driver` with a scripted player until the session ends
    fn play<S: Simulation>(driver: &mut Driver<S>, script: impl Fn(u32, &mut InputState)) {
        let mut input = InputState::new();
        let mut surface = DrawList::new(Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT));
        input.press(Key::Start);

        for frame in 0..MAX_FRAMES {
            script(frame, &mut input);
            let snapshot = input.snapshot();
            input.end_frame();
            driver.frame(frame as f64 * FRAME_MS, &snapshot, &mut surface);
            if frame > 0 && !driver.sim.session().is_playing() {
                break;
            }
        }
    }

    pub fn run_arena(seed: u64) {
        let mut driver = Driver::new(GameState::new(seed), services());
        // Sweep the gun back and forth while holding the trigger
        play(&mut driver, |frame, input| {
            input.release(Key::Start);
            input.press(Key::Fire);
            if (frame / 90) % 2 == 0 {
                input.release(Key::Left);
                input.press(Key::Right);
            } else {
                input.release(Key::Right);
                input.press(Key::Left);
            }
        });

        let summary = driver.sim.summary();
        log::info!(
            "Arena: score {} at level {}, accuracy {}%, {:?}",
            summary.score,
            summary.level,
            driver.sim.session.accuracy(),
            driver.sim.session.game_over_reason()
        );
        log::info!("Arena best on record: {}", driver.high_score());
    }

    pub fn run_snake(seed: u64) {
        let mut driver = Driver::new(GridGame::new(seed), services());
        // Square spiral, turning every few steps
        let turns = [Key::Down, Key::Left, Key::Up, Key::Right];
        play(&mut driver, |frame, input| {
            for key in Key::ALL {
                input.release(key);
            }
            if frame > 0 && frame % 40 == 0 {
                input.press(turns[(frame / 40) as usize % turns.len()]);
            }
        });

        let summary = driver.sim.summary();
        log::info!(
            "Snake: score {}, length {}, {:?}",
            summary.score,
            summary.level,
            driver.sim.session.game_over_reason()
        );
        log::info!("Snake best on record: {}", driver.high_score());
    }
}
