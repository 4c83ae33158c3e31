//! Pachinko entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, MouseEvent, TouchEvent};

    use pachinko::audio::{AudioManager, SoundEffect};
    use pachinko::consts::*;
    use pachinko::renderer::{RenderState, build_scene};
    use pachinko::sim::{GamePhase, GameState, TickInput, tick};
    use pachinko::{Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        audio: AudioManager,
        render_state: Option<RenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Canvas pixels per CSS pixel
        dpr: f32,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning, settings: Settings) -> Self {
            Self {
                state: GameState::new(seed, tuning),
                audio: AudioManager::new(&settings),
                settings,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                dpr: 1.0,
            }
        }

        /// Convert a CSS-pixel canvas position to world coordinates
        fn screen_to_world(&self, x: f32, y: f32) -> Option<Vec2> {
            let render_state = self.render_state.as_ref()?;
            Some(
                render_state
                    .viewport
                    .screen_to_world(Vec2::new(x, y) * self.dpr),
            )
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.fire = false;
                self.input.pause = false;
                self.input.try_again = false;
            }

            for event in self.state.drain_events() {
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let vertices = build_scene(&self.state, &self.settings);
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let (w, h) = render_state.viewport.size;
                        render_state.resize(w, h);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("ball-count") {
                el.set_text_content(Some(&self.state.ball_stock.to_string()));
            }

            show_if(&document, "game-over", self.state.phase == GamePhase::GameOver);
            show_if(&document, "congratulations", self.state.phase == GamePhase::Won);
            show_if(
                &document,
                "try-again-btn",
                matches!(self.state.phase, GamePhase::Won | GamePhase::GameOver),
            );
            show_if(&document, "pause-menu", self.state.paused);
        }
    }

    fn show_if(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Tuning from the `?tuning=` query parameter, or the defaults
    fn load_tuning(window: &web_sys::Window) -> Tuning {
        let json = window
            .location()
            .search()
            .ok()
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
            .and_then(|params| params.get("tuning"));

        match json {
            Some(json) => Tuning::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Invalid tuning, using defaults: {}", e);
                Tuning::default()
            }),
            None => Tuning::default(),
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Pachinko starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        show_if(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let tuning = load_tuning(&window);
        let world = Vec2::new(tuning.width, tuning.height);
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, tuning, Settings::load())));
        game.borrow_mut().dpr = dpr as f32;

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU (falls back to WebGL2)
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let to_js = |e: pachinko::renderer::RenderError| JsValue::from_str(&e.to_string());
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| to_js(e.into()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| to_js(e.into()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height, world)
            .await
            .map_err(to_js)?;
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_try_again_button(game.clone());
        setup_auto_pause(game.clone());

        show_if(&document, "hud", true);

        // Start game loop
        request_animation_frame(game);

        log::info!("Pachinko running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse move - aim
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let target = g.screen_to_world(event.offset_x() as f32, event.offset_y() as f32);
                if target.is_some() {
                    g.input.aim_target = target;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click - fire
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                if let Some(target) =
                    g.screen_to_world(event.offset_x() as f32, event.offset_y() as f32)
                {
                    g.input.aim_target = Some(target);
                }
                g.input.fire = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move - aim; touch start - aim and fire
        for (name, fires) in [("touchmove", false), ("touchstart", true)] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    if let Some(target) = g.screen_to_world(x, y) {
                        g.input.aim_target = Some(target);
                    }
                }
                if fires {
                    g.audio.resume();
                    g.input.fire = true;
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => g.input.fire = true,
                    "Escape" => g.input.pause = true,
                    "i" | "I" => {
                        g.input.idle_mode = !g.input.idle_mode;
                        log::info!("Idle mode: {}", g.input.idle_mode);
                    }
                    key => {
                        let Game {
                            settings, audio, ..
                        } = &mut *g;
                        if settings.apply_key(key) {
                            audio.apply_settings(settings);
                            settings.save();
                            log::info!("Settings: {:?}", settings);
                        }
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_try_again_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("try-again-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                // Keep the click from reaching the canvas as a shot
                event.stop_propagation();
                game.borrow_mut().input.try_again = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
                let mut g = game.borrow_mut();
                if hidden && !g.state.paused {
                    g.input.pause = true;
                    log::info!("Auto-paused (tab hidden)");
                }
                let mute = hidden && g.settings.mute_on_blur;
                g.audio.set_blurred(mute);
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if !g.state.paused {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
                let mute = g.settings.mute_on_blur;
                g.audio.set_blurred(mute);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Focus returns: unmute (stays paused until Escape)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_blurred(false);
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Native: play one full game headless with the demo player
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pachinko::Tuning;
    use pachinko::consts::SIM_DT;
    use pachinko::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Invalid tuning in {}, using defaults: {}", path, e);
                Tuning::default()
            }),
            Err(e) => {
                log::warn!("Cannot read {}, using defaults: {}", path, e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    log::info!("Pachinko (native) headless autoplay, seed {}", seed);

    let mut state = GameState::new(seed, tuning);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    // Ten minutes of game time is plenty for one game
    let max_ticks = (600.0 / SIM_DT) as u64;
    let mut catches = 0;
    for _ in 0..max_ticks {
        tick(&mut state, &input, SIM_DT);
        for event in state.drain_events() {
            log::debug!("{:?}", event);
            if event == GameEvent::BucketCatch {
                catches += 1;
            }
        }
        if matches!(state.phase, GamePhase::Won | GamePhase::GameOver) {
            break;
        }
    }

    let outcome = match state.phase {
        GamePhase::Won => "won",
        GamePhase::GameOver => "lost",
        _ => "unfinished",
    };
    log::info!(
        "Game {} after {} shots ({} bucket catches, {} special pegs left, {:.1}s)",
        outcome,
        state.shots_fired,
        catches,
        state.special_pegs_remaining(),
        state.clock_ms / 1000.0
    );
}
