//! Stack Tower entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent};

    use stack_tower::renderer::{RenderState, SceneGraph};
    use stack_tower::{GameEvent, GameSession, RapierWorld, Settings};

    /// Game instance holding all state
    struct Game {
        session: GameSession<SceneGraph, RapierWorld>,
        render_state: Option<RenderState>,
    }

    impl Game {
        fn new(width: u32, height: u32, seed: u64) -> Self {
            let settings = Settings::load().sanitized();
            // Write back so storage always holds every field with valid values
            settings.save();
            let physics = RapierWorld::new(settings.gravity);
            Self {
                session: GameSession::new(SceneGraph::new(width, height), physics, settings, seed),
                render_state: None,
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(self.session.scene()) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.session.on_resize(width, height);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
            }
        }

        /// Push score/announcement changes into the DOM
        fn update_hud(&mut self) {
            let events = self.session.drain_events();
            if events.is_empty() {
                return;
            }

            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            for event in events {
                match event {
                    GameEvent::ScoreChanged(score) => {
                        if let Some(el) = document.get_element_by_id("score") {
                            el.set_text_content(Some(&score.to_string()));
                        }
                    }
                    GameEvent::GameOver { message, .. } => {
                        if let Some(el) = document.get_element_by_id("announcement") {
                            el.set_text_content(Some(&message));
                            let _ = el.set_attribute("class", "");
                        }
                    }
                    GameEvent::Reset => {
                        if let Some(el) = document.get_element_by_id("announcement") {
                            let _ = el.set_attribute("class", "hidden");
                        }
                    }
                    GameEvent::Started => {}
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Stack Tower starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = canvas_pixel_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(width, height, seed)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await;
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_resize_handler(canvas, game.clone());

        // Draw loop runs from the start; the tower only moves once started
        request_animation_frame(game);

        log::info!("Stack Tower running!");
    }

    fn canvas_pixel_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        (width.max(1), height.max(1))
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Left click - start, then drop the moving layer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 0 {
                    game.borrow_mut().session.on_click();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Right click - restart
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                game.borrow_mut().session.on_reset();
            });
            let _ = canvas
                .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = canvas_pixel_size(&window, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            game.borrow_mut().resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            g.session.frame();
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Stack Tower (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    autoplay();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a bot that drops each layer a little later than the last
#[cfg(not(target_arch = "wasm32"))]
fn autoplay() {
    use stack_tower::renderer::SceneGraph;
    use stack_tower::{CutResult, GameSession, RapierWorld, Settings};

    /// Frame cap so a bot that never misses still terminates
    const MAX_FRAMES: u32 = 20_000;
    /// Extra drift added to the bot's aim each round
    const AIM_DRIFT: f32 = 0.07;

    let settings = Settings::load();
    let physics = RapierWorld::new(settings.gravity);
    let mut session = GameSession::new(SceneGraph::new(1280, 720), physics, settings, 2024);

    session.on_click();
    let mut round = 0u32;
    for _ in 0..MAX_FRAMES {
        session.frame();
        log_events(&mut session);

        let (Some(top), Some(reference)) = (session.stack().top(), session.stack().reference()) else {
            break;
        };
        let Some(axis) = top.axis else {
            break;
        };
        let aim = axis.of(reference.position()) + AIM_DRIFT * round as f32;
        if axis.of(top.position()) < aim {
            continue;
        }

        let result = session.on_click();
        log_events(&mut session);
        match result {
            Some(CutResult::Placed { score, next }) => {
                log::info!("Placed layer {} ({:.2} x {:.2})", score, next.width, next.depth);
                round += 1;
            }
            Some(CutResult::GameOver { score }) => {
                println!("{}", stack_tower::sim::game_over_message(score));
                break;
            }
            None => break,
        }
    }

    // Let the debris settle for a second
    for _ in 0..60 {
        session.frame();
        log_events(&mut session);
    }
    log::info!(
        "Rendered {} frames, {} boxes in scene, {} overhangs",
        session.scene().frames_rendered(),
        session.scene().len(),
        session.stack().overhangs.len()
    );
}

/// Native stand-in for the HUD: log whatever the session raised
#[cfg(not(target_arch = "wasm32"))]
fn log_events(session: &mut stack_tower::GameSession<stack_tower::SceneGraph, stack_tower::RapierWorld>) {
    use stack_tower::GameEvent;

    for event in session.drain_events() {
        match event {
            GameEvent::Started => log::info!("Game started"),
            GameEvent::ScoreChanged(score) => log::debug!("Score: {}", score),
            GameEvent::GameOver { score, .. } => log::info!("Game over at {}", score),
            GameEvent::Reset => log::info!("Reset"),
        }
    }
}
