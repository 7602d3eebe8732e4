//! Swell Rush entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use swell_rush::Tuning;
    use swell_rush::sim::{
        GameEvent, InputEvent, SessionMode, ShooterGame, Simulation, SimulationContext, SurfGame,
    };

    /// Browser-side holder for one running variant
    struct Game<S: Simulation> {
        ctx: SimulationContext<S>,
    }

    impl<S: Simulation> Game<S> {
        fn new(game: S) -> Self {
            Self {
                ctx: SimulationContext::new(game),
            }
        }

        /// Advance one display frame
        fn update(&mut self, now_ms: f64) {
            for event in self.ctx.frame(now_ms) {
                match event {
                    GameEvent::SessionEnded(report) | GameEvent::Victory(report) => {
                        log::info!(
                            "Final score {:.0}, {:.0} m, wave {}",
                            report.score,
                            report.distance,
                            report.wave
                        );
                    }
                    GameEvent::Takeoff { vy, charge, .. } => {
                        log::debug!("Takeoff vy={:.0} charge={:.2}", vy, charge);
                    }
                    _ => {}
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.ctx.hud();

            let fields = [
                ("speed", format!("{:.0}", hud.speed)),
                ("distance", format!("{:.0} m", hud.distance)),
                ("height", format!("{:.0} m", hud.height)),
                ("score", format!("{:.0} x{:.2}", hud.score, hud.multiplier)),
                ("health", format!("{:.0} / {:.0}", hud.health, hud.shield)),
                ("wave", hud.wave.to_string()),
            ];
            for (id, text) in fields {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&text));
                }
            }

            // Overlays
            let overlays = [
                ("menu", hud.mode == SessionMode::Menu),
                ("pause-menu", hud.mode == SessionMode::Paused),
                ("game-over", hud.mode == SessionMode::Ended),
                ("victory", hud.mode == SessionMode::Victory),
            ];
            for (id, visible) in overlays {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Swell Rush starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };

        let search = window.location().search().unwrap_or_default();
        let tuning = Tuning::default();
        if search.contains("mode=shooter") {
            let seed = js_sys::Date::now() as u64;
            log::info!("Shooter mode, seed {}", seed);
            start(Game::new(ShooterGame::new(tuning, seed)));
        } else {
            log::info!("Surf mode");
            start(Game::new(SurfGame::new(tuning)));
        }
    }

    fn start<S: Simulation + 'static>(game: Game<S>) {
        let game = Rc::new(RefCell::new(game));

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        // Pointer input goes to the canvas when there is one
        let pointer_target: Option<EventTarget> = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .map(EventTarget::from)
            .or_else(|| web_sys::window().map(EventTarget::from));

        if let Some(target) = pointer_target {
            setup_pointer_handlers(&target, game.clone());
        }
        setup_release_handlers(game.clone());
        setup_keyboard_handlers(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);
        log::info!("Swell Rush running!");
    }

    fn push<S: Simulation>(game: &Rc<RefCell<Game<S>>>, event: InputEvent) {
        game.borrow_mut().ctx.push_input(event);
    }

    fn listen<E, F>(target: &EventTarget, name: &str, handler: F)
    where
        E: wasm_bindgen::convert::FromWasmAbi + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_pointer_handlers<S: Simulation + 'static>(
        target: &EventTarget,
        game: Rc<RefCell<Game<S>>>,
    ) {
        // Mouse
        {
            let game = game.clone();
            listen(target, "mousedown", move |_event: MouseEvent| {
                push(&game, InputEvent::PrimaryDown);
            });
        }
        // Leaving the canvas ends the hold; the mouseup would land elsewhere
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            listen(target, name, move |_event: MouseEvent| {
                push(&game, InputEvent::PrimaryUp);
            });
        }

        // Touch
        {
            let game = game.clone();
            listen(target, "touchstart", move |event: TouchEvent| {
                event.prevent_default();
                push(&game, InputEvent::PrimaryDown);
            });
        }
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            listen(target, name, move |event: TouchEvent| {
                event.prevent_default();
                push(&game, InputEvent::PrimaryUp);
            });
        }
    }

    /// Releases that happen outside the canvas still end the hold
    fn setup_release_handlers<S: Simulation + 'static>(game: Rc<RefCell<Game<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let target = EventTarget::from(window);

        {
            let game = game.clone();
            listen(&target, "mouseup", move |_event: MouseEvent| {
                push(&game, InputEvent::PrimaryUp);
            });
        }
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            listen(&target, name, move |_event: TouchEvent| {
                push(&game, InputEvent::PrimaryUp);
            });
        }
    }

    fn setup_keyboard_handlers<S: Simulation + 'static>(game: Rc<RefCell<Game<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let target = EventTarget::from(window);

        {
            let game = game.clone();
            listen(&target, "keydown", move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let input = match event.key().as_str() {
                    " " | "ArrowUp" => InputEvent::PrimaryDown,
                    "ArrowLeft" | "a" | "A" => InputEvent::SteerLeft(true),
                    "ArrowRight" | "d" | "D" => InputEvent::SteerRight(true),
                    "Escape" | "p" | "P" => InputEvent::Pause,
                    "r" | "R" => InputEvent::Reset,
                    _ => return,
                };
                event.prevent_default();
                push(&game, input);
            });
        }
        listen(&target, "keyup", move |event: KeyboardEvent| {
            let input = match event.key().as_str() {
                " " | "ArrowUp" => InputEvent::PrimaryUp,
                "ArrowLeft" | "a" | "A" => InputEvent::SteerLeft(false),
                "ArrowRight" | "d" | "D" => InputEvent::SteerRight(false),
                _ => return,
            };
            push(&game, input);
        });
    }

    fn request_animation_frame<S: Simulation + 'static>(game: Rc<RefCell<Game<S>>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop<S: Simulation + 'static>(game: Rc<RefCell<Game<S>>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.update_hud();
        }
        request_animation_frame(game);
    }

    /// Release held controls (and pause, per tuning) when the page loses focus
    fn setup_auto_pause<S: Simulation + 'static>(game: Rc<RefCell<Game<S>>>) {
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
            listen(&document, "visibilitychange", move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    push(&game, InputEvent::FocusLost);
                    log::info!("Focus lost (tab hidden)");
                }
            });
        }

        // Window blur (click outside)
        listen(&window, "blur", move |_event: web_sys::FocusEvent| {
            push(&game, InputEvent::FocusLost);
            log::info!("Focus lost (window blur)");
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use swell_rush::sim::{
        EndReport, GameEvent, InputEvent, ShooterGame, Simulation, SimulationContext, SurfGame,
    };
    use swell_rush::{Tuning, TuningError};

    /// Simulated display rate of the scripted run
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Longest scripted run (seconds)
    const RUN_LIMIT: f32 = 180.0;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Variant {
        Surf,
        Shooter,
    }

    impl std::str::FromStr for Variant {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_lowercase().as_str() {
                "surf" => Ok(Variant::Surf),
                "shooter" => Ok(Variant::Shooter),
                other => Err(format!("unknown mode '{other}', expected surf or shooter")),
            }
        }
    }

    pub fn load_tuning(path: Option<&str>) -> Result<Tuning, TuningError> {
        match path {
            Some(path) => Tuning::load(path),
            None => Ok(Tuning::default()),
        }
    }

    pub fn run(variant: Variant, tuning: Tuning) -> EndReport {
        match variant {
            Variant::Surf => script(SimulationContext::new(SurfGame::new(tuning)), variant),
            Variant::Shooter => {
                script(SimulationContext::new(ShooterGame::new(tuning, 0x5EED)), variant)
            }
        }
    }

    /// Drive a session with a fixed input pattern until it ends or times out
    fn script<S: Simulation>(mut ctx: SimulationContext<S>, variant: Variant) -> EndReport {
        // Leave the menu
        ctx.push_input(InputEvent::PrimaryDown);
        ctx.push_input(InputEvent::PrimaryUp);

        let frames = (RUN_LIMIT / FRAME_DT) as u32;
        let mut takeoffs = 0u32;
        for frame in 1..=frames {
            match variant {
                // Hold through troughs for 0.6 s, release for 0.4 s
                Variant::Surf => match frame % 60 {
                    1 => ctx.push_input(InputEvent::PrimaryDown),
                    37 => ctx.push_input(InputEvent::PrimaryUp),
                    _ => {}
                },
                // Keep firing and weave across the lane
                Variant::Shooter => match frame % 240 {
                    1 => {
                        ctx.push_input(InputEvent::PrimaryDown);
                        ctx.push_input(InputEvent::SteerRight(false));
                        ctx.push_input(InputEvent::SteerLeft(true));
                    }
                    121 => {
                        ctx.push_input(InputEvent::SteerLeft(false));
                        ctx.push_input(InputEvent::SteerRight(true));
                    }
                    _ => {}
                },
            }

            for event in ctx.advance(FRAME_DT) {
                match event {
                    GameEvent::Takeoff { .. } => takeoffs += 1,
                    GameEvent::WaveAdvanced(wave) => log::info!("Wave {wave}"),
                    _ => {}
                }
            }
            if ctx.game().session().mode.is_terminal() {
                break;
            }
        }

        if variant == Variant::Surf {
            log::info!("{takeoffs} takeoffs");
        }
        ctx.game().session().report()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Swell Rush (native) starting...");
    log::info!("Running a headless scripted session - run with `trunk serve` for web version");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let variant = match args.first().map(|s| s.parse::<headless::Variant>()) {
        Some(Ok(variant)) => variant,
        Some(Err(e)) => {
            log::error!("{e}");
            std::process::exit(2);
        }
        None => headless::Variant::Surf,
    };

    let tuning = match headless::load_tuning(args.get(1).map(String::as_str)) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::error!("Failed to load tuning: {e}");
            std::process::exit(1);
        }
    };

    let report = headless::run(variant, tuning);
    println!(
        "{:?}: score {:.0}, distance {:.0} m, wave {}, {:.1} s",
        variant, report.score, report.distance, report.wave, report.elapsed
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
