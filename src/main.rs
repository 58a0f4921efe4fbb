//! Disk Survivor entry point
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
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MouseEvent, TouchEvent};

    use disk_survivor::audio::AudioManager;
    use disk_survivor::leaderboard::{LeaderboardClient, ScoreSubmission, share_text};
    use disk_survivor::platform::{FrameClock, InputSampler};
    use disk_survivor::render::FrameSnapshot;
    use disk_survivor::sim::{GameEvent, GamePhase, GameState, RunMode, apply_choice, tick};
    use disk_survivor::{Settings, Tuning};

    // Renderer lives on the JS side; it receives one snapshot per frame
    #[wasm_bindgen(inline_js = "
        export function present_frame(json) {
            if (window.diskSurvivorRender) {
                window.diskSurvivorRender(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn present_frame(json: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        clock: FrameClock,
        input: InputSampler,
        audio: AudioManager,
        leaderboard: LeaderboardClient,
        mode: RunMode,
        /// Screen position the player is drawn at (canvas center)
        canvas_center: Vec2,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, mode: RunMode) -> Self {
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            audio.set_sfx_volume(settings.sfx_volume);
            audio.set_muted(settings.muted);
            let state =
                GameState::with_config(seed, Tuning::default(), settings.run_options(), mode.clone());
            Self {
                state,
                settings,
                clock: FrameClock::new(),
                input: InputSampler::new(),
                audio,
                leaderboard: LeaderboardClient::new(),
                mode,
                canvas_center: Vec2::ZERO,
                last_phase: GamePhase::Playing,
            }
        }

        fn restart(&mut self, seed: u64) {
            self.state = GameState::with_config(
                seed,
                Tuning::default(),
                self.settings.run_options(),
                self.mode.clone(),
            );
            self.clock.reset();
            self.input.release_all();
            self.last_phase = GamePhase::Playing;
            log::info!("Run restarted ({}) with seed {}", self.mode.label(), seed);
        }

        fn now_secs() -> f64 {
            js_sys::Date::now() / 1000.0
        }

        /// One animation frame: sample input, step, voice cues, hand off
        fn frame(&mut self, time_ms: f64) {
            let dt = self.clock.advance(time_ms);
            poll_gamepad(&mut self.input);
            let input = self.input.sample(Self::now_secs());
            tick(&mut self.state, &input, dt);

            for event in self.state.drain_events() {
                if let GameEvent::Cue(cue) = event {
                    self.audio.play(cue);
                }
            }

            match serde_json::to_string(&FrameSnapshot::capture(&self.state)) {
                Ok(json) => present_frame(&json),
                Err(e) => log::warn!("Snapshot encode failed: {}", e),
            }

            if self.state.phase != self.last_phase {
                if self.state.phase == GamePhase::GameOver {
                    self.leaderboard.refresh();
                }
                self.last_phase = self.state.phase;
            }
        }

        fn submit_score(&mut self, name: &str) {
            let sub = match ScoreSubmission::new(
                name,
                self.state.time,
                self.state.score(),
                &self.mode,
            ) {
                Ok(sub) => sub,
                Err(e) => {
                    log::warn!("Score not submitted: {}", e);
                    return;
                }
            };
            self.settings.player_name = sub.name.clone();
            self.settings.save();
            self.leaderboard.submit(sub);
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            let state = &self.state;
            set("#hud-time .hud-value", &format!("{}s", state.time as u32));
            set("#hud-wave .hud-value", &(state.wave() + 1).to_string());
            set("#hud-score .hud-value", &state.score().to_string());
            set(
                "#hud-hp .hud-value",
                &format!("{}/{}", state.player.hp, state.player.max_hp),
            );
            set(
                "#hud-level .hud-value",
                &format!(
                    "Lv {} ({}/{})",
                    state.progression.level,
                    state.progression.xp as u32,
                    state.progression.xp_to_level
                ),
            );

            show("pause-menu", state.phase == GamePhase::Paused);
            show("level-up", state.phase == GamePhase::LevelUp);
            if state.phase == GamePhase::LevelUp {
                for (i, choice) in state.progression.offer.iter().enumerate() {
                    set(&format!("#choice-{} .title", i), &choice.title());
                }
            }

            show("game-over", state.phase == GamePhase::GameOver);
            if state.phase == GamePhase::GameOver {
                set(
                    "#share-text",
                    &share_text(&self.mode, state.wave() + 1, state.time),
                );
                if let Some(btn) = document.get_element_by_id("submit-btn") {
                    let busy = self.leaderboard.is_submitting() || self.leaderboard.was_submitted();
                    let _ = if busy {
                        btn.set_attribute("disabled", "")
                    } else {
                        btn.remove_attribute("disabled")
                    };
                }
                if let Some(el) = document.get_element_by_id("leaderboard") {
                    let rows = self
                        .leaderboard
                        .board()
                        .map(|board| {
                            board
                                .top()
                                .iter()
                                .enumerate()
                                .map(|(i, e)| {
                                    format!("{}. {} - {}s ({})", i + 1, e.name, e.time_survived, e.score)
                                })
                                .collect::<Vec<_>>()
                                .join("\n")
                        })
                        .unwrap_or_default();
                    el.set_text_content(Some(&rows));
                }
            }
        }
    }

    fn poll_gamepad(input: &mut InputSampler) {
        let Some(pads) = web_sys::window().and_then(|w| w.navigator().get_gamepads().ok()) else {
            return;
        };
        let Some(pad) = pads
            .iter()
            .find_map(|p| p.dyn_into::<web_sys::Gamepad>().ok())
        else {
            return;
        };
        let axes = pad.axes();
        let axis = |i: u32| axes.get(i).as_f64().unwrap_or(0.0) as f32;
        // gamepad y grows downward
        input.set_sticks(
            Vec2::new(axis(0), -axis(1)),
            Vec2::new(axis(2), -axis(3)),
        );
    }

    /// `?daily` plays today's shared plan, `?daily=YYYY-MM-DD` a given day
    fn mode_from_location() -> RunMode {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        for pair in search.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key == "daily" {
                let id = if value.is_empty() {
                    let d = js_sys::Date::new_0();
                    format!(
                        "{:04}-{:02}-{:02}",
                        d.get_utc_full_year(),
                        d.get_utc_month() + 1,
                        d.get_utc_date()
                    )
                } else {
                    value.to_string()
                };
                return RunMode::Daily { id };
            }
        }
        RunMode::Normal
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Disk Survivor starting...");

        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element, nothing to run");
            return;
        };

        let settings = Settings::load();
        let mode = mode_from_location();
        let seed = match &mode {
            RunMode::Daily { id } => disk_survivor::sim::waves::fnv1a(id) as u64,
            _ => js_sys::Date::now() as u64,
        };
        let game = Rc::new(RefCell::new(Game::new(seed, settings, mode)));
        {
            let mut g = game.borrow_mut();
            g.canvas_center = Vec2::new(
                canvas.client_width() as f32 / 2.0,
                canvas.client_height() as f32 / 2.0,
            );
            let aspect = canvas.client_width() as f32 / (canvas.client_height().max(1) as f32);
            let view = g.state.tuning.camera.view_size;
            g.state.camera.set_aspect(view, aspect);
        }
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);
        log::info!("Disk Survivor running!");
    }

    fn touch_offset(canvas: &HtmlCanvasElement, touch: &web_sys::Touch) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        )
    }

    /// Left half of the screen is a move pad, right half an aim pad
    fn apply_touches(g: &mut Game, canvas: &HtmlCanvasElement, event: &TouchEvent) {
        let touches = event.touches();
        let mut moving = None;
        let mut aiming = None;
        for i in 0..touches.length() {
            let Some(touch) = touches.get(i) else { continue };
            let pos = touch_offset(canvas, &touch);
            let rel = (pos - g.canvas_center) / g.canvas_center.max(Vec2::ONE);
            let v = Vec2::new(rel.x, -rel.y) * 2.0;
            if pos.x < g.canvas_center.x {
                moving = Some(v);
            } else {
                aiming = Some(v);
            }
        }
        g.input.set_touch_move(moving);
        g.input.set_touch_aim(aiming);
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.state.phase == GamePhase::LevelUp {
                    if let Some(index) = key.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                        apply_choice(&mut g.state, index);
                        return;
                    }
                }
                if g.input.key_down(&key) {
                    event.prevent_default();
                }
                g.audio.resume();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse aim relative to the player at the canvas center
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let offset = Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
                    - g.canvas_center;
                g.input.mouse_moved(offset, Game::now_secs());
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for (name, held) in [("mousedown", true), ("mouseup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.input.set_fire(held);
                g.audio.resume();
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch pads
        for name in ["touchstart", "touchmove", "touchend", "touchcancel"] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                apply_touches(&mut g, &canvas_clone, &event);
                g.audio.resume();
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keep the aim origin at the canvas center
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                g.canvas_center = Vec2::new(
                    canvas_clone.client_width() as f32 / 2.0,
                    canvas_clone.client_height() as f32 / 2.0,
                );
                let aspect = canvas_clone.client_width() as f32
                    / (canvas_clone.client_height().max(1) as f32);
                let view = g.state.tuning.camera.view_size;
                g.state.camera.set_aspect(view, aspect);
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn on_click(id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("restart-btn", move |_| {
                game.borrow_mut().restart(js_sys::Date::now() as u64);
            });
        }
        {
            let game = game.clone();
            on_click("resume-btn", move |_| {
                // toggles back to playing
                game.borrow_mut().input.request_pause();
            });
        }
        for i in 0..3 {
            let game = game.clone();
            on_click(&format!("choice-{}", i), move |_| {
                apply_choice(&mut game.borrow_mut().state, i);
            });
        }
        {
            let game = game.clone();
            on_click("submit-btn", move |_| {
                let name = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("player-name"))
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value())
                    .unwrap_or_default();
                game.borrow_mut().submit_score(&name);
            });
        }
        on_click("share-btn", move |_| {
            let g = game.borrow();
            let text = share_text(&g.mode, g.state.wave() + 1, g.state.time);
            if let Some(window) = web_sys::window() {
                let _ = window.navigator().clipboard().write_text(&text);
            }
        });
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Playing {
                        g.input.request_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                    g.clock.reset();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.input.release_all();
                if g.state.phase == GamePhase::Playing {
                    g.input.request_pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run: a bot circles the arena until it dies or time runs out
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use disk_survivor::consts::MAX_FRAME_DT;
    use disk_survivor::sim::{GamePhase, GameState, RunMode, TickInput, apply_choice, tick};
    use disk_survivor::{Settings, Tuning};
    use glam::Vec2;

    env_logger::init();
    log::info!("Disk Survivor (native) starting...");
    log::info!("The browser build renders the game; native runs a headless bot");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let mode = match args.next() {
        Some(id) => RunMode::Daily { id },
        None => RunMode::Normal,
    };
    let minutes: f32 = 5.0;

    let settings = Settings::load();
    let mut state = GameState::with_config(seed, Tuning::default(), settings.run_options(), mode);
    let mut frame = 0u64;
    while state.phase != GamePhase::GameOver && state.time < minutes * 60.0 {
        let angle = frame as f32 * 0.004;
        let input = TickInput {
            move_vec: Vec2::new(angle.cos(), angle.sin()),
            ..Default::default()
        };
        tick(&mut state, &input, MAX_FRAME_DT);
        if state.phase == GamePhase::LevelUp {
            apply_choice(&mut state, 0);
        }
        state.drain_events();
        frame += 1;
    }

    log::info!(
        "Bot finished: {:.1}s, wave {}, score {}, level {}, weapons {:?}",
        state.time,
        state.wave() + 1,
        state.score(),
        state.progression.level,
        state.arsenal.owned()
    );
}
