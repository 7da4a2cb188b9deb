pub mod camera;
pub mod idle;
pub mod net;
pub mod protocol;
pub mod render;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, MouseEvent, Window};

use camera::Camera;
use idle::{IdleActor, MenuRng};
use net::{CloseOutcome, Connection, EventQueue, NetEvent};
use protocol::{PlayerView, Snapshot};
use render::{Mode, Renderer};

// --- IMPORTS & LOGGING ---
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub(crate) fn log(s: &str);
    #[wasm_bindgen(js_namespace = Math)]
    fn random() -> f64;
}

const IDLE_ACTOR_COUNT: usize = 6;
const STATS_POLL_MS: i32 = 5000;

// --- SESSION ORCHESTRATOR ---

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Idle,
    Playing,
    Over,
}

struct Game {
    renderer: Renderer,
    canvas: HtmlCanvasElement,
    document: Document,
    camera: Camera,
    snapshot: Snapshot,
    my_id: Option<String>,
    my_score: f64,
    phase: Phase,
    // Checked before every reschedule; flipping it off cancels the loop.
    running: bool,
    pointer: (f64, f64),
    actors: Vec<IdleActor>,
    rng: MenuRng,
    conn: Option<Connection>,
    events: EventQueue,
    stats_tick: Option<(i32, Closure<dyn FnMut()>)>,
}

type Shared = Rc<RefCell<Game>>;

impl Game {
    fn new(document: Document, canvas: HtmlCanvasElement, renderer: Renderer) -> Game {
        let mut game = Game {
            renderer,
            canvas,
            document,
            camera: Camera::new(),
            snapshot: Snapshot::default(),
            my_id: None,
            my_score: 0.0,
            phase: Phase::Idle,
            running: true,
            pointer: (0.0, 0.0),
            actors: Vec::new(),
            rng: MenuRng::new((random() * u32::MAX as f64) as u32),
            conn: None,
            events: Rc::new(RefCell::new(VecDeque::new())),
            stats_tick: None,
        };
        game.spawn_actors();
        game
    }

    fn viewport(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn spawn_actors(&mut self) {
        let bounds = self.viewport();
        self.actors.clear();
        for _ in 0..IDLE_ACTOR_COUNT {
            let actor = IdleActor::spawn(&mut self.rng, bounds);
            self.actors.push(actor);
        }
    }

    // One animation tick. Network results queued since the previous tick are
    // applied first, so a frame never renders a half-applied snapshot.
    fn tick(&mut self) {
        self.drain_events();
        match self.phase {
            Phase::Idle => self.tick_idle(),
            Phase::Playing => self.tick_playing(),
            Phase::Over => {}
        }
    }

    fn drain_events(&mut self) {
        loop {
            let event = self.events.borrow_mut().pop_front();
            let Some(event) = event else { break };
            match event {
                NetEvent::Ready => self.enter_playing(),
                NetEvent::Init { player_id } => self.my_id = Some(player_id),
                NetEvent::World(snapshot) => {
                    let me = self
                        .my_id
                        .as_deref()
                        .and_then(|id| snapshot.players.iter().find(|p| p.id == id));
                    if let Some(me) = me {
                        self.my_score = me.score;
                    }
                    self.snapshot = snapshot;
                }
                NetEvent::Closed { code } => self.handle_close(code),
            }
        }
    }

    fn tick_idle(&mut self) {
        let bounds = self.viewport();
        for actor in &mut self.actors {
            actor.tick(&mut self.rng, bounds);
        }
        let players: Vec<PlayerView> = self.actors.iter().map(IdleActor::view).collect();
        let backdrop = Snapshot {
            timestamp: 0,
            all_players_count: players.len(),
            players,
            leaderboard: Vec::new(),
        };
        self.renderer.draw(&backdrop, &Camera::new(), None, Mode::Idle);
    }

    fn tick_playing(&mut self) {
        let me = self
            .my_id
            .as_deref()
            .and_then(|id| self.snapshot.players.iter().find(|p| p.id == id))
            .map(|p| (p.x, p.y));
        let viewport = self.viewport();
        self.camera.update(me, viewport);
        self.renderer
            .draw(&self.snapshot, &self.camera, self.my_id.as_deref(), Mode::Play);
    }

    fn enter_playing(&mut self) {
        log("Session open");
        self.phase = Phase::Playing;
        self.actors.clear();
        self.stop_stats();
        set_display(&self.document, "login-screen", "none");
    }

    fn handle_close(&mut self, code: u16) {
        log(&format!("Session closed: {}", code));
        self.conn = None;
        match net::close_outcome(code) {
            CloseOutcome::GameOver => {
                self.phase = Phase::Over;
                self.running = false;
                self.renderer.set_hud_visible(false);
                set_text(
                    &self.document,
                    "final-score",
                    &(self.my_score.round() as i64).to_string(),
                );
                set_display(&self.document, "game-over-screen", "flex");
            }
            CloseOutcome::Reset => {
                // Anything other than the death code is an abnormal drop;
                // start the whole client over.
                self.phase = Phase::Over;
                self.running = false;
                if let Some(window) = web_sys::window() {
                    let _ = window.location().reload();
                }
            }
        }
    }

    fn reset_to_idle(&mut self) {
        self.phase = Phase::Idle;
        self.snapshot = Snapshot::default();
        self.my_id = None;
        self.my_score = 0.0;
        self.conn = None;
        self.camera = Camera::new();
        self.spawn_actors();
        self.running = true;
        self.renderer.set_hud_visible(false);
        set_display(&self.document, "game-over-screen", "none");
        set_display(&self.document, "login-screen", "flex");
        self.start_stats();
    }

    fn start_stats(&mut self) {
        self.stop_stats();
        refresh_stats(&self.document);
        let document = self.document.clone();
        let poll = Closure::wrap(Box::new(move || refresh_stats(&document)) as Box<dyn FnMut()>);
        if let Some(window) = web_sys::window() {
            if let Ok(id) = window.set_interval_with_callback_and_timeout_and_arguments_0(
                poll.as_ref().unchecked_ref(),
                STATS_POLL_MS,
            ) {
                self.stats_tick = Some((id, poll));
            }
        }
    }

    fn stop_stats(&mut self) {
        if let Some((id, _poll)) = self.stats_tick.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }
}

fn refresh_stats(document: &Document) {
    let document = document.clone();
    net::fetch_stats(move |stats| {
        set_text(&document, "stats-players", &stats.players.to_string());
        set_text(&document, "stats-rooms", &stats.rooms.to_string());
    });
}

// --- SESSION CONTROL ---

fn start_session(game: &Shared) {
    if game.borrow().phase != Phase::Idle || game.borrow().conn.is_some() {
        return;
    }
    let document = game.borrow().document.clone();
    let name = document
        .get_element_by_id("nickname-input")
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value().trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message("Please enter a nickname");
        }
        return;
    }

    let events = game.borrow().events.clone();
    let target = {
        let game = game.clone();
        move || {
            let g = game.borrow();
            (g.pointer.0 + g.camera.x, g.pointer.1 + g.camera.y)
        }
    };
    match Connection::open(&name, events, target) {
        Ok(conn) => game.borrow_mut().conn = Some(conn),
        Err(err) => log(&format!("Connect failed: {:?}", err)),
    }
}

fn restart_session(game: &Shared) {
    {
        let mut g = game.borrow_mut();
        if g.phase != Phase::Over {
            return;
        }
        g.reset_to_idle();
    }
    start_render_loop(game);
}

// --- RENDER LOOP ---

// Explicit, cancellable repaint pump: the shared `running` flag is checked
// before every reschedule, so teardown stops the loop instead of relying on
// a guard buried in the callback.
fn start_render_loop(game: &Shared) {
    let f = Rc::new(RefCell::new(None));
    let g = f.clone();
    let game = game.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !game.borrow().running {
            return;
        }
        game.borrow_mut().tick();
        if game.borrow().running {
            request_animation_frame(f.borrow().as_ref().unwrap());
        }
    }) as Box<dyn FnMut()>));

    request_animation_frame(g.borrow().as_ref().unwrap());
}

// --- PAGE WIRING ---

#[wasm_bindgen]
pub fn run_game() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id("game-canvas")
        .ok_or_else(|| JsValue::from_str("missing #game-canvas"))?
        .dyn_into::<HtmlCanvasElement>()?;

    fit_canvas(&window, &canvas);

    let renderer = Renderer::new(&document, canvas.clone())?;
    let game: Shared = Rc::new(RefCell::new(Game::new(
        document.clone(),
        canvas.clone(),
        renderer,
    )));

    {
        let window2 = window.clone();
        let canvas = canvas.clone();
        let closure = Closure::wrap(Box::new(move || {
            fit_canvas(&window2, &canvas);
        }) as Box<dyn FnMut()>);
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    {
        let game = game.clone();
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            game.borrow_mut().pointer = (event.client_x() as f64, event.client_y() as f64);
        }) as Box<dyn FnMut(MouseEvent)>);
        window.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    {
        let game = game.clone();
        let closure = Closure::wrap(Box::new(move |_: MouseEvent| {
            start_session(&game);
        }) as Box<dyn FnMut(MouseEvent)>);
        document
            .get_element_by_id("play-button")
            .ok_or_else(|| JsValue::from_str("missing #play-button"))?
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    {
        let game = game.clone();
        let closure = Closure::wrap(Box::new(move |_: MouseEvent| {
            restart_session(&game);
        }) as Box<dyn FnMut(MouseEvent)>);
        document
            .get_element_by_id("restart-button")
            .ok_or_else(|| JsValue::from_str("missing #restart-button"))?
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    game.borrow().renderer.set_hud_visible(false);
    game.borrow_mut().start_stats();
    start_render_loop(&game);
    Ok(())
}

fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) {
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(600.0);
    canvas.set_width(w as u32);
    canvas.set_height(h as u32);
}

fn set_display(document: &Document, id: &str, value: &str) {
    let element = document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(element) = element {
        let _ = element.style().set_property("display", value);
    }
}

fn set_text(document: &Document, id: &str, text: &str) {
    if let Some(element) = document.get_element_by_id(id) {
        element.set_text_content(Some(text));
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    web_sys::window()
        .expect("no global `window` exists")
        .request_animation_frame(f.as_ref().unchecked_ref())
        .expect("should register `requestAnimationFrame` OK");
}
