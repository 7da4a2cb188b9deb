use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use crate::log;
use crate::protocol::{self, Inbound, InputPacket, ServerStats, Snapshot};

pub const INPUT_SEND_MS: i32 = 50;
pub const CLOSE_GAME_OVER: u16 = 4000;

// Transport events, drained by the orchestrator at the top of each animation
// tick. Pushing here instead of mutating game state from the socket
// callbacks keeps snapshot replacement atomic per tick.
pub enum NetEvent {
    Ready,
    Init { player_id: String },
    World(Snapshot),
    Closed { code: u16 },
}

pub type EventQueue = Rc<RefCell<VecDeque<NetEvent>>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CloseOutcome {
    GameOver,
    Reset,
}

// 4000 is the server's "you died" close; everything else is an abnormal
// drop and resets the whole client.
pub fn close_outcome(code: u16) -> CloseOutcome {
    if code == CLOSE_GAME_OVER {
        CloseOutcome::GameOver
    } else {
        CloseOutcome::Reset
    }
}

pub struct Connection {
    ws: WebSocket,
    input_timer: i32,
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(ErrorEvent)>,
    _send_tick: Closure<dyn FnMut()>,
}

impl Connection {
    // Opens one session carrying the display name as a query parameter and
    // starts the fixed-cadence input loop. `target` yields the current
    // world-space pointer target (pointer + camera offset).
    pub fn open(
        display_name: &str,
        events: EventQueue,
        target: impl Fn() -> (f64, f64) + 'static,
    ) -> Result<Connection, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let location = window.location();
        let scheme = if location.protocol()? == "https:" {
            "wss:"
        } else {
            "ws:"
        };
        let url = format!(
            "{}//{}/game?name={}",
            scheme,
            location.host()?,
            String::from(js_sys::encode_uri_component(display_name))
        );

        let ws = WebSocket::new(&url)?;

        let on_open = {
            let events = events.clone();
            Closure::wrap(Box::new(move || {
                events.borrow_mut().push_back(NetEvent::Ready);
            }) as Box<dyn FnMut()>)
        };
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = {
            let events = events.clone();
            Closure::wrap(Box::new(move |e: MessageEvent| {
                let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() else {
                    return;
                };
                let txt: String = txt.into();
                match protocol::decode(&txt) {
                    Ok(Inbound::Init { player_id }) => {
                        log(&format!("Assigned player id: {}", player_id));
                        events.borrow_mut().push_back(NetEvent::Init { player_id });
                    }
                    Ok(Inbound::World(snapshot)) => {
                        events.borrow_mut().push_back(NetEvent::World(snapshot));
                    }
                    Err(err) => log(&format!("Dropping malformed frame: {}", err)),
                }
            }) as Box<dyn FnMut(MessageEvent)>)
        };
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = {
            let events = events.clone();
            Closure::wrap(Box::new(move |e: CloseEvent| {
                events
                    .borrow_mut()
                    .push_back(NetEvent::Closed { code: e.code() });
            }) as Box<dyn FnMut(CloseEvent)>)
        };
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let on_error = Closure::wrap(Box::new(move |e: ErrorEvent| {
            log(&format!("Socket error: {}", e.message()));
        }) as Box<dyn FnMut(ErrorEvent)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        let send_tick = {
            let ws = ws.clone();
            Closure::wrap(Box::new(move || {
                if ws.ready_state() != WebSocket::OPEN {
                    return;
                }
                let (x, y) = target();
                if let Ok(json) = serde_json::to_string(&InputPacket { x, y }) {
                    let _ = ws.send_with_str(&json);
                }
            }) as Box<dyn FnMut()>)
        };
        let input_timer = window.set_interval_with_callback_and_timeout_and_arguments_0(
            send_tick.as_ref().unchecked_ref(),
            INPUT_SEND_MS,
        )?;

        Ok(Connection {
            ws,
            input_timer,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
            _send_tick: send_tick,
        })
    }
}

impl Drop for Connection {
    // Detach everything before the closures go away, then stop the input
    // loop and close the socket. The orchestrator only drops a Connection
    // from its own tick, never from inside one of these callbacks.
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.input_timer);
        }
        let _ = self.ws.close();
    }
}

// Lobby statistics, polled while idle. Any failure along the way is
// swallowed; the lobby simply keeps showing stale numbers.
pub fn fetch_stats(apply: impl Fn(ServerStats) + 'static) {
    wasm_bindgen_futures::spawn_local(async move {
        let Some(window) = web_sys::window() else { return };
        let Ok(resp) = JsFuture::from(window.fetch_with_str("/api/stats")).await else {
            return;
        };
        let Ok(resp) = resp.dyn_into::<web_sys::Response>() else {
            return;
        };
        let Ok(text_promise) = resp.text() else { return };
        let Ok(text) = JsFuture::from(text_promise).await else {
            return;
        };
        let Some(text) = text.as_string() else { return };
        if let Ok(stats) = serde_json::from_str::<ServerStats>(&text) {
            apply(stats);
        }
    });
}
