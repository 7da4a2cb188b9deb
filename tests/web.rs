#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlCanvasElement};

use terrio::camera::Camera;
use terrio::protocol::{LeaderboardEntry, PlayerView, Snapshot};
use terrio::render::{Mode, Renderer};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn ensure_element(document: &Document, tag: &str, id: &str) -> Element {
    if let Some(el) = document.get_element_by_id(id) {
        return el;
    }
    let el = document.create_element(tag).unwrap();
    el.set_id(id);
    document.body().unwrap().append_child(&el).unwrap();
    el
}

fn page() -> (Document, HtmlCanvasElement) {
    let document = document();
    let canvas: HtmlCanvasElement = ensure_element(&document, "canvas", "game-canvas")
        .dyn_into()
        .unwrap();
    canvas.set_width(800);
    canvas.set_height(600);
    for id in [
        "hud",
        "player-count",
        "current-score",
        "leaderboard",
        "leaderboard-list",
    ] {
        ensure_element(&document, "div", id);
    }
    (document, canvas)
}

fn player(id: &str, name: &str) -> PlayerView {
    PlayerView {
        id: id.to_string(),
        name: name.to_string(),
        color: "red".to_string(),
        x: 100.0,
        y: 100.0,
        angle: 0.0,
        is_alive: true,
        score: 42.0,
        trail: vec![[90.0, 90.0], [95.0, 95.0]],
        territory: Vec::new(),
    }
}

#[wasm_bindgen_test]
fn empty_snapshot_draws_without_throwing() {
    let (document, canvas) = page();
    let renderer = Renderer::new(&document, canvas).unwrap();
    renderer.draw(&Snapshot::default(), &Camera::new(), None, Mode::Play);
}

#[wasm_bindgen_test]
fn degenerate_geometry_is_skipped_and_later_players_still_draw() {
    let (document, canvas) = page();
    let renderer = Renderer::new(&document, canvas).unwrap();

    let mut degenerate = player("d1", "Deg");
    degenerate.territory = vec![vec![[0.0, 0.0], [10.0, 0.0]]];
    degenerate.trail = vec![[5.0, 5.0]];

    let mut ok = player("p2", "Ok");
    ok.territory = vec![vec![[0.0, 0.0], [50.0, 0.0], [50.0, 50.0]]];

    let snapshot = Snapshot {
        timestamp: 0,
        all_players_count: 2,
        players: vec![degenerate, ok],
        leaderboard: Vec::new(),
    };
    renderer.draw(&snapshot, &Camera::new(), Some("p2"), Mode::Play);
}

#[wasm_bindgen_test]
fn hud_reflects_score_count_and_leaderboard_rank() {
    let (document, canvas) = page();
    let renderer = Renderer::new(&document, canvas).unwrap();

    let snapshot = Snapshot {
        timestamp: 0,
        all_players_count: 1,
        players: vec![player("p1", "A")],
        leaderboard: vec![LeaderboardEntry {
            name: "A".to_string(),
            color: "red".to_string(),
            score: 42.0,
        }],
    };
    renderer.draw(&snapshot, &Camera::new(), Some("p1"), Mode::Play);

    let score = document
        .get_element_by_id("current-score")
        .unwrap()
        .text_content()
        .unwrap();
    assert_eq!(score, "Score: 42");

    let count = document
        .get_element_by_id("player-count")
        .unwrap()
        .text_content()
        .unwrap();
    assert_eq!(count, "Players: 1");

    let list = document
        .get_element_by_id("leaderboard-list")
        .unwrap()
        .inner_html();
    assert!(list.contains("1. "), "entry must carry its 1-based rank");
    assert!(list.contains("A"));
    assert!(list.contains("color: red"));
    assert_eq!(list.matches("leaderboard-entry").count(), 1);
}

#[wasm_bindgen_test]
fn idle_mode_leaves_hud_untouched() {
    let (document, canvas) = page();
    let renderer = Renderer::new(&document, canvas).unwrap();
    renderer.set_hud_visible(false);

    let score_el = document.get_element_by_id("current-score").unwrap();
    score_el.set_text_content(Some("sentinel"));

    let snapshot = Snapshot {
        timestamp: 0,
        all_players_count: 1,
        players: vec![player("p1", "")],
        leaderboard: Vec::new(),
    };
    renderer.draw(&snapshot, &Camera::new(), Some("p1"), Mode::Idle);

    assert_eq!(score_el.text_content().unwrap(), "sentinel");
    let hud: web_sys::HtmlElement = document
        .get_element_by_id("hud")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(hud.style().get_property_value("display").unwrap(), "none");
}
