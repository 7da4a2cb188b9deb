use std::fmt::Write as _;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement};

use crate::camera::Camera;
use crate::protocol::{PlayerView, Snapshot};

// --- WORLD & DRAWING CONSTANTS ---

pub const WORLD_SIZE: f64 = 3000.0;
pub const GRID_STEP: f64 = 100.0;

const TERRITORY_ALPHA: f64 = 0.35;
const TRAIL_ALPHA: f64 = 0.8;
const TRAIL_WIDTH: f64 = 5.0;
const HEAD_SIZE: f64 = 30.0;
const NAMEPLATE_LIFT: f64 = 35.0;
const NAMEPLATE_PADDING: f64 = 8.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Play,
    Idle,
}

struct Hud {
    hud: HtmlElement,
    leaderboard: HtmlElement,
    player_count: Element,
    score: Element,
    leaderboard_list: Element,
}

pub struct Renderer {
    ctx: CanvasRenderingContext2d,
    canvas: HtmlCanvasElement,
    hud: Option<Hud>,
}

impl Renderer {
    pub fn new(document: &Document, canvas: HtmlCanvasElement) -> Result<Renderer, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Renderer {
            ctx,
            canvas,
            hud: Hud::find(document),
        })
    }

    // One frame. The order of the passes is a contract: territory below
    // trails below heads, across ALL players, so nobody's head ever sits
    // under someone else's fill.
    pub fn draw(&self, snapshot: &Snapshot, camera: &Camera, local_id: Option<&str>, mode: Mode) {
        let ctx = &self.ctx;
        let view_w = self.canvas.width() as f64;
        let view_h = self.canvas.height() as f64;

        ctx.clear_rect(0.0, 0.0, view_w, view_h);

        ctx.save();
        let _ = ctx.translate(-camera.x, -camera.y);

        self.draw_grid(camera, view_w, view_h);

        let alive: Vec<&PlayerView> = snapshot.players.iter().filter(|p| p.is_alive).collect();
        for p in &alive {
            self.fill_territory(&p.color, &p.territory);
        }
        for p in &alive {
            self.stroke_trail(&p.color, &p.trail, (p.x, p.y));
        }
        for p in &alive {
            let name = (!p.name.is_empty()).then_some(p.name.as_str());
            self.draw_head(p.x, p.y, p.angle, &p.color, name);
        }

        ctx.restore();

        if mode == Mode::Play {
            self.update_hud(snapshot, local_id);
        }
    }

    // World backdrop plus grid lines, both clipped to the fixed map square.
    // Start coordinates snap to the interval below the camera origin so the
    // lines stay seamless while scrolling.
    fn draw_grid(&self, camera: &Camera, view_w: f64, view_h: f64) {
        let ctx = &self.ctx;
        ctx.save();

        ctx.set_fill_style_str("#fafafa");
        ctx.fill_rect(0.0, 0.0, WORLD_SIZE, WORLD_SIZE);

        ctx.set_stroke_style_str("rgba(0, 0, 0, 0.05)");
        ctx.set_line_width(1.0);

        let start_x = (camera.x / GRID_STEP).floor() * GRID_STEP;
        let start_y = (camera.y / GRID_STEP).floor() * GRID_STEP;
        let end_x = start_x + view_w + GRID_STEP;
        let end_y = start_y + view_h + GRID_STEP;

        ctx.begin_path();
        let mut x = start_x;
        while x <= end_x {
            if (0.0..=WORLD_SIZE).contains(&x) {
                ctx.move_to(x, start_y.max(0.0));
                ctx.line_to(x, end_y.min(WORLD_SIZE));
            }
            x += GRID_STEP;
        }
        let mut y = start_y;
        while y <= end_y {
            if (0.0..=WORLD_SIZE).contains(&y) {
                ctx.move_to(start_x.max(0.0), y);
                ctx.line_to(end_x.min(WORLD_SIZE), y);
            }
            y += GRID_STEP;
        }
        ctx.stroke();
        ctx.restore();
    }

    fn fill_territory(&self, color: &str, territory: &[Vec<[f64; 2]>]) {
        if territory.is_empty() {
            return;
        }
        let ctx = &self.ctx;
        ctx.save();
        ctx.set_fill_style_str(color);
        ctx.set_global_alpha(TERRITORY_ALPHA);

        for polygon in territory {
            if polygon.len() < 3 {
                continue;
            }
            ctx.begin_path();
            ctx.move_to(polygon[0][0], polygon[0][1]);
            for pt in &polygon[1..] {
                ctx.line_to(pt[0], pt[1]);
            }
            ctx.close_path();
            ctx.fill();
        }
        ctx.restore();
    }

    // Open polyline through the stored points, extended to the live head
    // position because the trail can lag the position by a tick.
    fn stroke_trail(&self, color: &str, trail: &[[f64; 2]], head: (f64, f64)) {
        if trail.len() < 2 {
            return;
        }
        let ctx = &self.ctx;
        ctx.save();
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(TRAIL_WIDTH);
        ctx.set_line_cap("round");
        ctx.set_line_join("round");
        ctx.set_global_alpha(TRAIL_ALPHA);

        ctx.begin_path();
        ctx.move_to(trail[0][0], trail[0][1]);
        for pt in &trail[1..] {
            ctx.line_to(pt[0], pt[1]);
        }
        ctx.line_to(head.0, head.1);
        ctx.stroke();
        ctx.restore();
    }

    fn draw_head(&self, x: f64, y: f64, angle: f64, color: &str, name: Option<&str>) {
        let ctx = &self.ctx;
        let half = HEAD_SIZE / 2.0;

        ctx.save();
        let _ = ctx.translate(x, y);
        let _ = ctx.rotate(angle);

        ctx.set_fill_style_str(color);
        ctx.set_shadow_blur(10.0);
        ctx.set_shadow_color("rgba(0, 0, 0, 0.3)");
        ctx.fill_rect(-half, -half, HEAD_SIZE, HEAD_SIZE);

        ctx.set_stroke_style_str("white");
        ctx.set_line_width(2.0);
        ctx.stroke_rect(-half, -half, HEAD_SIZE, HEAD_SIZE);
        ctx.restore();

        if let Some(name) = name {
            self.draw_nameplate(name, x, y - NAMEPLATE_LIFT);
        }
    }

    fn draw_nameplate(&self, name: &str, x: f64, y: f64) {
        let ctx = &self.ctx;
        ctx.set_font("bold 14px 'Segoe UI', Arial");
        let text_w = ctx.measure_text(name).map(|m| m.width()).unwrap_or(0.0);

        ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
        ctx.begin_path();
        trace_round_rect(
            ctx,
            x - text_w / 2.0 - NAMEPLATE_PADDING,
            y - 12.0,
            text_w + NAMEPLATE_PADDING * 2.0,
            20.0,
            10.0,
        );
        ctx.fill();

        ctx.set_fill_style_str("white");
        ctx.set_text_align("center");
        let _ = ctx.fill_text(name, x, y + 3.0);
    }

    fn update_hud(&self, snapshot: &Snapshot, local_id: Option<&str>) {
        let Some(ui) = &self.hud else { return };

        let _ = ui.hud.style().set_property("display", "block");
        let _ = ui.leaderboard.style().set_property("display", "block");

        ui.player_count
            .set_text_content(Some(&format!("Players: {}", snapshot.all_players_count)));

        let me = local_id.and_then(|id| snapshot.players.iter().find(|p| p.id == id));
        if let Some(me) = me {
            ui.score
                .set_text_content(Some(&format!("Score: {}", me.score.round() as i64)));
        }

        let mut html = String::new();
        for (i, entry) in snapshot.leaderboard.iter().enumerate() {
            let _ = write!(
                html,
                "<div class=\"leaderboard-entry\" style=\"color: {}\">\
                 <span>{}. <span class=\"leaderboard-name\">{}</span></span>\
                 <span>{}</span></div>",
                entry.color,
                i + 1,
                entry.name,
                entry.score.round() as i64
            );
        }
        ui.leaderboard_list.set_inner_html(&html);
    }

    pub fn set_hud_visible(&self, visible: bool) {
        let Some(ui) = &self.hud else { return };
        let display = if visible { "block" } else { "none" };
        let _ = ui.hud.style().set_property("display", display);
        let _ = ui.leaderboard.style().set_property("display", display);
    }
}

impl Hud {
    // All-or-nothing: a page without the overlay renders canvas-only.
    fn find(document: &Document) -> Option<Hud> {
        Some(Hud {
            hud: document.get_element_by_id("hud")?.dyn_into().ok()?,
            leaderboard: document.get_element_by_id("leaderboard")?.dyn_into().ok()?,
            player_count: document.get_element_by_id("player-count")?,
            score: document.get_element_by_id("current-score")?,
            leaderboard_list: document.get_element_by_id("leaderboard-list")?,
        })
    }
}

// roundRect is still too new across the web-sys surface; four arcTo corners
// produce the same path.
fn trace_round_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    ctx.move_to(x + r, y);
    let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
    let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
    let _ = ctx.arc_to(x, y + h, x, y, r);
    let _ = ctx.arc_to(x, y, x + w, y, r);
    ctx.close_path();
}
