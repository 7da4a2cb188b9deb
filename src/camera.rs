// Top-left world offset of the viewport. Derived from the followed player's
// position every frame; never persisted, never moved by input directly.
pub struct Camera {
    pub x: f64,
    pub y: f64,
}

impl Camera {
    pub fn new() -> Camera {
        Camera { x: 0.0, y: 0.0 }
    }

    // Centers the target in the viewport. Keeps the previous offset when the
    // target is absent (local player not yet present in any snapshot).
    // Deliberately unclamped: the viewport may show area outside the map.
    pub fn update(&mut self, target: Option<(f64, f64)>, viewport: (f64, f64)) {
        let Some((tx, ty)) = target else { return };
        self.x = tx - viewport.0 / 2.0;
        self.y = ty - viewport.1 / 2.0;
    }
}
