use crate::protocol::PlayerView;

// Cosmetic lobby bots. They animate the menu backdrop while no connection
// exists and never touch a live session.

const SPEED: f64 = 2.5;
const ATTACK_TURN_RATE: f64 = 0.045;
const TRAIL_SAMPLE_EVERY: u32 = 5;
const STRAIGHT_TICKS: (f64, f64) = (80.0, 220.0);
const ATTACK_TICKS: (f64, f64) = (40.0, 140.0);
const WALL_KICK: f64 = 0.35;
const RESET_MARGIN: f64 = 250.0;

// Deterministic xorshift32. Seeded from Math.random at startup; tests seed
// it directly.
pub struct MenuRng(u32);

impl MenuRng {
    pub fn new(seed: u32) -> MenuRng {
        MenuRng(if seed == 0 { 0x9e37_79b9 } else { seed })
    }

    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x as f64 / u32::MAX as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IdleState {
    Straight,
    Attack,
}

pub struct IdleActor {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub color: String,
    pub trail: Vec<[f64; 2]>,
    pub state: IdleState,
    timer: u32,
    turn_speed: f64,
    ticks: u32,
}

impl IdleActor {
    pub fn spawn(rng: &mut MenuRng, bounds: (f64, f64)) -> IdleActor {
        let mut actor = IdleActor {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            color: String::new(),
            trail: Vec::new(),
            state: IdleState::Straight,
            timer: 0,
            turn_speed: 0.0,
            ticks: 0,
        };
        actor.reset(rng, bounds);
        actor
    }

    // Full re-randomization: new pose and color, trail cleared.
    pub fn reset(&mut self, rng: &mut MenuRng, bounds: (f64, f64)) {
        self.x = rng.range(0.0, bounds.0);
        self.y = rng.range(0.0, bounds.1);
        self.angle = rng.range(0.0, std::f64::consts::TAU);
        self.color = format!("hsl({:.0}, 70%, 60%)", rng.range(0.0, 360.0));
        self.trail.clear();
        self.state = IdleState::Straight;
        self.timer = rng.range(STRAIGHT_TICKS.0, STRAIGHT_TICKS.1) as u32;
        self.turn_speed = 0.0;
        self.ticks = 0;
    }

    pub fn tick(&mut self, rng: &mut MenuRng, bounds: (f64, f64)) {
        if self.timer == 0 {
            self.toggle_state(rng);
        } else {
            self.timer -= 1;
        }

        self.angle += self.turn_speed;
        self.x += self.angle.cos() * SPEED;
        self.y += self.angle.sin() * SPEED;

        let out_x = self.x < 0.0 || self.x > bounds.0;
        let out_y = self.y < 0.0 || self.y > bounds.1;
        if self.x < -RESET_MARGIN
            || self.x > bounds.0 + RESET_MARGIN
            || self.y < -RESET_MARGIN
            || self.y > bounds.1 + RESET_MARGIN
        {
            // Too far gone for steering to look right.
            self.reset(rng, bounds);
            return;
        }
        if out_x || out_y {
            // Steer back in rather than clamping; briefly rendering outside
            // the rectangle is fine.
            self.angle += WALL_KICK;
        }

        self.ticks = self.ticks.wrapping_add(1);
        if self.state == IdleState::Attack && self.ticks % TRAIL_SAMPLE_EVERY == 0 {
            self.trail.push([self.x, self.y]);
        }
    }

    fn toggle_state(&mut self, rng: &mut MenuRng) {
        match self.state {
            IdleState::Straight => {
                self.state = IdleState::Attack;
                self.turn_speed = if rng.next_f64() < 0.5 {
                    ATTACK_TURN_RATE
                } else {
                    -ATTACK_TURN_RATE
                };
                self.timer = rng.range(ATTACK_TICKS.0, ATTACK_TICKS.1) as u32;
            }
            IdleState::Attack => {
                self.state = IdleState::Straight;
                self.turn_speed = 0.0;
                self.trail.clear();
                self.timer = rng.range(STRAIGHT_TICKS.0, STRAIGHT_TICKS.1) as u32;
            }
        }
    }

    // Adapter for the shared renderer: an idle actor draws exactly like a
    // nameless alive player with no territory.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: String::new(),
            name: String::new(),
            color: self.color.clone(),
            x: self.x,
            y: self.y,
            angle: self.angle,
            is_alive: true,
            score: 0.0,
            trail: self.trail.clone(),
            territory: Vec::new(),
        }
    }
}
