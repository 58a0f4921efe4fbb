//! Platform abstraction layer
//!
//! Turns browser timestamps and raw input events into what one
//! simulation step consumes: a clamped timestep and a [`TickInput`].
//!
//! Aim sources are ranked: right stick, then the mouse if it moved in the
//! last [`MOUSE_AIM_WINDOW`] seconds, then a touch aim pad. With none of
//! them active the player keeps the last facing.

use glam::Vec2;

use crate::sim::TickInput;
pub use crate::sim::tick::clamp_dt;

/// Seconds a mouse position stays authoritative for aiming
pub const MOUSE_AIM_WINDOW: f64 = 1.5;

/// Stick deflection below this is ignored
pub const STICK_DEADZONE: f32 = 0.2;

/// Converts animation-frame timestamps (milliseconds) into timesteps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestep for the frame at `now_ms`. The first frame after creation
    /// or [`reset`](Self::reset) advances nothing.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        clamp_dt(dt)
    }

    /// Forget the previous timestamp (after a pause or hidden tab)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Directional movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

impl MoveKey {
    /// Map a `KeyboardEvent.key` value (WASD or arrows)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" | "ArrowUp" => Some(MoveKey::Up),
            "s" | "S" | "ArrowDown" => Some(MoveKey::Down),
            "a" | "A" | "ArrowLeft" => Some(MoveKey::Left),
            "d" | "D" | "ArrowRight" => Some(MoveKey::Right),
            _ => None,
        }
    }
}

fn stick(v: Vec2) -> Option<Vec2> {
    (v.is_finite() && v.length() > STICK_DEADZONE).then(|| v.clamp_length_max(1.0))
}

fn direction(v: Vec2) -> Option<Vec2> {
    (v.is_finite() && v.length_squared() > 1e-6).then(|| v.normalize())
}

/// Accumulates raw input between frames
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    move_stick: Vec2,
    aim_stick: Vec2,
    /// Aim direction from the mouse and when it was set (seconds)
    mouse_aim: Option<(Vec2, f64)>,
    touch_move: Option<Vec2>,
    touch_aim: Option<Vec2>,
    fire: bool,
    pause: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was consumed
    pub fn key_down(&mut self, key: &str) -> bool {
        if matches!(key, "Escape" | "p" | "P") {
            self.pause = true;
            return true;
        }
        if key == " " {
            self.fire = true;
            return true;
        }
        match MoveKey::from_key(key) {
            Some(k) => {
                self.set_key(k, true);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if key == " " {
            self.fire = false;
            return true;
        }
        match MoveKey::from_key(key) {
            Some(k) => {
                self.set_key(k, false);
                true
            }
            None => false,
        }
    }

    fn set_key(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Up => self.up = held,
            MoveKey::Down => self.down = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
        }
    }

    /// Release everything (window blur)
    pub fn release_all(&mut self) {
        *self = Self {
            mouse_aim: self.mouse_aim,
            ..Self::default()
        };
    }

    /// Gamepad sticks in ground space (+y is up the screen)
    pub fn set_sticks(&mut self, left: Vec2, right: Vec2) {
        self.move_stick = left;
        self.aim_stick = right;
    }

    /// Mouse position in screen pixels relative to the player's screen
    /// position at `now` seconds
    pub fn mouse_moved(&mut self, offset_px: Vec2, now: f64) {
        // screen y grows downward
        if let Some(dir) = direction(Vec2::new(offset_px.x, -offset_px.y)) {
            self.mouse_aim = Some((dir, now));
        }
    }

    pub fn set_fire(&mut self, held: bool) {
        self.fire = held;
    }

    /// Virtual move pad; `None` when released
    pub fn set_touch_move(&mut self, v: Option<Vec2>) {
        self.touch_move = v;
    }

    /// Virtual aim pad; `None` when released
    pub fn set_touch_aim(&mut self, v: Option<Vec2>) {
        self.touch_aim = v;
    }

    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    fn keyboard_move(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        let v = Vec2::new(axis(self.left, self.right), axis(self.down, self.up));
        direction(v).unwrap_or(Vec2::ZERO)
    }

    /// Resolve the aim source for this frame
    pub fn aim(&self, now: f64) -> Option<Vec2> {
        if let Some(dir) = stick(self.aim_stick).and_then(direction) {
            return Some(dir);
        }
        if let Some((dir, at)) = self.mouse_aim {
            if now - at <= MOUSE_AIM_WINDOW {
                return Some(dir);
            }
        }
        self.touch_aim.and_then(direction)
    }

    /// Movement for this frame: stick, then keys, then touch pad
    pub fn movement(&self) -> Vec2 {
        if let Some(v) = stick(self.move_stick) {
            return v;
        }
        let keys = self.keyboard_move();
        if keys != Vec2::ZERO {
            return keys;
        }
        self.touch_move
            .filter(|v| v.is_finite())
            .map(|v| v.clamp_length_max(1.0))
            .unwrap_or(Vec2::ZERO)
    }

    /// Build the frame's input. The pause request is one-shot.
    pub fn sample(&mut self, now: f64) -> TickInput {
        let input = TickInput {
            move_vec: self.movement(),
            aim: self.aim(now),
            fire: self.fire,
            pause: self.pause,
        };
        self.pause = false;
        input
    }
}
