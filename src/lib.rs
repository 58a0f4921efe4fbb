//! Disk Survivor - a top-down survival arcade game
//!
//! Core modules:
//! - `sim`: Deterministic per-frame simulation (enemies, weapons, waves, progression)
//! - `tuning`: Data-driven game balance
//! - `platform`: Frame clock and input sampling
//! - `render`: Snapshot handed to the renderer after each step
//! - `audio`: Fire-and-forget sound cues
//! - `leaderboard`: Score submission, ordering and rank
//! - `persistence`: Maze preset storage
//! - `settings`: Player preferences

pub mod audio;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use leaderboard::{Leaderboard, LeaderboardEntry, ScoreSubmission};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest timestep a single frame may advance the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Hard ceiling on simultaneously alive enemies
    pub const MAX_ACTIVE_ENEMIES: u32 = 1000;

    /// Seconds per wave-minute
    pub const WAVE_SECONDS: f32 = 60.0;

    /// Seconds a level-up choice keeps attracting orbs after opening
    pub const LEVEL_UP_MAGNET_TAIL: f32 = 0.5;
}

/// Normalize `v`, or return `fallback` if `v` is (near) zero-length.
///
/// Every direction derived from positions goes through here so that two
/// coincident points never inject NaN into the spatial index.
#[inline]
pub fn safe_normalize(v: Vec2, fallback: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > 1e-12 && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// Ground-plane forward vector for a yaw angle (`yaw = atan2(x, z)`)
#[inline]
pub fn yaw_to_forward(yaw: f32) -> Vec2 {
    Vec2::new(yaw.sin(), yaw.cos())
}

/// Ground-plane right vector for a yaw angle
#[inline]
pub fn yaw_to_right(yaw: f32) -> Vec2 {
    Vec2::new(yaw.cos(), -yaw.sin())
}

/// Yaw angle of a ground-plane direction
#[inline]
pub fn direction_to_yaw(dir: Vec2) -> f32 {
    dir.x.atan2(dir.y)
}

/// Perpendicular of a direction (rotated a quarter turn)
#[inline]
pub fn perpendicular(dir: Vec2) -> Vec2 {
    Vec2::new(-dir.y, dir.x)
}
