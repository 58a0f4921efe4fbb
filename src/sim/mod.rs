//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped timestep supplied by the caller
//! - Seeded RNG only
//! - Stable iteration order (arena slot order)
//! - Delayed work goes through the frame-clocked scheduler
//! - No rendering or platform dependencies

pub mod arena;
pub mod behavior;
pub mod collision;
pub mod damage;
pub mod enemy;
pub mod obstacles;
pub mod pickups;
pub mod progression;
pub mod projectile;
pub mod schedule;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod waves;
pub mod weapons;

pub use arena::Arena;
pub use enemy::{Enemy, EnemyKind};
pub use progression::{Choice, Loadout, UpgradeKind, apply_choice};
pub use state::{GameEvent, GamePhase, GameState, RunOptions};
pub use tick::{TickInput, tick};
pub use waves::{DebugPlan, RunMode};
pub use weapons::WeaponKind;
