//! Owned weapons and effects
//!
//! The primary [`Gun`] is always present. Everything else is picked up
//! through level-ups and lives in the [`Arsenal`], which ticks the owned
//! modules in a fixed order every frame: beam, blades, tail, paint,
//! shockwave, rocket launcher, lasso, shield. A module running later in
//! the frame sees every tombstone an earlier one produced.

mod beam;
mod blades;
mod gun;
mod lasso;
mod paint;
mod rocket;
mod shield;
mod shockwave;
mod tail;

pub use beam::Beam;
pub use blades::Blades;
pub use gun::Gun;
pub use lasso::{Lasso, LassoPoint};
pub use paint::{Paint, Swath};
pub use rocket::RocketLauncher;
pub use shield::Shield;
pub use shockwave::Shockwave;
pub use tail::Tail;

use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::damage::DamageCtx;
use super::enemy::Enemy;
use super::projectile::Projectile;
use super::schedule::Scheduler;
use super::state::Player;
use crate::tuning::Tuning;

/// Weapon names as shown on level-up cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    CrtBeam,
    DotMatrix,
    DialUpBurst,
    ScsiRocket,
    TapeWhirl,
    MagicLasso,
    ShieldWall,
    SataCableTail,
    PaintExe,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 9] = [
        WeaponKind::CrtBeam,
        WeaponKind::DotMatrix,
        WeaponKind::DialUpBurst,
        WeaponKind::ScsiRocket,
        WeaponKind::TapeWhirl,
        WeaponKind::MagicLasso,
        WeaponKind::ShieldWall,
        WeaponKind::SataCableTail,
        WeaponKind::PaintExe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::CrtBeam => "CRT Beam",
            WeaponKind::DotMatrix => "Dot Matrix",
            WeaponKind::DialUpBurst => "Dial-up Burst",
            WeaponKind::ScsiRocket => "SCSI Rocket",
            WeaponKind::TapeWhirl => "Tape Whirl",
            WeaponKind::MagicLasso => "Magic Lasso",
            WeaponKind::ShieldWall => "Shield Wall",
            WeaponKind::SataCableTail => "Sata Cable Tail",
            WeaponKind::PaintExe => "Paint.exe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// On/off flicker timing shared by several weapons. Starts on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyCycle {
    pub on: f32,
    pub off: f32,
    timer: f32,
    active: bool,
}

impl DutyCycle {
    pub fn new(on: f32, off: f32) -> Self {
        Self {
            on,
            off,
            timer: 0.0,
            active: true,
        }
    }

    /// Advance the timer, flipping phase when the current one runs out.
    /// Returns whether the cycle is on for this frame.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.timer += dt;
        let phase = if self.active { self.on } else { self.off };
        if self.timer >= phase {
            self.timer = 0.0;
            self.active = !self.active;
        }
        self.active
    }

    pub fn is_on(&self) -> bool {
        self.active
    }
}

/// Everything a weapon tick may touch
pub struct WeaponCtx<'a> {
    pub dt: f32,
    pub player: &'a Player,
    pub enemies: &'a mut Arena<Enemy>,
    pub projectiles: &'a mut Arena<Projectile>,
    pub scheduler: &'a mut Scheduler,
    pub damage: DamageCtx<'a>,
}

/// Owned weapons in acquisition order, each with its live state
#[derive(Debug, Clone, Default)]
pub struct Arsenal {
    owned: Vec<(WeaponKind, u32)>,
    pub beam: Option<Beam>,
    pub blades: Option<Blades>,
    pub shockwave: Option<Shockwave>,
    pub rocket: Option<RocketLauncher>,
    pub paint: Option<Paint>,
    pub lasso: Option<Lasso>,
    pub tail: Option<Tail>,
    pub shield: Option<Shield>,
}

impl Arsenal {
    /// Owned weapons with their levels, in the order they were acquired
    pub fn owned(&self) -> &[(WeaponKind, u32)] {
        &self.owned
    }

    pub fn count(&self) -> usize {
        self.owned.len()
    }

    pub fn owns(&self, kind: WeaponKind) -> bool {
        self.level(kind).is_some()
    }

    pub fn level(&self, kind: WeaponKind) -> Option<u32> {
        self.owned.iter().find(|(k, _)| *k == kind).map(|(_, l)| *l)
    }

    /// Acquire a weapon at level 1. Returns false if it was already owned.
    pub fn add(&mut self, kind: WeaponKind, gun: &mut Gun, tuning: &Tuning) -> bool {
        if self.owns(kind) {
            return false;
        }
        self.owned.push((kind, 1));
        match kind {
            WeaponKind::CrtBeam => self.beam = Some(Beam::new(&tuning.beam)),
            WeaponKind::DotMatrix => gun.side_bullets = true,
            WeaponKind::DialUpBurst => self.shockwave = Some(Shockwave::new(&tuning.shockwave)),
            WeaponKind::ScsiRocket => self.rocket = Some(RocketLauncher::new(&tuning.rocket)),
            WeaponKind::TapeWhirl => self.blades = Some(Blades::new(&tuning.blades)),
            WeaponKind::MagicLasso => self.lasso = Some(Lasso::new(&tuning.lasso)),
            WeaponKind::ShieldWall => self.shield = Some(Shield::new(&tuning.shield)),
            WeaponKind::SataCableTail => self.tail = Some(Tail::new(&tuning.tail)),
            WeaponKind::PaintExe => self.paint = Some(Paint::new(&tuning.paint)),
        }
        log::info!("weapon acquired: {}", kind.name());
        true
    }

    /// Raise an owned weapon one level. Returns false if it is not owned.
    pub fn level_up(&mut self, kind: WeaponKind, gun: &mut Gun, tuning: &Tuning) -> bool {
        let Some(slot) = self.owned.iter_mut().find(|(k, _)| *k == kind) else {
            return false;
        };
        slot.1 += 1;
        let level = slot.1;
        match kind {
            WeaponKind::CrtBeam => {
                if let Some(w) = self.beam.as_mut() {
                    w.level_up(&tuning.beam);
                }
            }
            WeaponKind::DotMatrix => {
                let dm = &tuning.dot_matrix;
                gun.side_multiplier = (gun.side_multiplier + dm.per_level).min(dm.max_multiplier);
            }
            WeaponKind::DialUpBurst => {
                if let Some(w) = self.shockwave.as_mut() {
                    w.level_up(level, &tuning.shockwave);
                }
            }
            WeaponKind::ScsiRocket => {
                if let Some(w) = self.rocket.as_mut() {
                    w.level_up(level, &tuning.rocket);
                }
            }
            WeaponKind::TapeWhirl => {
                if let Some(w) = self.blades.as_mut() {
                    w.level_up(level, &tuning.blades);
                }
            }
            WeaponKind::MagicLasso => {
                if let Some(w) = self.lasso.as_mut() {
                    w.level_up(&tuning.lasso);
                }
            }
            WeaponKind::ShieldWall => {
                if let Some(w) = self.shield.as_mut() {
                    w.level_up(&tuning.shield);
                }
            }
            WeaponKind::SataCableTail => {
                if let Some(w) = self.tail.as_mut() {
                    w.level_up(&tuning.tail);
                }
            }
            WeaponKind::PaintExe => {
                if let Some(w) = self.paint.as_mut() {
                    w.level_up(&tuning.paint);
                }
            }
        }
        log::info!("{} reached level {level}", kind.name());
        true
    }

    /// Run every owned module once, in the fixed frame order
    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        if let Some(w) = self.beam.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.blades.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.tail.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.paint.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.shockwave.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.rocket.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.lasso.as_mut() {
            w.tick(ctx);
        }
        if let Some(w) = self.shield.as_mut() {
            w.tick(ctx);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::state::Ledger;
    use crate::tuning::PlayerTuning;

    /// Owned pieces a weapon tick borrows from
    pub struct Bench {
        pub tuning: Tuning,
        pub rng: Pcg32,
        pub ledger: Ledger,
        pub player: Player,
        pub enemies: Arena<Enemy>,
        pub projectiles: Arena<Projectile>,
        pub scheduler: Scheduler,
        pub now: f32,
    }

    impl Bench {
        pub fn new() -> Self {
            Self {
                tuning: Tuning::default(),
                rng: Pcg32::seed_from_u64(3),
                ledger: Ledger::default(),
                player: Player::new(&PlayerTuning::default()),
                enemies: Arena::new(),
                projectiles: Arena::new(),
                scheduler: Scheduler::default(),
                now: 0.0,
            }
        }

        /// Add a sturdy, stationary enemy and return its arena index
        pub fn enemy_at(&mut self, pos: Vec2, hp: f32) -> usize {
            let id = self.ledger.ids.next_id();
            self.ledger.stats.enemy_spawned();
            self.enemies
                .push(Enemy::bare(id, EnemyKind::Tank, pos, hp, 0.0, 0))
        }

        pub fn hp(&self, index: usize) -> f32 {
            self.enemies.slots()[index].hp
        }

        /// Run `f` with a freshly borrowed context, then advance the clock
        pub fn step(&mut self, dt: f32, f: impl FnOnce(&mut WeaponCtx)) {
            let mut ctx = WeaponCtx {
                dt,
                player: &self.player,
                enemies: &mut self.enemies,
                projectiles: &mut self.projectiles,
                scheduler: &mut self.scheduler,
                damage: DamageCtx {
                    now: self.now,
                    wave: 0,
                    plentiful: false,
                    tuning: &self.tuning,
                    rng: &mut self.rng,
                    ledger: &mut self.ledger,
                },
            };
            f(&mut ctx);
            self.now += dt;
        }
    }
}
