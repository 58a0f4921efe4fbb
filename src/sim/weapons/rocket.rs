//! SCSI Rocket launcher
//!
//! Rockets leave the muzzle at rest and accelerate toward whatever is
//! nearest; the homing and blast live in `projectile`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::WeaponCtx;
use crate::sim::arena::Arena;
use crate::sim::projectile::{Projectile, ProjectileKind};
use crate::sim::schedule::Task;
use crate::sim::state::{IdAllocator, Player};
use crate::tuning::{GunTuning, RocketTuning};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketLauncher {
    pub interval: f32,
    pub speed: f32,
    pub turn: f32,
    pub damage: f32,
    pub blast: f32,
    /// Follow-up rocket after every launch
    pub double_tap: bool,
    timer: f32,
}

impl RocketLauncher {
    pub fn new(tuning: &RocketTuning) -> Self {
        Self {
            interval: tuning.interval,
            speed: tuning.speed,
            turn: tuning.turn,
            damage: tuning.damage,
            blast: tuning.blast_radius,
            double_tap: false,
            timer: 0.0,
        }
    }

    pub fn level_up(&mut self, level: u32, tuning: &RocketTuning) {
        self.damage += tuning.damage_per_level;
        self.blast = (self.blast + tuning.blast_per_level).min(tuning.max_blast_radius);
        self.interval = (self.interval * tuning.interval_factor).max(tuning.min_interval);
        self.speed = (self.speed + tuning.speed_per_level).min(tuning.max_speed);
        self.turn = (self.turn + tuning.turn_per_level).min(tuning.max_turn);
        self.double_tap = level >= 2;
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        self.timer += ctx.dt;
        if self.timer < self.interval {
            return;
        }
        self.timer = 0.0;
        let tuning = ctx.damage.tuning;
        self.launch(
            ctx.player,
            ctx.projectiles,
            &mut ctx.damage.ledger.ids,
            &tuning.gun,
            &tuning.rocket,
        );
        if self.double_tap {
            ctx.scheduler
                .after(ctx.damage.now, tuning.rocket.follow_up_delay, Task::LaunchRocket);
        }
    }

    pub fn launch(
        &self,
        player: &Player,
        projectiles: &mut Arena<Projectile>,
        ids: &mut IdAllocator,
        gun: &GunTuning,
        tuning: &RocketTuning,
    ) {
        let muzzle = player.pos + player.forward() * gun.muzzle_offset;
        projectiles.push(Projectile::new(
            ids.next_id(),
            ProjectileKind::Rocket {
                speed: self.speed,
                turn: self.turn,
                blast: self.blast,
            },
            muzzle,
            Vec2::ZERO,
            tuning.ttl,
            self.damage,
            0,
        ));
    }
}
