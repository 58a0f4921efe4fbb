//! Tape Whirl: saws orbiting the player

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{DutyCycle, WeaponCtx};
use crate::safe_normalize;
use crate::sim::damage::{DamageOutcome, DamageSource, apply_damage};
use crate::tuning::BladesTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blades {
    pub count: u32,
    pub radius: f32,
    pub angular_speed: f32,
    pub dps: f32,
    pub cycle: DutyCycle,
}

impl Blades {
    pub fn new(tuning: &BladesTuning) -> Self {
        Self {
            count: tuning.count,
            radius: tuning.radius,
            angular_speed: tuning.angular_speed,
            dps: tuning.dps,
            cycle: DutyCycle::new(tuning.on, tuning.off),
        }
    }

    /// `level` is the level just reached
    pub fn level_up(&mut self, level: u32, tuning: &BladesTuning) {
        self.radius = (self.radius + tuning.radius_per_level).min(tuning.max_radius);
        self.dps += tuning.dps_per_level;
        self.angular_speed = (self.angular_speed + tuning.speed_per_level).min(tuning.max_angular_speed);
        if matches!(level, 2 | 4) {
            self.count = (self.count + 1).min(tuning.max_count);
        }
    }

    /// Saw positions at time `now`, evenly spaced around `center`
    pub fn positions(&self, center: Vec2, now: f32) -> Vec<Vec2> {
        let n = self.count.max(1);
        (0..n)
            .map(|i| {
                let angle = now * self.angular_speed + i as f32 * TAU / n as f32;
                center + Vec2::new(angle.cos(), angle.sin()) * self.radius
            })
            .collect()
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        if !self.cycle.advance(ctx.dt) {
            return;
        }
        let tuning = &ctx.damage.tuning.blades;
        let reach_sq = tuning.contact_distance * tuning.contact_distance;
        let knockback = tuning.knockback;
        let player_pos = ctx.player.pos;
        let amount = self.dps * ctx.dt;
        for saw in self.positions(player_pos, ctx.damage.now) {
            for enemy in ctx.enemies.iter_alive_mut() {
                if saw.distance_squared(enemy.pos) >= reach_sq {
                    continue;
                }
                if apply_damage(enemy, amount, DamageSource::Area, &mut ctx.damage)
                    == DamageOutcome::Wounded
                {
                    enemy.pos += safe_normalize(enemy.pos - player_pos, Vec2::X) * knockback;
                }
            }
        }
    }
}
