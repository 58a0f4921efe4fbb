//! Sata Cable Tail: a swaying chain behind the player

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::WeaponCtx;
use crate::sim::damage::{DamageSource, apply_damage};
use crate::tuning::TailTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tail {
    pub length: f32,
    pub dps: f32,
}

impl Tail {
    pub fn new(tuning: &TailTuning) -> Self {
        Self {
            length: tuning.length,
            dps: tuning.dps,
        }
    }

    pub fn level_up(&mut self, tuning: &TailTuning) {
        self.dps += tuning.dps_per_level;
        self.length = (self.length + tuning.length_per_level).min(tuning.max_length);
    }

    /// World positions of the segments, base first.
    ///
    /// Sway grows toward the tip and with movement speed; a player
    /// standing still has a straight tail.
    pub fn segments(
        &self,
        anchor: Vec2,
        forward: Vec2,
        right: Vec2,
        move_mag: f32,
        now: f32,
        tuning: &TailTuning,
    ) -> Vec<Vec2> {
        let n = tuning.segments.max(2);
        let base = anchor - forward * tuning.anchor_offset;
        (0..n)
            .map(|i| {
                let k = i as f32 / (n - 1) as f32;
                let sway = (now * tuning.frequency + k * 2.3).sin()
                    * tuning.amplitude
                    * k
                    * k
                    * move_mag;
                base + right * sway - forward * (k * self.length)
            })
            .collect()
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        let tuning = &ctx.damage.tuning.tail;
        let player = ctx.player;
        let move_mag = player.last_move.length().min(1.0);
        let segments = self.segments(
            player.pos,
            player.forward(),
            player.right(),
            move_mag,
            ctx.damage.now,
            tuning,
        );
        let reject = self.length + tuning.anchor_offset + 1.2;
        let hit_sq = tuning.hit_radius * tuning.hit_radius;
        let amount = self.dps * ctx.dt;
        for enemy in ctx.enemies.iter_alive_mut() {
            if enemy.pos.distance_squared(player.pos) > reject * reject {
                continue;
            }
            // at most one segment hit per enemy per frame
            if segments.iter().any(|s| s.distance_squared(enemy.pos) < hit_sq) {
                apply_damage(enemy, amount, DamageSource::Area, &mut ctx.damage);
            }
        }
    }
}
