//! Shield Wall: a flickering barrier in front of the player
//!
//! Deals no damage. Enemies inside the rectangle ahead are shoved along
//! the facing direction, harder the closer they are.

use serde::{Deserialize, Serialize};

use super::{DutyCycle, WeaponCtx};
use crate::tuning::ShieldTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shield {
    pub length: f32,
    pub width: f32,
    pub cycle: DutyCycle,
}

impl Shield {
    pub fn new(tuning: &ShieldTuning) -> Self {
        Self {
            length: tuning.length,
            width: tuning.width,
            cycle: DutyCycle::new(tuning.on, tuning.off),
        }
    }

    pub fn level_up(&mut self, tuning: &ShieldTuning) {
        self.length += tuning.length_per_level;
        self.width += tuning.width_per_level;
        self.cycle.on = (self.cycle.on + tuning.on_per_level).min(tuning.max_on);
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        if !self.cycle.advance(ctx.dt) {
            return;
        }
        let tuning = ctx.damage.tuning;
        let forward = ctx.player.forward();
        let right = ctx.player.right();
        let origin = ctx.player.pos;
        let half_width = self.width * 0.5;
        for enemy in ctx.enemies.iter_alive_mut() {
            let rel = enemy.pos - origin;
            let depth = rel.dot(forward);
            if depth <= 0.0 || depth >= self.length || rel.dot(right).abs() >= half_width {
                continue;
            }
            let push = (tuning.shield.max_push - depth * tuning.shield.push_falloff)
                .max(tuning.shield.min_push);
            enemy.pos += forward * push;
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::weapons::test_support::Bench;

    #[test]
    fn test_pushes_only_inside_the_wall() {
        let mut bench = Bench::new();
        let ahead = bench.enemy_at(Vec2::new(0.0, 1.0), 10.0);
        let wide = bench.enemy_at(Vec2::new(1.0, 1.0), 10.0);
        let behind = bench.enemy_at(Vec2::new(0.0, -1.0), 10.0);
        let mut shield = Shield::new(&ShieldTuning::default());
        bench.step(0.016, |ctx| shield.tick(ctx));

        let slots = bench.enemies.slots();
        assert!((slots[ahead].pos.y - 1.3).abs() < 1e-5);
        assert_eq!(slots[wide].pos, Vec2::new(1.0, 1.0));
        assert_eq!(slots[behind].pos, Vec2::new(0.0, -1.0));
        assert_eq!(bench.hp(ahead), 10.0);
    }

    #[test]
    fn test_far_push_is_floored() {
        let mut bench = Bench::new();
        let far = bench.enemy_at(Vec2::new(0.0, 3.9), 10.0);
        let mut shield = Shield::new(&ShieldTuning::default());
        bench.step(0.016, |ctx| shield.tick(ctx));
        // 0.32 - 3.9 * 0.02 = 0.242 stays above the floor
        assert!((bench.enemies.slots()[far].pos.y - 4.142).abs() < 1e-4);
    }

    #[test]
    fn test_idle_during_off_phase() {
        let mut bench = Bench::new();
        let mut shield = Shield::new(&ShieldTuning::default());
        // burn through the one second on phase
        bench.step(1.0, |ctx| shield.tick(ctx));
        let ahead = bench.enemy_at(Vec2::new(0.0, 1.0), 10.0);
        bench.step(0.1, |ctx| shield.tick(ctx));
        assert_eq!(bench.enemies.slots()[ahead].pos, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_level_up_grows_and_caps_on_time() {
        let tuning = ShieldTuning::default();
        let mut shield = Shield::new(&tuning);
        for _ in 0..10 {
            shield.level_up(&tuning);
        }
        assert_eq!(shield.length, 14.0);
        assert_eq!(shield.cycle.on, 2.0);
    }
}
