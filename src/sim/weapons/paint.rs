//! Paint.exe: damaging disks dropped along the player's path

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DutyCycle, WeaponCtx};
use crate::sim::damage::{DamageSource, apply_damage};
use crate::tuning::PaintTuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swath {
    pub pos: Vec2,
    pub born: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paint {
    pub dps: f32,
    pub lifetime: f32,
    pub gap: f32,
    pub radius: f32,
    pub cycle: DutyCycle,
    pub swaths: VecDeque<Swath>,
    last_drop: Option<Vec2>,
}

impl Paint {
    pub fn new(tuning: &PaintTuning) -> Self {
        Self {
            dps: tuning.dps,
            lifetime: tuning.lifetime,
            gap: tuning.gap,
            radius: tuning.radius,
            cycle: DutyCycle::new(tuning.on, tuning.off),
            swaths: VecDeque::new(),
            last_drop: None,
        }
    }

    pub fn level_up(&mut self, tuning: &PaintTuning) {
        self.cycle.on = (self.cycle.on + tuning.on_per_level).min(tuning.max_on);
        self.cycle.off = (self.cycle.off - tuning.off_per_level).max(tuning.min_off);
        self.dps += tuning.dps_per_level;
        self.lifetime = (self.lifetime + tuning.lifetime_per_level).min(tuning.max_lifetime);
        self.radius = (self.radius + tuning.radius_per_level).min(tuning.max_radius);
        self.gap = (self.gap - tuning.gap_per_level).max(tuning.min_gap);
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        let tuning = &ctx.damage.tuning.paint;
        let now = ctx.damage.now;
        let pos = ctx.player.pos;

        if self.cycle.advance(ctx.dt) {
            let last = *self.last_drop.get_or_insert(pos);
            if pos.distance_squared(last) >= self.gap * self.gap {
                let jitter = tuning.radius_jitter;
                let scale = 1.0 - jitter + ctx.damage.rng.random::<f32>() * 2.0 * jitter;
                self.swaths.push_back(Swath {
                    pos,
                    born: now,
                    radius: self.radius * scale,
                });
                while self.swaths.len() > tuning.max_swaths {
                    self.swaths.pop_front();
                }
                self.last_drop = Some(pos);
            }
        }

        let lifetime = self.lifetime;
        self.swaths.retain(|s| now - s.born <= lifetime);

        let amount = self.dps * ctx.dt;
        for swath in &self.swaths {
            let reach_sq = swath.radius * swath.radius;
            for enemy in ctx.enemies.iter_alive_mut() {
                if enemy.pos.distance_squared(swath.pos) <= reach_sq {
                    enemy.painted = true;
                    apply_damage(enemy, amount, DamageSource::Area, &mut ctx.damage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapons::test_support::Bench;

    fn walk(bench: &mut Bench, paint: &mut Paint, frames: u32, step: Vec2) {
        for _ in 0..frames {
            bench.player.pos += step;
            bench.step(0.016, |ctx| paint.tick(ctx));
        }
    }

    #[test]
    fn test_drops_spaced_by_gap() {
        let mut bench = Bench::new();
        let mut paint = Paint::new(&PaintTuning::default());
        // 0.1 per frame for 0.4 s of an 0.7 s on phase
        walk(&mut bench, &mut paint, 25, Vec2::new(0.1, 0.0));
        assert!(paint.swaths.len() >= 5 && paint.swaths.len() <= 7);
        for pair in paint.swaths.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].pos.distance(pair[1].pos) >= 0.35 - 1e-4);
        }
        for s in &paint.swaths {
            assert!(s.radius >= 1.38 * 0.85 - 1e-4 && s.radius <= 1.38 * 1.15 + 1e-4);
        }
    }

    #[test]
    fn test_swaths_damage_paint_and_expire() {
        let mut bench = Bench::new();
        let target = bench.enemy_at(Vec2::new(0.5, 0.0), 50.0);
        let mut paint = Paint::new(&PaintTuning::default());
        walk(&mut bench, &mut paint, 10, Vec2::new(0.05, 0.0));
        assert!(bench.hp(target) < 50.0);
        assert!(bench.enemies.slots()[target].painted);

        // stand still well past the lifetime
        walk(&mut bench, &mut paint, 200, Vec2::ZERO);
        assert!(paint.swaths.is_empty());
    }

    #[test]
    fn test_swath_cap_drops_oldest() {
        let mut bench = Bench::new();
        let tuning = PaintTuning::default();
        let mut paint = Paint::new(&tuning);
        paint.cycle = DutyCycle::new(1000.0, 1.0);
        paint.lifetime = 1000.0;
        walk(&mut bench, &mut paint, 120, Vec2::new(0.5, 0.0));
        assert_eq!(paint.swaths.len(), 80);
        assert!(paint.swaths[0].pos.x > 1.0);
    }
}
