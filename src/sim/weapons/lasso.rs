//! Magic Lasso: close a loop with your path to hit everything inside
//!
//! Samples are taken whenever the player has moved more than the point
//! gap. When the newest sample lands near an older one, with at least
//! the minimum loop length in between, the enclosed polygon is resolved
//! and the trail starts over.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::WeaponCtx;
use crate::sim::collision::point_in_polygon;
use crate::sim::damage::{DamageSource, apply_damage};
use crate::sim::state::GameEvent;
use crate::tuning::LassoTuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LassoPoint {
    pub pos: Vec2,
    pub t: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lasso {
    pub damage: f32,
    /// Seconds a sample stays in the trail
    pub duration: f32,
    pub points: VecDeque<LassoPoint>,
    last_sample: Option<Vec2>,
}

impl Lasso {
    pub fn new(tuning: &LassoTuning) -> Self {
        Self {
            damage: tuning.damage,
            duration: tuning.duration,
            points: VecDeque::new(),
            last_sample: None,
        }
    }

    pub fn level_up(&mut self, tuning: &LassoTuning) {
        self.duration = (self.duration + tuning.duration_per_level).min(tuning.max_duration);
        self.damage += tuning.damage_per_level;
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        let tuning = &ctx.damage.tuning.lasso;
        let now = ctx.damage.now;
        let pos = ctx.player.pos;
        let moved = self
            .last_sample
            .is_none_or(|last| pos.distance_squared(last) > tuning.point_gap * tuning.point_gap);
        if !moved {
            return;
        }
        self.points.push_back(LassoPoint { pos, t: now });
        self.last_sample = Some(pos);
        if self.points.len() > tuning.max_points {
            self.points.pop_front();
        }
        while self
            .points
            .front()
            .is_some_and(|p| now - p.t > self.duration)
        {
            self.points.pop_front();
        }

        let Some(ring) = self.closed_loop(tuning) else {
            return;
        };
        for enemy in ctx.enemies.iter_alive_mut() {
            if point_in_polygon(enemy.pos, &ring) {
                apply_damage(enemy, self.damage, DamageSource::Area, &mut ctx.damage);
            }
        }
        log::debug!("lasso closed with {} points", ring.len());
        ctx.damage
            .ledger
            .events
            .push(GameEvent::LassoClosed { points: ring });
        self.points.clear();
    }

    /// The polygon from the oldest sample the newest one closes on
    fn closed_loop(&self, tuning: &LassoTuning) -> Option<Vec<Vec2>> {
        let n = self.points.len();
        if n <= tuning.min_loop_points {
            return None;
        }
        let end = self.points[n - 1].pos;
        let close_sq = tuning.close_distance * tuning.close_distance;
        (0..n - tuning.min_loop_points)
            .find(|&i| self.points[i].pos.distance_squared(end) < close_sq)
            .map(|i| self.points.iter().skip(i).map(|p| p.pos).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;
    use crate::sim::weapons::test_support::Bench;

    /// Walk a circle of `radius` around the origin in `steps` samples
    fn circle(bench: &mut Bench, lasso: &mut Lasso, radius: f32, steps: u32) {
        for i in 0..=steps {
            let a = i as f32 / steps as f32 * TAU;
            bench.player.pos = Vec2::new(a.cos(), a.sin()) * radius;
            bench.step(0.05, |ctx| lasso.tick(ctx));
        }
    }

    #[test]
    fn test_closed_loop_damages_inside_and_resets() {
        let mut bench = Bench::new();
        let inside = bench.enemy_at(Vec2::new(0.5, 0.5), 50.0);
        let outside = bench.enemy_at(Vec2::new(6.0, 0.0), 50.0);
        let mut lasso = Lasso::new(&LassoTuning::default());
        circle(&mut bench, &mut lasso, 3.0, 20);
        assert_eq!(bench.hp(inside), 42.0);
        assert_eq!(bench.hp(outside), 50.0);
        assert!(lasso.points.is_empty());
        assert!(
            bench
                .ledger
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::LassoClosed { .. }))
        );
    }

    #[test]
    fn test_short_loop_does_not_close() {
        let mut bench = Bench::new();
        let inside = bench.enemy_at(Vec2::ZERO, 50.0);
        let mut lasso = Lasso::new(&LassoTuning::default());
        // a tight circle yields too few samples between start and end
        circle(&mut bench, &mut lasso, 0.8, 10);
        assert_eq!(bench.hp(inside), 50.0);
        assert!(!lasso.points.is_empty());
    }

    #[test]
    fn test_old_points_expire() {
        let mut bench = Bench::new();
        let mut lasso = Lasso::new(&LassoTuning::default());
        for i in 0..10 {
            bench.player.pos = Vec2::new(i as f32, 0.0);
            bench.step(1.0, |ctx| lasso.tick(ctx));
        }
        // samples older than five seconds are gone
        assert!(lasso.points.len() <= 6);
        assert!(lasso.points.front().is_some_and(|p| p.t >= 4.0));
    }

    #[test]
    fn test_standing_still_adds_nothing() {
        let mut bench = Bench::new();
        let mut lasso = Lasso::new(&LassoTuning::default());
        for _ in 0..30 {
            bench.step(0.016, |ctx| lasso.tick(ctx));
        }
        assert_eq!(lasso.points.len(), 1);
    }
}
