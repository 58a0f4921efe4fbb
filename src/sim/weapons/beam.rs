//! CRT Beam: a flickering cone in front of the player

use serde::{Deserialize, Serialize};

use super::{DutyCycle, WeaponCtx};
use crate::safe_normalize;
use crate::sim::damage::{DamageSource, apply_damage};
use crate::tuning::BeamTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub length: f32,
    pub dps: f32,
    pub cycle: DutyCycle,
}

impl Beam {
    pub fn new(tuning: &BeamTuning) -> Self {
        Self {
            length: tuning.length,
            dps: tuning.dps,
            cycle: DutyCycle::new(tuning.on, tuning.off),
        }
    }

    pub fn level_up(&mut self, tuning: &BeamTuning) {
        self.length += tuning.length_per_level;
        self.dps += tuning.dps_per_level;
        self.cycle.off = (self.cycle.off - tuning.off_per_level).max(tuning.min_off);
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        if !self.cycle.advance(ctx.dt) {
            return;
        }
        let cone = ctx.damage.tuning.beam.cone_dot;
        let origin = ctx.player.pos;
        let forward = ctx.player.forward();
        let amount = self.dps * ctx.dt;
        for enemy in ctx.enemies.iter_alive_mut() {
            let to_enemy = enemy.pos - origin;
            if to_enemy.length_squared() > self.length * self.length {
                continue;
            }
            if forward.dot(safe_normalize(to_enemy, forward)) > cone {
                apply_damage(enemy, amount, DamageSource::Beam, &mut ctx.damage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapons::test_support::Bench;
    use glam::Vec2;

    #[test]
    fn test_beam_hits_cone_only() {
        let mut bench = Bench::new();
        let ahead = bench.enemy_at(Vec2::new(0.0, 4.0), 50.0);
        let beside = bench.enemy_at(Vec2::new(3.0, 3.0), 50.0);
        let beyond = bench.enemy_at(Vec2::new(0.0, 6.5), 50.0);
        let mut beam = Beam::new(&BeamTuning::default());
        bench.step(0.1, |ctx| beam.tick(ctx));
        assert!((bench.hp(ahead) - 49.4).abs() < 1e-4);
        assert_eq!(bench.hp(beside), 50.0);
        assert_eq!(bench.hp(beyond), 50.0);
    }

    #[test]
    fn test_beam_idle_while_off() {
        let mut bench = Bench::new();
        let ahead = bench.enemy_at(Vec2::new(0.0, 2.0), 50.0);
        let mut beam = Beam::new(&BeamTuning::default());
        // run out the on phase
        bench.step(1.2, |ctx| beam.tick(ctx));
        let after_on = bench.hp(ahead);
        bench.step(0.3, |ctx| beam.tick(ctx));
        assert_eq!(bench.hp(ahead), after_on);
    }

    #[test]
    fn test_beam_level_up_floors_off_time() {
        let tuning = BeamTuning::default();
        let mut beam = Beam::new(&tuning);
        for _ in 0..10 {
            beam.level_up(&tuning);
        }
        assert_eq!(beam.cycle.off, 0.5);
        assert_eq!(beam.length, 16.0);
        assert_eq!(beam.dps, 26.0);
    }
}
