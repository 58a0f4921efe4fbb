//! Dial-up Burst: periodic rings around the player
//!
//! A newly acquired burst waits one full interval before its first cycle.
//! The first ring of a cycle fires at once; any extra pulses go through
//! the scheduler and are resolved against the enemies alive when
//! they come due.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::WeaponCtx;
use crate::audio::SoundCue;
use crate::consts::WAVE_SECONDS;
use crate::safe_normalize;
use crate::sim::arena::Arena;
use crate::sim::damage::{DamageCtx, DamageOutcome, DamageSource, apply_damage};
use crate::sim::enemy::Enemy;
use crate::sim::schedule::Task;
use crate::sim::state::GameEvent;
use crate::tuning::ShockwaveTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub interval: f32,
    pub radius: f32,
    pub damage: f32,
    pub pulses: u32,
    timer: f32,
}

impl Shockwave {
    pub fn new(tuning: &ShockwaveTuning) -> Self {
        Self {
            interval: tuning.interval,
            radius: tuning.radius,
            damage: tuning.base_damage,
            pulses: tuning.pulses,
            timer: 0.0,
        }
    }

    pub fn level_up(&mut self, level: u32, tuning: &ShockwaveTuning) {
        self.radius = (self.radius + tuning.radius_per_level).min(tuning.max_radius);
        self.interval = (self.interval - tuning.interval_per_level).max(tuning.min_interval);
        self.damage += tuning.damage_per_level;
        if matches!(level, 2 | 4) {
            self.pulses = (self.pulses + 1).min(tuning.max_pulses);
        }
    }

    pub fn tick(&mut self, ctx: &mut WeaponCtx) {
        self.timer += ctx.dt;
        if self.timer < self.interval {
            return;
        }
        self.timer = 0.0;
        self.pulse(ctx.player.pos, ctx.enemies, &mut ctx.damage);
        let gap = ctx.damage.tuning.shockwave.pulse_gap;
        for i in 1..self.pulses {
            ctx.scheduler
                .after(ctx.damage.now, gap * i as f32, Task::ShockwavePulse);
        }
    }

    /// One ring: damage scaled by session minute, knockback and slow on survivors
    pub fn pulse(&self, center: Vec2, enemies: &mut Arena<Enemy>, ctx: &mut DamageCtx) {
        let tuning = &ctx.tuning.shockwave;
        let (min_knock, knock_scale) = (tuning.min_knockback, tuning.knockback_scale);
        let slow_until = ctx.now + tuning.slow_duration;
        let slow_factor = tuning.slow_factor;
        let amount = self.damage + (ctx.now / WAVE_SECONDS).floor();
        let radius = self.radius;

        ctx.ledger.events.push(GameEvent::Shockwave {
            pos: center,
            radius,
        });
        ctx.ledger.cue(SoundCue::Shockwave);
        for enemy in enemies.iter_alive_mut() {
            let d = enemy.pos.distance(center);
            if d >= radius {
                continue;
            }
            if apply_damage(enemy, amount, DamageSource::Area, ctx) == DamageOutcome::Wounded {
                let away = safe_normalize(enemy.pos - center, Vec2::X);
                enemy.pos += away * ((radius - d) * knock_scale).max(min_knock);
                enemy.apply_slow(slow_until, slow_factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapons::test_support::Bench;

    #[test]
    fn test_pulse_damages_knocks_and_slows() {
        let mut bench = Bench::new();
        let near = bench.enemy_at(Vec2::new(1.0, 0.0), 50.0);
        let far = bench.enemy_at(Vec2::new(4.0, 0.0), 50.0);
        let mut wave = Shockwave::new(&ShockwaveTuning::default());
        bench.now = 125.0;
        bench.step(3.0, |ctx| wave.tick(ctx));
        // 5 base + 2 for the third minute
        assert_eq!(bench.hp(near), 43.0);
        let e = &bench.enemies.slots()[near];
        assert!((e.pos.x - 1.176).abs() < 1e-4);
        assert_eq!(e.slow_factor(125.1), 0.6);
        assert_eq!(e.slow_factor(126.0), 1.0);
        assert_eq!(bench.hp(far), 50.0);
        assert!(bench.ledger.events.contains(&GameEvent::Cue(SoundCue::Shockwave)));
    }

    #[test]
    fn test_extra_pulses_are_scheduled() {
        let mut bench = Bench::new();
        let tuning = ShockwaveTuning::default();
        let mut wave = Shockwave::new(&tuning);
        wave.level_up(2, &tuning);
        assert_eq!(wave.pulses, 2);
        bench.step(3.0, |ctx| wave.tick(ctx));
        assert_eq!(bench.scheduler.due_of(Task::ShockwavePulse), Some(0.18));
    }

    #[test]
    fn test_waits_for_interval() {
        let mut bench = Bench::new();
        let near = bench.enemy_at(Vec2::new(1.0, 0.0), 50.0);
        let mut wave = Shockwave::new(&ShockwaveTuning::default());
        for _ in 0..11 {
            bench.step(0.25, |ctx| wave.tick(ctx));
        }
        assert_eq!(bench.hp(near), 50.0);
        // twelfth quarter second completes the 3 s interval
        bench.step(0.25, |ctx| wave.tick(ctx));
        assert_eq!(bench.hp(near), 45.0);
    }
}
