//! Primary gun: multishot volleys, burst sub-shots and side bullets

use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::sim::arena::Arena;
use crate::sim::projectile::{Projectile, ProjectileKind};
use crate::sim::state::{Ledger, Player};
use crate::tuning::{DotMatrixTuning, GunTuning};
use crate::{direction_to_yaw, yaw_to_forward};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gun {
    pub fire_interval: f32,
    timer: f32,
    pub multishot: u32,
    /// Volleys per trigger, spaced by the burst delay
    pub burst: u32,
    pub damage: f32,
    pub pierce: u32,
    /// Granted by Dot Matrix
    pub side_bullets: bool,
    pub side_multiplier: f32,
}

impl Gun {
    pub fn new(tuning: &GunTuning, dot_matrix: &DotMatrixTuning) -> Self {
        Self {
            fire_interval: tuning.fire_interval,
            timer: 0.0,
            multishot: 1,
            burst: 1,
            damage: tuning.damage,
            pierce: tuning.pierce,
            side_bullets: false,
            side_multiplier: dot_matrix.damage_multiplier,
        }
    }

    /// Advance the cooldown. Returns true when the trigger should fire now.
    pub fn ready(&mut self, dt: f32, firing: bool) -> bool {
        self.timer += dt;
        if firing && self.timer >= self.fire_interval {
            self.timer = 0.0;
            true
        } else {
            false
        }
    }

    /// One volley of `multishot` bullets fanned around the facing direction
    pub fn volley(
        &self,
        player: &Player,
        projectiles: &mut Arena<Projectile>,
        ledger: &mut Ledger,
        tuning: &GunTuning,
    ) {
        let forward = player.forward();
        let muzzle = player.pos + forward * tuning.muzzle_offset;
        let yaw = direction_to_yaw(forward);
        let count = self.multishot.max(1);
        let center = (count - 1) as f32 / 2.0;
        for i in 0..count {
            let dir = yaw_to_forward(yaw + (i as f32 - center) * tuning.spread);
            projectiles.push(Projectile::new(
                ledger.ids.next_id(),
                ProjectileKind::Bullet,
                muzzle + dir * 0.12,
                dir * tuning.bullet_speed,
                tuning.bullet_ttl,
                self.damage,
                self.pierce,
            ));
        }
        ledger.cue(SoundCue::Shoot);
    }

    /// Left and right side bullets
    pub fn fire_sides(
        &self,
        player: &Player,
        projectiles: &mut Arena<Projectile>,
        ledger: &mut Ledger,
        tuning: &GunTuning,
    ) {
        let muzzle = player.pos + player.forward() * tuning.muzzle_offset;
        let right = player.right();
        for dir in [right, -right] {
            projectiles.push(Projectile::new(
                ledger.ids.next_id(),
                ProjectileKind::Side,
                muzzle,
                dir * tuning.side_bullet_speed,
                tuning.bullet_ttl,
                self.damage * self.side_multiplier,
                self.pierce,
            ));
        }
    }

    /// Fire everything the trigger releases at once; extra burst volleys
    /// are returned as delays for the caller to schedule.
    pub fn trigger(
        &self,
        player: &Player,
        projectiles: &mut Arena<Projectile>,
        ledger: &mut Ledger,
        tuning: &GunTuning,
    ) -> Vec<f32> {
        self.volley(player, projectiles, ledger, tuning);
        if self.side_bullets {
            self.fire_sides(player, projectiles, ledger, tuning);
        }
        (1..self.burst).map(|b| b as f32 * tuning.burst_delay).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::PlayerTuning;

    fn setup() -> (Gun, Player, Arena<Projectile>, Ledger, GunTuning) {
        let tuning = GunTuning::default();
        (
            Gun::new(&tuning, &DotMatrixTuning::default()),
            Player::new(&PlayerTuning::default()),
            Arena::new(),
            Ledger::default(),
            tuning,
        )
    }

    #[test]
    fn test_cooldown_gates_fire() {
        let (mut gun, ..) = setup();
        assert!(!gun.ready(0.3, true));
        assert!(gun.ready(0.3, true));
        assert!(!gun.ready(0.6, false));
        // cooldown kept charging while the trigger was up
        assert!(gun.ready(0.0, true));
    }

    #[test]
    fn test_multishot_fans_symmetrically() {
        let (mut gun, player, mut ps, mut ledger, tuning) = setup();
        gun.multishot = 3;
        gun.volley(&player, &mut ps, &mut ledger, &tuning);
        let xs: Vec<f32> = ps.slots().iter().map(|p| p.vel.x).collect();
        assert_eq!(xs.len(), 3);
        assert!((xs[0] + xs[2]).abs() < 1e-4);
        assert!(xs[1].abs() < 1e-6);
        for p in ps.slots() {
            assert!((p.vel.length() - 14.0).abs() < 1e-3);
            assert_eq!(p.kind, ProjectileKind::Bullet);
        }
        assert!(ledger.events.contains(&crate::sim::state::GameEvent::Cue(SoundCue::Shoot)));
    }

    #[test]
    fn test_trigger_with_burst_and_sides() {
        let (mut gun, player, mut ps, mut ledger, tuning) = setup();
        gun.burst = 3;
        gun.side_bullets = true;
        gun.side_multiplier = 1.4;
        let later = gun.trigger(&player, &mut ps, &mut ledger, &tuning);
        assert_eq!(later.len(), 2);
        assert!((later[1] - 0.1).abs() < 1e-6);
        let sides: Vec<&Projectile> = ps
            .slots()
            .iter()
            .filter(|p| p.kind == ProjectileKind::Side)
            .collect();
        assert_eq!(sides.len(), 2);
        assert!((sides[0].damage - 1.4).abs() < 1e-6);
        assert!((sides[0].vel + sides[1].vel).length() < 1e-4);
    }
}
