//! XP orbs and pickups
//!
//! Unit XP drops as an orb; larger values drop as an XP bundle pickup.
//! Both are pulled in by the magnet (and by an active vacuum) and are
//! collected inside the pickup radius.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Tombstone};
use super::state::IdAllocator;
use crate::safe_normalize;
use crate::tuning::{DropTuning, XP_VALUES};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpOrb {
    pub id: u32,
    pub pos: Vec2,
    pub alive: bool,
}

impl Tombstone for XpOrb {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Heal,
    Xp(u32),
    Vacuum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
    pub alive: bool,
    pub kind: PickupKind,
}

impl Tombstone for Pickup {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// What the player picked up this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collected {
    Xp(u32),
    Heal,
    Vacuum,
}

/// Pick an XP value from the wave-keyed odds table
pub fn roll_xp_value<R: Rng + ?Sized>(wave: u32, rng: &mut R, tuning: &DropTuning) -> u32 {
    let Some(row) = tuning
        .xp_odds
        .iter()
        .rev()
        .find(|row| wave >= row.from_wave)
        .or(tuning.xp_odds.first())
    else {
        return XP_VALUES[0];
    };
    let roll: f32 = rng.random();
    let mut acc = 0.0;
    for (odds, value) in row.odds.iter().zip(XP_VALUES) {
        acc += odds;
        if roll < acc {
            return value;
        }
    }
    XP_VALUES[XP_VALUES.len() - 1]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drops {
    pub orbs: Arena<XpOrb>,
    pub pickups: Arena<Pickup>,
    pub magnet_radius: f32,
    pub vacuum_until: f32,
}

impl Default for Drops {
    fn default() -> Self {
        Self::new(&DropTuning::default())
    }
}

impl Drops {
    pub fn new(tuning: &DropTuning) -> Self {
        Self {
            orbs: Arena::new(),
            pickups: Arena::new(),
            magnet_radius: tuning.magnet_radius,
            vacuum_until: 0.0,
        }
    }

    /// Drop `value` XP: an orb for 1, a bundle pickup otherwise
    pub fn spawn_xp(&mut self, ids: &mut IdAllocator, pos: Vec2, value: u32) {
        let id = ids.next_id();
        if value <= 1 {
            self.orbs.push(XpOrb {
                id,
                pos,
                alive: true,
            });
        } else {
            self.pickups.push(Pickup {
                id,
                pos,
                alive: true,
                kind: PickupKind::Xp(value),
            });
        }
    }

    /// Drop XP with a value rolled for the current wave
    pub fn spawn_rolled_xp<R: Rng + ?Sized>(
        &mut self,
        ids: &mut IdAllocator,
        rng: &mut R,
        pos: Vec2,
        wave: u32,
        tuning: &DropTuning,
    ) {
        let value = roll_xp_value(wave, rng, tuning);
        self.spawn_xp(ids, pos, value);
    }

    /// Bonus drop: vacuum, heal or rolled XP
    pub fn drop_pickup<R: Rng + ?Sized>(
        &mut self,
        ids: &mut IdAllocator,
        rng: &mut R,
        pos: Vec2,
        wave: u32,
        plentiful: bool,
        tuning: &DropTuning,
    ) {
        let (vacuum, heal) = if plentiful {
            (tuning.vacuum_chance_plentiful, tuning.heal_chance_plentiful)
        } else {
            (tuning.vacuum_chance, tuning.heal_chance)
        };
        let roll: f32 = rng.random();
        let kind = if roll < vacuum {
            PickupKind::Vacuum
        } else if roll < vacuum + heal {
            PickupKind::Heal
        } else {
            self.spawn_rolled_xp(ids, rng, pos, wave, tuning);
            return;
        };
        self.pickups.push(Pickup {
            id: ids.next_id(),
            pos,
            alive: true,
            kind,
        });
    }

    pub fn vacuum_active(&self, now: f32) -> bool {
        self.vacuum_until > now
    }

    /// Pull drops toward the player and collect the ones in reach
    pub fn update(
        &mut self,
        player_pos: Vec2,
        player_radius: f32,
        now: f32,
        dt: f32,
        tuning: &DropTuning,
    ) -> Vec<Collected> {
        let vacuum = self.vacuum_active(now);
        let magnet = self.magnet_radius;
        let reach = player_radius + tuning.pickup_radius;
        let pull = |pos: &mut Vec2| {
            let to_player = player_pos - *pos;
            let d = to_player.length();
            let dir = safe_normalize(to_player, Vec2::ZERO);
            let step = if vacuum {
                (tuning.vacuum_pull + d * 2.0) * dt
            } else if d < magnet {
                (magnet - d + 0.4) * tuning.magnet_strength * dt
            } else {
                0.0
            };
            // never overshoot past the player
            *pos += dir * step.min(d);
        };

        let mut collected = Vec::new();
        for orb in self.orbs.iter_alive_mut() {
            pull(&mut orb.pos);
            if orb.pos.distance_squared(player_pos) < reach * reach {
                orb.alive = false;
                collected.push(Collected::Xp(1));
            }
        }
        for p in self.pickups.iter_alive_mut() {
            if let PickupKind::Xp(_) = p.kind {
                pull(&mut p.pos);
            }
            if p.pos.distance_squared(player_pos) < reach * reach {
                p.alive = false;
                collected.push(match p.kind {
                    PickupKind::Xp(v) => Collected::Xp(v),
                    PickupKind::Heal => Collected::Heal,
                    PickupKind::Vacuum => Collected::Vacuum,
                });
            }
        }
        collected
    }

    /// Orb-only magnet used while a level-up choice is open
    pub fn magnet_tail(&mut self, player_pos: Vec2, dt: f32, tuning: &DropTuning) {
        let magnet = self.magnet_radius;
        for orb in self.orbs.iter_alive_mut() {
            let to_player = player_pos - orb.pos;
            let d = to_player.length();
            if d < magnet {
                let step = ((magnet - d + 0.4) * tuning.magnet_strength * dt).min(d);
                orb.pos += safe_normalize(to_player, Vec2::ZERO) * step;
            }
        }
    }

    pub fn compact(&mut self) {
        self.orbs.compact();
        self.pickups.compact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_wave_zero_only_small_values() {
        let tuning = DropTuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..500 {
            let v = roll_xp_value(0, &mut rng, &tuning);
            assert!(v == 1 || v == 3, "unexpected value {v}");
        }
    }

    #[test]
    fn test_late_waves_can_roll_twenty() {
        let tuning = DropTuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let rolled: Vec<u32> = (0..2000).map(|_| roll_xp_value(16, &mut rng, &tuning)).collect();
        assert!(rolled.contains(&20));
        assert!(rolled.contains(&10));
    }

    #[test]
    fn test_unit_xp_becomes_orb() {
        let mut drops = Drops::default();
        let mut ids = IdAllocator::default();
        drops.spawn_xp(&mut ids, Vec2::ZERO, 1);
        drops.spawn_xp(&mut ids, Vec2::ZERO, 5);
        assert_eq!(drops.orbs.len(), 1);
        assert_eq!(drops.pickups.len(), 1);
        assert_eq!(drops.pickups.slots()[0].kind, PickupKind::Xp(5));
    }

    #[test]
    fn test_magnet_pulls_then_collects() {
        let tuning = DropTuning::default();
        let mut drops = Drops::default();
        let mut ids = IdAllocator::default();
        drops.spawn_xp(&mut ids, Vec2::new(1.9, 0.0), 1);
        let mut got = Vec::new();
        for _ in 0..60 {
            got.extend(drops.update(Vec2::ZERO, 0.6, 0.0, 0.016, &tuning));
        }
        assert_eq!(got, vec![Collected::Xp(1)]);
    }

    #[test]
    fn test_orb_outside_magnet_stays() {
        let tuning = DropTuning::default();
        let mut drops = Drops::default();
        let mut ids = IdAllocator::default();
        drops.spawn_xp(&mut ids, Vec2::new(8.0, 0.0), 1);
        drops.update(Vec2::ZERO, 0.6, 0.0, 0.016, &tuning);
        assert_eq!(drops.orbs.slots()[0].pos, Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_vacuum_pulls_from_anywhere() {
        let tuning = DropTuning::default();
        let mut drops = Drops::default();
        let mut ids = IdAllocator::default();
        drops.spawn_xp(&mut ids, Vec2::new(30.0, 0.0), 10);
        drops.vacuum_until = 3.0;
        let mut got = Vec::new();
        for i in 0..120 {
            got.extend(drops.update(Vec2::ZERO, 0.6, i as f32 * 0.016, 0.016, &tuning));
        }
        assert_eq!(got, vec![Collected::Xp(10)]);
    }
}
