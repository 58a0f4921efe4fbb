//! Renderer hand-off
//!
//! After each step the renderer receives a [`FrameSnapshot`]: positions
//! and orientations of everything alive, weapon overlays and HUD numbers.
//! It owns no simulation state and returns nothing.

use glam::Vec2;
use serde::Serialize;

use crate::sim::enemy::EnemyKind;
use crate::sim::pickups::PickupKind;
use crate::sim::projectile::ProjectileKind;
use crate::sim::state::{GamePhase, GameState};
use crate::sim::weapons::WeaponKind;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: f32,
    /// Flicker while invulnerable
    pub blinking: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub height: f32,
    /// Yaw toward the player
    pub yaw: f32,
    pub hit_tint: bool,
    pub elite: bool,
    pub painted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: Vec2,
}

/// Weapon overlays that have a visible shape
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeaponView {
    /// Beam length while the beam is on
    pub beam: Option<f32>,
    pub blades: Vec<Vec2>,
    pub tail: Vec<Vec2>,
    /// Wall length and width while the shield is up
    pub shield: Option<(f32, f32)>,
    pub paint: Vec<(Vec2, f32)>,
    pub lasso: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HudView {
    pub time: f32,
    /// 1-based wave number
    pub wave: u32,
    pub score: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub level: u32,
    pub xp: f32,
    pub xp_to_level: u32,
    pub weapons: Vec<(WeaponKind, u32)>,
    pub enemies_alive: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub camera_focus: Vec2,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub orbs: Vec<Vec2>,
    pub pickups: Vec<(PickupKind, Vec2)>,
    pub obstacles: Vec<Vec2>,
    pub weapons: WeaponView,
    pub hud: HudView,
    /// Level-up choices while the picker is open
    pub offer: Vec<String>,
}

impl FrameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.player;
        let now = state.time;

        let enemies = state
            .enemies
            .iter_alive()
            .map(|e| EnemyView {
                id: e.id,
                kind: e.kind,
                pos: e.pos,
                height: e.height,
                yaw: crate::direction_to_yaw(player.pos - e.pos),
                hit_tint: e.hit_tint_until > now,
                elite: e.elite,
                painted: e.painted,
            })
            .collect();

        let projectiles = state
            .projectiles
            .iter_alive()
            .map(|p| ProjectileView {
                id: p.id,
                kind: p.kind,
                pos: p.pos,
            })
            .collect();

        let drops = &state.ledger.drops;
        let arsenal = &state.arsenal;
        let weapons = WeaponView {
            beam: arsenal
                .beam
                .as_ref()
                .filter(|b| b.cycle.is_on())
                .map(|b| b.length),
            blades: arsenal
                .blades
                .as_ref()
                .filter(|b| b.cycle.is_on())
                .map(|b| b.positions(player.pos, now))
                .unwrap_or_default(),
            tail: arsenal
                .tail
                .as_ref()
                .map(|t| {
                    t.segments(
                        player.pos,
                        player.forward(),
                        player.right(),
                        player.last_move.length().min(1.0),
                        now,
                        &state.tuning.tail,
                    )
                })
                .unwrap_or_default(),
            shield: arsenal
                .shield
                .as_ref()
                .filter(|s| s.cycle.is_on())
                .map(|s| (s.length, s.width)),
            paint: arsenal
                .paint
                .as_ref()
                .map(|p| p.swaths.iter().map(|s| (s.pos, s.radius)).collect())
                .unwrap_or_default(),
            lasso: arsenal
                .lasso
                .as_ref()
                .map(|l| l.points.iter().map(|p| p.pos).collect())
                .unwrap_or_default(),
        };

        Self {
            phase: state.phase,
            camera_focus: state.camera.focus,
            player: PlayerView {
                pos: player.pos,
                facing: player.facing,
                blinking: player.invuln > 0.0,
            },
            enemies,
            projectiles,
            orbs: drops.orbs.iter_alive().map(|o| o.pos).collect(),
            pickups: drops.pickups.iter_alive().map(|p| (p.kind, p.pos)).collect(),
            obstacles: state.obstacles.box_centers(),
            weapons,
            hud: HudView {
                time: now,
                wave: state.wave() + 1,
                score: state.score(),
                hp: player.hp,
                max_hp: player.max_hp,
                level: state.progression.level,
                xp: state.progression.xp,
                xp_to_level: state.progression.xp_to_level,
                weapons: arsenal.owned().to_vec(),
                enemies_alive: state.ledger.stats.alive_enemies,
            },
            offer: if state.phase == GamePhase::LevelUp {
                state.progression.offer.iter().map(|c| c.title()).collect()
            } else {
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::Enemy;

    #[test]
    fn test_snapshot_skips_tombstones() {
        let mut state = GameState::new(11);
        for x in [2.0, 4.0] {
            let id = state.next_entity_id();
            state.add_enemy(Enemy::bare(id, EnemyKind::Slime, Vec2::new(x, 0.0), 5.0, 1.0, 0));
        }
        state.enemies.slots_mut()[0].alive = false;
        let snap = FrameSnapshot::capture(&state);
        assert_eq!(snap.enemies.len(), 1);
        assert_eq!(snap.enemies[0].pos, Vec2::new(4.0, 0.0));
        // facing the player at the origin
        assert!((snap.enemies[0].yaw + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(snap.hud.wave, 1);
        assert!(snap.offer.is_empty());
    }

    #[test]
    fn test_snapshot_shows_owned_weapon_overlays() {
        let mut state = GameState::new(12);
        state
            .arsenal
            .add(WeaponKind::TapeWhirl, &mut state.gun, &state.tuning);
        state
            .arsenal
            .add(WeaponKind::SataCableTail, &mut state.gun, &state.tuning);
        let snap = FrameSnapshot::capture(&state);
        assert_eq!(snap.weapons.blades.len(), 3);
        assert_eq!(snap.weapons.tail.len(), state.tuning.tail.segments);
        assert!(snap.weapons.beam.is_none());
        assert_eq!(snap.hud.weapons.len(), 2);
    }
}
