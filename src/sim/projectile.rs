//! Bullets and homing rockets
//!
//! Projectiles are swept against enemies along the segment they travel
//! each frame, using the spatial grid to narrow candidates.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, Tombstone};
use super::collision::sweep_segment_vs_point;
use super::damage::{DamageCtx, DamageOutcome, DamageSource, apply_damage};
use super::enemy::Enemy;
use super::obstacles::ObstacleField;
use super::spatial::SpatialGrid;
use super::state::GameEvent;
use crate::safe_normalize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Bullet,
    Side,
    /// Re-targets the nearest enemy every frame, explodes on impact
    Rocket { speed: f32, turn: f32, blast: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub prev: Vec2,
    pub vel: Vec2,
    pub ttl: f32,
    pub damage: f32,
    /// Extra enemies this projectile may pass through
    pub pierce: u32,
    pub alive: bool,
    /// Enemies already struck, so a piercing shot never double-hits
    #[serde(skip)]
    pub struck: Vec<u32>,
}

impl Tombstone for Projectile {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl Projectile {
    pub fn new(
        id: u32,
        kind: ProjectileKind,
        pos: Vec2,
        vel: Vec2,
        ttl: f32,
        damage: f32,
        pierce: u32,
    ) -> Self {
        Self {
            id,
            kind,
            pos,
            prev: pos,
            vel,
            ttl,
            damage,
            pierce,
            alive: true,
            struck: Vec::new(),
        }
    }

    fn source(&self) -> DamageSource {
        match self.kind {
            ProjectileKind::Rocket { .. } => DamageSource::RocketHit,
            _ => DamageSource::Bullet,
        }
    }
}

/// Sweep parameters shared by every projectile
#[derive(Debug, Clone, Copy)]
pub struct SweepParams {
    pub hit_radius: f32,
    pub grid_margin: f32,
}

/// Advance every projectile one frame and resolve hits
pub fn advance_projectiles(
    projectiles: &mut Arena<Projectile>,
    enemies: &mut Arena<Enemy>,
    grid: &SpatialGrid,
    obstacles: &ObstacleField,
    params: SweepParams,
    dt: f32,
    ctx: &mut DamageCtx,
) {
    for p in projectiles.iter_alive_mut() {
        p.ttl -= dt;
        if p.ttl <= 0.0 {
            p.alive = false;
            continue;
        }
        p.prev = p.pos;
        if let ProjectileKind::Rocket { speed, turn, .. } = p.kind {
            steer_rocket(p, enemies, speed, turn);
        }
        p.pos += p.vel * dt;

        if obstacles.blocks_point(p.pos) {
            p.alive = false;
            continue;
        }

        let mut candidates = grid.candidates_for_segment(p.prev, p.pos, params.grid_margin);
        sort_along_segment(&mut candidates, enemies, p.prev, p.pos);
        for index in candidates {
            let Some(enemy) = enemies.get_mut(index) else {
                continue;
            };
            if !enemy.alive || p.struck.contains(&enemy.id) {
                continue;
            }
            if !sweep_segment_vs_point(p.prev, p.pos, enemy.pos, params.hit_radius) {
                continue;
            }
            p.struck.push(enemy.id);
            apply_damage(enemy, p.damage, p.source(), ctx);
            if p.pierce > 0 {
                p.pierce -= 1;
            } else {
                p.alive = false;
                if let ProjectileKind::Rocket { blast, .. } = p.kind {
                    explode(p.pos, blast, p.damage, enemies, grid, ctx);
                }
                break;
            }
        }
    }
}

/// Order candidates by where they sit along `a -> b`, so the first enemy
/// the projectile reaches takes the hit
fn sort_along_segment(candidates: &mut [usize], enemies: &Arena<Enemy>, a: Vec2, b: Vec2) {
    let seg = b - a;
    let along = |index: usize| {
        enemies
            .get(index)
            .map_or(f32::INFINITY, |e| (e.pos - a).dot(seg))
    };
    candidates.sort_by(|&i, &j| along(i).total_cmp(&along(j)));
}

/// Turn toward the nearest alive enemy by a lerp factor
fn steer_rocket(p: &mut Projectile, enemies: &Arena<Enemy>, speed: f32, turn: f32) {
    let nearest = enemies
        .iter_alive()
        .min_by(|a, b| {
            a.pos
                .distance_squared(p.pos)
                .total_cmp(&b.pos.distance_squared(p.pos))
        })
        .map(|e| e.pos);
    if let Some(target) = nearest {
        let desired = safe_normalize(target - p.pos, safe_normalize(p.vel, Vec2::Y)) * speed;
        p.vel = p.vel.lerp(desired, turn.clamp(0.0, 1.0));
    }
}

/// Rocket blast: reduced damage to everything inside, knockback on survivors
pub fn explode(
    center: Vec2,
    radius: f32,
    base_damage: f32,
    enemies: &mut Arena<Enemy>,
    grid: &SpatialGrid,
    ctx: &mut DamageCtx,
) {
    ctx.ledger.events.push(GameEvent::Explosion { pos: center, radius });
    let damage = (base_damage * 0.8).ceil();
    for index in grid.candidates_near(center, radius) {
        let Some(enemy) = enemies.get_mut(index) else {
            continue;
        };
        if !enemy.alive {
            continue;
        }
        let d = enemy.pos.distance(center);
        if d > radius {
            continue;
        }
        if apply_damage(enemy, damage, DamageSource::Rocket, ctx) == DamageOutcome::Wounded {
            let away = safe_normalize(enemy.pos - center, Vec2::X);
            enemy.pos += away * ((radius - d) * 0.05).max(0.08);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::state::Ledger;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const PARAMS: SweepParams = SweepParams {
        hit_radius: 0.55,
        grid_margin: 0.6,
    };

    /// A column of tough enemies along +x, one unit apart
    fn column(n: u32) -> Arena<Enemy> {
        let mut arena = Arena::new();
        for i in 0..n {
            arena.push(Enemy::bare(i + 1, EnemyKind::Tank, Vec2::new(2.0 + i as f32, 0.0), 50.0, 0.0, 0));
        }
        arena
    }

    fn run(projectile: Projectile, enemies: &mut Arena<Enemy>, frames: u32) -> Arena<Projectile> {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ledger = Ledger::default();
        let mut grid = SpatialGrid::default();
        let obstacles = ObstacleField::open();
        let mut projectiles = Arena::new();
        projectiles.push(projectile);
        for _ in 0..frames {
            grid.rebuild(enemies);
            let mut ctx = DamageCtx {
                now: 0.0,
                wave: 0,
                plentiful: false,
                tuning: &tuning,
                rng: &mut rng,
                ledger: &mut ledger,
            };
            advance_projectiles(&mut projectiles, enemies, &grid, &obstacles, PARAMS, 0.016, &mut ctx);
        }
        projectiles
    }

    fn bullet(pierce: u32) -> Projectile {
        Projectile::new(1, ProjectileKind::Bullet, Vec2::ZERO, Vec2::new(14.0, 0.0), 1.6, 1.0, pierce)
    }

    fn hits(enemies: &Arena<Enemy>) -> usize {
        enemies.slots().iter().filter(|e| e.hp < 50.0).count()
    }

    #[test]
    fn test_no_pierce_destroyed_on_first_hit() {
        let mut enemies = column(4);
        let ps = run(bullet(0), &mut enemies, 60);
        assert!(!ps.slots()[0].alive);
        assert_eq!(hits(&enemies), 1);
    }

    #[test]
    fn test_pierce_two_survives_two_hits() {
        let mut enemies = column(4);
        // far enough to pass the first two enemies but not the third
        let ps = run(bullet(2), &mut enemies, 14);
        assert_eq!(hits(&enemies), 2);
        assert!(ps.slots()[0].alive);
        assert_eq!(ps.slots()[0].pierce, 0);

        let ps = run(bullet(2), &mut column(4), 60);
        assert!(!ps.slots()[0].alive);
    }

    #[test]
    fn test_pierce_two_destroyed_on_third_hit() {
        let mut enemies = column(4);
        run(bullet(2), &mut enemies, 60);
        assert_eq!(hits(&enemies), 3);
    }

    #[test]
    fn test_fast_bullet_does_not_tunnel() {
        // one frame covers 4 units, the target sits mid-segment
        let mut enemies = column(1);
        let fast = Projectile::new(1, ProjectileKind::Bullet, Vec2::ZERO, Vec2::new(250.0, 0.0), 1.6, 1.0, 0);
        run(fast, &mut enemies, 1);
        assert_eq!(hits(&enemies), 1);
    }

    #[test]
    fn test_nearest_enemy_on_the_sweep_is_hit_first() {
        let mut enemies = Arena::new();
        // the farther enemy occupies the lower slot
        enemies.push(Enemy::bare(1, EnemyKind::Tank, Vec2::new(3.0, 0.0), 50.0, 0.0, 0));
        enemies.push(Enemy::bare(2, EnemyKind::Tank, Vec2::new(1.5, 0.0), 50.0, 0.0, 0));
        let fast = Projectile::new(1, ProjectileKind::Bullet, Vec2::ZERO, Vec2::new(250.0, 0.0), 1.6, 1.0, 0);
        run(fast, &mut enemies, 1);
        assert_eq!(enemies.slots()[0].hp, 50.0);
        assert_eq!(enemies.slots()[1].hp, 49.0);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut enemies = Arena::new();
        let ps = run(bullet(0), &mut enemies, 101);
        assert!(!ps.slots()[0].alive);
    }

    #[test]
    fn test_rocket_homes_toward_enemy() {
        let mut enemies = Arena::new();
        enemies.push(Enemy::bare(1, EnemyKind::Tank, Vec2::new(0.0, 6.0), 50.0, 0.0, 0));
        let rocket = Projectile::new(
            1,
            ProjectileKind::Rocket {
                speed: 3.5,
                turn: 0.15,
                blast: 2.6,
            },
            Vec2::ZERO,
            Vec2::new(3.5, 0.0),
            5.0,
            3.0,
            0,
        );
        let ps = run(rocket, &mut enemies, 10);
        let vel = ps.slots()[0].vel;
        assert!(vel.y > vel.x, "rocket should have turned toward +z, vel {vel}");
    }

    #[test]
    fn test_rocket_blast_hits_neighbors() {
        let mut enemies = column(3);
        let rocket = Projectile::new(
            1,
            ProjectileKind::Rocket {
                speed: 3.5,
                turn: 0.0,
                blast: 2.6,
            },
            Vec2::ZERO,
            Vec2::new(14.0, 0.0),
            5.0,
            3.0,
            0,
        );
        run(rocket, &mut enemies, 20);
        // direct hit (3) plus blast ceil(2.4) = 3 on the first, blast only on the rest
        assert_eq!(enemies.slots()[0].hp, 44.0);
        assert_eq!(enemies.slots()[1].hp, 47.0);
        assert_eq!(enemies.slots()[2].hp, 47.0);
    }
}
