//! Enemy behavior engine
//!
//! Every enemy gets a direct-chase direction toward the player; its kind
//! then bends that direction and sets a speed. Hesitation, area slows,
//! boo and giant enrage layer on top as one clamped speed multiplier.

use glam::Vec2;
use rand::Rng;

use super::damage::{DamageCtx, DeathCause, kill};
use super::enemy::{
    Behavior, BomberPhase, ChargePhase, Enemy, EnemyKind, StridePhase, runner_spans,
};
use super::state::{Camera, GameState, Player};
use crate::audio::SoundCue;
use crate::tuning::{BehaviorTuning, Tuning};
use crate::{perpendicular, safe_normalize};

/// Something an enemy does to the world beyond moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    /// Replace with two runner children
    Split,
    /// Bomber blew up next to the player
    Explode,
    /// Brute ground slam centered on its position
    Slam { center: Vec2 },
}

/// Result of one behavior evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub dir: Vec2,
    /// Kind-specific speed multiplier (giant enrage)
    pub multiplier: f32,
    pub action: Option<EnemyAction>,
}

/// Read-only inputs for steering one enemy
#[derive(Debug, Clone, Copy)]
pub struct SteerCtx<'a> {
    pub now: f32,
    pub dt: f32,
    pub player_pos: Vec2,
    pub looked_at: bool,
    pub tuning: &'a BehaviorTuning,
}

/// Compute the movement direction and speed for one enemy.
///
/// Mutates `enemy.speed`, the behavior payload and (for teleporters) the
/// position. Kinds without a rule chase directly.
pub fn steer<R: Rng + ?Sized>(enemy: &mut Enemy, ctx: &SteerCtx, rng: &mut R) -> Steering {
    let b = ctx.tuning;
    let to_player = ctx.player_pos - enemy.pos;
    let dist = to_player.length();
    let mut dir = safe_normalize(to_player, Vec2::Y);
    let perp = perpendicular(dir);
    let t = enemy.time_alive;
    let mut multiplier = 1.0;
    let mut action = None;

    match (&mut enemy.behavior, enemy.kind) {
        (
            Behavior::Runner {
                phase,
                timer,
                run,
                pause,
            },
            _,
        ) => {
            let (run_span, pause_span) = runner_spans(enemy.spawn_wave, b);
            *timer += ctx.dt;
            match *phase {
                StridePhase::Running if *timer >= *run => {
                    *phase = StridePhase::Paused;
                    *timer = 0.0;
                    *pause = pause_span.sample(rng);
                }
                StridePhase::Paused if *timer >= *pause => {
                    *phase = StridePhase::Running;
                    *timer = 0.0;
                    *run = run_span.sample(rng);
                }
                _ => {}
            }
            enemy.speed = match *phase {
                StridePhase::Paused => 0.0,
                StridePhase::Running => {
                    (b.runner_base + (ctx.now * b.runner_ramp).min(b.runner_max_ramp))
                        * b.runner_scale
                }
            };
        }
        (Behavior::Chase, EnemyKind::Zigzag) => {
            dir = safe_normalize(dir + perp * (t * b.zigzag_freq).sin() * b.zigzag_amp, dir);
        }
        (Behavior::Chase, EnemyKind::Tank) => {
            // shy: crawls while watched, rushes otherwise
            enemy.speed = if ctx.looked_at {
                enemy.speed.min(b.tank_watched_speed)
            } else {
                enemy.speed.max(b.tank_unwatched_speed)
            };
        }
        (Behavior::Shooter { aggressive }, _) => {
            if *aggressive {
                if dist < b.shooter_band {
                    enemy.speed *= b.shooter_close;
                }
            } else if dist < b.shooter_preferred - b.shooter_band {
                dir = -dir;
            } else if dist <= b.shooter_preferred + b.shooter_band {
                let sign = if (t * b.shooter_strafe_freq).sin() < 0.0 {
                    -1.0
                } else {
                    1.0
                };
                dir = perp * sign;
            }
        }
        (Behavior::Chase, EnemyKind::Splitter) => {
            if enemy.hp < b.splitter_threshold {
                action = Some(EnemyAction::Split);
            }
        }
        (Behavior::Bomber { phase, dash_left }, _) => {
            match *phase {
                BomberPhase::Flank => {
                    dir = safe_normalize(dir + perp * 0.9 + dir * 0.25, dir);
                    enemy.speed = b.bomber_speed;
                    if dist < b.bomber_trigger {
                        *phase = BomberPhase::Dash;
                        *dash_left = b.bomber_dash_time;
                    }
                }
                BomberPhase::Dash => {
                    enemy.speed = b.bomber_dash_speed;
                    *dash_left -= ctx.dt;
                    if *dash_left <= 0.0 {
                        *phase = BomberPhase::Flank;
                    }
                }
            }
            if dist < b.bomber_blast {
                action = Some(EnemyAction::Explode);
            }
        }
        (Behavior::Chase, EnemyKind::Sniper) => {
            if dist < b.sniper_retreat {
                dir = -dir;
            }
        }
        (Behavior::Chase, EnemyKind::Weaver) => {
            dir = safe_normalize(dir + perp * (t * b.weaver_freq).sin() * b.weaver_amp, dir);
            enemy.speed = b.weaver_speed;
        }
        (
            Behavior::Charger {
                phase,
                timer,
                dash_left,
            },
            _,
        ) => {
            *timer += ctx.dt;
            match *phase {
                ChargePhase::Windup => {
                    enemy.speed = enemy.base_speed * 0.4;
                    if *timer > b.charger_windup {
                        *phase = ChargePhase::Dash;
                        *timer = 0.0;
                        *dash_left = b.charger_dash;
                    }
                }
                ChargePhase::Dash => {
                    enemy.speed = b.charger_dash_speed;
                    *dash_left -= ctx.dt;
                    if *dash_left <= 0.0 {
                        *phase = ChargePhase::Recover;
                        *timer = 0.0;
                    }
                }
                ChargePhase::Recover => {
                    enemy.speed = enemy.base_speed * 0.7;
                    if *timer > b.charger_recover {
                        *phase = ChargePhase::Windup;
                        *timer = 0.0;
                    }
                }
            }
        }
        (
            Behavior::Orbiter {
                orbit_dir,
                swoop_dir,
            },
            _,
        ) => {
            if dist < b.orbiter_trigger {
                if rng.random::<f32>() < b.orbiter_flip_chance {
                    *swoop_dir = -*swoop_dir;
                }
                dir = safe_normalize(dir + perp * (*swoop_dir * 0.9) + dir * 0.6, dir);
                enemy.speed = enemy.base_speed * b.orbiter_swoop;
            } else {
                dir = safe_normalize(dir + perp * (*orbit_dir * 0.9) + dir * 0.25, dir);
                enemy.speed = enemy.base_speed;
            }
        }
        (Behavior::Teleport { next_at, dash_left }, _) => {
            if ctx.now >= *next_at {
                let angle = rng.random::<f32>() * std::f32::consts::TAU;
                let radius = b.teleport_ring.sample(rng);
                enemy.pos = ctx.player_pos + Vec2::new(angle.cos(), angle.sin()) * radius;
                *next_at = ctx.now + b.teleport_next.sample(rng);
                *dash_left = b.teleport_dash;
                dir = safe_normalize(ctx.player_pos - enemy.pos, dir);
            }
            if *dash_left > 0.0 {
                *dash_left -= ctx.dt;
                enemy.speed = b.teleport_dash_speed;
            } else {
                enemy.speed = enemy.base_speed;
            }
        }
        (Behavior::Brute { next_slam_at }, _) => {
            if ctx.now >= *next_slam_at {
                action = Some(EnemyAction::Slam { center: enemy.pos });
                *next_slam_at = ctx.now + b.brute_next_slam.sample(rng);
                enemy.speed = b.brute_windup_speed;
            } else if ctx.now >= *next_slam_at - b.brute_windup {
                enemy.speed = b.brute_windup_speed;
            } else {
                enemy.speed = b.brute_speed;
            }
        }
        (
            Behavior::Giant {
                recent_hits,
                last_hit_at,
                enraged_until,
            },
            _,
        ) => {
            if *last_hit_at > ctx.now - b.giant_recent_hit {
                if *enraged_until > ctx.now {
                    multiplier = b.giant_enrage_speed;
                }
            } else {
                *recent_hits = 0;
            }
        }
        // slime, spinner and anything unmatched chase directly
        _ => {}
    }

    Steering {
        dir,
        multiplier,
        action,
    }
}

/// Combined speed multiplier, clamped to `[0, max]`
pub fn speed_multiplier(hesitation: f32, slow: f32, boo: f32, kind: f32, max: f32) -> f32 {
    (hesitation.clamp(0.0, 1.0) * slow * boo * kind).clamp(0.0, max)
}

/// Subtract player hit points with feedback. Returns true on a lethal hit.
pub fn hurt_player(player: &mut Player, amount: u32, ctx: &mut DamageCtx) -> bool {
    let lethal = player.take_damage(amount);
    ctx.ledger.cue(SoundCue::PlayerHit);
    lethal
}

fn boo_multiplier(enemy: &Enemy, camera: &Camera, tuning: &Tuning) -> f32 {
    if !enemy.boo {
        1.0
    } else if camera.is_looking_at(enemy.pos) {
        tuning.waves.boo_watched
    } else {
        tuning.waves.boo_unwatched
    }
}

/// Advance every enemy one frame: behavior, movement, obstacles, contact.
///
/// Returns true if the player died during the pass.
pub fn update_enemies(state: &mut GameState, dt: f32) -> bool {
    let now = state.time;
    let wave = state.wave();
    let frame = state.frame;
    let GameState {
        enemies,
        player,
        camera,
        obstacles,
        rng,
        ledger,
        tuning,
        options,
        ..
    } = state;
    let tuning: &Tuning = tuning;
    let kernel = if options.kernel_panic {
        tuning.waves.kernel_panic_speed
    } else {
        1.0
    };
    let far_sq = tuning.camera.far_update_distance * tuning.camera.far_update_distance;
    let contact_r = player.radius + tuning.player.enemy_contact_radius;
    let mut ctx = DamageCtx {
        now,
        wave,
        plentiful: options.plentiful_pickups,
        tuning,
        rng,
        ledger,
    };
    let mut splits: Vec<(Vec2, u32)> = Vec::new();
    let mut player_died = false;

    for enemy in enemies.slots_mut() {
        if !enemy.alive {
            continue;
        }
        if camera.contains(enemy.pos) {
            enemy.last_onscreen_at = now;
        }
        // far enemies only update on even frames
        if camera.eye().distance_squared(enemy.pos) > far_sq && frame % 2 == 1 {
            continue;
        }
        enemy.time_alive += dt;
        enemy.speed = enemy.base_speed * kernel;

        let hesitation = enemy
            .hesitation
            .advance(now, dt, &mut *ctx.rng, &tuning.hesitation);
        let steer_ctx = SteerCtx {
            now,
            dt,
            player_pos: player.pos,
            looked_at: camera.is_looking_at(enemy.pos),
            tuning: &tuning.behavior,
        };
        let steering = steer(enemy, &steer_ctx, &mut *ctx.rng);

        match steering.action {
            Some(EnemyAction::Split) => {
                if kill(enemy, DeathCause::Split, &mut ctx) {
                    splits.push((enemy.pos, enemy.spawn_wave));
                }
                continue;
            }
            Some(EnemyAction::Explode) => {
                kill(enemy, DeathCause::Exploded, &mut ctx);
                // blast ignores invulnerability
                if hurt_player(player, tuning.behavior.bomber_damage, &mut ctx) {
                    player_died = true;
                    break;
                }
                continue;
            }
            Some(EnemyAction::Slam { center }) => {
                let b = &tuning.behavior;
                let d = player.pos.distance(center);
                if d < b.brute_radius {
                    let away = safe_normalize(player.pos - center, Vec2::Y);
                    player.pos += away * ((b.brute_radius - d) * 0.15).max(0.1);
                    if hurt_player(player, b.brute_damage, &mut ctx) {
                        player_died = true;
                        break;
                    }
                }
            }
            None => {}
        }

        let elite = if enemy.elite {
            tuning.waves.elite_speed
        } else {
            1.0
        };
        let mult = speed_multiplier(
            hesitation,
            enemy.slow_factor(now),
            boo_multiplier(enemy, camera, tuning),
            steering.multiplier * elite,
            tuning.behavior.max_speed_multiplier,
        );
        enemy.pos += steering.dir * enemy.speed * mult * dt;
        obstacles.resolve_enemy(enemy, now, dt, &tuning.obstacles);

        if enemy.pos.distance_squared(player.pos) < contact_r * contact_r && player.invuln <= 0.0 {
            kill(enemy, DeathCause::Contact, &mut ctx);
            if hurt_player(player, tuning.player.contact_damage, &mut ctx) {
                player_died = true;
                break;
            }
            player.invuln = tuning.player.invuln_duration;
        }
    }

    if !player_died {
        spawn_split_children(state, &splits);
    }
    player_died
}

fn spawn_split_children(state: &mut GameState, splits: &[(Vec2, u32)]) {
    let b = state.tuning.behavior.clone();
    for &(pos, spawn_wave) in splits {
        for _ in 0..2 {
            let offset = Vec2::new(
                state.rng.random_range(-b.splitter_offset..b.splitter_offset),
                state.rng.random_range(-b.splitter_offset..b.splitter_offset),
            );
            let id = state.next_entity_id();
            let child = Enemy::spawn(
                id,
                EnemyKind::Runner,
                pos + offset,
                b.splitter_child_hp,
                b.splitter_child_speed,
                spawn_wave,
                state.time,
                &mut state.rng,
                &state.tuning,
            );
            state.add_enemy(child);
        }
        log::debug!("splitter split at ({:.1}, {:.1})", pos.x, pos.y);
    }
}
