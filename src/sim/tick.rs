//! Per-frame simulation step
//!
//! Core game loop. One call advances the run by a clamped timestep in a
//! fixed order: player, aim, primary fire, deferred tasks, weapons,
//! waves, enemies, spatial index, projectiles, drops, culling and finally
//! compaction of everything tombstoned during the frame.

use glam::Vec2;

use super::behavior::update_enemies;
use super::damage::DamageCtx;
use super::pickups::Collected;
use super::progression::open_level_up;
use super::projectile::{SweepParams, advance_projectiles};
use super::schedule::Task;
use super::state::{GameEvent, GamePhase, GameState};
use super::waves::{cull_stale, cull_wave, spawn_for_minute, update_waves};
use super::weapons::WeaponCtx;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::direction_to_yaw;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction, magnitude 0..1
    pub move_vec: Vec2,
    /// Resolved aim direction; `None` holds the last facing
    pub aim: Option<Vec2>,
    /// Fire held (ignored while auto-fire is on)
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Effective timestep for a wall-clock gap: never negative, never above
/// [`MAX_FRAME_DT`]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    let dt = clamp_dt(dt);

    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        GamePhase::LevelUp => {
            level_up_tail(state, dt);
            return;
        }
        GamePhase::Playing => {}
    }

    state.frame += 1;
    state.time += dt;

    move_player(state, input, dt);
    if let Some(aim) = input.aim.filter(|a| a.is_finite() && a.length_squared() > 1e-6) {
        state.player.facing = direction_to_yaw(aim);
    }
    fire_primary(state, input, dt);
    run_deferred(state);
    run_weapons(state, dt);
    update_waves(state, dt);

    if update_enemies(state, dt) {
        end_run(state);
        compact(state);
        return;
    }

    state.grid.rebuild(&state.enemies);
    run_projectiles(state, dt);
    collect_drops(state, dt);
    cull_stale(state);
    compact(state);
    open_level_up(state);
}

fn move_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let mv = if input.move_vec.is_finite() {
        input.move_vec.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };
    let player = &mut state.player;
    player.last_move = mv;
    player.pos += mv * player.speed * dt;
    player.pos = state
        .obstacles
        .resolve_circle(player.pos, player.radius, &state.tuning.obstacles);
    player.invuln = (player.invuln - dt).max(0.0);
    state.camera.follow(player.pos);
}

fn fire_primary(state: &mut GameState, input: &TickInput, dt: f32) {
    let firing = state.options.auto_fire || input.fire;
    if !state.gun.ready(dt, firing) {
        return;
    }
    let later = state.gun.trigger(
        &state.player,
        &mut state.projectiles,
        &mut state.ledger,
        &state.tuning.gun,
    );
    for delay in later {
        state.scheduler.after(state.time, delay, Task::Volley);
    }
}

/// Run every deferred task that came due. Each one re-checks that what
/// it acts on still exists.
fn run_deferred(state: &mut GameState) {
    for task in state.scheduler.drain_due(state.time) {
        match task {
            Task::Volley => state.gun.volley(
                &state.player,
                &mut state.projectiles,
                &mut state.ledger,
                &state.tuning.gun,
            ),
            Task::SpawnEnemy { minute } => {
                spawn_for_minute(state, minute);
            }
            Task::CullWave { wave } => {
                cull_wave(state, wave);
            }
            Task::ShockwavePulse => {
                let now = state.time;
                let wave = state.wave();
                let GameState {
                    arsenal,
                    player,
                    enemies,
                    rng,
                    ledger,
                    tuning,
                    options,
                    ..
                } = &mut *state;
                if let Some(shockwave) = arsenal.shockwave.as_ref() {
                    let mut ctx = DamageCtx {
                        now,
                        wave,
                        plentiful: options.plentiful_pickups,
                        tuning,
                        rng,
                        ledger,
                    };
                    shockwave.pulse(player.pos, enemies, &mut ctx);
                }
            }
            Task::LaunchRocket => {
                if let Some(rocket) = state.arsenal.rocket.as_ref() {
                    rocket.launch(
                        &state.player,
                        &mut state.projectiles,
                        &mut state.ledger.ids,
                        &state.tuning.gun,
                        &state.tuning.rocket,
                    );
                }
            }
        }
    }
}

fn run_weapons(state: &mut GameState, dt: f32) {
    let now = state.time;
    let wave = state.wave();
    let GameState {
        player,
        enemies,
        projectiles,
        scheduler,
        arsenal,
        rng,
        ledger,
        tuning,
        options,
        ..
    } = state;
    let mut ctx = WeaponCtx {
        dt,
        player,
        enemies,
        projectiles,
        scheduler,
        damage: DamageCtx {
            now,
            wave,
            plentiful: options.plentiful_pickups,
            tuning,
            rng,
            ledger,
        },
    };
    arsenal.tick(&mut ctx);
}

fn run_projectiles(state: &mut GameState, dt: f32) {
    let now = state.time;
    let wave = state.wave();
    let params = SweepParams {
        hit_radius: state.tuning.gun.hit_radius,
        grid_margin: state.tuning.gun.grid_margin,
    };
    let GameState {
        projectiles,
        enemies,
        grid,
        obstacles,
        rng,
        ledger,
        tuning,
        options,
        ..
    } = state;
    let mut ctx = DamageCtx {
        now,
        wave,
        plentiful: options.plentiful_pickups,
        tuning,
        rng,
        ledger,
    };
    advance_projectiles(projectiles, enemies, grid, obstacles, params, dt, &mut ctx);
}

fn collect_drops(state: &mut GameState, dt: f32) {
    let now = state.time;
    let collected = state.ledger.drops.update(
        state.player.pos,
        state.player.radius,
        now,
        dt,
        &state.tuning.drops,
    );
    for item in collected {
        state.ledger.cue(SoundCue::Pickup);
        match item {
            Collected::Xp(value) => {
                state.progression.gain_xp(value);
            }
            Collected::Heal => {
                let amount =
                    (state.player.max_hp as f32 * state.tuning.drops.heal_fraction).ceil() as u32;
                state.player.heal(amount);
            }
            Collected::Vacuum => {
                state.ledger.drops.vacuum_until = now + state.tuning.drops.vacuum_duration;
            }
        }
    }
}

/// Orbs keep drifting in for a moment after the level-up screen opens
fn level_up_tail(state: &mut GameState, dt: f32) {
    if state.level_up_tail <= 0.0 {
        return;
    }
    state.level_up_tail -= dt;
    state
        .ledger
        .drops
        .magnet_tail(state.player.pos, dt, &state.tuning.drops);
}

fn compact(state: &mut GameState) {
    state.enemies.compact();
    state.projectiles.compact();
    state.ledger.drops.compact();
}

fn end_run(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    state.ledger.events.push(GameEvent::PlayerDied);
    state.ledger.cue(SoundCue::Death);
    log::info!(
        "Run over at {:.1}s, wave {}, score {}",
        state.time,
        state.wave() + 1,
        state.score()
    );
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::sim::enemy::{Enemy, EnemyKind};
    use crate::sim::progression::apply_choice;
    use crate::sim::weapons::WeaponKind;

    fn add(state: &mut GameState, pos: Vec2, hp: f32) -> u32 {
        let id = state.next_entity_id();
        state.add_enemy(Enemy::bare(id, EnemyKind::Tank, pos, hp, 0.0, 0));
        id
    }

    #[test]
    fn test_wave_cull_runs_through_the_scheduler() {
        let mut tuning = crate::tuning::Tuning::default();
        tuning.waves.micro_burst_chance = 0.0;
        tuning.cull.unseen_for = f32::INFINITY;
        let options = crate::sim::state::RunOptions {
            auto_fire: false,
            ..Default::default()
        };
        let mut state =
            GameState::with_config(21, tuning, options, crate::sim::waves::RunMode::Normal);
        state.player.hp = 1_000_000;
        state.player.invuln = f32::INFINITY;
        for i in 0..5 {
            let id = state.next_entity_id();
            let pos = Vec2::new(i as f32 * 3.0 - 6.0, 8.0);
            state.add_enemy(Enemy::bare(id, EnemyKind::Slime, pos, 5.0, 0.0, 2));
        }
        for i in 0..35 {
            let id = state.next_entity_id();
            let pos = Vec2::new(40.0 + i as f32, 0.0);
            state.add_enemy(Enemy::bare(id, EnemyKind::Slime, pos, 5.0, 0.0, 2));
        }
        let minute_two = |state: &GameState| {
            state
                .enemies
                .iter_alive()
                .filter(|e| e.spawn_wave == 2)
                .count()
        };

        // step from just before minute 4 into it
        state.time = 4.0 * WAVE_SECONDS - 0.005;
        let idle = TickInput::default();
        tick(&mut state, &idle, 0.016);
        assert!(state.ledger.events.contains(&GameEvent::WaveStarted(4)));
        assert!(state.scheduler.contains(Task::CullWave { wave: 2 }));

        while state.time < 4.0 * WAVE_SECONDS + 1.9 {
            tick(&mut state, &idle, 0.016);
        }
        assert_eq!(minute_two(&state), 40);

        while state.time < 4.0 * WAVE_SECONDS + 2.1 {
            tick(&mut state, &idle, 0.016);
        }
        assert!(!state.scheduler.contains(Task::CullWave { wave: 2 }));
        assert_eq!(minute_two(&state), 5);
        assert!(
            state
                .enemies
                .iter_alive()
                .filter(|e| e.spawn_wave == 2)
                .all(|e| state.camera.contains(e.pos))
        );
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.ledger.stats.score, 0);
    }

    #[test]
    fn test_timestep_is_clamped() {
        let mut state = GameState::new(1);
        let input = TickInput {
            move_vec: Vec2::X,
            ..Default::default()
        };
        tick(&mut state, &input, 5.0);
        assert!((state.time - MAX_FRAME_DT).abs() < 1e-6);
        assert!(state.player.pos.x <= state.player.speed * MAX_FRAME_DT + 1e-5);

        tick(&mut state, &input, -1.0);
        tick(&mut state, &input, f32::NAN);
        assert!((state.time - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(2);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, 0.016);
        assert_eq!(state.phase, GamePhase::Paused);
        let frozen = state.time;
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.time, frozen);

        // Unpause
        tick(&mut state, &pause, 0.016);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.time > frozen);
    }

    #[test]
    fn test_aim_sets_facing_and_zero_aim_holds() {
        let mut state = GameState::new(3);
        let input = TickInput {
            aim: Some(Vec2::X),
            ..Default::default()
        };
        tick(&mut state, &input, 0.016);
        assert!((state.player.facing - FRAC_PI_2).abs() < 1e-6);
        let input = TickInput {
            aim: Some(Vec2::ZERO),
            ..Default::default()
        };
        tick(&mut state, &input, 0.016);
        assert!((state.player.facing - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_burst_volleys_arrive_through_the_queue() {
        let mut state = GameState::new(4);
        state.gun.burst = 3;
        // first frame charges, the cooldown releases at 0.5 s
        for _ in 0..16 {
            tick(&mut state, &TickInput::default(), 0.032);
        }
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.scheduler.pending(), 2);
        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.032);
        }
        assert_eq!(state.projectiles.len(), 3);
        assert_eq!(state.scheduler.pending(), 0);
    }

    #[test]
    fn test_overlapping_weapons_pay_out_once() {
        let mut state = GameState::new(5);
        state.options.auto_fire = false;
        state.player.facing = FRAC_PI_2;
        {
            let GameState {
                arsenal,
                gun,
                tuning,
                ..
            } = &mut state;
            arsenal.add(WeaponKind::CrtBeam, gun, tuning);
            arsenal.add(WeaponKind::TapeWhirl, gun, tuning);
        }
        let id = add(&mut state, Vec2::new(2.0, 0.1), 0.01);
        tick(&mut state, &TickInput::default(), 0.033);

        assert_eq!(state.score(), 1);
        let downs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::EnemyDown { id: down, .. } if *down == id))
            .count();
        assert_eq!(downs, 1);
        // tombstone compacted away at the end of the frame
        assert!(state.enemies.is_empty());
        assert_eq!(state.ledger.stats.alive_enemies, 0);
    }

    #[test]
    fn test_collecting_xp_opens_level_up_and_freezes_time() {
        let mut state = GameState::new(6);
        {
            let ledger = &mut state.ledger;
            ledger.drops.spawn_xp(&mut ledger.ids, Vec2::new(0.3, 0.0), 5);
        }
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(state.progression.level, 2);
        assert_eq!(state.progression.offer.len(), 3);

        let frozen = state.time;
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.time, frozen);
        assert!(state.level_up_tail < LEVEL_UP_MAGNET_TAIL);

        assert!(apply_choice(&mut state, 0));
        assert_eq!(state.phase, GamePhase::Playing);
        tick(&mut state, &TickInput::default(), 0.016);
        assert!(state.time > frozen);
    }

    #[test]
    fn test_heal_pickup_restores_quarter() {
        let mut state = GameState::new(7);
        state.player.hp = 1;
        state.ledger.drops.pickups.push(crate::sim::pickups::Pickup {
            id: 99,
            kind: crate::sim::pickups::PickupKind::Heal,
            pos: Vec2::new(0.2, 0.0),
            alive: true,
        });
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.player.hp, 3);
    }

    #[test]
    fn test_death_ends_run() {
        let mut state = GameState::new(8);
        state.player.hp = 1;
        add(&mut state, Vec2::new(0.3, 0.0), 50.0);
        state.options.auto_fire = false;
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerDied));
        assert!(events.contains(&GameEvent::Cue(SoundCue::Death)));

        let frozen = state.time;
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.time, frozen);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99_999);
        let mut b = GameState::new(99_999);
        let inputs = [
            TickInput {
                move_vec: Vec2::new(0.6, 0.8),
                ..Default::default()
            },
            TickInput {
                aim: Some(Vec2::new(-1.0, 0.2)),
                ..Default::default()
            },
            TickInput::default(),
        ];
        for frame in 0..900 {
            let input = &inputs[frame % inputs.len()];
            tick(&mut a, input, 0.033);
            tick(&mut b, input, 0.033);
        }
        assert_eq!(a.frame, b.frame);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.player.pos, b.player.pos);
        for (x, y) in a.enemies.slots().iter().zip(b.enemies.slots()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.pos, y.pos);
        }
    }

    #[test]
    fn test_long_run_stays_consistent() {
        let mut state = GameState::new(42);
        state.player.invuln = f32::INFINITY;
        // bomber blasts ignore invulnerability
        state.player.max_hp = 1_000_000;
        state.player.hp = 1_000_000;
        for frame in 0..1800 {
            let angle = frame as f32 * 0.01;
            let input = TickInput {
                move_vec: Vec2::new(angle.cos(), angle.sin()),
                ..Default::default()
            };
            tick(&mut state, &input, 0.033);
            if state.phase == GamePhase::LevelUp {
                apply_choice(&mut state, 0);
            }
        }
        assert!(state.time > 59.0);
        assert!(!state.enemies.is_empty());
        assert_eq!(
            state.ledger.stats.alive_enemies as usize,
            state.enemies.alive_count()
        );
        assert!(state.enemies.slots().iter().all(|e| e.alive && e.pos.is_finite()));
    }
}
