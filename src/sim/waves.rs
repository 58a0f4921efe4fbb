//! Wave director: spawn cadence, enemy selection and staged culling
//!
//! Time is divided into wave-minutes. Each minute picks its enemy kind
//! from a fixed table (cycling with buffs after minute 10) unless a debug
//! or daily plan overrides it. Crossing into minute `m` schedules a
//! partial cull of minute `m - 2`, which only ever removes enemies the
//! camera cannot see.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::damage::{DamageCtx, DeathCause, kill};
use super::enemy::{Enemy, EnemyKind};
use super::progression::Loadout;
use super::schedule::Task;
use super::state::{Camera, GameEvent, GameState};
use crate::safe_normalize;
use crate::tuning::{Tuning, WaveTuning, WaveTwist};

/// Kinds for minutes 4..=9, reused cyclically from minute 10
const LATE_POOLS: [&[EnemyKind]; 6] = [
    &[EnemyKind::Spinner, EnemyKind::Shooter],
    &[EnemyKind::Charger, EnemyKind::Splitter],
    &[EnemyKind::Orbiter, EnemyKind::Bomber],
    &[EnemyKind::Teleport, EnemyKind::Sniper],
    &[EnemyKind::Weaver],
    &[EnemyKind::Brute],
];

/// Tiers a daily plan draws from
const DAILY_POOLS: [&[EnemyKind]; 8] = [
    &[EnemyKind::Runner],
    &[EnemyKind::Zigzag],
    &[EnemyKind::Spinner, EnemyKind::Shooter],
    &[EnemyKind::Charger, EnemyKind::Splitter],
    &[EnemyKind::Orbiter, EnemyKind::Bomber],
    &[EnemyKind::Teleport, EnemyKind::Sniper],
    &[EnemyKind::Weaver],
    &[EnemyKind::Brute],
];

/// Hand-authored run: per-minute kinds plus a starting loadout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugPlan {
    /// Kinds to draw from for each minute; empty or missing minutes use the table
    pub minutes: Vec<Vec<EnemyKind>>,
    pub loadout: Loadout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Normal,
    /// Seeded plan shared by every player on the same date (`YYYY-MM-DD`)
    Daily { id: String },
    Debug(DebugPlan),
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Normal => "normal",
            RunMode::Daily { .. } => "daily",
            RunMode::Debug(_) => "debug",
        }
    }

    pub fn daily_id(&self) -> Option<&str> {
        match self {
            RunMode::Daily { id } => Some(id),
            _ => None,
        }
    }
}

/// FNV-1a over UTF-16 code units
pub fn fnv1a(s: &str) -> u32 {
    s.encode_utf16().fold(2_166_136_261u32, |h, c| {
        (h ^ c as u32).wrapping_mul(16_777_619)
    })
}

/// Tiny xorshift32 stream; dailies must not depend on the run RNG
struct XorShift32(u32);

impl XorShift32 {
    fn next_unit(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x as f64 / u32::MAX as f64
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        let i = (self.next_unit() * items.len() as f64).floor() as usize;
        items[i.min(items.len() - 1)]
    }
}

/// One kind per minute, identical for everyone with the same date id
pub fn daily_plan(id: &str, minutes: usize) -> Vec<EnemyKind> {
    let mut rng = XorShift32(fnv1a(id));
    (0..minutes)
        .map(|_| {
            let pool = rng.pick(&DAILY_POOLS);
            rng.pick(pool)
        })
        .collect()
}

/// Table kind for a minute with no plan override
pub fn table_kind<R: Rng + ?Sized>(minute: u32, rng: &mut R) -> EnemyKind {
    let pool = match minute {
        0 => return EnemyKind::Slime,
        1 => return EnemyKind::Runner,
        2 => return EnemyKind::Zigzag,
        3 => return EnemyKind::Tank,
        4..=9 => LATE_POOLS[(minute - 4) as usize],
        _ => LATE_POOLS[((minute - 10) % 6) as usize],
    };
    pool.choose(rng).copied().unwrap_or(EnemyKind::Slime)
}

/// Enemies to add on a cadence trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnBatch {
    pub immediate: u32,
    /// Queued behind the immediate ones, one stagger apart
    pub staggered: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDirector {
    plan: Vec<Vec<EnemyKind>>,
    last_minute: Option<u32>,
    accumulator: f32,
    phase: f32,
    burst_left: f32,
    giant_timer: f32,
}

impl WaveDirector {
    pub fn new(mode: &RunMode, tuning: &WaveTuning) -> Self {
        let plan = match mode {
            RunMode::Normal => Vec::new(),
            RunMode::Daily { id } => daily_plan(id, tuning.daily_minutes)
                .into_iter()
                .map(|k| vec![k])
                .collect(),
            RunMode::Debug(plan) => plan.minutes.clone(),
        };
        Self {
            plan,
            last_minute: None,
            accumulator: 0.0,
            phase: 0.0,
            burst_left: 0.0,
            giant_timer: 0.0,
        }
    }

    /// Kind to spawn in `minute`, plan first
    pub fn kind_for_minute<R: Rng + ?Sized>(&self, minute: u32, rng: &mut R) -> EnemyKind {
        self.plan
            .get(minute as usize)
            .and_then(|kinds| kinds.choose(rng).copied())
            .unwrap_or_else(|| table_kind(minute, rng))
    }

    /// Advance the spawn clock. Returns a batch when the accumulator trips.
    pub fn cadence<R: Rng + ?Sized>(
        &mut self,
        now: f32,
        dt: f32,
        kernel_panic: bool,
        headroom: u32,
        rng: &mut R,
        tuning: &WaveTuning,
    ) -> Option<SpawnBatch> {
        self.accumulator += dt;
        let mut base = (tuning.base_interval - now * tuning.interval_ramp).max(tuning.min_interval);
        if kernel_panic {
            base *= tuning.kernel_panic_interval;
        }
        self.phase += dt * tuning.sine_rate;
        let modulated = (base * (1.0 + tuning.sine_depth * self.phase.sin()))
            .max(tuning.min_modulated_interval);

        if self.burst_left <= 0.0 && rng.random::<f32>() < tuning.micro_burst_chance {
            self.burst_left = tuning.micro_burst_duration.sample(rng);
            log::debug!("micro-burst for {:.2}s", self.burst_left);
        }
        let bursting = self.burst_left > 0.0;
        let factor = if bursting {
            tuning.micro_burst_factor
        } else {
            1.0
        };
        if bursting {
            self.burst_left -= dt;
        }
        let effective = (modulated * factor).max(tuning.min_effective_interval);
        if self.accumulator < effective {
            return None;
        }
        self.accumulator = 0.0;

        let ramp = ((now / tuning.count_ramp_seconds).floor() as u32).min(tuning.max_count_ramp);
        let base_count = tuning.base_count + ramp;
        let total = (base_count + u32::from(bursting)).min(headroom);
        let immediate = total.min(base_count);
        Some(SpawnBatch {
            immediate,
            staggered: total - immediate,
        })
    }
}

/// A point just outside the visible rectangle around `center`
pub fn spawn_position<R: Rng + ?Sized>(
    center: Vec2,
    camera: &Camera,
    rng: &mut R,
    tuning: &WaveTuning,
) -> Vec2 {
    let min_r = camera.half_diagonal() + tuning.spawn_margin;
    let max_r = min_r + tuning.spawn_band;
    for _ in 0..tuning.spawn_tries {
        let angle = rng.random::<f32>() * TAU;
        let dist = min_r + rng.random::<f32>() * (max_r - min_r);
        let p = center + Vec2::new(angle.cos(), angle.sin()) * dist;
        if !camera.contains(p) {
            return p;
        }
    }
    let angle = rng.random::<f32>() * TAU;
    center + Vec2::new(angle.cos(), angle.sin()) * (max_r + tuning.spawn_fallback)
}

/// Wave transitions, giants and the spawn cadence for one frame
pub fn update_waves(state: &mut GameState, dt: f32) {
    let minute = state.wave();
    if state.director.last_minute.is_none_or(|last| minute > last) {
        on_wave_start(state, minute);
    }
    state.director.last_minute = Some(minute);

    state.director.giant_timer += dt;
    if state.director.giant_timer >= state.tuning.waves.giant_interval {
        state.director.giant_timer = 0.0;
        spawn_giant(state);
    }

    let headroom = state.ledger.stats.headroom();
    let batch = state.director.cadence(
        state.time,
        dt,
        state.options.kernel_panic,
        headroom,
        &mut state.rng,
        &state.tuning.waves,
    );
    let Some(batch) = batch else {
        return;
    };
    for _ in 0..batch.immediate {
        spawn_for_minute(state, minute);
    }
    let stagger = state.tuning.waves.spawn_stagger;
    for i in 0..batch.staggered {
        state
            .scheduler
            .after(state.time, stagger * (i + 1) as f32, Task::SpawnEnemy { minute });
    }
}

fn on_wave_start(state: &mut GameState, minute: u32) {
    log::info!("Wave {} started", minute + 1);
    state.ledger.events.push(GameEvent::WaveStarted(minute));
    if let Some(target) = minute.checked_sub(2) {
        state.scheduler.after(
            state.time,
            state.tuning.cull.wave_cull_delay,
            Task::CullWave { wave: target },
        );
    }
}

/// Spawn one wave enemy for `minute`. Returns false at the enemy cap.
pub fn spawn_for_minute(state: &mut GameState, minute: u32) -> bool {
    if state.ledger.stats.headroom() == 0 {
        return false;
    }
    let now = state.time;
    let kind = state.director.kind_for_minute(minute, &mut state.rng);
    let w = &state.tuning.waves;
    let mut pos = spawn_position(state.player.pos, &state.camera, &mut state.rng, w);
    if matches!(kind, EnemyKind::Teleport | EnemyKind::Weaver) {
        pos += safe_normalize(pos - state.player.pos, Vec2::X) * w.far_spawn_extra;
    }
    let (mut hp, speed) = kind.spawn_stats(now);
    let boo = w.boo_minutes.contains(&minute);
    let elite = state.rng.random::<f32>() < w.elite_chance;
    if elite {
        hp += w.elite_hp;
    }
    let twist = minute
        .checked_sub(10)
        .filter(|_| !w.late_twists.is_empty())
        .map(|m| w.late_twists[m as usize % w.late_twists.len()]);

    let id = state.ledger.ids.next_id();
    let mut enemy = Enemy::spawn(id, kind, pos, hp, speed, minute, now, &mut state.rng, &state.tuning);
    enemy.boo = boo;
    enemy.elite = elite;
    match twist {
        Some(WaveTwist::Speed(f)) => {
            enemy.base_speed *= f;
            enemy.speed = enemy.base_speed;
        }
        Some(WaveTwist::Hp(extra)) => enemy.hp += extra,
        None => {}
    }
    log::debug!("spawn {} #{id} for minute {minute}", kind.name());
    state.add_enemy(enemy);
    true
}

/// Periodic elite somewhere around the player
pub fn spawn_giant(state: &mut GameState) -> bool {
    if state.ledger.stats.headroom() == 0 {
        return false;
    }
    let w = &state.tuning.waves;
    let angle = state.rng.random::<f32>() * TAU;
    let dist = w.giant_distance.sample(&mut state.rng);
    let pos = state.player.pos + Vec2::new(angle.cos(), angle.sin()) * dist;
    let hp = w.giant_hp + (state.time / w.giant_hp_ramp_seconds).floor();
    let speed = w.giant_speed;
    let id = state.ledger.ids.next_id();
    let enemy = Enemy::spawn(
        id,
        EnemyKind::Giant,
        pos,
        hp,
        speed,
        state.wave(),
        state.time,
        &mut state.rng,
        &state.tuning,
    );
    log::info!("Giant #{id} spawned with {hp} hp");
    state.add_enemy(enemy);
    true
}

/// Split the state into what a cull needs
fn cull_ctx(state: &mut GameState) -> (DamageCtx<'_>, &mut Arena<Enemy>, &Camera, Vec2) {
    let now = state.time;
    let wave = state.wave();
    let GameState {
        enemies,
        camera,
        player,
        rng,
        ledger,
        tuning,
        options,
        ..
    } = state;
    let tuning: &Tuning = tuning;
    (
        DamageCtx {
            now,
            wave,
            plentiful: options.plentiful_pickups,
            tuning,
            rng,
            ledger,
        },
        enemies,
        camera,
        player.pos,
    )
}

/// Remove most of a past wave's enemies, never one the camera can see.
///
/// Keeps `max(1, floor(n * keep_fraction))` and removes the farthest
/// off-screen candidates first. Returns how many were removed.
pub fn cull_wave(state: &mut GameState, wave: u32) -> usize {
    let keep_fraction = state.tuning.cull.keep_fraction;
    let (mut ctx, enemies, camera, player_pos) = cull_ctx(state);
    let group: Vec<usize> = enemies
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.alive && e.spawn_wave == wave)
        .map(|(i, _)| i)
        .collect();
    let n = group.len();
    if n == 0 {
        return 0;
    }
    let keep = n.min(((n as f32 * keep_fraction).floor() as usize).max(1));
    let need = n - keep;
    let slots = enemies.slots();
    let mut offscreen: Vec<usize> = group
        .into_iter()
        .filter(|&i| !camera.contains(slots[i].pos))
        .collect();
    offscreen.sort_by(|&a, &b| {
        let da = slots[a].pos.distance_squared(player_pos);
        let db = slots[b].pos.distance_squared(player_pos);
        db.total_cmp(&da)
    });
    offscreen.truncate(need);

    let slots = enemies.slots_mut();
    let mut removed = 0;
    for i in offscreen {
        if kill(&mut slots[i], DeathCause::Culled, &mut ctx) {
            removed += 1;
        }
    }
    if removed > 0 {
        log::debug!("wave {wave} cull removed {removed} of {n}");
    }
    removed
}

/// Drop enemies from past waves that have been off-screen too long
pub fn cull_stale(state: &mut GameState) -> usize {
    let current = state.wave();
    let unseen_for = state.tuning.cull.unseen_for;
    let now = state.time;
    let (mut ctx, enemies, camera, _) = cull_ctx(state);
    let mut removed = 0;
    for enemy in enemies.iter_alive_mut() {
        if current.saturating_sub(enemy.spawn_wave) < 1 || camera.contains(enemy.pos) {
            continue;
        }
        if now - enemy.last_onscreen_at > unseen_for && kill(enemy, DeathCause::Culled, &mut ctx) {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::consts::WAVE_SECONDS;
    use crate::sim::state::RunOptions;

    fn minute_start(minute: u32) -> f32 {
        minute as f32 * WAVE_SECONDS
    }

    fn quiet_tuning() -> Tuning {
        let mut t = Tuning::default();
        t.waves.micro_burst_chance = 0.0;
        t
    }

    fn wave_enemy(state: &mut GameState, pos: Vec2, wave: u32) -> usize {
        let id = state.next_entity_id();
        state.add_enemy(Enemy::bare(id, EnemyKind::Slime, pos, 5.0, 0.0, wave))
    }

    #[test]
    fn test_minute_table() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(table_kind(0, &mut rng), EnemyKind::Slime);
        assert_eq!(table_kind(3, &mut rng), EnemyKind::Tank);
        assert_eq!(table_kind(9, &mut rng), EnemyKind::Brute);
        assert_eq!(table_kind(14, &mut rng), EnemyKind::Weaver);
        for _ in 0..20 {
            let k = table_kind(4, &mut rng);
            assert!(matches!(k, EnemyKind::Spinner | EnemyKind::Shooter));
        }
    }

    #[test]
    fn test_fnv1a_vectors() {
        assert_eq!(fnv1a(""), 2_166_136_261);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
    }

    #[test]
    fn test_daily_plan_is_deterministic() {
        let a = daily_plan("2025-03-14", 15);
        let b = daily_plan("2025-03-14", 15);
        assert_eq!(a, b);
        assert_eq!(a.len(), 15);
        for kind in &a {
            assert!(DAILY_POOLS.iter().any(|pool| pool.contains(kind)));
        }
    }

    #[test]
    fn test_debug_plan_overrides_table() {
        let plan = DebugPlan {
            minutes: vec![vec![EnemyKind::Brute], vec![]],
            loadout: Loadout::default(),
        };
        let director = WaveDirector::new(&RunMode::Debug(plan), &WaveTuning::default());
        let mut rng = Pcg32::seed_from_u64(2);
        assert_eq!(director.kind_for_minute(0, &mut rng), EnemyKind::Brute);
        assert_eq!(director.kind_for_minute(1, &mut rng), EnemyKind::Runner);
    }

    #[test]
    fn test_first_trigger_spawns_base_count() {
        let tuning = quiet_tuning();
        let mut director = WaveDirector::new(&RunMode::Normal, &tuning.waves);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut now = 0.0;
        let batch = loop {
            if let Some(b) = director.cadence(now, 0.033, false, 1000, &mut rng, &tuning.waves) {
                break b;
            }
            now += 0.033;
            assert!(now < 3.0);
        };
        assert!(now > 1.7 && now < 2.3);
        assert_eq!(
            batch,
            SpawnBatch {
                immediate: 2,
                staggered: 0
            }
        );
    }

    #[test]
    fn test_batch_capped_by_headroom() {
        let tuning = quiet_tuning();
        let mut director = WaveDirector::new(&RunMode::Normal, &tuning.waves);
        let mut rng = Pcg32::seed_from_u64(4);
        let batch = director.cadence(300.0, 5.0, false, 1, &mut rng, &tuning.waves);
        assert_eq!(
            batch,
            Some(SpawnBatch {
                immediate: 1,
                staggered: 0
            })
        );
    }

    #[test]
    fn test_spawn_position_is_offscreen() {
        let state = GameState::new(5);
        let mut rng = Pcg32::seed_from_u64(5);
        let min_r = state.camera.half_diagonal() + 3.0;
        for _ in 0..200 {
            let p = spawn_position(Vec2::ZERO, &state.camera, &mut rng, &state.tuning.waves);
            assert!(!state.camera.contains(p));
            assert!(p.length() >= min_r - 1e-3);
        }
    }

    #[test]
    fn test_late_wave_twist_and_boo() {
        let mut state = GameState::with_config(6, quiet_tuning(), RunOptions::default(), RunMode::Normal);
        state.tuning.waves.elite_chance = 0.0;
        state.time = minute_start(10);
        assert!(spawn_for_minute(&mut state, 10));
        let e = &state.enemies.slots()[0];
        let (_, speed) = e.kind.spawn_stats(state.time);
        assert!((e.base_speed - speed * 1.1).abs() < 1e-5);
        assert!(!e.boo);

        state.time = minute_start(3);
        assert!(spawn_for_minute(&mut state, 3));
        let e = &state.enemies.slots()[1];
        assert_eq!(e.kind, EnemyKind::Tank);
        assert!(e.boo);
        assert_eq!(e.spawn_wave, 3);
        assert_eq!(state.ledger.stats.alive_enemies, 2);
    }

    #[test]
    fn test_giant_cadence() {
        let mut state = GameState::with_config(7, quiet_tuning(), RunOptions::default(), RunMode::Normal);
        state.time = 30.0;
        for _ in 0..24 {
            update_waves(&mut state, 1.0);
        }
        assert!(!state.enemies.slots().iter().any(|e| e.is_giant()));
        update_waves(&mut state, 1.0);
        let giant = state
            .enemies
            .slots()
            .iter()
            .find(|e| e.is_giant())
            .expect("giant spawned on the 25th second");
        assert_eq!(giant.hp, 65.0);
        let d = giant.pos.length();
        assert!((16.0..=22.0).contains(&d));
    }

    #[test]
    fn test_minute_three_to_four_culls_minute_two_offscreen_only() {
        let mut state = GameState::with_config(8, quiet_tuning(), RunOptions::default(), RunMode::Normal);
        let visible: Vec<usize> = (0..5)
            .map(|i| wave_enemy(&mut state, Vec2::new(i as f32, 2.0), 2))
            .collect();
        let hidden: Vec<usize> = (0..35)
            .map(|i| wave_enemy(&mut state, Vec2::new(40.0 + i as f32, 0.0), 2))
            .collect();

        state.time = minute_start(3) + 30.0;
        update_waves(&mut state, 0.016);
        assert!(!state.scheduler.contains(Task::CullWave { wave: 2 }));

        state.time = minute_start(4);
        update_waves(&mut state, 0.016);
        let due = state.scheduler.due_of(Task::CullWave { wave: 2 });
        assert_eq!(due, Some(minute_start(4) + 2.0));

        let removed = cull_wave(&mut state, 2);
        assert_eq!(removed, 35);
        for i in visible {
            assert!(state.enemies.slots()[i].alive);
        }
        for i in hidden {
            assert!(!state.enemies.slots()[i].alive);
        }
        // culls pay nothing
        assert_eq!(state.ledger.stats.score, 0);
    }

    #[test]
    fn test_cull_removes_farthest_and_keeps_one() {
        let mut state = GameState::new(9);
        let ids: Vec<usize> = (0..10)
            .map(|i| wave_enemy(&mut state, Vec2::new(30.0 + i as f32, 0.0), 0))
            .collect();
        assert_eq!(cull_wave(&mut state, 0), 9);
        assert!(state.enemies.slots()[ids[0]].alive);
        assert_eq!(state.ledger.stats.alive_enemies, 1);
    }

    #[test]
    fn test_stale_cull_waits_for_unseen_time() {
        let mut state = GameState::new(10);
        state.time = 70.0;
        let stale = wave_enemy(&mut state, Vec2::new(50.0, 0.0), 0);
        let fresh_unseen = wave_enemy(&mut state, Vec2::new(50.0, 5.0), 0);
        let current = wave_enemy(&mut state, Vec2::new(50.0, 10.0), 1);
        let onscreen = wave_enemy(&mut state, Vec2::new(1.0, 1.0), 0);
        for (i, seen) in [(stale, 60.0), (fresh_unseen, 69.0), (current, 0.0), (onscreen, 0.0)] {
            state.enemies.slots_mut()[i].last_onscreen_at = seen;
        }
        assert_eq!(cull_stale(&mut state), 1);
        assert!(!state.enemies.slots()[stale].alive);
        assert!(state.enemies.slots()[fresh_unseen].alive);
        assert!(state.enemies.slots()[current].alive);
        assert!(state.enemies.slots()[onscreen].alive);
    }
}
