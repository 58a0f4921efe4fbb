//! Game state and core simulation types
//!
//! The state is a set of cooperating components, each owning one slice:
//! entity arenas, the wave director, progression, the arsenal. The frame
//! step in `tick` borrows them field by field.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::enemy::{EnemyKind, VisualHandle};
use super::obstacles::ObstacleField;
use super::pickups::Drops;
use super::progression::Progression;
use super::projectile::Projectile;
use super::schedule::Scheduler;
use super::spatial::SpatialGrid;
use super::waves::{RunMode, WaveDirector};
use super::weapons::{Arsenal, Gun};
use super::enemy::Enemy;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::tuning::{CameraTuning, PlayerTuning, Tuning};
use crate::{safe_normalize, yaw_to_forward, yaw_to_right};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Waiting on a level-up choice
    LevelUp,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Yaw, `atan2(x, z)` of the facing direction
    pub facing: f32,
    pub speed: f32,
    pub radius: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub invuln: f32,
    /// Movement input of the last simulated frame (magnitude 0..1)
    pub last_move: Vec2,
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            pos: Vec2::ZERO,
            facing: 0.0,
            speed: tuning.speed,
            radius: tuning.radius,
            hp: tuning.max_hp,
            max_hp: tuning.max_hp,
            invuln: 0.0,
            last_move: Vec2::ZERO,
        }
    }

    pub fn forward(&self) -> Vec2 {
        yaw_to_forward(self.facing)
    }

    pub fn right(&self) -> Vec2 {
        yaw_to_right(self.facing)
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Subtract hit points. Returns true if this hit was lethal.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }
}

/// Orthographic camera following the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub focus: Vec2,
    /// Half extents of the visible ground rectangle
    pub half_extents: Vec2,
    pub eye_offset: Vec2,
    pub look_cone: f32,
    pub follow_lerp: f32,
}

impl Camera {
    pub fn new(tuning: &CameraTuning) -> Self {
        Self {
            focus: Vec2::ZERO,
            half_extents: Vec2::new(tuning.view_size * tuning.aspect, tuning.view_size),
            eye_offset: tuning.eye_offset,
            look_cone: tuning.look_cone,
            follow_lerp: tuning.follow_lerp,
        }
    }

    pub fn set_aspect(&mut self, view_size: f32, aspect: f32) {
        self.half_extents = Vec2::new(view_size * aspect.max(0.1), view_size);
    }

    pub fn follow(&mut self, target: Vec2) {
        self.focus = self.focus.lerp(target, self.follow_lerp);
    }

    pub fn eye(&self) -> Vec2 {
        self.focus + self.eye_offset
    }

    /// Inside the visible rectangle
    pub fn contains(&self, pos: Vec2) -> bool {
        let d = (pos - self.focus).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }

    /// Inside the camera's forward cone
    pub fn is_looking_at(&self, pos: Vec2) -> bool {
        let forward = safe_normalize(-self.eye_offset, Vec2::Y);
        let to_target = safe_normalize(pos - self.eye(), forward);
        forward.dot(to_target) > self.look_cone
    }

    pub fn half_diagonal(&self) -> f32 {
        self.half_extents.length()
    }
}

/// Notifications for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Cue(SoundCue),
    EnemyDown { id: u32, kind: EnemyKind, pos: Vec2 },
    ReleaseVisual(VisualHandle),
    Explosion { pos: Vec2, radius: f32 },
    Shockwave { pos: Vec2, radius: f32 },
    /// A lasso loop closed around these points
    LassoClosed { points: Vec<Vec2> },
    WaveStarted(u32),
    LevelUp(u32),
    PlayerDied,
}

/// Score counters and the incrementally maintained enemy census
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub score: u32,
    pub kills: u32,
    pub alive_enemies: u32,
}

impl RunStats {
    pub fn enemy_spawned(&mut self) {
        self.alive_enemies += 1;
    }

    pub fn enemy_removed(&mut self) {
        self.alive_enemies = self.alive_enemies.saturating_sub(1);
    }

    pub fn headroom(&self) -> u32 {
        MAX_ACTIVE_ENEMIES.saturating_sub(self.alive_enemies)
    }
}

/// Monotonic entity id source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Everything an enemy death pays into
#[derive(Debug, Default)]
pub struct Ledger {
    pub drops: Drops,
    pub stats: RunStats,
    pub events: Vec<GameEvent>,
    pub ids: IdAllocator,
}

impl Ledger {
    pub fn cue(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Cue(cue));
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.rotate_left(32))
    }
}

/// Player-facing switches that shape a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    pub auto_fire: bool,
    pub plentiful_pickups: bool,
    pub kernel_panic: bool,
    pub maze: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            auto_fire: true,
            plentiful_pickups: false,
            kernel_panic: false,
            maze: false,
        }
    }
}

/// Complete simulation state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub options: RunOptions,
    pub mode: RunMode,
    pub phase: GamePhase,
    /// Simulated seconds; only advances while playing
    pub time: f32,
    pub frame: u64,
    pub player: Player,
    pub camera: Camera,
    pub enemies: Arena<Enemy>,
    pub projectiles: Arena<Projectile>,
    pub grid: SpatialGrid,
    pub obstacles: ObstacleField,
    pub gun: Gun,
    pub arsenal: Arsenal,
    pub progression: Progression,
    pub director: WaveDirector,
    pub scheduler: Scheduler,
    pub ledger: Ledger,
    /// Seconds of magnet pull left after a level-up choice opened
    pub level_up_tail: f32,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), RunOptions::default(), RunMode::Normal)
    }

    pub fn with_config(seed: u64, tuning: Tuning, options: RunOptions, mode: RunMode) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let obstacles = if options.maze {
            ObstacleField::maze(&mut rng, &tuning.obstacles)
        } else {
            ObstacleField::open()
        };
        let director = WaveDirector::new(&mode, &tuning.waves);
        let mut state = Self {
            seed,
            rng_state,
            rng,
            player: Player::new(&tuning.player),
            camera: Camera::new(&tuning.camera),
            enemies: Arena::new(),
            projectiles: Arena::new(),
            grid: SpatialGrid::default(),
            obstacles,
            gun: Gun::new(&tuning.gun, &tuning.dot_matrix),
            arsenal: Arsenal::default(),
            progression: Progression::new(&tuning.progression),
            director,
            scheduler: Scheduler::default(),
            ledger: Ledger {
                drops: Drops::new(&tuning.drops),
                ..Ledger::default()
            },
            level_up_tail: 0.0,
            phase: GamePhase::Playing,
            time: 0.0,
            frame: 0,
            tuning,
            options,
            mode,
        };
        if let RunMode::Debug(plan) = &state.mode {
            let loadout = plan.loadout.clone();
            super::progression::apply_loadout(&mut state, &loadout);
        }
        log::info!("Run started (seed {seed}, mode {})", state.mode.label());
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ledger.ids.next_id()
    }

    /// Current wave-minute
    pub fn wave(&self) -> u32 {
        (self.time / WAVE_SECONDS).floor() as u32
    }

    pub fn score(&self) -> u32 {
        self.ledger.stats.score
    }

    /// Take this frame's notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.ledger.events)
    }

    /// Add an enemy to the arena and the census
    pub fn add_enemy(&mut self, enemy: Enemy) -> usize {
        self.ledger.stats.enemy_spawned();
        self.enemies.push(enemy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(42);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.hp, 5);
        assert_eq!(state.player.radius, 0.6);
        assert_eq!(state.wave(), 0);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_camera_visibility_rect() {
        let cam = Camera::new(&CameraTuning::default());
        assert!(cam.contains(Vec2::new(20.0, 11.0)));
        assert!(!cam.contains(Vec2::new(0.0, 12.5)));
        assert!(!cam.contains(Vec2::new(22.0, 0.0)));
    }

    #[test]
    fn test_camera_look_cone() {
        let cam = Camera::new(&CameraTuning::default());
        // straight ahead of the eye
        assert!(cam.is_looking_at(Vec2::new(0.0, 5.0)));
        // far off to the side of the view
        assert!(!cam.is_looking_at(Vec2::new(20.0, 0.0)));
    }

    #[test]
    fn test_player_damage_saturates() {
        let mut p = Player::new(&PlayerTuning::default());
        assert!(!p.take_damage(4));
        assert!(p.take_damage(3));
        assert_eq!(p.hp, 0);
        p.heal(10);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn test_stats_census() {
        let mut s = RunStats::default();
        s.enemy_spawned();
        s.enemy_removed();
        s.enemy_removed();
        assert_eq!(s.alive_enemies, 0);
        assert_eq!(s.headroom(), MAX_ACTIVE_ENEMIES);
    }
}
