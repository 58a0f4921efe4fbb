//! Data-driven game balance
//!
//! Every damage value, duration, probability and threshold used by the
//! simulation lives here so balance passes never touch gameplay code.
//! `Tuning::default()` is the canonical feel; JSON overrides may set any
//! subset of fields.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive-exclusive range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + rng.random::<f32>() * (self.max - self.min)
    }
}

/// Top-level balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub camera: CameraTuning,
    pub gun: GunTuning,
    pub beam: BeamTuning,
    pub blades: BladesTuning,
    pub shockwave: ShockwaveTuning,
    pub rocket: RocketTuning,
    pub paint: PaintTuning,
    pub lasso: LassoTuning,
    pub tail: TailTuning,
    pub shield: ShieldTuning,
    pub dot_matrix: DotMatrixTuning,
    pub drops: DropTuning,
    pub progression: ProgressionTuning,
    pub waves: WaveTuning,
    pub hesitation: HesitationTuning,
    pub behavior: BehaviorTuning,
    pub cull: CullTuning,
    pub obstacles: ObstacleTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON balance sheet
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub speed: f32,
    pub max_speed: f32,
    pub max_hp: u32,
    pub invuln_duration: f32,
    /// Enemy body radius used for contact checks
    pub enemy_contact_radius: f32,
    pub contact_damage: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.6,
            speed: 7.0,
            max_speed: 13.0,
            max_hp: 5,
            invuln_duration: 1.0,
            enemy_contact_radius: 0.5,
            contact_damage: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Half-height of the orthographic view
    pub view_size: f32,
    pub aspect: f32,
    pub follow_lerp: f32,
    /// Ground-plane offset from the view focus to the eye
    pub eye_offset: Vec2,
    /// Cosine threshold for "looked at" tests
    pub look_cone: f32,
    /// Beyond this distance enemies update every other frame
    pub far_update_distance: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            view_size: 12.0,
            aspect: 16.0 / 9.0,
            follow_lerp: 0.1,
            eye_offset: Vec2::new(0.0, -16.0),
            look_cone: 0.85,
            far_update_distance: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunTuning {
    pub fire_interval: f32,
    pub min_fire_interval: f32,
    pub fire_interval_upgrade: f32,
    pub spread: f32,
    pub bullet_speed: f32,
    pub bullet_ttl: f32,
    pub damage: f32,
    pub pierce: u32,
    pub max_pierce: u32,
    pub max_multishot: u32,
    pub burst_delay: f32,
    pub max_burst: u32,
    pub side_bullet_speed: f32,
    /// Muzzle offset in front of the player
    pub muzzle_offset: f32,
    pub hit_radius: f32,
    pub grid_margin: f32,
}

impl Default for GunTuning {
    fn default() -> Self {
        Self {
            fire_interval: 0.5,
            min_fire_interval: 0.06,
            fire_interval_upgrade: 0.88,
            spread: 0.12,
            bullet_speed: 14.0,
            bullet_ttl: 1.6,
            damage: 1.0,
            pierce: 0,
            max_pierce: 3,
            max_multishot: 6,
            burst_delay: 0.05,
            max_burst: 5,
            side_bullet_speed: 12.0,
            muzzle_offset: 0.6,
            hit_radius: 0.55,
            grid_margin: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamTuning {
    pub length: f32,
    pub dps: f32,
    pub on: f32,
    pub off: f32,
    pub cone_dot: f32,
    pub length_per_level: f32,
    pub dps_per_level: f32,
    pub off_per_level: f32,
    pub min_off: f32,
}

impl Default for BeamTuning {
    fn default() -> Self {
        Self {
            length: 6.0,
            dps: 6.0,
            on: 1.2,
            off: 0.8,
            cone_dot: 0.92,
            length_per_level: 1.0,
            dps_per_level: 2.0,
            off_per_level: 0.1,
            min_off: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BladesTuning {
    pub count: u32,
    pub max_count: u32,
    pub radius: f32,
    pub max_radius: f32,
    pub angular_speed: f32,
    pub max_angular_speed: f32,
    pub dps: f32,
    pub contact_distance: f32,
    pub knockback: f32,
    pub on: f32,
    pub off: f32,
    pub radius_per_level: f32,
    pub dps_per_level: f32,
    pub speed_per_level: f32,
}

impl Default for BladesTuning {
    fn default() -> Self {
        Self {
            count: 3,
            max_count: 6,
            radius: 2.0,
            max_radius: 3.8,
            angular_speed: 2.8,
            max_angular_speed: 4.2,
            dps: 16.0,
            contact_distance: 1.0,
            knockback: 0.035,
            on: 1.2,
            off: 0.8,
            radius_per_level: 0.3,
            dps_per_level: 6.0,
            speed_per_level: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockwaveTuning {
    pub interval: f32,
    pub min_interval: f32,
    pub radius: f32,
    pub max_radius: f32,
    pub base_damage: f32,
    pub pulses: u32,
    pub max_pulses: u32,
    pub pulse_gap: f32,
    pub slow_duration: f32,
    pub slow_factor: f32,
    pub radius_per_level: f32,
    pub interval_per_level: f32,
    pub damage_per_level: f32,
    pub min_knockback: f32,
    pub knockback_scale: f32,
}

impl Default for ShockwaveTuning {
    fn default() -> Self {
        Self {
            interval: 3.0,
            min_interval: 0.9,
            radius: 3.2,
            max_radius: 8.0,
            base_damage: 5.0,
            pulses: 1,
            max_pulses: 3,
            pulse_gap: 0.18,
            slow_duration: 0.6,
            slow_factor: 0.6,
            radius_per_level: 0.7,
            interval_per_level: 0.2,
            damage_per_level: 2.0,
            min_knockback: 0.12,
            knockback_scale: 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketTuning {
    pub interval: f32,
    pub min_interval: f32,
    pub speed: f32,
    pub max_speed: f32,
    pub turn: f32,
    pub max_turn: f32,
    pub damage: f32,
    pub ttl: f32,
    pub blast_radius: f32,
    pub max_blast_radius: f32,
    /// Delay of the follow-up rocket from level 2
    pub follow_up_delay: f32,
    pub damage_per_level: f32,
    pub blast_per_level: f32,
    /// Interval multiplier per level
    pub interval_factor: f32,
    pub speed_per_level: f32,
    pub turn_per_level: f32,
}

impl Default for RocketTuning {
    fn default() -> Self {
        Self {
            interval: 1.8,
            min_interval: 0.9,
            speed: 3.5,
            max_speed: 5.0,
            turn: 0.15,
            max_turn: 0.25,
            damage: 3.0,
            ttl: 5.0,
            blast_radius: 2.6,
            max_blast_radius: 5.0,
            follow_up_delay: 0.15,
            damage_per_level: 1.0,
            blast_per_level: 0.4,
            interval_factor: 0.92,
            speed_per_level: 0.4,
            turn_per_level: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintTuning {
    pub on: f32,
    pub max_on: f32,
    pub off: f32,
    pub min_off: f32,
    pub dps: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub gap: f32,
    pub min_gap: f32,
    pub radius: f32,
    pub max_radius: f32,
    pub max_swaths: usize,
    /// Swath radius varies by this fraction either way
    pub radius_jitter: f32,
    pub on_per_level: f32,
    pub off_per_level: f32,
    pub dps_per_level: f32,
    pub lifetime_per_level: f32,
    pub radius_per_level: f32,
    pub gap_per_level: f32,
}

impl Default for PaintTuning {
    fn default() -> Self {
        Self {
            on: 0.7,
            max_on: 2.5,
            off: 1.3,
            min_off: 0.35,
            dps: 10.0,
            lifetime: 1.3,
            max_lifetime: 4.5,
            gap: 0.35,
            min_gap: 0.18,
            radius: 1.38,
            max_radius: 3.0,
            max_swaths: 80,
            radius_jitter: 0.15,
            on_per_level: 0.25,
            off_per_level: 0.15,
            dps_per_level: 5.0,
            lifetime_per_level: 0.35,
            radius_per_level: 0.25,
            gap_per_level: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LassoTuning {
    pub point_gap: f32,
    pub max_points: usize,
    pub close_distance: f32,
    pub min_loop_points: usize,
    pub damage: f32,
    pub duration: f32,
    pub max_duration: f32,
    pub duration_per_level: f32,
    pub damage_per_level: f32,
}

impl Default for LassoTuning {
    fn default() -> Self {
        Self {
            point_gap: 0.4,
            max_points: 200,
            close_distance: 0.6,
            min_loop_points: 12,
            damage: 8.0,
            duration: 5.0,
            max_duration: 12.0,
            duration_per_level: 2.0,
            damage_per_level: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailTuning {
    pub segments: usize,
    /// Distance from the anchor to the tail tip
    pub length: f32,
    pub max_length: f32,
    pub dps: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub hit_radius: f32,
    pub anchor_offset: f32,
    pub dps_per_level: f32,
    pub length_per_level: f32,
}

impl Default for TailTuning {
    fn default() -> Self {
        Self {
            segments: 12,
            length: 2.0,
            max_length: 4.0,
            dps: 20.0,
            amplitude: 0.18,
            frequency: 8.0,
            hit_radius: 0.5,
            anchor_offset: 0.35,
            dps_per_level: 6.0,
            length_per_level: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldTuning {
    pub length: f32,
    pub width: f32,
    pub on: f32,
    pub max_on: f32,
    pub off: f32,
    pub max_push: f32,
    pub min_push: f32,
    pub push_falloff: f32,
    pub length_per_level: f32,
    pub width_per_level: f32,
    pub on_per_level: f32,
}

impl Default for ShieldTuning {
    fn default() -> Self {
        Self {
            length: 4.0,
            width: 1.2,
            on: 1.0,
            max_on: 2.0,
            off: 1.2,
            max_push: 0.32,
            min_push: 0.15,
            push_falloff: 0.02,
            length_per_level: 1.0,
            width_per_level: 0.2,
            on_per_level: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotMatrixTuning {
    pub damage_multiplier: f32,
    pub per_level: f32,
    pub max_multiplier: f32,
}

impl Default for DotMatrixTuning {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            per_level: 0.2,
            max_multiplier: 2.0,
        }
    }
}

/// Wave-keyed odds for XP values 1, 3, 5, 10 (value 20 takes the remainder)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpOddsRow {
    pub from_wave: u32,
    pub odds: [f32; 4],
}

pub const XP_VALUES: [u32; 5] = [1, 3, 5, 10, 20];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTuning {
    /// Ascending by `from_wave`
    pub xp_odds: Vec<XpOddsRow>,
    pub bonus_drop_chance: f32,
    pub vacuum_chance: f32,
    pub vacuum_chance_plentiful: f32,
    pub heal_chance: f32,
    pub heal_chance_plentiful: f32,
    pub heal_fraction: f32,
    pub vacuum_duration: f32,
    pub vacuum_pull: f32,
    pub magnet_radius: f32,
    pub max_magnet_radius: f32,
    pub magnet_strength: f32,
    pub pickup_radius: f32,
    pub giant_bundle: u32,
    pub giant_extra_drops: u32,
}

impl Default for DropTuning {
    fn default() -> Self {
        let row = |from_wave, odds| XpOddsRow { from_wave, odds };
        Self {
            xp_odds: vec![
                row(0, [0.8, 0.2, 0.0, 0.0]),
                row(2, [0.7, 0.25, 0.05, 0.0]),
                row(4, [0.5, 0.25, 0.25, 0.0]),
                row(6, [0.35, 0.3, 0.25, 0.1]),
                row(8, [0.25, 0.3, 0.3, 0.15]),
                row(10, [0.18, 0.28, 0.32, 0.16]),
                row(12, [0.12, 0.25, 0.32, 0.22]),
                row(15, [0.08, 0.22, 0.3, 0.28]),
            ],
            bonus_drop_chance: 0.25,
            vacuum_chance: 0.015,
            vacuum_chance_plentiful: 0.06,
            heal_chance: 0.12,
            heal_chance_plentiful: 0.33,
            heal_fraction: 0.25,
            vacuum_duration: 3.0,
            vacuum_pull: 12.0,
            magnet_radius: 2.0,
            max_magnet_radius: 5.0,
            magnet_strength: 6.0,
            pickup_radius: 0.6,
            giant_bundle: 50,
            giant_extra_drops: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub xp_to_level: u32,
    /// Threshold multiplier per level, floored
    pub growth: f32,
    pub max_weapons: usize,
    pub max_upgrades: usize,
    pub choices: usize,
    pub speed_step: f32,
    pub damage_step: f32,
    pub magnet_step: f32,
    /// Fraction of max hp restored by ECC Memory
    pub ecc_heal: f32,
    /// XP multiplier at the first two amplifier levels
    pub xp_amp_levels: [f32; 2],
    pub max_xp_multiplier: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            xp_to_level: 5,
            growth: 1.5,
            max_weapons: 5,
            max_upgrades: 5,
            choices: 3,
            speed_step: 0.6,
            damage_step: 1.0,
            magnet_step: 0.7,
            ecc_heal: 0.5,
            xp_amp_levels: [1.2, 3.0],
            max_xp_multiplier: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub base_interval: f32,
    pub interval_ramp: f32,
    pub min_interval: f32,
    pub kernel_panic_interval: f32,
    pub kernel_panic_speed: f32,
    pub sine_rate: f32,
    pub sine_depth: f32,
    pub min_modulated_interval: f32,
    pub micro_burst_chance: f32,
    pub micro_burst_duration: Span,
    pub micro_burst_factor: f32,
    pub min_effective_interval: f32,
    pub base_count: u32,
    pub count_ramp_seconds: f32,
    pub max_count_ramp: u32,
    pub spawn_stagger: f32,
    pub elite_chance: f32,
    pub elite_hp: f32,
    pub elite_speed: f32,
    pub boo_minutes: Vec<u32>,
    pub boo_watched: f32,
    pub boo_unwatched: f32,
    pub spawn_margin: f32,
    pub spawn_band: f32,
    pub spawn_tries: u32,
    pub spawn_fallback: f32,
    pub far_spawn_extra: f32,
    pub giant_interval: f32,
    pub giant_distance: Span,
    pub giant_hp: f32,
    pub giant_hp_ramp_seconds: f32,
    pub giant_speed: f32,
    pub daily_minutes: usize,
    /// Per-cycle buffs for minutes 10 and later, indexed by `(minute - 10) % len`
    pub late_twists: Vec<WaveTwist>,
}

/// Buff applied to every spawn of a late wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveTwist {
    /// Multiply base speed
    Speed(f32),
    /// Add hit points
    Hp(f32),
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_interval: 2.0,
            interval_ramp: 0.03,
            min_interval: 0.6,
            kernel_panic_interval: 0.45,
            kernel_panic_speed: 1.4,
            sine_rate: 0.8,
            sine_depth: 0.1,
            min_modulated_interval: 0.3,
            micro_burst_chance: 0.001,
            micro_burst_duration: Span::new(1.0, 2.0),
            micro_burst_factor: 0.65,
            min_effective_interval: 0.45,
            base_count: 2,
            count_ramp_seconds: 30.0,
            max_count_ramp: 6,
            spawn_stagger: 0.12,
            elite_chance: 1.0 / 500.0,
            elite_hp: 2.0,
            elite_speed: 1.2,
            boo_minutes: vec![3, 9],
            boo_watched: 0.1,
            boo_unwatched: 1.6,
            spawn_margin: 3.0,
            spawn_band: 8.0,
            spawn_tries: 12,
            spawn_fallback: 6.0,
            far_spawn_extra: 1.5,
            giant_interval: 25.0,
            giant_distance: Span::new(16.0, 22.0),
            giant_hp: 60.0,
            giant_hp_ramp_seconds: 6.0,
            giant_speed: 1.2,
            daily_minutes: 15,
            late_twists: vec![
                WaveTwist::Speed(1.1),
                WaveTwist::Hp(1.0),
                WaveTwist::Speed(1.15),
                WaveTwist::Speed(1.15),
                WaveTwist::Hp(2.0),
                WaveTwist::Hp(3.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HesitationTuning {
    pub first_delay: Span,
    pub decel: Span,
    pub pause: Span,
    pub accel: Span,
    pub cycle_gap: Span,
}

impl Default for HesitationTuning {
    fn default() -> Self {
        Self {
            first_delay: Span::new(2.0, 6.0),
            decel: Span::new(0.4, 0.6),
            pause: Span::new(0.15, 0.4),
            accel: Span::new(0.35, 0.55),
            cycle_gap: Span::new(2.0, 6.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    pub max_speed_multiplier: f32,
    pub runner_base: f32,
    pub runner_ramp: f32,
    pub runner_max_ramp: f32,
    pub runner_scale: f32,
    pub runner_run: Span,
    pub runner_pause: Span,
    pub runner_run_early: Span,
    pub runner_pause_early: Span,
    pub zigzag_freq: f32,
    pub zigzag_amp: f32,
    pub tank_watched_speed: f32,
    pub tank_unwatched_speed: f32,
    pub shooter_preferred: f32,
    pub shooter_band: f32,
    pub shooter_strafe_freq: f32,
    pub shooter_close: f32,
    pub shooter_aggressive_chance: f32,
    pub splitter_threshold: f32,
    pub splitter_child_hp: f32,
    pub splitter_child_speed: f32,
    pub splitter_offset: f32,
    pub bomber_speed: f32,
    pub bomber_trigger: f32,
    pub bomber_dash_time: f32,
    pub bomber_dash_speed: f32,
    pub bomber_blast: f32,
    pub bomber_damage: u32,
    pub sniper_retreat: f32,
    pub weaver_freq: f32,
    pub weaver_amp: f32,
    pub weaver_speed: f32,
    pub charger_windup: f32,
    pub charger_dash: f32,
    pub charger_recover: f32,
    pub charger_dash_speed: f32,
    pub orbiter_speed: f32,
    pub orbiter_trigger: f32,
    pub orbiter_flip_chance: f32,
    pub orbiter_swoop: f32,
    pub teleport_first: Span,
    pub teleport_next: Span,
    pub teleport_ring: Span,
    pub teleport_dash: f32,
    pub teleport_dash_speed: f32,
    pub teleport_initial_dash: f32,
    pub brute_speed: f32,
    pub brute_first_slam: Span,
    pub brute_next_slam: Span,
    pub brute_windup: f32,
    pub brute_windup_speed: f32,
    pub brute_radius: f32,
    pub brute_damage: u32,
    pub giant_window: f32,
    pub giant_hits: u32,
    pub giant_enrage: f32,
    pub giant_enrage_speed: f32,
    pub giant_recent_hit: f32,
    pub hit_tint: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            max_speed_multiplier: 2.0,
            runner_base: 2.8,
            runner_ramp: 0.02,
            runner_max_ramp: 3.0,
            runner_scale: 0.8,
            runner_run: Span::new(1.1, 1.8),
            runner_pause: Span::new(0.15, 0.35),
            runner_run_early: Span::new(0.8, 1.35),
            runner_pause_early: Span::new(0.35, 0.55),
            zigzag_freq: 6.0,
            zigzag_amp: 0.6,
            tank_watched_speed: 0.4,
            tank_unwatched_speed: 2.2,
            shooter_preferred: 7.0,
            shooter_band: 1.2,
            shooter_strafe_freq: 1.5,
            shooter_close: 0.9,
            shooter_aggressive_chance: 0.5,
            splitter_threshold: 2.0,
            splitter_child_hp: 2.0,
            splitter_child_speed: 3.0,
            splitter_offset: 0.4,
            bomber_speed: 2.4,
            bomber_trigger: 5.0,
            bomber_dash_time: 0.45,
            bomber_dash_speed: 5.5,
            bomber_blast: 1.2,
            bomber_damage: 1,
            sniper_retreat: 9.0,
            weaver_freq: 3.0,
            weaver_amp: 0.8,
            weaver_speed: 2.8,
            charger_windup: 0.6,
            charger_dash: 0.45,
            charger_recover: 0.5,
            charger_dash_speed: 6.0,
            orbiter_speed: 2.4,
            orbiter_trigger: 5.0,
            orbiter_flip_chance: 0.02,
            orbiter_swoop: 1.35,
            teleport_first: Span::new(2.0, 4.0),
            teleport_next: Span::new(2.5, 5.0),
            teleport_ring: Span::new(6.0, 8.0),
            teleport_dash: 0.3,
            teleport_dash_speed: 4.5,
            teleport_initial_dash: 0.35,
            brute_speed: 1.6,
            brute_first_slam: Span::new(2.0, 4.0),
            brute_next_slam: Span::new(2.2, 3.8),
            brute_windup: 0.4,
            brute_windup_speed: 0.7,
            brute_radius: 2.6,
            brute_damage: 1,
            giant_window: 1.0,
            giant_hits: 3,
            giant_enrage: 3.0,
            giant_enrage_speed: 1.8,
            giant_recent_hit: 0.8,
            hit_tint: 0.06,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullTuning {
    pub wave_cull_delay: f32,
    pub keep_fraction: f32,
    pub unseen_for: f32,
}

impl Default for CullTuning {
    fn default() -> Self {
        Self {
            wave_cull_delay: 2.0,
            keep_fraction: 0.03,
            unseen_for: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub maze_cell: f32,
    pub maze_step: i32,
    pub maze_extent: i32,
    pub maze_box: f32,
    pub maze_start_clear: i32,
    pub enemy_pad: f32,
    pub climb_speed: f32,
    pub climb_height: f32,
    pub climb_hold: f32,
    pub soft_radius: f32,
    pub soft_push: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            maze_cell: 8.0,
            maze_step: 8,
            maze_extent: 24,
            maze_box: 4.0,
            maze_start_clear: 4,
            enemy_pad: 0.4,
            climb_speed: 3.0,
            climb_height: 2.5,
            climb_hold: 0.6,
            soft_radius: 1.6,
            soft_push: 0.08,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "beam": { "dps": 9.0 } }"#).unwrap();
        assert_eq!(t.beam.dps, 9.0);
        assert_eq!(t.beam.length, 6.0);
        assert_eq!(t.gun.fire_interval, 0.5);
    }

    #[test]
    fn test_json_round_trip() {
        let t = Tuning::default();
        let back = Tuning::from_json(&t.to_json()).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn test_xp_odds_ascending_and_bounded() {
        let drops = DropTuning::default();
        for pair in drops.xp_odds.windows(2) {
            assert!(pair[0].from_wave < pair[1].from_wave);
        }
        for row in &drops.xp_odds {
            assert!(row.odds.iter().sum::<f32>() <= 1.0 + 1e-6);
        }
    }
}
