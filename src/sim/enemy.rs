//! Enemy records
//!
//! An enemy is a common core (position, hit points, speeds, wave tag)
//! plus a per-kind [`Behavior`] payload. Stateless chasers carry
//! `Behavior::Chase`; every kind with a phase machine owns exactly the
//! fields that machine needs.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Tombstone;
use crate::tuning::{BehaviorTuning, HesitationTuning, Tuning};

/// Enemy variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Slime,
    Runner,
    Zigzag,
    Tank,
    Shooter,
    Spinner,
    Splitter,
    Bomber,
    Sniper,
    Weaver,
    Charger,
    Orbiter,
    Teleport,
    Brute,
    /// Periodic elite with a large hit point pool
    Giant,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 15] = [
        EnemyKind::Slime,
        EnemyKind::Runner,
        EnemyKind::Zigzag,
        EnemyKind::Tank,
        EnemyKind::Shooter,
        EnemyKind::Spinner,
        EnemyKind::Splitter,
        EnemyKind::Bomber,
        EnemyKind::Sniper,
        EnemyKind::Weaver,
        EnemyKind::Charger,
        EnemyKind::Orbiter,
        EnemyKind::Teleport,
        EnemyKind::Brute,
        EnemyKind::Giant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Slime => "slime",
            EnemyKind::Runner => "runner",
            EnemyKind::Zigzag => "zigzag",
            EnemyKind::Tank => "tank",
            EnemyKind::Shooter => "shooter",
            EnemyKind::Spinner => "spinner",
            EnemyKind::Splitter => "splitter",
            EnemyKind::Bomber => "bomber",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Weaver => "weaver",
            EnemyKind::Charger => "charger",
            EnemyKind::Orbiter => "orbiter",
            EnemyKind::Teleport => "teleport",
            EnemyKind::Brute => "brute",
            EnemyKind::Giant => "giant",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Kinds that scale maze walls instead of being pushed off them
    pub fn can_climb(self) -> bool {
        matches!(self, EnemyKind::Runner | EnemyKind::Charger | EnemyKind::Shooter)
    }

    /// Hit points and speed for a wave spawn at session time `t`
    pub fn spawn_stats(self, t: f32) -> (f32, f32) {
        let ramp = |base: f32, div: f32| base + (t / div).floor();
        match self {
            EnemyKind::Runner => (ramp(2.0, 35.0), 2.4),
            EnemyKind::Spinner => (ramp(3.0, 30.0), 3.2),
            EnemyKind::Splitter => (ramp(5.0, 28.0), 2.6),
            EnemyKind::Bomber => (ramp(4.0, 30.0), 2.9),
            EnemyKind::Sniper => (ramp(4.0, 28.0), 2.7),
            EnemyKind::Weaver => (ramp(5.0, 26.0), 3.1),
            EnemyKind::Zigzag => (ramp(2.0, 35.0), 2.6),
            EnemyKind::Tank => (ramp(6.0, 24.0), 1.5),
            EnemyKind::Shooter => (ramp(4.0, 25.0), 2.0),
            EnemyKind::Charger => (ramp(6.0, 22.0), 2.3),
            EnemyKind::Orbiter => (ramp(5.0, 25.0), 2.4),
            EnemyKind::Teleport => (ramp(5.0, 24.0), 2.3),
            EnemyKind::Brute => (ramp(10.0, 18.0), 1.6),
            EnemyKind::Giant => (ramp(60.0, 6.0), 1.2),
            EnemyKind::Slime => (ramp(2.0, 40.0), 2.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StridePhase {
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomberPhase {
    Flank,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePhase {
    Windup,
    Dash,
    Recover,
}

/// Per-kind behavior state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Direct chase with a kind-specific steering rule and no stored state
    Chase,
    Runner {
        phase: StridePhase,
        timer: f32,
        run: f32,
        pause: f32,
    },
    Shooter {
        aggressive: bool,
    },
    Bomber {
        phase: BomberPhase,
        dash_left: f32,
    },
    Charger {
        phase: ChargePhase,
        timer: f32,
        dash_left: f32,
    },
    Orbiter {
        orbit_dir: f32,
        swoop_dir: f32,
    },
    Teleport {
        next_at: f32,
        dash_left: f32,
    },
    Brute {
        next_slam_at: f32,
    },
    Giant {
        recent_hits: u32,
        last_hit_at: f32,
        enraged_until: f32,
    },
}

impl Behavior {
    /// Initial state for a freshly spawned enemy
    pub fn spawn<R: Rng + ?Sized>(
        kind: EnemyKind,
        now: f32,
        spawn_wave: u32,
        rng: &mut R,
        tuning: &BehaviorTuning,
    ) -> Self {
        let coin = |rng: &mut R| if rng.random::<f32>() < 0.5 { 1.0 } else { -1.0 };
        match kind {
            EnemyKind::Runner => {
                let (run, pause) = runner_spans(spawn_wave, tuning);
                Behavior::Runner {
                    phase: StridePhase::Running,
                    timer: 0.0,
                    run: run.sample(rng),
                    pause: pause.sample(rng),
                }
            }
            EnemyKind::Shooter => Behavior::Shooter {
                aggressive: rng.random::<f32>() < tuning.shooter_aggressive_chance,
            },
            EnemyKind::Bomber => Behavior::Bomber {
                phase: BomberPhase::Flank,
                dash_left: 0.0,
            },
            EnemyKind::Charger => Behavior::Charger {
                phase: ChargePhase::Windup,
                timer: 0.0,
                dash_left: 0.0,
            },
            EnemyKind::Orbiter => Behavior::Orbiter {
                orbit_dir: coin(rng),
                swoop_dir: coin(rng),
            },
            EnemyKind::Teleport => Behavior::Teleport {
                next_at: now + tuning.teleport_first.sample(rng),
                dash_left: tuning.teleport_initial_dash,
            },
            EnemyKind::Brute => Behavior::Brute {
                next_slam_at: now + tuning.brute_first_slam.sample(rng),
            },
            EnemyKind::Giant => Behavior::Giant {
                recent_hits: 0,
                last_hit_at: f32::NEG_INFINITY,
                enraged_until: 0.0,
            },
            _ => Behavior::Chase,
        }
    }
}

/// Run/pause spans for runners; wave-2 spawns pause longer
pub fn runner_spans(
    spawn_wave: u32,
    tuning: &BehaviorTuning,
) -> (crate::tuning::Span, crate::tuning::Span) {
    if spawn_wave == 1 {
        (tuning.runner_run_early, tuning.runner_pause_early)
    } else {
        (tuning.runner_run, tuning.runner_pause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HesitationPhase {
    Moving { next_at: f32 },
    Decel { timer: f32, duration: f32 },
    Paused { timer: f32, duration: f32 },
    Accel { timer: f32, duration: f32 },
}

/// Decelerate, pause, accelerate cycle that spreads out clumps of chasers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hesitation {
    pub phase: HesitationPhase,
}

impl Hesitation {
    pub fn new<R: Rng + ?Sized>(now: f32, rng: &mut R, tuning: &HesitationTuning) -> Self {
        Self {
            phase: HesitationPhase::Moving {
                next_at: now + tuning.first_delay.sample(rng),
            },
        }
    }

    /// Advance the cycle and return the speed scale in `[0, 1]`
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        now: f32,
        dt: f32,
        rng: &mut R,
        tuning: &HesitationTuning,
    ) -> f32 {
        let ease = |timer: f32, duration: f32| (timer / duration.max(1e-3)).min(1.0);
        let (phase, scale) = match self.phase {
            HesitationPhase::Moving { next_at } if now >= next_at => (
                HesitationPhase::Decel {
                    timer: 0.0,
                    duration: tuning.decel.sample(rng),
                },
                1.0,
            ),
            moving @ HesitationPhase::Moving { .. } => (moving, 1.0),
            HesitationPhase::Decel { timer, duration } => {
                let timer = timer + dt;
                let t = ease(timer, duration);
                if t >= 1.0 {
                    (
                        HesitationPhase::Paused {
                            timer: 0.0,
                            duration: tuning.pause.sample(rng),
                        },
                        0.0,
                    )
                } else {
                    (HesitationPhase::Decel { timer, duration }, 1.0 - t * t)
                }
            }
            HesitationPhase::Paused { timer, duration } => {
                let timer = timer + dt;
                if timer >= duration {
                    (
                        HesitationPhase::Accel {
                            timer: 0.0,
                            duration: tuning.accel.sample(rng),
                        },
                        0.0,
                    )
                } else {
                    (HesitationPhase::Paused { timer, duration }, 0.0)
                }
            }
            HesitationPhase::Accel { timer, duration } => {
                let timer = timer + dt;
                let t = ease(timer, duration);
                if t >= 1.0 {
                    (
                        HesitationPhase::Moving {
                            next_at: now + tuning.cycle_gap.sample(rng),
                        },
                        1.0,
                    )
                } else {
                    (HesitationPhase::Accel { timer, duration }, t * t)
                }
            }
        };
        self.phase = phase;
        scale.clamp(0.0, 1.0)
    }
}

/// Vertical state for maze climbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClimbState {
    Ground,
    Ascending,
    OnTop { until: f32 },
    Descending,
}

/// Temporary movement slow applied by area weapons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slow {
    pub until: f32,
    pub factor: f32,
}

/// Renderer-side resource owned by an enemy until it dies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub alive: bool,
    pub pos: Vec2,
    /// Height above ground (climbers only)
    pub height: f32,
    pub hp: f32,
    pub base_speed: f32,
    pub speed: f32,
    pub spawn_wave: u32,
    pub time_alive: f32,
    pub behavior: Behavior,
    pub hesitation: Hesitation,
    pub slow: Option<Slow>,
    pub climb: Option<ClimbState>,
    /// Rare 1/500 spawn: more hp, faster steering
    pub elite: bool,
    /// Crawls when looked at, sprints otherwise
    pub boo: bool,
    pub hit_tint_until: f32,
    pub last_onscreen_at: f32,
    /// Touched by paint at least once
    pub painted: bool,
    pub visual: Option<VisualHandle>,
}

impl Tombstone for Enemy {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl Enemy {
    /// Create an enemy with freshly rolled behavior and hesitation state
    #[allow(clippy::too_many_arguments)]
    pub fn spawn<R: Rng + ?Sized>(
        id: u32,
        kind: EnemyKind,
        pos: Vec2,
        hp: f32,
        speed: f32,
        spawn_wave: u32,
        now: f32,
        rng: &mut R,
        tuning: &Tuning,
    ) -> Self {
        Self {
            id,
            kind,
            alive: true,
            pos,
            height: 0.0,
            hp,
            base_speed: speed,
            speed,
            spawn_wave,
            time_alive: 0.0,
            behavior: Behavior::spawn(kind, now, spawn_wave, rng, &tuning.behavior),
            hesitation: Hesitation::new(now, rng, &tuning.hesitation),
            slow: None,
            climb: kind.can_climb().then_some(ClimbState::Ground),
            elite: false,
            boo: false,
            hit_tint_until: 0.0,
            last_onscreen_at: now,
            painted: false,
            visual: Some(VisualHandle(id)),
        }
    }

    /// Deterministic enemy that never hesitates (test fixture)
    #[cfg(test)]
    pub(crate) fn bare(
        id: u32,
        kind: EnemyKind,
        pos: Vec2,
        hp: f32,
        speed: f32,
        spawn_wave: u32,
    ) -> Self {
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(id as u64);
        let mut e = Self::spawn(
            id,
            kind,
            pos,
            hp,
            speed,
            spawn_wave,
            0.0,
            &mut rng,
            &Tuning::default(),
        );
        e.hesitation.phase = HesitationPhase::Moving {
            next_at: f32::INFINITY,
        };
        e
    }

    /// Mark dead and hand back the presentation resource.
    ///
    /// Returns `None` if the enemy was already dead, so callers can use it
    /// as the single alive -> dead transition point.
    pub fn tombstone(&mut self) -> Option<Option<VisualHandle>> {
        if !self.alive {
            return None;
        }
        self.alive = false;
        Some(self.visual.take())
    }

    pub fn apply_slow(&mut self, until: f32, factor: f32) {
        self.slow = Some(Slow { until, factor });
    }

    /// Slow factor active at `now` (1.0 when none)
    pub fn slow_factor(&self, now: f32) -> f32 {
        match self.slow {
            Some(s) if s.until > now => s.factor,
            _ => 1.0,
        }
    }

    pub fn is_giant(&self) -> bool {
        self.kind == EnemyKind::Giant
    }
}
