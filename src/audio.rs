//! Audio cues
//!
//! The simulation pushes fire-and-forget [`SoundCue`]s into its event
//! stream. On the web they are voiced by [`AudioManager`] with procedural
//! oscillator blips, so no sound files ship with the game.

use serde::{Deserialize, Serialize};

/// Named sound cue emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundCue {
    /// Primary gun volley
    Shoot,
    /// Bullet or rocket hit that did not kill
    Impact,
    EnemyDown,
    /// XP orb, bundle, heal or vacuum collected
    Pickup,
    LevelUp,
    PlayerHit,
    Shockwave,
    /// Player hit points reached zero
    Death,
}

impl SoundCue {
    pub const ALL: [SoundCue; 8] = [
        SoundCue::Shoot,
        SoundCue::Impact,
        SoundCue::EnemyDown,
        SoundCue::Pickup,
        SoundCue::LevelUp,
        SoundCue::PlayerHit,
        SoundCue::Shockwave,
        SoundCue::Death,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Impact => "impact",
            SoundCue::EnemyDown => "enemyDown",
            SoundCue::Pickup => "pickup",
            SoundCue::LevelUp => "levelUp",
            SoundCue::PlayerHit => "playerHit",
            SoundCue::Shockwave => "shockwave",
            SoundCue::Death => "death",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Effective gain for a cue given the mixer state
pub fn mix_volume(master: f32, sfx: f32, muted: bool) -> f32 {
    if muted {
        0.0
    } else {
        master.clamp(0.0, 1.0) * sfx.clamp(0.0, 1.0)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundCue, mix_volume};

    /// One oscillator blip: frequency, length, peak gain, waveform and
    /// start offset in seconds
    struct Blip {
        freq: f32,
        duration: f64,
        level: f32,
        wave: OscillatorType,
        delay: f64,
    }

    const fn blip(freq: f32, duration: f64, level: f32, wave: OscillatorType, delay: f64) -> Blip {
        Blip {
            freq,
            duration,
            level,
            wave,
            delay,
        }
    }

    /// Web Audio voice for the simulation's cues
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.9,
                sfx_volume: 0.9,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        /// Voice a cue. Silently does nothing without an audio context.
        pub fn play(&self, cue: SoundCue) {
            let vol = mix_volume(self.master_volume, self.sfx_volume, self.muted);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Shoot => self.blips(ctx, vol, &[blip(950.0, 0.045, 0.22, OscillatorType::Square, 0.0)]),
                SoundCue::Impact => self.blips(ctx, vol, &[blip(520.0, 0.035, 0.18, OscillatorType::Square, 0.0)]),
                SoundCue::EnemyDown => self.blips(
                    ctx,
                    vol,
                    &[
                        blip(300.0, 0.05, 0.24, OscillatorType::Square, 0.0),
                        blip(90.0, 0.03, 0.16, OscillatorType::Sawtooth, 0.0),
                    ],
                ),
                SoundCue::Pickup => self.blips(
                    ctx,
                    vol,
                    &[
                        blip(1700.0, 0.06, 0.2, OscillatorType::Triangle, 0.0),
                        blip(2000.0, 0.06, 0.18, OscillatorType::Triangle, 0.07),
                    ],
                ),
                SoundCue::LevelUp => self.blips(
                    ctx,
                    vol,
                    &[
                        blip(880.0, 0.1, 0.16, OscillatorType::Square, 0.0),
                        blip(1175.0, 0.1, 0.16, OscillatorType::Square, 0.09),
                        blip(1480.0, 0.12, 0.16, OscillatorType::Square, 0.18),
                    ],
                ),
                SoundCue::PlayerHit => self.sweep(ctx, vol, 700.0, 220.0, 0.16, 0.4, OscillatorType::Triangle),
                SoundCue::Shockwave => self.sweep(ctx, vol, 180.0, 45.0, 0.3, 0.35, OscillatorType::Sine),
                SoundCue::Death => {
                    self.sweep(ctx, vol, 320.0, 60.0, 0.65, 0.6, OscillatorType::Sawtooth);
                    self.blips(
                        ctx,
                        vol,
                        &[
                            blip(392.0, 0.2, 0.12, OscillatorType::Sawtooth, 0.0),
                            blip(466.0, 0.2, 0.12, OscillatorType::Sawtooth, 0.14),
                            blip(523.0, 0.24, 0.12, OscillatorType::Sawtooth, 0.28),
                        ],
                    );
                }
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short attack, exponential decay clicks
        fn blips(&self, ctx: &AudioContext, vol: f32, blips: &[Blip]) {
            for b in blips {
                let Some((osc, gain)) = self.create_osc(ctx, b.freq, b.wave) else {
                    continue;
                };
                let t = ctx.current_time() + b.delay;
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(vol * b.level, t + 0.003)
                    .ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.0001, t + b.duration)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + b.duration + 0.02).ok();
            }
        }

        /// Falling pitch sweep
        #[allow(clippy::too_many_arguments)]
        fn sweep(
            &self,
            ctx: &AudioContext,
            vol: f32,
            from: f32,
            to: f32,
            duration: f64,
            level: f32,
            wave: OscillatorType,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, from, wave) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol * level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + duration)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + duration * 0.9)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + duration + 0.05).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names_match_wire_names() {
        for cue in SoundCue::ALL {
            let json = serde_json::to_string(&cue).unwrap();
            assert_eq!(json, format!("\"{}\"", cue.name()));
            assert_eq!(SoundCue::from_name(cue.name()), Some(cue));
        }
        assert_eq!(SoundCue::from_name("boing"), None);
    }

    #[test]
    fn test_mix_volume() {
        assert_eq!(mix_volume(0.5, 0.5, false), 0.25);
        assert_eq!(mix_volume(2.0, 1.0, false), 1.0);
        assert_eq!(mix_volume(1.0, 1.0, true), 0.0);
    }
}
