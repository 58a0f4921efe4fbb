//! Damage application and death payout
//!
//! Every weapon, projectile and behavior funnels through [`apply_damage`]
//! or [`kill`]. The alive -> dead transition happens in exactly one place
//! (`Enemy::tombstone`), so an enemy that two weapons overlap on in the
//! same frame pays out once.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::enemy::{Behavior, Enemy};
use super::state::{GameEvent, Ledger};
use crate::audio::SoundCue;
use crate::tuning::Tuning;

/// What dealt the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Primary or side bullet
    Bullet,
    /// Direct rocket impact
    RocketHit,
    /// Rocket blast
    Rocket,
    Beam,
    /// Blades, tail, paint, lasso, shockwave
    Area,
}

impl DamageSource {
    /// Projectile and beam kills roll an extra pickup; blasts and area
    /// weapons do not
    fn rolls_bonus_drop(self) -> bool {
        matches!(
            self,
            DamageSource::Bullet | DamageSource::RocketHit | DamageSource::Beam
        )
    }
}

/// Why an enemy left play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Hit points ran out: score, XP and maybe a bonus pickup
    Slain { bonus_roll: bool },
    /// Rammed the player
    Contact,
    /// Bomber self-destruct
    Exploded,
    /// Splitter replaced by its children
    Split,
    /// Removed off-screen by a cull; pays nothing
    Culled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already dead
    Ignored,
    Wounded,
    Killed,
}

/// Borrowed slice of the game state that damage writes into
pub struct DamageCtx<'a> {
    pub now: f32,
    pub wave: u32,
    pub plentiful: bool,
    pub tuning: &'a Tuning,
    pub rng: &'a mut Pcg32,
    pub ledger: &'a mut Ledger,
}

/// Subtract hit points, tint, and kill at zero.
///
/// Negative amounts are treated as zero.
pub fn apply_damage(
    enemy: &mut Enemy,
    amount: f32,
    source: DamageSource,
    ctx: &mut DamageCtx,
) -> DamageOutcome {
    if !enemy.alive {
        return DamageOutcome::Ignored;
    }
    let amount = amount.max(0.0);
    enemy.hp -= amount;
    enemy.hit_tint_until = ctx.now + ctx.tuning.behavior.hit_tint;
    note_giant_hit(enemy, ctx.now, ctx.tuning);

    if enemy.hp <= 0.0 {
        kill(
            enemy,
            DeathCause::Slain {
                bonus_roll: source.rolls_bonus_drop(),
            },
            ctx,
        );
        DamageOutcome::Killed
    } else {
        ctx.ledger.cue(SoundCue::Impact);
        DamageOutcome::Wounded
    }
}

/// Giants enrage after several hits inside a short window
fn note_giant_hit(enemy: &mut Enemy, now: f32, tuning: &Tuning) {
    let b = &tuning.behavior;
    if let Behavior::Giant {
        recent_hits,
        last_hit_at,
        enraged_until,
    } = &mut enemy.behavior
    {
        if *last_hit_at < now - b.giant_window {
            *recent_hits = 0;
        }
        *recent_hits += 1;
        *last_hit_at = now;
        if *recent_hits >= b.giant_hits {
            *enraged_until = now + b.giant_enrage;
        }
    }
}

/// Single exit point for enemies. Returns false if it was already dead.
pub fn kill(enemy: &mut Enemy, cause: DeathCause, ctx: &mut DamageCtx) -> bool {
    let Some(visual) = enemy.tombstone() else {
        return false;
    };
    let ledger = &mut *ctx.ledger;
    ledger.stats.enemy_removed();
    if let Some(handle) = visual {
        ledger.events.push(GameEvent::ReleaseVisual(handle));
    }

    match cause {
        DeathCause::Slain { bonus_roll } => {
            ledger.stats.score += 1;
            ledger.stats.kills += 1;
            drop_xp_on_death(enemy, ctx);
            if bonus_roll && ctx.rng.random::<f32>() < ctx.tuning.drops.bonus_drop_chance {
                ctx.ledger.drops.drop_pickup(
                    &mut ctx.ledger.ids,
                    &mut *ctx.rng,
                    enemy.pos,
                    ctx.wave,
                    ctx.plentiful,
                    &ctx.tuning.drops,
                );
            }
            enemy_down(enemy, ctx.ledger);
        }
        DeathCause::Contact | DeathCause::Exploded => {
            ledger.events.push(GameEvent::Explosion {
                pos: enemy.pos,
                radius: 1.0,
            });
            enemy_down(enemy, ledger);
        }
        DeathCause::Split => enemy_down(enemy, ledger),
        DeathCause::Culled => {
            log::debug!("culled {} #{}", enemy.kind.name(), enemy.id);
        }
    }
    true
}

fn enemy_down(enemy: &Enemy, ledger: &mut Ledger) {
    ledger.events.push(GameEvent::EnemyDown {
        id: enemy.id,
        kind: enemy.kind,
        pos: enemy.pos,
    });
    ledger.cue(SoundCue::EnemyDown);
}

fn drop_xp_on_death(enemy: &Enemy, ctx: &mut DamageCtx) {
    let drops = &ctx.tuning.drops;
    let ledger = &mut *ctx.ledger;
    if enemy.is_giant() {
        ledger
            .drops
            .spawn_xp(&mut ledger.ids, enemy.pos, drops.giant_bundle);
        for _ in 0..drops.giant_extra_drops {
            let jitter = Vec2::new(
                ctx.rng.random_range(-0.4..0.4),
                ctx.rng.random_range(-0.4..0.4),
            );
            ledger.drops.spawn_rolled_xp(
                &mut ledger.ids,
                &mut *ctx.rng,
                enemy.pos + jitter,
                ctx.wave,
                drops,
            );
        }
    } else {
        ledger
            .drops
            .spawn_rolled_xp(&mut ledger.ids, &mut *ctx.rng, enemy.pos, ctx.wave, drops);
    }
}
