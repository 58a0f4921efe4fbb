//! XP, levels and the level-up choice queue
//!
//! Several level-ups earned from a single XP gain are queued in
//! `pending` and offered one at a time: resolving a choice re-rolls a
//! fresh offer until the queue is empty.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, GameState};
use super::weapons::{Arsenal, WeaponKind};
use crate::audio::SoundCue;
use crate::consts::LEVEL_UP_MAGNET_TAIL;
use crate::tuning::{ProgressionTuning, Tuning};

/// Passive upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    TurboCpu,
    ScsiSplitter,
    OverclockedBus,
    CopperHeatsink,
    EccMemory,
    DmaBurst,
    MagnetCoil,
    PiercingIsa,
    XpAmplifier,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 9] = [
        UpgradeKind::TurboCpu,
        UpgradeKind::ScsiSplitter,
        UpgradeKind::OverclockedBus,
        UpgradeKind::CopperHeatsink,
        UpgradeKind::EccMemory,
        UpgradeKind::DmaBurst,
        UpgradeKind::MagnetCoil,
        UpgradeKind::PiercingIsa,
        UpgradeKind::XpAmplifier,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::TurboCpu => "Turbo CPU",
            UpgradeKind::ScsiSplitter => "SCSI Splitter",
            UpgradeKind::OverclockedBus => "Overclocked Bus",
            UpgradeKind::CopperHeatsink => "Copper Heatsink",
            UpgradeKind::EccMemory => "ECC Memory",
            UpgradeKind::DmaBurst => "DMA Burst",
            UpgradeKind::MagnetCoil => "Magnet Coil",
            UpgradeKind::PiercingIsa => "Piercing ISA",
            UpgradeKind::XpAmplifier => "XP Amplifier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            UpgradeKind::TurboCpu => "Fire rate +12%",
            UpgradeKind::ScsiSplitter => "+1 bullet per volley",
            UpgradeKind::OverclockedBus => "Move speed up",
            UpgradeKind::CopperHeatsink => "+1 bullet damage",
            UpgradeKind::EccMemory => "+1 max HP and heal",
            UpgradeKind::DmaBurst => "+1 volley per trigger",
            UpgradeKind::MagnetCoil => "Larger pickup magnet",
            UpgradeKind::PiercingIsa => "Bullets pierce +1",
            UpgradeKind::XpAmplifier => "More XP per orb",
        }
    }
}

/// One card on the level-up screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    NewWeapon(WeaponKind),
    WeaponLevel(WeaponKind),
    Upgrade(UpgradeKind),
}

impl Choice {
    pub fn title(self) -> String {
        match self {
            Choice::NewWeapon(kind) => format!("New: {}", kind.name()),
            Choice::WeaponLevel(kind) => format!("{} +1", kind.name()),
            Choice::Upgrade(kind) => kind.name().to_string(),
        }
    }
}

/// Weapons and upgrades granted before a run starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    pub weapons: Vec<(WeaponKind, u32)>,
    pub upgrades: Vec<(UpgradeKind, u32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    pub xp: f32,
    pub xp_to_level: u32,
    pub level: u32,
    /// Level-ups earned but not yet chosen
    pub pending: u32,
    pub xp_multiplier: f32,
    /// Owned upgrades with their levels, in pick order
    upgrades: Vec<(UpgradeKind, u32)>,
    /// Choices currently on screen
    pub offer: Vec<Choice>,
    growth: f32,
}

impl Progression {
    pub fn new(tuning: &ProgressionTuning) -> Self {
        Self {
            xp: 0.0,
            xp_to_level: tuning.xp_to_level,
            level: 1,
            pending: 0,
            xp_multiplier: 1.0,
            upgrades: Vec::new(),
            offer: Vec::new(),
            growth: tuning.growth,
        }
    }

    /// Add XP, scaled by the multiplier. Returns how many levels it earned.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount as f32 * self.xp_multiplier;
        let mut gained = 0;
        while self.xp >= self.xp_to_level as f32 {
            self.xp -= self.xp_to_level as f32;
            self.level += 1;
            self.pending += 1;
            gained += 1;
            self.xp_to_level = (self.xp_to_level as f32 * self.growth).floor() as u32;
        }
        gained
    }

    pub fn upgrades(&self) -> &[(UpgradeKind, u32)] {
        &self.upgrades
    }

    pub fn upgrade_level(&self, kind: UpgradeKind) -> Option<u32> {
        self.upgrades
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, l)| *l)
    }

    /// Bump an upgrade's level, acquiring it at 1. Returns the new level.
    fn raise_upgrade(&mut self, kind: UpgradeKind) -> u32 {
        match self.upgrades.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => {
                slot.1 += 1;
                slot.1
            }
            None => {
                self.upgrades.push((kind, 1));
                1
            }
        }
    }

    /// Draw a fresh, shuffled offer
    pub fn roll_choices<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        arsenal: &Arsenal,
        tuning: &ProgressionTuning,
    ) -> Vec<Choice> {
        let mut pool: Vec<Choice> = Vec::new();
        if arsenal.count() < tuning.max_weapons {
            pool.extend(
                WeaponKind::ALL
                    .into_iter()
                    .filter(|k| !arsenal.owns(*k))
                    .map(Choice::NewWeapon),
            );
        }
        let room_for_upgrades = self.upgrades.len() < tuning.max_upgrades;
        pool.extend(
            UpgradeKind::ALL
                .into_iter()
                .filter(|k| room_for_upgrades || self.upgrade_level(*k).is_some())
                .map(Choice::Upgrade),
        );
        pool.extend(
            arsenal
                .owned()
                .iter()
                .map(|(kind, _)| Choice::WeaponLevel(*kind)),
        );
        pool.shuffle(rng);
        pool.truncate(tuning.choices);
        pool
    }
}

/// XP multiplier for an amplifier level
fn amplifier_multiplier(level: u32, tuning: &ProgressionTuning) -> f32 {
    match level {
        0 => 1.0,
        1 => tuning.xp_amp_levels[0],
        2 => tuning.xp_amp_levels[1],
        n => (1.0 + n as f32).min(tuning.max_xp_multiplier),
    }
}

/// Enter the level-up phase if a level-up is waiting
pub fn open_level_up(state: &mut GameState) -> bool {
    if state.progression.pending == 0 || state.phase != GamePhase::Playing {
        return false;
    }
    state.progression.offer =
        state
            .progression
            .roll_choices(&mut state.rng, &state.arsenal, &state.tuning.progression);
    state.phase = GamePhase::LevelUp;
    state.level_up_tail = LEVEL_UP_MAGNET_TAIL;
    state
        .ledger
        .events
        .push(GameEvent::LevelUp(state.progression.level));
    state.ledger.cue(SoundCue::LevelUp);
    log::info!(
        "Level up to {} ({} pending)",
        state.progression.level,
        state.progression.pending
    );
    true
}

/// Resolve the offered choice at `index`. Returns false if there is no
/// open offer or the index is out of range.
pub fn apply_choice(state: &mut GameState, index: usize) -> bool {
    if state.phase != GamePhase::LevelUp {
        return false;
    }
    let Some(choice) = state.progression.offer.get(index).copied() else {
        return false;
    };
    log::info!("Picked {}", choice.title());
    grant(state, choice);
    state.progression.pending = state.progression.pending.saturating_sub(1);
    if state.progression.pending > 0 {
        state.progression.offer =
            state
                .progression
                .roll_choices(&mut state.rng, &state.arsenal, &state.tuning.progression);
    } else {
        state.progression.offer.clear();
        state.phase = GamePhase::Playing;
    }
    true
}

fn grant(state: &mut GameState, choice: Choice) {
    match choice {
        Choice::NewWeapon(kind) => {
            state.arsenal.add(kind, &mut state.gun, &state.tuning);
        }
        Choice::WeaponLevel(kind) => {
            state.arsenal.level_up(kind, &mut state.gun, &state.tuning);
        }
        Choice::Upgrade(kind) => apply_upgrade(state, kind),
    }
}

/// Take one level of an upgrade and apply its effect
pub fn apply_upgrade(state: &mut GameState, kind: UpgradeKind) {
    let level = state.progression.raise_upgrade(kind);
    let GameState {
        gun,
        player,
        progression,
        ledger,
        tuning,
        ..
    } = state;
    let tuning: &Tuning = tuning;
    let p = &tuning.progression;
    match kind {
        UpgradeKind::TurboCpu => {
            gun.fire_interval =
                (gun.fire_interval * tuning.gun.fire_interval_upgrade).max(tuning.gun.min_fire_interval);
        }
        UpgradeKind::ScsiSplitter => {
            gun.multishot = (gun.multishot + 1).min(tuning.gun.max_multishot);
        }
        UpgradeKind::OverclockedBus => {
            player.speed = (player.speed + p.speed_step).min(tuning.player.max_speed);
        }
        UpgradeKind::CopperHeatsink => gun.damage += p.damage_step,
        UpgradeKind::EccMemory => {
            player.max_hp += 1;
            player.heal((player.max_hp as f32 * p.ecc_heal).ceil() as u32);
        }
        UpgradeKind::DmaBurst => gun.burst = (gun.burst + 1).min(tuning.gun.max_burst),
        UpgradeKind::MagnetCoil => {
            ledger.drops.magnet_radius =
                (ledger.drops.magnet_radius + p.magnet_step).min(tuning.drops.max_magnet_radius);
        }
        UpgradeKind::PiercingIsa => gun.pierce = (gun.pierce + 1).min(tuning.gun.max_pierce),
        UpgradeKind::XpAmplifier => progression.xp_multiplier = amplifier_multiplier(level, p),
    }
}

/// Grant a starting loadout (debug runs)
pub fn apply_loadout(state: &mut GameState, loadout: &Loadout) {
    for &(kind, level) in &loadout.weapons {
        if !state.arsenal.add(kind, &mut state.gun, &state.tuning) {
            continue;
        }
        for _ in 1..level {
            state.arsenal.level_up(kind, &mut state.gun, &state.tuning);
        }
    }
    for &(kind, level) in &loadout.upgrades {
        for _ in 0..level {
            apply_upgrade(state, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_one_gain_queues_two_levels() {
        let mut p = Progression::new(&ProgressionTuning::default());
        assert_eq!(p.gain_xp(12), 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.pending, 2);
        assert_eq!(p.xp, 0.0);
        assert_eq!(p.xp_to_level, 10);
    }

    #[test]
    fn test_multiplier_scales_gain() {
        let mut p = Progression::new(&ProgressionTuning::default());
        p.xp_multiplier = 1.2;
        assert_eq!(p.gain_xp(3), 0);
        assert!((p.xp - 3.6).abs() < 1e-5);
    }

    #[test]
    fn test_amplifier_curve() {
        let t = ProgressionTuning::default();
        let levels: Vec<f32> = (1..=6).map(|l| amplifier_multiplier(l, &t)).collect();
        assert_eq!(levels, vec![1.2, 3.0, 4.0, 5.0, 6.0, 6.0]);
    }

    #[test]
    fn test_offer_respects_weapon_cap() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        for kind in WeaponKind::ALL.into_iter().take(5) {
            let GameState { arsenal, gun, .. } = &mut state;
            arsenal.add(kind, gun, &tuning);
        }
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..50 {
            let offer = state
                .progression
                .roll_choices(&mut rng, &state.arsenal, &tuning.progression);
            assert_eq!(offer.len(), 3);
            assert!(!offer.iter().any(|c| matches!(c, Choice::NewWeapon(_))));
        }
    }

    #[test]
    fn test_full_upgrade_slots_only_offer_owned() {
        let mut state = GameState::new(2);
        for kind in UpgradeKind::ALL.into_iter().take(5) {
            apply_upgrade(&mut state, kind);
        }
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..50 {
            let offer =
                state
                    .progression
                    .roll_choices(&mut rng, &state.arsenal, &state.tuning.progression);
            for choice in offer {
                if let Choice::Upgrade(kind) = choice {
                    assert!(state.progression.upgrade_level(kind).is_some());
                }
            }
        }
    }

    #[test]
    fn test_choices_resolve_one_at_a_time() {
        let mut state = GameState::new(3);
        state.progression.gain_xp(12);
        assert!(open_level_up(&mut state));
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(state.level_up_tail, LEVEL_UP_MAGNET_TAIL);
        assert!(state.ledger.events.contains(&GameEvent::Cue(SoundCue::LevelUp)));

        assert!(!apply_choice(&mut state, 7));
        assert!(apply_choice(&mut state, 0));
        assert_eq!(state.progression.pending, 1);
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(state.progression.offer.len(), 3);

        assert!(apply_choice(&mut state, 1));
        assert_eq!(state.progression.pending, 0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.progression.offer.is_empty());
    }

    #[test]
    fn test_upgrade_effects_and_caps() {
        let mut state = GameState::new(4);
        for _ in 0..8 {
            apply_upgrade(&mut state, UpgradeKind::ScsiSplitter);
            apply_upgrade(&mut state, UpgradeKind::PiercingIsa);
            apply_upgrade(&mut state, UpgradeKind::MagnetCoil);
        }
        assert_eq!(state.gun.multishot, 6);
        assert_eq!(state.gun.pierce, 3);
        assert_eq!(state.ledger.drops.magnet_radius, 5.0);

        state.player.hp = 1;
        apply_upgrade(&mut state, UpgradeKind::EccMemory);
        assert_eq!(state.player.max_hp, 6);
        assert_eq!(state.player.hp, 4);

        apply_upgrade(&mut state, UpgradeKind::TurboCpu);
        assert!((state.gun.fire_interval - 0.44).abs() < 1e-6);
    }

    #[test]
    fn test_loadout_grants_levels() {
        let mut state = GameState::new(5);
        let loadout = Loadout {
            weapons: vec![(WeaponKind::CrtBeam, 3), (WeaponKind::DotMatrix, 1)],
            upgrades: vec![(UpgradeKind::DmaBurst, 2)],
        };
        apply_loadout(&mut state, &loadout);
        assert_eq!(state.arsenal.level(WeaponKind::CrtBeam), Some(3));
        assert!(state.gun.side_bullets);
        assert_eq!(state.gun.burst, 3);
        assert_eq!(state.progression.upgrade_level(UpgradeKind::DmaBurst), Some(2));
    }
}
