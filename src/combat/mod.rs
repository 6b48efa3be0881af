//! # Combat Resolution Engine
//!
//! Pure functions that turn an attacker/defender snapshot plus a source of randomness into
//! an outcome. Nothing here mutates turn state; the battle sequencer applies the outcomes.

pub mod skills;
pub mod status;

pub use skills::*;
pub use status::*;

use crate::{GearBonus, Monster, Player, PlayerClass, StatKind};
use rand::Rng;

/// `K` in `reduction = DEF / (DEF + K)`.
pub const DEFENSE_CONSTANT: f64 = 50.0;
/// Chance that a monster dodges a player's attack.
pub const MONSTER_EVASION_CHANCE: f64 = 0.05;
/// Player evasion gained per point of DEX.
pub const EVASION_PER_DEX: f64 = 0.005;
/// Rogue critical chance gained per point of DEX.
pub const CRIT_PER_DEX: f64 = 0.005;
pub const CRIT_MULTIPLIER: f64 = 1.5;
/// Monster stat growth per player level above 1.
pub const LEVEL_SCALING: f64 = 0.20;

pub const STUN_TURNS: u32 = 1;
pub const BLEED_TURNS: u32 = 3;
pub const POISON_TURNS: u32 = 5;

/// Mitigates physical damage.
///
/// # Examples
///
/// ```
/// use cryptcrawl::apply_defense;
///
/// assert_eq!(apply_defense(100, 0), 100);
/// assert_eq!(apply_defense(100, 50), 50);
/// assert_eq!(apply_defense(1, 500), 1);
/// ```
pub fn apply_defense(raw: i32, def: i32) -> i32 {
    let def = def.max(0) as f64;
    let reduction = def / (def + DEFENSE_CONSTANT);
    let mitigated = (raw as f64 * (1.0 - reduction)).round() as i32;
    mitigated.max(1)
}

/// Damage rule for spells and finishing moves, which ignore defense.
pub fn bypass_defense(raw: i32) -> i32 {
    raw.max(1)
}

pub fn player_evasion_chance(dex: i32) -> f64 {
    (dex.max(0) as f64 * EVASION_PER_DEX).min(1.0)
}

pub fn crit_chance(dex: i32) -> f64 {
    (dex.max(0) as f64 * CRIT_PER_DEX).min(1.0)
}

/// Rolls a probability in `0.0..=1.0`.
pub fn roll<R: Rng>(chance: f64, rng: &mut R) -> bool {
    chance > 0.0 && rng.gen::<f64>() < chance
}

/// `original * (1 + (level - 1) * 0.20)`, rounded.
///
/// # Examples
///
/// ```
/// use cryptcrawl::scale_stat;
///
/// assert_eq!(scale_stat(50, 6), 100);
/// assert_eq!(scale_stat(50, 1), 50);
/// ```
pub fn scale_stat(original: i32, player_level: u32) -> i32 {
    let factor = 1.0 + player_level.saturating_sub(1) as f64 * LEVEL_SCALING;
    (original as f64 * factor).round() as i32
}

/// How incoming HP damage splits between HP and MP under a mana shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldSplit {
    pub hp_damage: i32,
    pub mp_damage: i32,
}

/// Redirects `rate` of `damage` to MP.
///
/// The two parts always sum to `damage`, and `mp_damage` never exceeds `current_mp`.
///
/// # Examples
///
/// ```
/// use cryptcrawl::split_mana_shield;
///
/// let split = split_mana_shield(10, 0.25, 100);
/// assert_eq!((split.hp_damage, split.mp_damage), (7, 3));
///
/// let drained = split_mana_shield(10, 0.5, 2);
/// assert_eq!((drained.hp_damage, drained.mp_damage), (8, 2));
/// ```
pub fn split_mana_shield(damage: i32, rate: f64, current_mp: i32) -> ShieldSplit {
    let damage = damage.max(0);
    let current_mp = current_mp.max(0);
    if rate <= 0.0 || current_mp == 0 || damage == 0 {
        return ShieldSplit {
            hp_damage: damage,
            mp_damage: 0,
        };
    }

    let mp_absorb = ((damage as f64 * rate.min(1.0)).ceil() as i32).min(damage);
    if current_mp >= mp_absorb {
        ShieldSplit {
            hp_damage: damage - mp_absorb,
            mp_damage: mp_absorb,
        }
    } else {
        let shortfall = mp_absorb - current_mp;
        ShieldSplit {
            hp_damage: shortfall + (damage - mp_absorb),
            mp_damage: current_mp,
        }
    }
}

/// Result of one player hit against a monster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitOutcome {
    /// Damage to apply immediately
    pub damage: i32,
    /// The target evaded; distinct from a zero-damage hit
    pub missed: bool,
    pub critical: bool,
    pub stun: bool,
    /// Bleed magnitude per turn, if a bleed proc landed
    pub bleed: Option<i32>,
    /// Poison magnitude per turn, applied on the monster's later turns
    pub poison: Option<i32>,
    /// HP the attacker regains (lifesteal or healing skills)
    pub heal: i32,
}

impl HitOutcome {
    pub fn miss() -> Self {
        Self {
            missed: true,
            ..Self::default()
        }
    }
}

/// Raw basic-attack damage by class.
pub fn basic_attack_raw(player: &Player) -> i32 {
    let atk = player.stat(StatKind::Atk);
    match player.class {
        PlayerClass::Warrior => atk + player.stat(StatKind::Str),
        PlayerClass::Mage => atk + player.stat(StatKind::Int) / 2,
        PlayerClass::Rogue => atk + player.stat(StatKind::Dex) / 2,
    }
}

/// Applies the gear damage-percent bonus to raw damage.
pub fn with_damage_bonus(player: &Player, raw: i32) -> i32 {
    let bonus = player.bonus(GearBonus::DamagePercent);
    (raw as f64 * (1.0 + bonus as f64 / 100.0)).round() as i32
}

/// Rolls the gear on-hit effects (stun, bleed, lifesteal) onto a landed hit.
pub fn roll_on_hit_effects<R: Rng>(player: &Player, outcome: &mut HitOutcome, rng: &mut R) {
    if outcome.missed || outcome.damage <= 0 {
        return;
    }
    if roll(player.bonus_rate(GearBonus::StunChance), rng) {
        outcome.stun = true;
    }
    if roll(player.bonus_rate(GearBonus::BleedChance), rng) {
        outcome.bleed = Some((player.stat(StatKind::Dex) / 2).max(1));
    }
    if roll(player.bonus_rate(GearBonus::Lifesteal), rng) {
        outcome.heal += (outcome.damage / 4).max(1);
    }
}

/// Resolves the player's basic attack.
///
/// Only the Rogue can land critical hits here.
pub fn resolve_basic_attack<R: Rng>(player: &Player, target: &Monster, rng: &mut R) -> HitOutcome {
    if roll(MONSTER_EVASION_CHANCE, rng) {
        return HitOutcome::miss();
    }

    let mut raw = basic_attack_raw(player) as f64;
    let mut critical = false;
    if player.class == PlayerClass::Rogue && roll(crit_chance(player.stat(StatKind::Dex)), rng) {
        raw *= CRIT_MULTIPLIER;
        critical = true;
    }

    let raw = with_damage_bonus(player, raw.round() as i32);
    let mut outcome = HitOutcome {
        damage: apply_defense(raw, target.stats.def),
        critical,
        ..HitOutcome::default()
    };
    roll_on_hit_effects(player, &mut outcome, rng);
    outcome
}

/// Result of a monster's attack on the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonsterStrike {
    pub missed: bool,
    pub hp_damage: i32,
    pub mp_damage: i32,
    /// Damage bounced back at the monster by gear
    pub reflected: i32,
}

impl MonsterStrike {
    pub fn total(&self) -> i32 {
        self.hp_damage + self.mp_damage
    }
}

/// Resolves a monster's attack against the player's current snapshot.
pub fn resolve_monster_attack<R: Rng>(monster: &Monster, player: &Player, rng: &mut R) -> MonsterStrike {
    if roll(player_evasion_chance(player.stat(StatKind::Dex)), rng) {
        return MonsterStrike {
            missed: true,
            ..MonsterStrike::default()
        };
    }

    let damage = apply_defense(monster.stats.atk, player.stat(StatKind::Def));
    let split = split_mana_shield(damage, player.bonus_rate(GearBonus::ManaShield), player.mp);

    let reflected = if roll(player.bonus_rate(GearBonus::Reflect), rng) {
        ((damage + 1) / 2).max(1)
    } else {
        0
    };

    MonsterStrike {
        missed: false,
        hp_damage: split.hp_damage,
        mp_damage: split.mp_damage,
        reflected,
    }
}
