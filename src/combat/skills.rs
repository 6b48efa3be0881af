//! # Skills
//!
//! The closed set of class skills. Each variant resolves through a single pure
//! [`Skill::resolve`] match; MP is spent by the caller before resolving.

use super::{
    apply_defense, bypass_defense, roll, roll_on_hit_effects, with_damage_bonus, HitOutcome,
    MONSTER_EVASION_CHANCE,
};
use crate::{Monster, Player, StatKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a skill does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    /// Deals damage, possibly with a rider effect
    Damage,
    /// Restores the caster's HP
    Heal,
    /// Applies a status to the target without damage
    Disable,
}

/// How a damaging skill interacts with the target's defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseRule {
    Mitigated,
    Bypassed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    PowerStrike,
    ShieldBash,
    Execute,
    SecondWind,
    Fireball,
    FrostBolt,
    ArcaneMissile,
    Heal,
    Backstab,
    PoisonBlade,
    Assassinate,
    SmokeBomb,
}

impl Skill {
    pub fn name(self) -> &'static str {
        match self {
            Skill::PowerStrike => "Power Strike",
            Skill::ShieldBash => "Shield Bash",
            Skill::Execute => "Execute",
            Skill::SecondWind => "Second Wind",
            Skill::Fireball => "Fireball",
            Skill::FrostBolt => "Frost Bolt",
            Skill::ArcaneMissile => "Arcane Missile",
            Skill::Heal => "Heal",
            Skill::Backstab => "Backstab",
            Skill::PoisonBlade => "Poison Blade",
            Skill::Assassinate => "Assassinate",
            Skill::SmokeBomb => "Smoke Bomb",
        }
    }

    pub fn mp_cost(self) -> i32 {
        match self {
            Skill::PowerStrike => 6,
            Skill::ShieldBash => 5,
            Skill::Execute => 10,
            Skill::SecondWind => 8,
            Skill::Fireball => 10,
            Skill::FrostBolt => 8,
            Skill::ArcaneMissile => 4,
            Skill::Heal => 12,
            Skill::Backstab => 6,
            Skill::PoisonBlade => 7,
            Skill::Assassinate => 12,
            Skill::SmokeBomb => 5,
        }
    }

    pub fn kind(self) -> SkillKind {
        match self {
            Skill::SecondWind | Skill::Heal => SkillKind::Heal,
            Skill::SmokeBomb => SkillKind::Disable,
            _ => SkillKind::Damage,
        }
    }

    pub fn defense_rule(self) -> DefenseRule {
        match self {
            Skill::ShieldBash | Skill::Backstab | Skill::PoisonBlade => DefenseRule::Mitigated,
            _ => DefenseRule::Bypassed,
        }
    }

    /// Whether a successful use stuns the target.
    pub fn stuns(self) -> bool {
        matches!(self, Skill::ShieldBash | Skill::FrostBolt | Skill::SmokeBomb)
    }

    /// Raw damage before gear percent bonuses and defense. `None` for non-damaging skills.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{Monster, MonsterTemplate, Player, PlayerClass, Position, Skill};
    ///
    /// let warrior = Player::new("Hero".to_string(), PlayerClass::Warrior, Position::new(0, 0));
    /// let target = Monster::new(MonsterTemplate::new("Goblin", 'g', 28, 7, 5, 14), Position::new(1, 0), false);
    /// assert_eq!(Skill::PowerStrike.base_damage(&warrior, &target), Some(24));
    /// assert_eq!(Skill::SecondWind.base_damage(&warrior, &target), None);
    /// ```
    pub fn base_damage(self, caster: &Player, target: &Monster) -> Option<i32> {
        let atk = caster.stat(StatKind::Atk);
        let strength = caster.stat(StatKind::Str);
        let int = caster.stat(StatKind::Int);
        let dex = caster.stat(StatKind::Dex);
        let def = caster.stat(StatKind::Def);

        let raw = match self {
            Skill::PowerStrike => (atk + strength) * 2,
            Skill::ShieldBash => atk + def,
            Skill::Execute if target.hp_fraction() <= 0.30 => (atk + strength) * 3,
            Skill::Execute => atk + strength,
            Skill::Fireball => int * 3,
            Skill::FrostBolt => int * 2,
            Skill::ArcaneMissile => int + atk,
            Skill::Backstab => (atk + dex) * 2,
            Skill::PoisonBlade => atk + dex,
            Skill::Assassinate if target.hp_fraction() <= 0.50 => (atk + dex) * 3,
            Skill::Assassinate => atk + dex,
            Skill::SecondWind | Skill::Heal | Skill::SmokeBomb => return None,
        };
        Some(raw)
    }

    /// HP restored by a healing skill.
    pub fn heal_amount(self, caster: &Player) -> i32 {
        match self {
            Skill::SecondWind => caster.stat(StatKind::Str) * 3 + 10,
            Skill::Heal => caster.stat(StatKind::Int) * 4,
            _ => 0,
        }
    }

    /// Resolves the skill against a target snapshot.
    ///
    /// Mitigated skills can be evaded; bypassing skills and the no-damage Smoke Bomb always
    /// land. Healing skills report their amount in [`HitOutcome::heal`].
    pub fn resolve<R: Rng>(self, caster: &Player, target: &Monster, rng: &mut R) -> HitOutcome {
        match self.kind() {
            SkillKind::Heal => HitOutcome {
                heal: self.heal_amount(caster),
                ..HitOutcome::default()
            },
            SkillKind::Disable => HitOutcome {
                stun: self.stuns(),
                ..HitOutcome::default()
            },
            SkillKind::Damage => self.resolve_damage(caster, target, rng),
        }
    }

    fn resolve_damage<R: Rng>(self, caster: &Player, target: &Monster, rng: &mut R) -> HitOutcome {
        let rule = self.defense_rule();
        if rule == DefenseRule::Mitigated && roll(MONSTER_EVASION_CHANCE, rng) {
            return HitOutcome::miss();
        }

        let raw = with_damage_bonus(caster, self.base_damage(caster, target).unwrap_or(0));
        let damage = match rule {
            DefenseRule::Mitigated => apply_defense(raw, target.stats.def),
            DefenseRule::Bypassed => bypass_defense(raw),
        };

        let mut outcome = HitOutcome {
            damage,
            ..HitOutcome::default()
        };
        roll_on_hit_effects(caster, &mut outcome, rng);
        if self.stuns() {
            outcome.stun = true;
        }
        if self == Skill::PoisonBlade {
            outcome.poison = Some((caster.stat(StatKind::Dex) / 2).max(1));
        }
        outcome
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} MP)", self.name(), self.mp_cost())
    }
}

/// MP returned by a successful mana refund proc.
pub fn mana_refund_amount(cost: i32) -> i32 {
    (cost / 4).max(1)
}
