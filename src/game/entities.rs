//! # Entities
//!
//! Plain data records for the player, monsters, chests and traps. Derived stats are
//! computed on demand from base values plus equipped gear.

use crate::combat::{scale_stat, Skill, StatusEffects};
use crate::{
    new_entity_id, Consumable, EntityId, Equipment, EquipmentSlot, GearBonus, Inventory,
    ModifierKind, ModifierTarget, Position, StatKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three playable archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    Warrior,
    Mage,
    Rogue,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 3] = [PlayerClass::Warrior, PlayerClass::Mage, PlayerClass::Rogue];

    /// Starting stats at level 1.
    pub fn base_stats(self) -> Stats {
        match self {
            PlayerClass::Warrior => Stats::new(120, 30, 4, 6, 8, 2, 4),
            PlayerClass::Mage => Stats::new(80, 80, 2, 3, 2, 10, 4),
            PlayerClass::Rogue => Stats::new(95, 45, 5, 4, 4, 3, 10),
        }
    }

    /// Stats gained on every level up.
    pub fn growth(self) -> Stats {
        match self {
            PlayerClass::Warrior => Stats::new(15, 3, 2, 2, 2, 0, 1),
            PlayerClass::Mage => Stats::new(8, 10, 1, 1, 0, 3, 1),
            PlayerClass::Rogue => Stats::new(11, 5, 2, 1, 1, 1, 3),
        }
    }

    /// The fixed four-skill loadout of the class.
    pub fn skills(self) -> [Skill; 4] {
        match self {
            PlayerClass::Warrior => [
                Skill::PowerStrike,
                Skill::ShieldBash,
                Skill::Execute,
                Skill::SecondWind,
            ],
            PlayerClass::Mage => [
                Skill::Fireball,
                Skill::FrostBolt,
                Skill::ArcaneMissile,
                Skill::Heal,
            ],
            PlayerClass::Rogue => [
                Skill::Backstab,
                Skill::PoisonBlade,
                Skill::Assassinate,
                Skill::SmokeBomb,
            ],
        }
    }

    /// Parses a class name as typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "warrior" => Some(PlayerClass::Warrior),
            "mage" => Some(PlayerClass::Mage),
            "rogue" => Some(PlayerClass::Rogue),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerClass::Warrior => write!(f, "Warrior"),
            PlayerClass::Mage => write!(f, "Mage"),
            PlayerClass::Rogue => write!(f, "Rogue"),
        }
    }
}

/// The seven base statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: i32,
    pub mp: i32,
    pub atk: i32,
    pub def: i32,
    pub strength: i32,
    pub intelligence: i32,
    pub dexterity: i32,
}

impl Stats {
    pub fn new(
        hp: i32,
        mp: i32,
        atk: i32,
        def: i32,
        strength: i32,
        intelligence: i32,
        dexterity: i32,
    ) -> Self {
        Self {
            hp,
            mp,
            atk,
            def,
            strength,
            intelligence,
            dexterity,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Hp => self.hp,
            StatKind::Mp => self.mp,
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Str => self.strength,
            StatKind::Int => self.intelligence,
            StatKind::Dex => self.dexterity,
        }
    }

    /// Component-wise sum, used for level-up growth.
    pub fn grow(&mut self, growth: &Stats) {
        self.hp += growth.hp;
        self.mp += growth.mp;
        self.atk += growth.atk;
        self.def += growth.def;
        self.strength += growth.strength;
        self.intelligence += growth.intelligence;
        self.dexterity += growth.dexterity;
    }
}

/// Experience needed to advance from `level` to `level + 1`.
///
/// # Examples
///
/// ```
/// use cryptcrawl::experience_to_next;
///
/// assert_eq!(experience_to_next(1), 75);
/// assert_eq!(experience_to_next(2), 200);
/// ```
pub fn experience_to_next(level: u32) -> u32 {
    50 * level + 25 * level * level
}

/// The player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub name: String,
    pub class: PlayerClass,
    pub position: Position,
    pub level: u32,
    pub experience: u32,
    pub base: Stats,
    pub hp: i32,
    pub mp: i32,
    pub equipment: BTreeMap<EquipmentSlot, Equipment>,
    pub inventory: Inventory,
}

impl Player {
    /// Creates a level 1 character with full HP/MP and two starter potions.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{Player, PlayerClass, Position};
    ///
    /// let player = Player::new("Hero".to_string(), PlayerClass::Warrior, Position::new(5, 5));
    /// assert_eq!(player.level, 1);
    /// assert_eq!(player.hp, player.max_hp());
    /// assert_eq!(player.skills().len(), 4);
    /// ```
    pub fn new(name: String, class: PlayerClass, position: Position) -> Self {
        let base = class.base_stats();
        let mut inventory = Inventory::new();
        inventory.add(Consumable::new(
            crate::ConsumableKind::HealthPotion,
            crate::Rarity::Common,
        ));
        inventory.add(Consumable::new(
            crate::ConsumableKind::ManaPotion,
            crate::Rarity::Common,
        ));

        Self {
            id: new_entity_id(),
            name,
            class,
            position,
            level: 1,
            experience: 0,
            base,
            hp: base.hp,
            mp: base.mp,
            equipment: BTreeMap::new(),
            inventory,
        }
    }

    /// Effective stat: base plus flat gear bonuses plus percent gear bonuses of the base.
    pub fn stat(&self, kind: StatKind) -> i32 {
        let base = self.base.get(kind);
        let mut flat = 0;
        let mut percent = 0;
        for modifier in self.equipment.values().flat_map(|e| e.modifiers.iter()) {
            if modifier.target == ModifierTarget::Stat(kind) {
                match modifier.kind {
                    ModifierKind::Flat => flat += modifier.value,
                    ModifierKind::Percent => percent += modifier.value,
                }
            }
        }
        let scaled = (base as f64 * percent as f64 / 100.0).round() as i32;
        (base + flat + scaled).max(0)
    }

    /// Summed percentage of a gear-only bonus across all equipped items.
    pub fn bonus(&self, bonus: GearBonus) -> i32 {
        self.equipment
            .values()
            .flat_map(|e| e.modifiers.iter())
            .filter(|m| m.target == ModifierTarget::Bonus(bonus))
            .map(|m| m.value)
            .sum()
    }

    /// Gear bonus as a probability or rate in `0.0..=1.0`.
    pub fn bonus_rate(&self, bonus: GearBonus) -> f64 {
        (self.bonus(bonus) as f64 / 100.0).clamp(0.0, 1.0)
    }

    pub fn max_hp(&self) -> i32 {
        self.stat(StatKind::Hp).max(1)
    }

    pub fn max_mp(&self) -> i32 {
        self.stat(StatKind::Mp)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn skills(&self) -> [Skill; 4] {
        self.class.skills()
    }

    /// Heals up to max HP and returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp());
        self.hp - before
    }

    /// Restores MP up to max and returns the amount actually restored.
    pub fn restore_mp(&mut self, amount: i32) -> i32 {
        let before = self.mp;
        self.mp = (self.mp + amount.max(0)).min(self.max_mp());
        self.mp - before
    }

    /// Spends MP if enough is available.
    pub fn spend_mp(&mut self, cost: i32) -> bool {
        if self.mp >= cost {
            self.mp -= cost;
            true
        } else {
            false
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount.max(0);
    }

    pub fn experience_to_next(&self) -> u32 {
        experience_to_next(self.level)
    }

    /// Adds experience and applies every level up it pays for.
    ///
    /// Returns the levels reached, in order. Each level up restores HP and MP.
    pub fn gain_experience(&mut self, amount: u32) -> Vec<u32> {
        self.experience += amount;
        let mut reached = Vec::new();
        while self.experience >= self.experience_to_next() {
            self.experience -= self.experience_to_next();
            self.level += 1;
            self.base.grow(&self.class.growth());
            reached.push(self.level);
        }
        if !reached.is_empty() {
            self.hp = self.max_hp();
            self.mp = self.max_mp();
        }
        reached
    }

    /// Wears an item, returning whatever was in the slot before.
    pub fn equip(&mut self, item: Equipment) -> Option<Equipment> {
        let previous = self.equipment.insert(item.slot, item);
        self.hp = self.hp.min(self.max_hp());
        self.mp = self.mp.min(self.max_mp());
        previous
    }

    pub fn equipped(&self, slot: EquipmentSlot) -> Option<&Equipment> {
        self.equipment.get(&slot)
    }
}

/// Battle stats derived from a template for one fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub exp_reward: u32,
}

/// Immutable roster entry; scaled copies are derived from it at battle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    pub icon: char,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub exp_reward: u32,
}

impl MonsterTemplate {
    pub fn new(name: &str, icon: char, max_hp: i32, atk: i32, def: i32, exp_reward: u32) -> Self {
        Self {
            name: name.to_string(),
            icon,
            max_hp,
            atk,
            def,
            exp_reward,
        }
    }

    /// Unscaled stats.
    pub fn base_stats(&self) -> EffectiveStats {
        EffectiveStats {
            max_hp: self.max_hp,
            atk: self.atk,
            def: self.def,
            exp_reward: self.exp_reward,
        }
    }

    /// Stats for a fight against a player of the given level.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::MonsterTemplate;
    ///
    /// let template = MonsterTemplate::new("Orc", 'o', 50, 10, 5, 20);
    /// assert_eq!(template.scale_for(6).max_hp, 100);
    /// assert_eq!(template.max_hp, 50);
    /// ```
    pub fn scale_for(&self, player_level: u32) -> EffectiveStats {
        EffectiveStats {
            max_hp: scale_stat(self.max_hp, player_level),
            atk: scale_stat(self.atk, player_level),
            def: scale_stat(self.def, player_level),
            exp_reward: scale_stat(self.exp_reward as i32, player_level).max(0) as u32,
        }
    }
}

/// A monster on the map or in an ambush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub position: Position,
    pub template: MonsterTemplate,
    pub is_boss: bool,
    pub hp: i32,
    pub stats: EffectiveStats,
    pub status: StatusEffects,
}

impl Monster {
    pub fn new(template: MonsterTemplate, position: Position, is_boss: bool) -> Self {
        let stats = template.base_stats();
        Self {
            id: new_entity_id(),
            position,
            template,
            is_boss,
            hp: stats.max_hp,
            stats,
            status: StatusEffects::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn icon(&self) -> char {
        self.template.icon
    }

    /// Recomputes battle stats from the template and resets HP and effects.
    ///
    /// Bosses keep their template stats regardless of player level.
    pub fn begin_battle(&mut self, player_level: u32) {
        self.stats = if self.is_boss {
            self.template.base_stats()
        } else {
            self.template.scale_for(player_level)
        };
        self.hp = self.stats.max_hp;
        self.status.clear();
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount.max(0);
    }

    /// Current HP as a fraction of max, for execution-type skills.
    pub fn hp_fraction(&self) -> f64 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        self.hp.max(0) as f64 / self.stats.max_hp as f64
    }
}

/// A closed chest. Opening is one-shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chest {
    pub position: Position,
    pub icon: char,
    pub opened: bool,
}

impl Chest {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            icon: '=',
            opened: false,
        }
    }

    /// Marks the chest opened. Returns false when it already was.
    pub fn open(&mut self) -> bool {
        if self.opened {
            return false;
        }
        self.opened = true;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapKind {
    Damage,
    Battle,
}

/// A hidden trap. Triggering is one-shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub position: Position,
    pub kind: TrapKind,
    pub icon: char,
    pub triggered: bool,
}

impl Trap {
    pub fn new(position: Position, kind: TrapKind) -> Self {
        Self {
            position,
            kind,
            icon: '^',
            triggered: false,
        }
    }

    /// Fires the trap once; later calls return None.
    pub fn trigger(&mut self) -> Option<TrapKind> {
        if self.triggered {
            return None;
        }
        self.triggered = true;
        Some(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Modifier, Rarity};

    fn warrior() -> Player {
        Player::new("Test".to_string(), PlayerClass::Warrior, Position::new(1, 1))
    }

    #[test]
    fn test_effective_stats_include_gear() {
        let mut player = warrior();
        assert_eq!(player.stat(StatKind::Atk), 4);

        player.equip(Equipment::new(
            "Sword".to_string(),
            Rarity::Rare,
            EquipmentSlot::Weapon,
            vec![
                Modifier::flat(StatKind::Atk, 3),
                Modifier::percent(StatKind::Str, 50),
                Modifier::bonus(GearBonus::Lifesteal, 10),
            ],
        ));

        assert_eq!(player.stat(StatKind::Atk), 7);
        assert_eq!(player.stat(StatKind::Str), 12);
        assert_eq!(player.bonus(GearBonus::Lifesteal), 10);
        assert!((player.bonus_rate(GearBonus::Lifesteal) - 0.1).abs() < f64::EPSILON);
        assert_eq!(player.bonus(GearBonus::Reflect), 0);
    }

    #[test]
    fn test_equip_replaces_slot_and_clamps_hp() {
        let mut player = warrior();
        let heavy = Equipment::new(
            "Plate".to_string(),
            Rarity::Common,
            EquipmentSlot::Armor,
            vec![Modifier::flat(StatKind::Hp, 30)],
        );
        assert!(player.equip(heavy).is_none());
        player.hp = player.max_hp();
        assert_eq!(player.hp, 150);

        let light = Equipment::new(
            "Robe".to_string(),
            Rarity::Common,
            EquipmentSlot::Armor,
            vec![Modifier::flat(StatKind::Int, 1)],
        );
        let old = player.equip(light).unwrap();
        assert_eq!(old.name, "Plate");
        assert_eq!(player.hp, 120);
    }

    #[test]
    fn test_level_up_grows_stats_and_restores() {
        let mut player = warrior();
        player.hp = 10;
        let levels = player.gain_experience(75 + 200 + 5);
        assert_eq!(levels, vec![2, 3]);
        assert_eq!(player.level, 3);
        assert_eq!(player.experience, 5);
        assert_eq!(player.base.hp, 150);
        assert_eq!(player.hp, player.max_hp());

        assert!(player.gain_experience(1).is_empty());
    }

    #[test]
    fn test_monster_scaling_keeps_template() {
        let template = MonsterTemplate::new("Orc", 'o', 50, 10, 5, 20);
        let mut monster = Monster::new(template, Position::new(3, 3), false);
        monster.begin_battle(6);
        assert_eq!(monster.stats.max_hp, 100);
        assert_eq!(monster.hp, 100);
        assert_eq!(monster.stats.atk, 20);
        assert_eq!(monster.template.max_hp, 50);

        monster.begin_battle(1);
        assert_eq!(monster.stats.max_hp, 50);
    }

    #[test]
    fn test_boss_is_not_scaled() {
        let template = MonsterTemplate::new("Lich", 'L', 260, 22, 10, 300);
        let mut boss = Monster::new(template, Position::new(3, 3), true);
        boss.begin_battle(9);
        assert_eq!(boss.stats.max_hp, 260);
    }

    #[test]
    fn test_chest_and_trap_are_one_shot() {
        let mut chest = Chest::new(Position::new(2, 2));
        assert!(chest.open());
        assert!(!chest.open());

        let mut trap = Trap::new(Position::new(4, 4), TrapKind::Battle);
        assert_eq!(trap.trigger(), Some(TrapKind::Battle));
        assert_eq!(trap.trigger(), None);
    }
}
