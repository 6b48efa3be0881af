//! # Drop Tables
//!
//! Rarity rolls, equipment and potion generation, the standard and boss drop tables, and
//! chest contents.

use crate::{
    Consumable, ConsumableKind, Equipment, EquipmentSlot, GearBonus, Item, Modifier,
    ModifierTarget, Rarity, StatKind,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

/// Which rarity weights and item counts a drop uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTable {
    Standard,
    Boss,
}

impl DropTable {
    /// Weights for Common, Rare, Unique, Legendary.
    pub fn rarity_weights(self) -> [u32; 4] {
        match self {
            DropTable::Standard => [60, 28, 10, 2],
            DropTable::Boss => [0, 45, 40, 15],
        }
    }
}

/// Chance that a standard drop contains a piece of equipment.
pub const STANDARD_EQUIPMENT_CHANCE: f64 = 0.35;
/// Chance for each of the two potion slots of a standard drop.
pub const STANDARD_POTION_CHANCE: f64 = 0.5;
/// Chance that opening a chest springs an ambush.
pub const CHEST_AMBUSH_CHANCE: f64 = 0.15;
/// Chance that a chest holds nothing.
pub const CHEST_EMPTY_CHANCE: f64 = 0.10;
/// Share of chest items that are equipment rather than potions.
pub const CHEST_EQUIPMENT_SHARE: f64 = 0.40;

const WEAPON_NAMES: [&str; 5] = ["Sword", "Axe", "Dagger", "Staff", "Mace"];
const HELMET_NAMES: [&str; 3] = ["Helm", "Hood", "Circlet"];
const ARMOR_NAMES: [&str; 3] = ["Mail", "Robe", "Leather Armor"];
const BOOTS_NAMES: [&str; 3] = ["Boots", "Greaves", "Sandals"];
const ACCESSORY_NAMES: [&str; 3] = ["Ring", "Amulet", "Charm"];
const SUFFIXES: [&str; 6] = [
    "of the Bear",
    "of the Fox",
    "of the Owl",
    "of Embers",
    "of the Void",
    "of Thorns",
];

/// Rolls a rarity tier from the table's weights.
pub fn roll_rarity(table: DropTable, rng: &mut StdRng) -> Rarity {
    let weights = table.rarity_weights();
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (rarity, weight) in Rarity::ALL.iter().zip(weights) {
        if roll < weight {
            return *rarity;
        }
        roll -= weight;
    }
    Rarity::Common
}

fn base_names(slot: EquipmentSlot) -> &'static [&'static str] {
    match slot {
        EquipmentSlot::Weapon => &WEAPON_NAMES,
        EquipmentSlot::Helmet => &HELMET_NAMES,
        EquipmentSlot::Armor => &ARMOR_NAMES,
        EquipmentSlot::Boots => &BOOTS_NAMES,
        EquipmentSlot::Accessory => &ACCESSORY_NAMES,
    }
}

/// Builds a display name: rarity prefix, slot base name, and a suffix for the top tiers.
pub fn item_name(rarity: Rarity, slot: EquipmentSlot, rng: &mut StdRng) -> String {
    let base = base_names(slot).choose(rng).copied().unwrap_or("Trinket");
    let mut name = match rarity.prefix() {
        Some(prefix) => format!("{} {}", prefix, base),
        None => base.to_string(),
    };
    if rarity >= Rarity::Unique {
        if let Some(suffix) = SUFFIXES.choose(rng) {
            name.push(' ');
            name.push_str(suffix);
        }
    }
    name
}

/// Every target a modifier can roll.
fn modifier_pool() -> Vec<ModifierTarget> {
    StatKind::ALL
        .iter()
        .map(|&s| ModifierTarget::Stat(s))
        .chain(
            [
                GearBonus::DamagePercent,
                GearBonus::StunChance,
                GearBonus::BleedChance,
                GearBonus::Lifesteal,
                GearBonus::ManaRefund,
                GearBonus::Reflect,
                GearBonus::ManaShield,
            ]
            .into_iter()
            .map(ModifierTarget::Bonus),
        )
        .collect()
}

/// Base value range of a flat stat modifier before the rarity multiplier.
fn flat_range(stat: StatKind) -> (i32, i32) {
    match stat {
        StatKind::Hp => (5, 15),
        StatKind::Mp => (3, 10),
        _ => (1, 3),
    }
}

fn bonus_range(bonus: GearBonus) -> (i32, i32) {
    match bonus {
        GearBonus::StunChance | GearBonus::BleedChance => (2, 5),
        GearBonus::Lifesteal | GearBonus::Reflect => (2, 6),
        GearBonus::DamagePercent | GearBonus::ManaRefund | GearBonus::ManaShield => (3, 8),
    }
}

fn scaled(range: (i32, i32), rarity: Rarity, rng: &mut StdRng) -> i32 {
    let base = rng.gen_range(range.0..=range.1) as f64;
    ((base * rarity.magnitude()).round() as i32).max(1)
}

/// Rolls `rarity.modifier_count()` modifiers on distinct targets.
pub fn roll_modifiers(rarity: Rarity, rng: &mut StdRng) -> Vec<Modifier> {
    let pool = modifier_pool();
    let targets: Vec<ModifierTarget> = pool
        .choose_multiple(rng, rarity.modifier_count())
        .copied()
        .collect();

    targets
        .into_iter()
        .map(|target| match target {
            ModifierTarget::Stat(stat) => {
                if rng.gen_bool(0.7) {
                    Modifier::flat(stat, scaled(flat_range(stat), rarity, rng))
                } else {
                    Modifier::percent(stat, scaled((3, 8), rarity, rng))
                }
            }
            ModifierTarget::Bonus(bonus) => Modifier::bonus(bonus, scaled(bonus_range(bonus), rarity, rng)),
        })
        .collect()
}

/// Generates a random piece of equipment of the given rarity.
pub fn generate_equipment(rarity: Rarity, rng: &mut StdRng) -> Equipment {
    let slot = EquipmentSlot::ALL
        .choose(rng)
        .copied()
        .unwrap_or(EquipmentSlot::Weapon);
    let name = item_name(rarity, slot, rng);
    let modifiers = roll_modifiers(rarity, rng);
    Equipment::new(name, rarity, slot, modifiers)
}

/// Generates a health or mana potion with equal odds.
pub fn generate_consumable(rarity: Rarity, rng: &mut StdRng) -> Consumable {
    let kind = if rng.gen_bool(0.5) {
        ConsumableKind::HealthPotion
    } else {
        ConsumableKind::ManaPotion
    };
    Consumable::new(kind, rarity)
}

/// Rolls the loot for a defeated monster.
///
/// Standard: 35% one equipment, then two 50% potion slots. Boss: 2–3 equipment and two
/// potions, all from the boss rarity weights.
pub fn roll_drops(table: DropTable, rng: &mut StdRng) -> Vec<Item> {
    let mut items = Vec::new();
    match table {
        DropTable::Standard => {
            if rng.gen_bool(STANDARD_EQUIPMENT_CHANCE) {
                let rarity = roll_rarity(table, rng);
                items.push(Item::Equipment(generate_equipment(rarity, rng)));
            }
            for _ in 0..2 {
                if rng.gen_bool(STANDARD_POTION_CHANCE) {
                    let rarity = roll_rarity(table, rng);
                    items.push(Item::Consumable(generate_consumable(rarity, rng)));
                }
            }
        }
        DropTable::Boss => {
            let equipment_count = rng.gen_range(2..=3);
            for _ in 0..equipment_count {
                let rarity = roll_rarity(table, rng);
                items.push(Item::Equipment(generate_equipment(rarity, rng)));
            }
            for _ in 0..2 {
                let rarity = roll_rarity(table, rng);
                items.push(Item::Consumable(generate_consumable(rarity, rng)));
            }
        }
    }
    items
}

/// What opening a chest produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ChestContents {
    /// A monster jumps out; no loot
    Ambush,
    Empty,
    Loot(Vec<Item>),
}

/// Number of chest items for a uniform roll: 3 at 10%, 2 at 15%, 1 otherwise.
///
/// # Examples
///
/// ```
/// use cryptcrawl::item_count_for_roll;
///
/// assert_eq!(item_count_for_roll(0.05), 3);
/// assert_eq!(item_count_for_roll(0.20), 2);
/// assert_eq!(item_count_for_roll(0.80), 1);
/// ```
pub fn item_count_for_roll(roll: f64) -> usize {
    if roll < 0.10 {
        3
    } else if roll < 0.25 {
        2
    } else {
        1
    }
}

/// Chest outcome from explicit rolls for the ambush, empty and item-count checks.
pub fn open_chest_with_rolls(
    ambush_roll: f64,
    empty_roll: f64,
    count_roll: f64,
    rng: &mut StdRng,
) -> ChestContents {
    if ambush_roll < CHEST_AMBUSH_CHANCE {
        return ChestContents::Ambush;
    }
    if empty_roll < CHEST_EMPTY_CHANCE {
        return ChestContents::Empty;
    }

    let items = (0..item_count_for_roll(count_roll))
        .map(|_| {
            let rarity = roll_rarity(DropTable::Standard, rng);
            if rng.gen_bool(CHEST_EQUIPMENT_SHARE) {
                Item::Equipment(generate_equipment(rarity, rng))
            } else {
                Item::Consumable(generate_consumable(rarity, rng))
            }
        })
        .collect();
    ChestContents::Loot(items)
}

/// Rolls a chest's contents.
pub fn roll_chest(rng: &mut StdRng) -> ChestContents {
    let ambush_roll = rng.gen::<f64>();
    let empty_roll = rng.gen::<f64>();
    let count_roll = rng.gen::<f64>();
    open_chest_with_rolls(ambush_roll, empty_roll, count_roll, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_boss_table_never_rolls_common() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..500 {
            assert_ne!(roll_rarity(DropTable::Boss, &mut rng), Rarity::Common);
        }
    }

    #[test]
    fn test_standard_rarity_distribution() {
        let mut rng = StdRng::seed_from_u64(9);
        let commons = (0..2000)
            .filter(|_| roll_rarity(DropTable::Standard, &mut rng) == Rarity::Common)
            .count();
        assert!(commons > 1000 && commons < 1400, "commons = {}", commons);
    }

    #[test]
    fn test_equipment_modifier_count_matches_rarity() {
        let mut rng = StdRng::seed_from_u64(10);
        for rarity in Rarity::ALL {
            let item = generate_equipment(rarity, &mut rng);
            assert_eq!(item.modifiers.len(), rarity.modifier_count());
            let targets: HashSet<_> = item.modifiers.iter().map(|m| m.target).collect();
            assert_eq!(targets.len(), item.modifiers.len());
            assert!(item.modifiers.iter().all(|m| m.value >= 1));
        }
    }

    #[test]
    fn test_names_follow_rarity() {
        let mut rng = StdRng::seed_from_u64(11);
        let common = item_name(Rarity::Common, EquipmentSlot::Weapon, &mut rng);
        assert!(WEAPON_NAMES.contains(&common.as_str()));

        let rare = item_name(Rarity::Rare, EquipmentSlot::Boots, &mut rng);
        assert!(rare.starts_with("Fine "));
        assert!(!rare.contains(" of "));

        let legendary = item_name(Rarity::Legendary, EquipmentSlot::Accessory, &mut rng);
        assert!(legendary.starts_with("Legendary "));
        assert!(legendary.contains(" of "));
    }

    #[test]
    fn test_boss_drops() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..20 {
            let drops = roll_drops(DropTable::Boss, &mut rng);
            let equipment = drops.iter().filter(|i| matches!(i, Item::Equipment(_))).count();
            let potions = drops.len() - equipment;
            assert!((2..=3).contains(&equipment));
            assert_eq!(potions, 2);
        }
    }

    #[test]
    fn test_standard_drops_are_bounded() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..100 {
            assert!(roll_drops(DropTable::Standard, &mut rng).len() <= 3);
        }
    }

    #[test]
    fn test_chest_thresholds() {
        let mut rng = StdRng::seed_from_u64(14);
        assert_eq!(open_chest_with_rolls(0.10, 0.9, 0.9, &mut rng), ChestContents::Ambush);
        assert_eq!(open_chest_with_rolls(0.50, 0.05, 0.9, &mut rng), ChestContents::Empty);

        for (count_roll, expected) in [(0.05, 3), (0.12, 2), (0.60, 1)] {
            match open_chest_with_rolls(0.50, 0.50, count_roll, &mut rng) {
                ChestContents::Loot(items) => assert_eq!(items.len(), expected),
                other => panic!("unexpected chest contents {:?}", other),
            }
        }
    }
}
