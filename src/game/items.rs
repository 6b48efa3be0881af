//! # Items
//!
//! Equipment and consumables. Items are immutable once generated; rarity biases both how
//! many modifiers a piece carries and how large they are.

use crate::{new_entity_id, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rarity tiers, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Unique,
    Legendary,
}

impl Rarity {
    /// All tiers in ascending order.
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Unique,
        Rarity::Legendary,
    ];

    /// Number of modifiers rolled on equipment of this tier.
    pub fn modifier_count(self) -> usize {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::Unique => 3,
            Rarity::Legendary => 4,
        }
    }

    /// Multiplier applied to every rolled modifier value.
    pub fn magnitude(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.5,
            Rarity::Unique => 2.2,
            Rarity::Legendary => 3.0,
        }
    }

    /// Name prefix used by the item name generator.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Rarity::Common => None,
            Rarity::Rare => Some("Fine"),
            Rarity::Unique => Some("Ancient"),
            Rarity::Legendary => Some("Legendary"),
        }
    }

    /// HP or MP restored by a potion of this tier.
    pub fn potion_value(self) -> i32 {
        match self {
            Rarity::Common => 30,
            Rarity::Rare => 60,
            Rarity::Unique => 100,
            Rarity::Legendary => 200,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Unique => "Unique",
            Rarity::Legendary => "Legendary",
        };
        write!(f, "{}", name)
    }
}

/// The seven player statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Hp,
    Mp,
    Atk,
    Def,
    Str,
    Int,
    Dex,
}

impl StatKind {
    pub const ALL: [StatKind; 7] = [
        StatKind::Hp,
        StatKind::Mp,
        StatKind::Atk,
        StatKind::Def,
        StatKind::Str,
        StatKind::Int,
        StatKind::Dex,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Hp => "HP",
            StatKind::Mp => "MP",
            StatKind::Atk => "ATK",
            StatKind::Def => "DEF",
            StatKind::Str => "STR",
            StatKind::Int => "INT",
            StatKind::Dex => "DEX",
        }
    }
}

/// Percent-valued bonuses that only exist on gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GearBonus {
    /// Extra outgoing damage, applied before defense
    DamagePercent,
    StunChance,
    BleedChance,
    Lifesteal,
    ManaRefund,
    Reflect,
    /// Share of incoming HP damage redirected to MP
    ManaShield,
}

impl GearBonus {
    pub fn label(self) -> &'static str {
        match self {
            GearBonus::DamagePercent => "damage",
            GearBonus::StunChance => "stun chance",
            GearBonus::BleedChance => "bleed chance",
            GearBonus::Lifesteal => "lifesteal",
            GearBonus::ManaRefund => "mana refund",
            GearBonus::Reflect => "reflect",
            GearBonus::ManaShield => "mana shield",
        }
    }
}

/// What a modifier changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierTarget {
    Stat(StatKind),
    Bonus(GearBonus),
}

/// Whether a stat modifier adds a flat amount or a percentage of the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    Flat,
    Percent,
}

/// A single rolled modifier on a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub target: ModifierTarget,
    pub kind: ModifierKind,
    pub value: i32,
}

impl Modifier {
    pub fn flat(stat: StatKind, value: i32) -> Self {
        Self {
            target: ModifierTarget::Stat(stat),
            kind: ModifierKind::Flat,
            value,
        }
    }

    pub fn percent(stat: StatKind, value: i32) -> Self {
        Self {
            target: ModifierTarget::Stat(stat),
            kind: ModifierKind::Percent,
            value,
        }
    }

    pub fn bonus(bonus: GearBonus, value: i32) -> Self {
        Self {
            target: ModifierTarget::Bonus(bonus),
            kind: ModifierKind::Percent,
            value,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.target, self.kind) {
            (ModifierTarget::Stat(stat), ModifierKind::Flat) => {
                write!(f, "+{} {}", self.value, stat.label())
            }
            (ModifierTarget::Stat(stat), ModifierKind::Percent) => {
                write!(f, "+{}% {}", self.value, stat.label())
            }
            (ModifierTarget::Bonus(bonus), _) => write!(f, "+{}% {}", self.value, bonus.label()),
        }
    }
}

/// Equipment slots; the player wears at most one item per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Helmet,
    Armor,
    Boots,
    Accessory,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 5] = [
        EquipmentSlot::Weapon,
        EquipmentSlot::Helmet,
        EquipmentSlot::Armor,
        EquipmentSlot::Boots,
        EquipmentSlot::Accessory,
    ];
}

/// A wearable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EntityId,
    pub name: String,
    pub rarity: Rarity,
    pub slot: EquipmentSlot,
    pub modifiers: Vec<Modifier>,
}

impl Equipment {
    pub fn new(name: String, rarity: Rarity, slot: EquipmentSlot, modifiers: Vec<Modifier>) -> Self {
        Self {
            id: new_entity_id(),
            name,
            rarity,
            slot,
            modifiers,
        }
    }

    /// One-line description for logs and reward prompts.
    pub fn describe(&self) -> String {
        let mods: Vec<String> = self.modifiers.iter().map(|m| m.to_string()).collect();
        format!("{} [{}] ({})", self.name, self.rarity, mods.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumableKind {
    HealthPotion,
    ManaPotion,
}

impl fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumableKind::HealthPotion => write!(f, "Health Potion"),
            ConsumableKind::ManaPotion => write!(f, "Mana Potion"),
        }
    }
}

/// A single-use potion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumable {
    pub kind: ConsumableKind,
    pub rarity: Rarity,
    pub value: i32,
}

impl Consumable {
    pub fn new(kind: ConsumableKind, rarity: Rarity) -> Self {
        Self {
            kind,
            rarity,
            value: rarity.potion_value(),
        }
    }
}

impl fmt::Display for Consumable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (+{})", self.rarity, self.kind, self.value)
    }
}

/// Anything a drop table or chest can yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Equipment(Equipment),
    Consumable(Consumable),
}

/// Unordered multiset of potions carried by the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    consumables: Vec<Consumable>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, consumable: Consumable) {
        self.consumables.push(consumable);
    }

    /// Removes one potion of the given kind and rarity.
    pub fn take(&mut self, kind: ConsumableKind, rarity: Rarity) -> Option<Consumable> {
        let index = self
            .consumables
            .iter()
            .position(|c| c.kind == kind && c.rarity == rarity)?;
        Some(self.consumables.swap_remove(index))
    }

    pub fn count(&self, kind: ConsumableKind, rarity: Rarity) -> usize {
        self.consumables
            .iter()
            .filter(|c| c.kind == kind && c.rarity == rarity)
            .count()
    }

    pub fn count_kind(&self, kind: ConsumableKind) -> usize {
        self.consumables.iter().filter(|c| c.kind == kind).count()
    }

    /// The weakest rarity held for a kind, used by quick-use outside battle.
    pub fn lowest_rarity(&self, kind: ConsumableKind) -> Option<Rarity> {
        self.consumables
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.rarity)
            .min()
    }

    pub fn len(&self) -> usize {
        self.consumables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumables.is_empty()
    }
}
