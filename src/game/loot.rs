//! # Loot and Leveling
//!
//! Turns a won battle or an opened chest into a queue of prompts. Level ups come first,
//! then one equip/discard decision per piece of equipment, then a single summary of the
//! potions that went straight into the inventory.

use crate::{
    roll_drops, ActionOutcome, Consumable, DropTable, Equipment, Item, MessageLog, Monster, Player,
};
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// A reward waiting for the player's attention.
#[derive(Debug, Clone, PartialEq)]
pub enum RewardPrompt {
    /// The player reached a new level
    LevelUp { level: u32 },
    /// Wear this item or throw it away
    EquipmentDecision(Equipment),
    /// Potions already added to the inventory
    ConsumableSummary(Vec<Consumable>),
}

impl RewardPrompt {
    /// One-line text for the prompt.
    pub fn describe(&self) -> String {
        match self {
            RewardPrompt::LevelUp { level } => format!("Level up! You are now level {}.", level),
            RewardPrompt::EquipmentDecision(item) => {
                format!("Found {}. Equip it? (y/n)", item.describe())
            }
            RewardPrompt::ConsumableSummary(potions) => {
                let names: Vec<String> = potions.iter().map(|p| p.to_string()).collect();
                format!("Potions added: {}.", names.join(", "))
            }
        }
    }
}

/// Ordered prompts that block other actions until resolved.
#[derive(Debug, Clone, Default)]
pub struct RewardQueue {
    prompts: VecDeque<RewardPrompt>,
}

impl RewardQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// The prompt currently shown.
    pub fn current(&self) -> Option<&RewardPrompt> {
        self.prompts.front()
    }

    pub fn clear(&mut self) {
        self.prompts.clear();
    }

    /// Queues rewards in display order. Potions go into the inventory right away.
    pub fn push_rewards(
        &mut self,
        levels: &[u32],
        items: Vec<Item>,
        player: &mut Player,
        log: &mut MessageLog,
    ) {
        if let Some(&level) = levels.last() {
            log.push(format!("You reached level {}!", level));
            self.prompts.push_back(RewardPrompt::LevelUp { level });
        }

        let mut potions = Vec::new();
        for item in items {
            match item {
                Item::Equipment(equipment) => {
                    log.push(format!("You found {}.", equipment.describe()));
                    self.prompts
                        .push_back(RewardPrompt::EquipmentDecision(equipment));
                }
                Item::Consumable(potion) => {
                    player.inventory.add(potion);
                    potions.push(potion);
                }
            }
        }
        if !potions.is_empty() {
            self.prompts
                .push_back(RewardPrompt::ConsumableSummary(potions));
        }
    }

    /// Equips the pending item, returning any replaced item to the void.
    pub fn equip_pending(&mut self, player: &mut Player, log: &mut MessageLog) -> ActionOutcome {
        match self.prompts.front() {
            Some(RewardPrompt::EquipmentDecision(_)) => {}
            _ => {
                log.push("There is no item waiting to be equipped.");
                return ActionOutcome::Rejected;
            }
        }
        if let Some(RewardPrompt::EquipmentDecision(item)) = self.prompts.pop_front() {
            let name = item.name.clone();
            match player.equip(item) {
                Some(old) => log.push(format!("You equip {} and discard {}.", name, old.name)),
                None => log.push(format!("You equip {}.", name)),
            }
        }
        ActionOutcome::Performed
    }

    pub fn discard_pending(&mut self, log: &mut MessageLog) -> ActionOutcome {
        match self.prompts.front() {
            Some(RewardPrompt::EquipmentDecision(item)) => {
                log.push(format!("You leave {} behind.", item.name));
                self.prompts.pop_front();
                ActionOutcome::Performed
            }
            _ => {
                log.push("There is no item to discard.");
                ActionOutcome::Rejected
            }
        }
    }

    /// Dismisses a level-up or potion summary prompt.
    pub fn acknowledge(&mut self, log: &mut MessageLog) -> ActionOutcome {
        match self.prompts.front() {
            Some(RewardPrompt::LevelUp { .. }) | Some(RewardPrompt::ConsumableSummary(_)) => {
                self.prompts.pop_front();
                ActionOutcome::Performed
            }
            Some(RewardPrompt::EquipmentDecision(_)) => {
                log.push("Decide whether to equip the item first (y/n).");
                ActionOutcome::Rejected
            }
            None => ActionOutcome::Rejected,
        }
    }
}

/// Grants experience and drops for a defeated monster.
///
/// Bosses roll on the boss table. Returns the levels reached.
pub fn award_victory(
    monster: &Monster,
    player: &mut Player,
    rewards: &mut RewardQueue,
    log: &mut MessageLog,
    rng: &mut StdRng,
) -> Vec<u32> {
    let experience = monster.stats.exp_reward;
    log.push(format!(
        "You defeated the {} and gain {} experience.",
        monster.name(),
        experience
    ));
    let levels = player.gain_experience(experience);

    let table = if monster.is_boss {
        DropTable::Boss
    } else {
        DropTable::Standard
    };
    let drops = roll_drops(table, rng);
    rewards.push_rewards(&levels, drops, player, log);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConsumableKind, EquipmentSlot, Modifier, MonsterTemplate, PlayerClass, Position, Rarity, StatKind};
    use rand::SeedableRng;

    fn sword() -> Equipment {
        Equipment::new(
            "Sword".to_string(),
            Rarity::Common,
            EquipmentSlot::Weapon,
            vec![Modifier::flat(StatKind::Atk, 2)],
        )
    }

    #[test]
    fn test_prompt_order() {
        let mut player = Player::new("Hero".to_string(), PlayerClass::Rogue, Position::new(0, 0));
        let mut log = MessageLog::new();
        let mut queue = RewardQueue::new();
        let potion = Consumable::new(ConsumableKind::ManaPotion, Rarity::Rare);

        queue.push_rewards(
            &[2, 3],
            vec![
                Item::Consumable(potion),
                Item::Equipment(sword()),
                Item::Equipment(sword()),
            ],
            &mut player,
            &mut log,
        );

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.current(), Some(&RewardPrompt::LevelUp { level: 3 }));
        assert_eq!(player.inventory.count(ConsumableKind::ManaPotion, Rarity::Rare), 1);

        assert_eq!(queue.equip_pending(&mut player, &mut log), ActionOutcome::Rejected);
        assert_eq!(queue.acknowledge(&mut log), ActionOutcome::Performed);
        assert_eq!(queue.acknowledge(&mut log), ActionOutcome::Rejected);

        assert_eq!(queue.equip_pending(&mut player, &mut log), ActionOutcome::Performed);
        assert_eq!(player.stat(StatKind::Atk), 7);
        assert_eq!(queue.discard_pending(&mut log), ActionOutcome::Performed);

        assert!(matches!(queue.current(), Some(RewardPrompt::ConsumableSummary(p)) if p.len() == 1));
        queue.acknowledge(&mut log);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_boss_victory_awards_equipment() {
        let mut rng = StdRng::seed_from_u64(77);
        let mut player = Player::new("Hero".to_string(), PlayerClass::Warrior, Position::new(0, 0));
        let mut log = MessageLog::new();
        let mut queue = RewardQueue::new();
        let mut boss = Monster::new(
            MonsterTemplate::new("Goblin King", 'G', 140, 14, 6, 120),
            Position::new(5, 5),
            true,
        );
        boss.begin_battle(1);

        let levels = award_victory(&boss, &mut player, &mut queue, &mut log, &mut rng);
        assert_eq!(levels, vec![2]);
        assert_eq!(player.experience, 45);

        let decisions = std::iter::from_fn(|| {
            let is_equipment = matches!(queue.current(), Some(RewardPrompt::EquipmentDecision(_)));
            if queue.current().is_none() {
                return None;
            }
            if is_equipment {
                queue.discard_pending(&mut log);
            } else {
                queue.acknowledge(&mut log);
            }
            Some(is_equipment)
        })
        .filter(|&d| d)
        .count();
        assert!((2..=3).contains(&decisions));
    }
}
