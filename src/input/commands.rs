//! # Command Definitions
//!
//! Discrete actions a player can request, independent of how they were typed.

use crate::{ConsumableKind, Direction, Rarity};
use serde::{Deserialize, Serialize};

/// A decoded player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Walk one tile
    Move(Direction),
    /// Open a chest next to the player
    OpenChest,
    /// Drink the lowest-rarity potion of a kind
    QuickUse(ConsumableKind),

    /// Basic attack
    Attack,
    OpenSkills,
    /// Cast the class skill at a 0-based index
    UseSkill(usize),
    OpenItems,
    ChooseItemKind(ConsumableKind),
    /// Drink a specific potion
    UseItem(ConsumableKind, Rarity),
    Flee,
    /// Leave the current sub-menu
    Back,

    /// Wear the offered item
    Equip,
    /// Throw the offered item away
    Discard,
    /// Dismiss a level-up or potion summary
    Acknowledge,

    /// Start over after the game ended
    Restart,
    Quit,
}

impl Command {
    /// Whether the command only navigates menus and never changes the game world.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Command::OpenSkills | Command::OpenItems | Command::ChooseItemKind(_) | Command::Back
        )
    }
}
