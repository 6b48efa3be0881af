//! # Status Effects
//!
//! Turn-counted effects carried by a combatant. A nonzero counter means the effect is active
//! this turn; it is decremented after being applied.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Skip the next action
    Stun,
    /// Flat damage per turn from gear procs
    Bleed,
    /// Flat damage per turn from skills
    Poison,
}

/// Damage dealt by damage-over-time effects during one upkeep step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DotTick {
    pub poison: i32,
    pub bleed: i32,
}

impl DotTick {
    pub fn total(self) -> i32 {
        self.poison + self.bleed
    }
}

/// Effect key to remaining-turn map plus the per-turn magnitudes of poison and bleed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    turns: HashMap<StatusKind, u32>,
    pub poison_damage: i32,
    pub bleed_damage: i32,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining turns for an effect, zero when inactive.
    pub fn remaining(&self, kind: StatusKind) -> u32 {
        self.turns.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.remaining(kind) > 0
    }

    /// Sets an effect's counter, refreshing rather than stacking duration.
    pub fn apply(&mut self, kind: StatusKind, turns: u32) {
        let entry = self.turns.entry(kind).or_insert(0);
        *entry = (*entry).max(turns);
    }

    pub fn apply_poison(&mut self, turns: u32, damage: i32) {
        self.apply(StatusKind::Poison, turns);
        self.poison_damage = damage.max(1);
    }

    pub fn apply_bleed(&mut self, turns: u32, damage: i32) {
        self.apply(StatusKind::Bleed, turns);
        self.bleed_damage = damage.max(1);
    }

    fn decrement(&mut self, kind: StatusKind) {
        if let Some(turns) = self.turns.get_mut(&kind) {
            *turns = turns.saturating_sub(1);
            if *turns == 0 {
                self.turns.remove(&kind);
            }
        }
    }

    /// Applies poison and bleed for this turn and counts both down.
    pub fn tick_damage_over_time(&mut self) -> DotTick {
        let mut tick = DotTick::default();
        if self.is_active(StatusKind::Poison) {
            tick.poison = self.poison_damage;
            self.decrement(StatusKind::Poison);
        }
        if self.is_active(StatusKind::Bleed) {
            tick.bleed = self.bleed_damage;
            self.decrement(StatusKind::Bleed);
        }
        tick
    }

    /// Consumes one turn of stun. Returns true when the action must be skipped.
    pub fn consume_stun(&mut self) -> bool {
        if self.is_active(StatusKind::Stun) {
            self.decrement(StatusKind::Stun);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.poison_damage = 0;
        self.bleed_damage = 0;
    }
}
