//! # Battle Sequencer
//!
//! Battle-scoped state machine. Player actions resolve immediately, then start a blinking
//! animation whose [`Continuation`] says what happens once it finishes: the monster's turn,
//! the end of the battle, or a return to the menu. At most one animation is in flight.

use crate::combat::{
    mana_refund_amount, resolve_basic_attack, resolve_monster_attack, roll, HitOutcome,
    SkillKind, StatusKind, BLEED_TURNS, POISON_TURNS, STUN_TURNS,
};
use crate::config::ANIMATION_BLINKS;
use crate::{ConsumableKind, EntityId, GearBonus, MessageLog, Monster, Player, Rarity, StatKind};
use rand::rngs::StdRng;

/// Upper bound on the chance to escape a fight.
pub const MAX_FLEE_CHANCE: f64 = 0.9;

/// `0.5 + DEX * 0.005`, capped at 0.9.
pub fn flee_chance(dex: i32) -> f64 {
    (0.5 + dex.max(0) as f64 * 0.005).min(MAX_FLEE_CHANCE)
}

/// Takes one potion from the inventory and applies it.
///
/// Returns the amount restored, or `None` when no such potion is carried.
pub fn drink_potion(
    player: &mut Player,
    kind: ConsumableKind,
    rarity: Rarity,
    log: &mut MessageLog,
) -> Option<i32> {
    let Some(potion) = player.inventory.take(kind, rarity) else {
        log.push(format!("You have no {} {}.", rarity, kind));
        return None;
    };
    let (restored, stat) = match kind {
        ConsumableKind::HealthPotion => (player.heal(potion.value), StatKind::Hp),
        ConsumableKind::ManaPotion => (player.restore_mp(potion.value), StatKind::Mp),
    };
    log.push(format!("You drink a {} and recover {} {}.", potion, restored, stat.label()));
    Some(restored)
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleResult {
    Victory,
    Defeat,
}

/// Where the opponent came from; decides flee rules and cleanup on victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterSource {
    /// A monster standing on the map
    Roaming(EntityId),
    /// The stage boss
    Boss(EntityId),
    /// Spawned by a battle trap or a chest
    Ambush,
}

impl EncounterSource {
    /// Map monster to remove on victory, if any.
    pub fn map_monster(self) -> Option<EntityId> {
        match self {
            EncounterSource::Roaming(id) | EncounterSource::Boss(id) => Some(id),
            EncounterSource::Ambush => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    Monster,
    Player,
}

/// Value shown over the blinking target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageDisplay {
    Damage(i32),
    Critical(i32),
    Miss,
    Heal(i32),
    Stunned,
}

/// What runs once the current animation is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    MonsterTurn,
    EndBattle(BattleResult),
    ReturnToMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub target: AnimationTarget,
    pub display: DamageDisplay,
    pub blinks_remaining: u32,
    pub continuation: Continuation,
}

impl Animation {
    /// Whether the target is drawn this tick; alternates with every blink.
    pub fn visible(&self) -> bool {
        self.blinks_remaining % 2 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleState {
    Menu,
    SkillSelect,
    ItemMenu,
    ItemSubMenu(ConsumableKind),
    Animating(Animation),
    Won,
    GameOver,
}

/// Immediate result of a player command inside a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleStep {
    /// Nothing changed; a reason was logged
    Rejected,
    /// The command was accepted
    Continued,
    /// The player escaped; the monster stays on the map untouched
    Fled,
}

/// One fight between the player and a single monster.
#[derive(Debug, Clone)]
pub struct Battle {
    /// Battle copy of the opponent with stats scaled for this fight
    pub monster: Monster,
    pub source: EncounterSource,
    pub state: BattleState,
    /// Boss fights and ambushes are mandatory
    pub flee_allowed: bool,
    blinks: u32,
}

impl Battle {
    /// Starts a battle, scaling the opponent to the player's level.
    pub fn new(mut monster: Monster, source: EncounterSource, player_level: u32) -> Self {
        monster.begin_battle(player_level);
        Self {
            flee_allowed: matches!(source, EncounterSource::Roaming(_)) && !monster.is_boss,
            monster,
            source,
            state: BattleState::Menu,
            blinks: ANIMATION_BLINKS,
        }
    }

    /// Overrides the blink count of every animation in this battle.
    pub fn with_blinks(mut self, blinks: u32) -> Self {
        self.blinks = blinks.max(1);
        self
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, BattleState::Animating(_))
    }

    pub fn animation(&self) -> Option<&Animation> {
        match &self.state {
            BattleState::Animating(animation) => Some(animation),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, BattleState::Won | BattleState::GameOver)
    }

    /// Whether the battle is waiting on a player choice.
    pub fn accepts_commands(&self) -> bool {
        matches!(
            self.state,
            BattleState::Menu
                | BattleState::SkillSelect
                | BattleState::ItemMenu
                | BattleState::ItemSubMenu(_)
        )
    }

    fn guard(&self, log: &mut MessageLog) -> bool {
        if self.accepts_commands() {
            true
        } else {
            log.push("Wait for the current action to finish.");
            false
        }
    }

    fn animate(&mut self, target: AnimationTarget, display: DamageDisplay, continuation: Continuation) {
        self.state = BattleState::Animating(Animation {
            target,
            display,
            blinks_remaining: self.blinks,
            continuation,
        });
    }

    pub fn open_skills(&mut self, log: &mut MessageLog) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        self.state = BattleState::SkillSelect;
        BattleStep::Continued
    }

    pub fn open_items(&mut self, log: &mut MessageLog) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        self.state = BattleState::ItemMenu;
        BattleStep::Continued
    }

    pub fn choose_item_kind(&mut self, kind: ConsumableKind, log: &mut MessageLog) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        self.state = BattleState::ItemSubMenu(kind);
        BattleStep::Continued
    }

    /// Steps one menu level back towards the main menu.
    pub fn back(&mut self) -> BattleStep {
        self.state = match self.state {
            BattleState::SkillSelect | BattleState::ItemMenu => BattleState::Menu,
            BattleState::ItemSubMenu(_) => BattleState::ItemMenu,
            _ => return BattleStep::Rejected,
        };
        BattleStep::Continued
    }

    /// Applies a landed hit to the battle monster and the attacker, then starts the
    /// animation over the monster.
    fn land_hit(&mut self, outcome: HitOutcome, label: &str, player: &mut Player, log: &mut MessageLog) {
        if outcome.missed {
            log.push(format!("{} misses; the {} evades.", label, self.monster.name()));
            self.animate(AnimationTarget::Monster, DamageDisplay::Miss, Continuation::MonsterTurn);
            return;
        }

        self.monster.take_damage(outcome.damage);
        if outcome.damage > 0 {
            let crit = if outcome.critical { " Critical hit!" } else { "" };
            log.push(format!(
                "{} deals {} damage to the {}.{}",
                label,
                outcome.damage,
                self.monster.name(),
                crit
            ));
        }
        if outcome.stun {
            self.monster.status.apply(StatusKind::Stun, STUN_TURNS);
            log.push(format!("The {} is stunned!", self.monster.name()));
        }
        if let Some(bleed) = outcome.bleed {
            self.monster.status.apply_bleed(BLEED_TURNS, bleed);
            log.push(format!("The {} starts bleeding.", self.monster.name()));
        }
        if let Some(poison) = outcome.poison {
            self.monster.status.apply_poison(POISON_TURNS, poison);
            log.push(format!("The {} is poisoned.", self.monster.name()));
        }
        if outcome.heal > 0 {
            let healed = player.heal(outcome.heal);
            if healed > 0 {
                log.push(format!("You drain {} HP.", healed));
            }
        }

        let display = if outcome.damage == 0 {
            DamageDisplay::Stunned
        } else if outcome.critical {
            DamageDisplay::Critical(outcome.damage)
        } else {
            DamageDisplay::Damage(outcome.damage)
        };
        let continuation = if self.monster.is_alive() {
            Continuation::MonsterTurn
        } else {
            log.push(format!("The {} is defeated!", self.monster.name()));
            Continuation::EndBattle(BattleResult::Victory)
        };
        self.animate(AnimationTarget::Monster, display, continuation);
    }

    /// Basic attack.
    pub fn attack(&mut self, player: &mut Player, log: &mut MessageLog, rng: &mut StdRng) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        let outcome = resolve_basic_attack(player, &self.monster, rng);
        self.land_hit(outcome, "Your attack", player, log);
        BattleStep::Continued
    }

    /// Uses the class skill at `index` (0-based).
    ///
    /// Too little MP rejects the command without spending anything.
    pub fn use_skill(
        &mut self,
        index: usize,
        player: &mut Player,
        log: &mut MessageLog,
        rng: &mut StdRng,
    ) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        let Some(skill) = player.skills().get(index).copied() else {
            log.push("You don't know that skill.");
            return BattleStep::Rejected;
        };
        let cost = skill.mp_cost();
        if !player.spend_mp(cost) {
            log.push(format!(
                "Not enough MP for {} (need {}, have {}).",
                skill.name(),
                cost,
                player.mp
            ));
            return BattleStep::Rejected;
        }
        log.push(format!("You use {}.", skill.name()));

        let outcome = skill.resolve(player, &self.monster, rng);
        if !outcome.missed && roll(player.bonus_rate(GearBonus::ManaRefund), rng) {
            let refunded = player.restore_mp(mana_refund_amount(cost));
            if refunded > 0 {
                log.push(format!("Mana refund: +{} MP.", refunded));
            }
        }
        match skill.kind() {
            SkillKind::Heal => {
                let healed = player.heal(outcome.heal);
                log.push(format!("You recover {} HP.", healed));
                self.animate(
                    AnimationTarget::Player,
                    DamageDisplay::Heal(healed),
                    Continuation::MonsterTurn,
                );
            }
            SkillKind::Disable | SkillKind::Damage => self.land_hit(outcome, skill.name(), player, log),
        }
        BattleStep::Continued
    }

    /// Drinks a potion of the given kind and rarity. Costs the turn.
    pub fn use_consumable(
        &mut self,
        kind: ConsumableKind,
        rarity: Rarity,
        player: &mut Player,
        log: &mut MessageLog,
    ) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        let Some(restored) = drink_potion(player, kind, rarity, log) else {
            return BattleStep::Rejected;
        };
        self.animate(
            AnimationTarget::Player,
            DamageDisplay::Heal(restored),
            Continuation::MonsterTurn,
        );
        BattleStep::Continued
    }

    /// Attempts to escape. Failure hands the turn to the monster.
    pub fn flee(&mut self, player: &mut Player, log: &mut MessageLog, rng: &mut StdRng) -> BattleStep {
        if !self.guard(log) {
            return BattleStep::Rejected;
        }
        if !self.flee_allowed {
            log.push("There is no escape from this fight!");
            return BattleStep::Rejected;
        }
        if roll(flee_chance(player.stat(StatKind::Dex)), rng) {
            log.push(format!("You escape from the {}.", self.monster.name()));
            return BattleStep::Fled;
        }
        log.push("You fail to escape!");
        self.monster_turn(player, log, rng);
        BattleStep::Continued
    }

    /// Advances the running animation by one tick.
    ///
    /// Runs the continuation when the blinks are exhausted and returns the battle result
    /// once a terminal state is reached.
    pub fn advance_animation(
        &mut self,
        player: &mut Player,
        log: &mut MessageLog,
        rng: &mut StdRng,
    ) -> Option<BattleResult> {
        let BattleState::Animating(mut animation) = self.state else {
            return None;
        };
        animation.blinks_remaining = animation.blinks_remaining.saturating_sub(1);
        if animation.blinks_remaining > 0 {
            self.state = BattleState::Animating(animation);
            return None;
        }

        match animation.continuation {
            Continuation::MonsterTurn => {
                self.monster_turn(player, log, rng);
                None
            }
            Continuation::ReturnToMenu => {
                self.state = BattleState::Menu;
                None
            }
            Continuation::EndBattle(BattleResult::Victory) => {
                self.state = BattleState::Won;
                Some(BattleResult::Victory)
            }
            Continuation::EndBattle(BattleResult::Defeat) => {
                self.state = BattleState::GameOver;
                Some(BattleResult::Defeat)
            }
        }
    }

    /// Runs animations back to back until the battle waits for input or ends.
    pub fn drain_animations(
        &mut self,
        player: &mut Player,
        log: &mut MessageLog,
        rng: &mut StdRng,
    ) -> Option<BattleResult> {
        while self.is_animating() {
            if let Some(result) = self.advance_animation(player, log, rng) {
                return Some(result);
            }
        }
        None
    }

    /// Monster upkeep (poison/bleed, stun) followed by its attack.
    fn monster_turn(&mut self, player: &mut Player, log: &mut MessageLog, rng: &mut StdRng) {
        let name = self.monster.name().to_string();

        let tick = self.monster.status.tick_damage_over_time();
        if tick.total() > 0 {
            self.monster.take_damage(tick.total());
            if tick.poison > 0 {
                log.push(format!("The {} takes {} poison damage.", name, tick.poison));
            }
            if tick.bleed > 0 {
                log.push(format!("The {} bleeds for {} damage.", name, tick.bleed));
            }
            if !self.monster.is_alive() {
                log.push(format!("The {} succumbs to its wounds!", name));
                self.animate(
                    AnimationTarget::Monster,
                    DamageDisplay::Damage(tick.total()),
                    Continuation::EndBattle(BattleResult::Victory),
                );
                return;
            }
        }

        if self.monster.status.consume_stun() {
            log.push(format!("The {} is stunned and cannot act.", name));
            self.state = BattleState::Menu;
            return;
        }

        let strike = resolve_monster_attack(&self.monster, player, rng);
        if strike.missed {
            log.push(format!("You dodge the {}'s attack.", name));
            self.animate(AnimationTarget::Player, DamageDisplay::Miss, Continuation::ReturnToMenu);
            return;
        }

        player.take_damage(strike.hp_damage);
        player.mp = (player.mp - strike.mp_damage).max(0);
        if strike.mp_damage > 0 {
            log.push(format!(
                "The {} hits you for {} damage ({} absorbed by mana).",
                name,
                strike.total(),
                strike.mp_damage
            ));
        } else {
            log.push(format!("The {} hits you for {} damage.", name, strike.hp_damage));
        }
        if strike.reflected > 0 {
            self.monster.take_damage(strike.reflected);
            log.push(format!("{} damage is reflected back at the {}.", strike.reflected, name));
        }

        let continuation = if !player.is_alive() {
            log.push("You have been slain...");
            Continuation::EndBattle(BattleResult::Defeat)
        } else if !self.monster.is_alive() {
            log.push(format!("The {} is defeated!", name));
            Continuation::EndBattle(BattleResult::Victory)
        } else {
            Continuation::ReturnToMenu
        };
        self.animate(
            AnimationTarget::Player,
            DamageDisplay::Damage(strike.total()),
            continuation,
        );
    }
}
