//! # Game Session
//!
//! The [`GameSession`] aggregate owned by the top-level loop. It holds the current stage,
//! the player, the active battle and pending rewards, and routes every player action to
//! the exploration, battle and loot subsystems. Nothing here is global.

use crate::generation::utils::create_rng;
use crate::{
    award_victory, conclude_victory, drink_potion, engage, move_monsters, open_adjacent_chest,
    step_player, ActionOutcome, Battle, BattleResult, BattleState, BattleStep, ChestOutcome,
    Command, ConsumableKind, CrawlError, CrawlResult, Direction, Dungeon, GameConfig, Generator,
    InputContext, MessageLog, Player, PlayerClass, Rarity, RewardPrompt, RewardQueue,
    RoomCorridorGenerator, StepOutcome,
};
use rand::rngs::StdRng;

/// Top-level outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Exploring,
    InBattle,
    /// The last stage was cleared
    Victory,
    GameOver,
}

/// One player's run through the three stages.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub config: GameConfig,
    /// Current stage, 1-based
    pub stage: u32,
    pub dungeon: Dungeon,
    pub player: Player,
    pub battle: Option<Battle>,
    pub rewards: RewardQueue,
    pub log: MessageLog,
    pub phase: SessionPhase,
    /// Loop ticks since the session started
    pub ticks: u64,
    /// Completed map turns
    pub turn_number: u64,
    rng: StdRng,
}

/// Generates one stage with the built-in generator.
pub fn generate_stage(config: &GameConfig, stage: u32, rng: &mut StdRng) -> CrawlResult<Dungeon> {
    RoomCorridorGenerator::new(stage).generate(config, rng)
}

impl GameSession {
    /// Starts a new run on stage 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{GameConfig, GameSession, PlayerClass, SessionPhase};
    ///
    /// let session = GameSession::new(GameConfig::new(42), PlayerClass::Mage, "Ayla").unwrap();
    /// assert_eq!(session.stage, 1);
    /// assert_eq!(session.phase, SessionPhase::Exploring);
    /// assert_eq!(session.player.position, session.dungeon.player_spawn);
    /// ```
    pub fn new(config: GameConfig, class: PlayerClass, name: &str) -> CrawlResult<Self> {
        config.validate()?;
        let mut rng = create_rng(&config);
        let dungeon = generate_stage(&config, 1, &mut rng)?;
        let player = Player::new(name.to_string(), class, dungeon.player_spawn);

        let mut log = MessageLog::new();
        log.push(format!("{} the {} enters the crypt.", player.name, player.class));
        log::info!("New session: {} ({}) seed {:?}", player.name, player.class, config.seed);

        Ok(Self {
            config,
            stage: 1,
            dungeon,
            player,
            battle: None,
            rewards: RewardQueue::new(),
            log,
            phase: SessionPhase::Exploring,
            ticks: 0,
            turn_number: 0,
            rng,
        })
    }

    /// Throws the run away and starts again with the same character concept.
    pub fn restart(&mut self) -> CrawlResult<()> {
        let name = self.player.name.clone();
        let class = self.player.class;
        let dungeon = generate_stage(&self.config, 1, &mut self.rng)?;
        self.player = Player::new(name, class, dungeon.player_spawn);
        self.dungeon = dungeon;
        self.stage = 1;
        self.battle = None;
        self.rewards.clear();
        self.log.clear();
        self.log.push("A new descent begins.");
        self.phase = SessionPhase::Exploring;
        self.turn_number = 0;
        log::info!("Session restarted");
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Victory | SessionPhase::GameOver)
    }

    pub fn is_animating(&self) -> bool {
        self.battle.as_ref().map(|b| b.is_animating()).unwrap_or(false)
    }

    /// The prompt the player must answer before doing anything else.
    pub fn pending_reward(&self) -> Option<&RewardPrompt> {
        self.rewards.current()
    }

    fn ensure_active(&self) -> CrawlResult<()> {
        if self.is_finished() {
            return Err(CrawlError::InvalidState("The game is over".to_string()));
        }
        Ok(())
    }

    fn ensure_exploring(&self) -> CrawlResult<()> {
        self.ensure_active()?;
        if self.phase == SessionPhase::InBattle {
            return Err(CrawlError::InvalidAction(
                "That is not possible during a battle".to_string(),
            ));
        }
        Ok(())
    }

    /// Logs and reports whether a reward prompt is blocking other actions.
    fn blocked_by_rewards(&mut self) -> bool {
        if self.rewards.is_empty() {
            return false;
        }
        self.log.push("Deal with the reward first.");
        true
    }

    /// Runs a battle action against the active fight.
    fn with_battle<F>(&mut self, action: F) -> CrawlResult<ActionOutcome>
    where
        F: FnOnce(&mut Battle, &mut Player, &mut MessageLog, &mut StdRng) -> BattleStep,
    {
        self.ensure_active()?;
        let battle = self
            .battle
            .as_mut()
            .ok_or_else(|| CrawlError::InvalidState("No battle in progress".to_string()))?;
        let step = action(battle, &mut self.player, &mut self.log, &mut self.rng);
        Ok(step_outcome(step))
    }

    fn start_battle(&mut self, battle: Battle) {
        log::info!(
            "Stage {}: battle against {} (flee allowed: {})",
            self.stage,
            battle.monster.name(),
            battle.flee_allowed
        );
        self.battle = Some(battle);
        self.phase = SessionPhase::InBattle;
    }

    fn blinks(&self) -> u32 {
        self.config.animation_blinks
    }

    /// Walks one tile, then lets the monsters take their step.
    pub fn move_player(&mut self, direction: Direction) -> CrawlResult<ActionOutcome> {
        self.ensure_exploring()?;
        if self.blocked_by_rewards() {
            return Ok(ActionOutcome::Rejected);
        }

        let blinks = self.blinks();
        let outcome = step_player(
            &mut self.dungeon,
            &mut self.player,
            direction,
            blinks,
            &mut self.log,
            &mut self.rng,
        )?;
        match outcome {
            StepOutcome::Blocked => return Ok(ActionOutcome::Rejected),
            StepOutcome::Fight(battle) => {
                self.start_battle(battle);
                return Ok(ActionOutcome::Performed);
            }
            StepOutcome::Killed => {
                self.game_over();
                return Ok(ActionOutcome::Performed);
            }
            StepOutcome::Portal => {
                self.advance_stage()?;
                return Ok(ActionOutcome::Performed);
            }
            StepOutcome::Moved => {}
        }

        self.end_map_turn();
        Ok(ActionOutcome::Performed)
    }

    /// Monster movement after a map action; a monster reaching the player starts a fight.
    fn end_map_turn(&mut self) {
        self.turn_number += 1;
        let encounters = move_monsters(&mut self.dungeon, &[self.player.position], &mut self.rng);
        if let Some(encounter) = encounters.first() {
            if let Some(battle) = engage(&self.dungeon, encounter.monster, &self.player, self.blinks()) {
                self.log.push(format!("The {} attacks you!", battle.monster.name()));
                self.start_battle(battle);
            }
        }
    }

    /// Opens a chest next to the player.
    pub fn open_adjacent_chest(&mut self) -> CrawlResult<ActionOutcome> {
        self.ensure_exploring()?;
        if self.blocked_by_rewards() {
            return Ok(ActionOutcome::Rejected);
        }

        let blinks = self.blinks();
        let outcome = open_adjacent_chest(
            &mut self.dungeon,
            &mut self.player,
            &mut self.rewards,
            blinks,
            &mut self.log,
            &mut self.rng,
        )?;
        match outcome {
            ChestOutcome::NoChest => Ok(ActionOutcome::Rejected),
            ChestOutcome::Opened => {
                self.turn_number += 1;
                Ok(ActionOutcome::Performed)
            }
            ChestOutcome::Ambush(battle) => {
                self.start_battle(battle);
                Ok(ActionOutcome::Performed)
            }
        }
    }

    pub fn attack(&mut self) -> CrawlResult<ActionOutcome> {
        self.with_battle(|battle, player, log, rng| battle.attack(player, log, rng))
    }

    pub fn use_skill(&mut self, index: usize) -> CrawlResult<ActionOutcome> {
        self.with_battle(|battle, player, log, rng| battle.use_skill(index, player, log, rng))
    }

    /// Drinks a potion. In battle it costs the turn; on the map no time passes.
    pub fn use_consumable(&mut self, kind: ConsumableKind, rarity: Rarity) -> CrawlResult<ActionOutcome> {
        self.ensure_active()?;
        if let Some(battle) = self.battle.as_mut() {
            let step = battle.use_consumable(kind, rarity, &mut self.player, &mut self.log);
            return Ok(step_outcome(step));
        }
        if self.blocked_by_rewards() {
            return Ok(ActionOutcome::Rejected);
        }
        match drink_potion(&mut self.player, kind, rarity, &mut self.log) {
            Some(_) => Ok(ActionOutcome::Performed),
            None => Ok(ActionOutcome::Rejected),
        }
    }

    /// Drinks the weakest potion of a kind.
    pub fn quick_use(&mut self, kind: ConsumableKind) -> CrawlResult<ActionOutcome> {
        self.ensure_active()?;
        match self.player.inventory.lowest_rarity(kind) {
            Some(rarity) => self.use_consumable(kind, rarity),
            None => {
                self.log.push(format!("You have no {}.", kind));
                Ok(ActionOutcome::Rejected)
            }
        }
    }

    /// Tries to run. A successful escape leaves the map monster where it stands.
    pub fn flee(&mut self) -> CrawlResult<ActionOutcome> {
        let mut fled = false;
        let outcome = self.with_battle(|battle, player, log, rng| {
            let step = battle.flee(player, log, rng);
            fled = step == BattleStep::Fled;
            step
        })?;
        if fled {
            self.battle = None;
            self.phase = SessionPhase::Exploring;
            log::debug!("Player fled on stage {}", self.stage);
        }
        Ok(outcome)
    }

    /// Menu navigation inside a battle.
    fn navigate(&mut self, command: Command) -> CrawlResult<ActionOutcome> {
        self.with_battle(|battle, _, log, _| match command {
            Command::OpenSkills => battle.open_skills(log),
            Command::OpenItems => battle.open_items(log),
            Command::ChooseItemKind(kind) => battle.choose_item_kind(kind, log),
            _ => battle.back(),
        })
    }

    /// One tick of the animation sequencer. Ends the battle when its continuation says so.
    pub fn advance_animation(&mut self) -> CrawlResult<Option<BattleResult>> {
        let Some(battle) = self.battle.as_mut() else {
            return Ok(None);
        };
        match battle.advance_animation(&mut self.player, &mut self.log, &mut self.rng) {
            Some(result) => {
                self.finish_battle(result)?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Plays every queued animation at once.
    pub fn drain_animations(&mut self) -> CrawlResult<Option<BattleResult>> {
        while self.is_animating() {
            if let Some(result) = self.advance_animation()? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Fixed-rate loop tick.
    pub fn tick(&mut self) -> CrawlResult<()> {
        self.ticks += 1;
        if self.is_animating() {
            self.advance_animation()?;
        }
        Ok(())
    }

    fn finish_battle(&mut self, result: BattleResult) -> CrawlResult<()> {
        let Some(battle) = self.battle.take() else {
            return Ok(());
        };
        match result {
            BattleResult::Victory => {
                let levels = award_victory(
                    &battle.monster,
                    &mut self.player,
                    &mut self.rewards,
                    &mut self.log,
                    &mut self.rng,
                );
                if let Some(level) = levels.last() {
                    log::info!("{} reached level {}", self.player.name, level);
                }
                conclude_victory(&mut self.dungeon, battle.source, &mut self.log)?;
                self.phase = SessionPhase::Exploring;
                log::info!("Stage {}: defeated {}", self.stage, battle.monster.name());
            }
            BattleResult::Defeat => self.game_over(),
        }
        Ok(())
    }

    fn game_over(&mut self) {
        self.battle = None;
        self.phase = SessionPhase::GameOver;
        self.log.push("Game over.");
        log::info!(
            "Game over on stage {} at level {}",
            self.stage,
            self.player.level
        );
    }

    /// Moves to the next stage, or wins the game after the last one.
    fn advance_stage(&mut self) -> CrawlResult<()> {
        if self.stage >= self.config.stages.len() as u32 {
            self.phase = SessionPhase::Victory;
            self.log.push("You escape the crypt. Victory!");
            log::info!("{} cleared every stage", self.player.name);
            return Ok(());
        }
        self.stage += 1;
        self.dungeon = generate_stage(&self.config, self.stage, &mut self.rng)?;
        self.player.position = self.dungeon.player_spawn;
        self.log.push(format!("You descend to stage {}.", self.stage));
        log::info!("Entered stage {}", self.stage);
        Ok(())
    }

    pub fn equip_pending(&mut self) -> CrawlResult<ActionOutcome> {
        Ok(self.rewards.equip_pending(&mut self.player, &mut self.log))
    }

    pub fn discard_pending(&mut self) -> CrawlResult<ActionOutcome> {
        Ok(self.rewards.discard_pending(&mut self.log))
    }

    pub fn acknowledge_reward(&mut self) -> CrawlResult<ActionOutcome> {
        Ok(self.rewards.acknowledge(&mut self.log))
    }

    /// How the next token should be read.
    pub fn input_context(&self) -> InputContext {
        if self.is_finished() {
            return InputContext::Finished;
        }
        play_context(self.battle.as_ref(), &self.rewards)
    }

    /// Runs a decoded command. `Quit` is left to the caller and reported as rejected.
    pub fn execute(&mut self, command: Command) -> CrawlResult<ActionOutcome> {
        match command {
            Command::Move(direction) => self.move_player(direction),
            Command::OpenChest => self.open_adjacent_chest(),
            Command::QuickUse(kind) => self.quick_use(kind),
            Command::Attack => self.attack(),
            Command::UseSkill(index) => self.use_skill(index),
            Command::UseItem(kind, rarity) => self.use_consumable(kind, rarity),
            Command::Flee => self.flee(),
            Command::OpenSkills | Command::OpenItems | Command::ChooseItemKind(_) | Command::Back => {
                self.navigate(command)
            }
            Command::Equip => self.equip_pending(),
            Command::Discard => self.discard_pending(),
            Command::Acknowledge => self.acknowledge_reward(),
            Command::Restart => {
                if !self.is_finished() {
                    return Ok(ActionOutcome::Rejected);
                }
                self.restart()?;
                Ok(ActionOutcome::Performed)
            }
            Command::Quit => Ok(ActionOutcome::Rejected),
        }
    }
}

/// Input context of a living player: reward prompts first, then the battle menus.
pub fn play_context(battle: Option<&Battle>, rewards: &RewardQueue) -> InputContext {
    match rewards.current() {
        Some(RewardPrompt::EquipmentDecision(_)) => return InputContext::EquipmentPrompt,
        Some(_) => return InputContext::NoticePrompt,
        None => {}
    }
    match battle.map(|b| b.state) {
        None => InputContext::Exploring,
        Some(BattleState::SkillSelect) => InputContext::SkillSelect,
        Some(BattleState::ItemMenu) => InputContext::ItemMenu,
        Some(BattleState::ItemSubMenu(kind)) => InputContext::ItemSubMenu(kind),
        Some(BattleState::Animating(_)) => InputContext::Animating,
        Some(_) => InputContext::BattleMenu,
    }
}

fn step_outcome(step: BattleStep) -> ActionOutcome {
    match step {
        BattleStep::Rejected => ActionOutcome::Rejected,
        BattleStep::Continued | BattleStep::Fled => ActionOutcome::Performed,
    }
}
