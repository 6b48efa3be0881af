//! # Multiplayer Lobby
//!
//! Authoritative state for up to [`MAX_PEERS`] players sharing one dungeon. Peers walk
//! through nickname entry and class selection, then take turns: one pointer names the
//! player allowed to act and cycles through connected, living players. Commands from anyone
//! else are dropped. Battles play their animations out immediately, so every accepted
//! command yields exactly one snapshot broadcast.
//!
//! The lobby is synchronous; [`crate::net::serve`] wraps it in a single async mutex.

use crate::config::MAX_PEERS;
use crate::generation::utils::create_rng;
use crate::net::PeerPhase;
use crate::{
    award_victory, battle_panel, conclude_victory, drink_potion, engage, generate_stage,
    log_lines, move_monsters, open_adjacent_chest, play_context, render_map, reward_panel,
    status_line, step_player, Battle, BattleResult, BattleStep, ChestOutcome, Command,
    CrawlError, CrawlResult, Dungeon, GameConfig, InputContext, InputHandler, Marker,
    MessageLog, Player, PlayerClass, Position, RewardQueue, SessionPhase, StepOutcome,
    TileType, Token, SNAPSHOT_LOG_LINES,
};
use rand::rngs::StdRng;

/// Connection handle assigned on join.
pub type PeerId = u64;

/// Map glyphs by join order.
pub const PLAYER_GLYPHS: [char; MAX_PEERS] = ['@', '&'];

/// Longest accepted nickname, in characters.
pub const MAX_NICKNAME_LEN: usize = 16;

/// A frame addressed by the lobby; the server does the framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    To(PeerId, String),
    All(String),
}

/// One connected client.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: PeerId,
    pub phase: PeerPhase,
    /// Confirmed nickname, or what has been typed so far
    pub nickname: String,
    pub player: Option<Player>,
    pub battle: Option<Battle>,
    pub rewards: RewardQueue,
}

impl Peer {
    fn new(id: PeerId) -> Self {
        Self {
            id,
            phase: PeerPhase::NicknameEntry,
            nickname: String::new(),
            player: None,
            battle: None,
            rewards: RewardQueue::new(),
        }
    }

    /// Playing and still standing; only these hold the turn.
    pub fn is_active(&self) -> bool {
        self.phase == PeerPhase::Playing && self.player.as_ref().is_some_and(|p| p.is_alive())
    }

    fn living_player(&self) -> Option<&Player> {
        self.player.as_ref().filter(|p| p.is_alive())
    }

    /// Drops the character; a confirmed nickname is kept.
    fn reset(&mut self) {
        if self.phase != PeerPhase::NicknameEntry {
            self.phase = PeerPhase::ClassSelect;
        }
        self.player = None;
        self.battle = None;
        self.rewards.clear();
    }
}

/// What a command did to the turn order.
enum TurnEffect {
    /// Nothing that costs the turn (menus, map potions, bumps, reward prompts)
    Kept,
    Passed,
    /// A completed step on the map; monsters move before the turn passes
    MapTurn,
    Portal,
}

/// Shared game for the connected peers.
#[derive(Debug)]
pub struct Lobby {
    config: GameConfig,
    pub stage: u32,
    pub dungeon: Dungeon,
    peers: Vec<Peer>,
    turn: Option<PeerId>,
    pub log: MessageLog,
    /// `Victory` or `GameOver` once the shared run has ended
    pub outcome: Option<SessionPhase>,
    input: InputHandler,
    next_id: PeerId,
    rng: StdRng,
}

impl Lobby {
    /// Creates an empty lobby with stage 1 generated.
    pub fn new(config: GameConfig) -> CrawlResult<Self> {
        config.validate()?;
        let mut rng = create_rng(&config);
        let dungeon = generate_stage(&config, 1, &mut rng)?;
        Ok(Self {
            config,
            stage: 1,
            dungeon,
            peers: Vec::new(),
            turn: None,
            log: MessageLog::new(),
            outcome: None,
            input: InputHandler::new(),
            next_id: 1,
            rng,
        })
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn peer(&self, id: PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// The peer allowed to act.
    pub fn current_turn(&self) -> Option<PeerId> {
        self.turn
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= MAX_PEERS
    }

    fn index_of(&self, id: PeerId) -> CrawlResult<usize> {
        self.peers
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CrawlError::Protocol(format!("Unknown peer {}", id)))
    }

    /// Registers a new connection and returns its id with the nickname prompt.
    pub fn join(&mut self) -> CrawlResult<(PeerId, Vec<Outbound>)> {
        if self.is_full() {
            return Err(CrawlError::Protocol("The lobby is full".to_string()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.peers.push(Peer::new(id));
        log::info!("Peer {} joined ({} connected)", id, self.peers.len());

        let index = self.peers.len() - 1;
        Ok((id, vec![Outbound::To(id, self.prompt(index))]))
    }

    /// Removes a peer and resets the game for whoever remains.
    pub fn leave(&mut self, id: PeerId) -> CrawlResult<Vec<Outbound>> {
        let index = self.index_of(id)?;
        let peer = self.peers.remove(index);
        log::info!("Peer {} ({}) left, resetting the game", id, peer.nickname);
        self.reset("A player left. The game has been reset.")
    }

    /// Starts over on a fresh stage 1. Every peer goes back to class selection.
    fn reset(&mut self, notice: &str) -> CrawlResult<Vec<Outbound>> {
        self.stage = 1;
        self.dungeon = generate_stage(&self.config, 1, &mut self.rng)?;
        self.turn = None;
        self.outcome = None;
        self.log.clear();
        self.log.push(notice);
        for peer in &mut self.peers {
            peer.reset();
        }

        Ok((0..self.peers.len())
            .map(|index| {
                let id = self.peers[index].id;
                Outbound::To(id, format!("{}\n{}", notice, self.prompt(index)))
            })
            .collect())
    }

    /// Processes one token from a peer.
    ///
    /// Returns the frames to deliver. An empty list means the token changed nothing,
    /// for example a command sent out of turn.
    pub fn handle(&mut self, id: PeerId, token: Token) -> CrawlResult<Vec<Outbound>> {
        let index = self.index_of(id)?;
        match self.peers[index].phase {
            PeerPhase::NicknameEntry => Ok(self.enter_nickname(index, token)),
            PeerPhase::ClassSelect => Ok(self.select_class(index, token)),
            PeerPhase::Playing => self.play(index, token),
        }
    }

    fn enter_nickname(&mut self, index: usize, token: Token) -> Vec<Outbound> {
        let peer = &mut self.peers[index];
        let room_left = peer.nickname.chars().count() < MAX_NICKNAME_LEN;
        match token {
            Token::Char(c) if room_left && !c.is_control() => peer.nickname.push(c),
            Token::Spacebar if room_left && !peer.nickname.is_empty() => peer.nickname.push(' '),
            Token::Backspace => {
                peer.nickname.pop();
            }
            Token::Enter => {
                let name = peer.nickname.trim().to_string();
                if !name.is_empty() {
                    log::info!("Peer {} is now known as {}", peer.id, name);
                    peer.nickname = name;
                    peer.phase = PeerPhase::ClassSelect;
                }
            }
            _ => {}
        }
        let id = peer.id;
        vec![Outbound::To(id, self.prompt(index))]
    }

    fn select_class(&mut self, index: usize, token: Token) -> Vec<Outbound> {
        let id = self.peers[index].id;
        let class = match token {
            Token::Char('1') => PlayerClass::Warrior,
            Token::Char('2') => PlayerClass::Mage,
            Token::Char('3') => PlayerClass::Rogue,
            _ => return vec![Outbound::To(id, self.prompt(index))],
        };

        let taken = self.occupied_by_players(index);
        let spawn = self.spawn_point(&taken);
        let peer = &mut self.peers[index];
        let player = Player::new(peer.nickname.clone(), class, spawn);
        self.log.push(format!("{} the {} joins the hunt.", player.name, player.class));
        log::info!("Peer {} plays {} the {}", id, player.name, player.class);
        peer.player = Some(player);
        peer.phase = PeerPhase::Playing;

        if self.turn.is_none() && self.outcome.is_none() {
            self.turn = Some(id);
        }
        vec![Outbound::All(self.snapshot())]
    }

    /// Positions of the other living players.
    fn occupied_by_players(&self, except: usize) -> Vec<Position> {
        self.peers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != except)
            .filter_map(|(_, p)| p.living_player())
            .map(|p| p.position)
            .collect()
    }

    /// The stage spawn, or the first free floor tile around it.
    fn spawn_point(&self, taken: &[Position]) -> Position {
        let spawn = self.dungeon.player_spawn;
        std::iter::once(spawn)
            .chain(spawn.cardinal_adjacent_positions())
            .chain(spawn.adjacent_positions())
            .find(|&pos| {
                self.dungeon.grid.get(pos) == Some(TileType::Floor)
                    && !self.dungeon.is_occupied(pos)
                    && !taken.contains(&pos)
            })
            .unwrap_or(spawn)
    }

    fn context_for(&self, index: usize) -> InputContext {
        let peer = &self.peers[index];
        if self.outcome.is_some() || !peer.is_active() {
            return InputContext::Finished;
        }
        play_context(peer.battle.as_ref(), &peer.rewards)
    }

    fn play(&mut self, index: usize, token: Token) -> CrawlResult<Vec<Outbound>> {
        let id = self.peers[index].id;
        let Some(command) = self.input.command_for(token, self.context_for(index)) else {
            return Ok(Vec::new());
        };

        match command {
            Command::Quit => {
                return Ok(vec![Outbound::To(id, "Close the connection to leave.".to_string())]);
            }
            Command::Restart if self.outcome.is_some() => {
                log::info!("Peer {} restarted the lobby", id);
                return self.reset("A new descent begins.");
            }
            _ => {}
        }
        if self.outcome.is_some() || self.turn != Some(id) {
            log::debug!("Ignoring {:?} from peer {} out of turn", command, id);
            return Ok(Vec::new());
        }

        match self.apply(index, command)? {
            TurnEffect::Kept => {}
            TurnEffect::Passed => self.pass_turn(),
            TurnEffect::MapTurn => {
                self.monsters_act();
                self.pass_turn();
            }
            TurnEffect::Portal => {
                self.advance_stage()?;
                if self.outcome.is_none() {
                    self.pass_turn();
                }
            }
        }
        self.check_wipe();
        Ok(vec![Outbound::All(self.snapshot())])
    }

    /// Runs a command for the peer holding the turn.
    fn apply(&mut self, index: usize, command: Command) -> CrawlResult<TurnEffect> {
        let blinks = self.config.animation_blinks;
        let others = self.occupied_by_players(index);
        let Lobby {
            peers,
            dungeon,
            log,
            rng,
            ..
        } = self;
        let peer = &mut peers[index];
        let Some(player) = peer.player.as_mut() else {
            return Ok(TurnEffect::Kept);
        };

        match command {
            Command::Equip => {
                peer.rewards.equip_pending(player, log);
                return Ok(TurnEffect::Kept);
            }
            Command::Discard => {
                peer.rewards.discard_pending(log);
                return Ok(TurnEffect::Kept);
            }
            Command::Acknowledge => {
                peer.rewards.acknowledge(log);
                return Ok(TurnEffect::Kept);
            }
            _ => {}
        }

        if let Some(battle) = peer.battle.as_mut() {
            let step = match command {
                Command::Attack => battle.attack(player, log, rng),
                Command::UseSkill(i) => battle.use_skill(i, player, log, rng),
                Command::UseItem(kind, rarity) => battle.use_consumable(kind, rarity, player, log),
                Command::Flee => battle.flee(player, log, rng),
                Command::OpenSkills => battle.open_skills(log),
                Command::OpenItems => battle.open_items(log),
                Command::ChooseItemKind(kind) => battle.choose_item_kind(kind, log),
                Command::Back => battle.back(),
                _ => BattleStep::Rejected,
            };
            if command.is_navigation() {
                return Ok(TurnEffect::Kept);
            }
            match step {
                BattleStep::Rejected => return Ok(TurnEffect::Kept),
                BattleStep::Fled => {
                    peer.battle = None;
                    return Ok(TurnEffect::Passed);
                }
                BattleStep::Continued => {}
            }

            let Some(result) = battle.drain_animations(player, log, rng) else {
                return Ok(TurnEffect::Passed);
            };
            let Some(finished) = peer.battle.take() else {
                return Ok(TurnEffect::Passed);
            };
            match result {
                BattleResult::Victory => {
                    award_victory(&finished.monster, player, &mut peer.rewards, log, rng);
                    conclude_victory(dungeon, finished.source, log)?;
                }
                BattleResult::Defeat => {
                    log.push(format!("{} has fallen.", player.name));
                    log::info!("{} fell on stage {}", player.name, dungeon.stage);
                }
            }
            return Ok(TurnEffect::Passed);
        }

        match command {
            Command::Move(direction) => {
                if others.contains(&player.position.step(direction)) {
                    log.push("Another hero is in the way.");
                    return Ok(TurnEffect::Kept);
                }
                Ok(match step_player(dungeon, player, direction, blinks, log, rng)? {
                    StepOutcome::Blocked => TurnEffect::Kept,
                    StepOutcome::Moved => TurnEffect::MapTurn,
                    StepOutcome::Fight(battle) => {
                        peer.battle = Some(battle);
                        TurnEffect::Passed
                    }
                    StepOutcome::Killed => {
                        log.push(format!("{} has fallen.", player.name));
                        TurnEffect::Passed
                    }
                    StepOutcome::Portal => TurnEffect::Portal,
                })
            }
            Command::OpenChest => {
                let outcome = open_adjacent_chest(dungeon, player, &mut peer.rewards, blinks, log, rng)?;
                Ok(match outcome {
                    ChestOutcome::NoChest => TurnEffect::Kept,
                    ChestOutcome::Opened => TurnEffect::Passed,
                    ChestOutcome::Ambush(battle) => {
                        peer.battle = Some(battle);
                        TurnEffect::Passed
                    }
                })
            }
            Command::QuickUse(kind) => {
                match player.inventory.lowest_rarity(kind) {
                    Some(rarity) => {
                        drink_potion(player, kind, rarity, log);
                    }
                    None => log.push(format!("You have no {}.", kind)),
                }
                Ok(TurnEffect::Kept)
            }
            _ => Ok(TurnEffect::Kept),
        }
    }

    /// Monster step after a map move. A monster reaching an idle player starts a fight.
    fn monsters_act(&mut self) {
        let targets: Vec<Position> = self
            .peers
            .iter()
            .filter_map(|p| p.living_player())
            .map(|p| p.position)
            .collect();
        let encounters = move_monsters(&mut self.dungeon, &targets, &mut self.rng);

        let blinks = self.config.animation_blinks;
        for encounter in encounters {
            let Some(peer) = self.peers.iter_mut().find(|p| {
                p.battle.is_none() && p.living_player().is_some_and(|pl| pl.position == encounter.target)
            }) else {
                continue;
            };
            let Some(player) = peer.player.as_ref() else {
                continue;
            };
            if let Some(battle) = engage(&self.dungeon, encounter.monster, player, blinks) {
                self.log
                    .push(format!("The {} attacks {}!", battle.monster.name(), player.name));
                peer.battle = Some(battle);
            }
        }
    }

    /// Hands the turn to the next active peer in join order.
    fn pass_turn(&mut self) {
        let count = self.peers.len();
        let start = self
            .turn
            .and_then(|id| self.peers.iter().position(|p| p.id == id))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.turn = (0..count)
            .map(|offset| &self.peers[(start + offset) % count])
            .find(|p| p.is_active())
            .map(|p| p.id);
    }

    /// Ends the run once nobody playing is left standing.
    fn check_wipe(&mut self) {
        let anyone_playing = self.peers.iter().any(|p| p.phase == PeerPhase::Playing);
        if self.outcome.is_none() && anyone_playing && !self.peers.iter().any(Peer::is_active) {
            self.outcome = Some(SessionPhase::GameOver);
            self.turn = None;
            self.log.push("Every hero has fallen. Game over.");
            log::info!("Lobby wiped on stage {}", self.stage);
        }
    }

    fn advance_stage(&mut self) -> CrawlResult<()> {
        if self.stage >= self.config.stages.len() as u32 {
            self.outcome = Some(SessionPhase::Victory);
            self.turn = None;
            self.log.push("The party escapes the crypt. Victory!");
            log::info!("Lobby cleared every stage");
            return Ok(());
        }

        self.stage += 1;
        self.dungeon = generate_stage(&self.config, self.stage, &mut self.rng)?;
        let mut taken = Vec::new();
        for index in 0..self.peers.len() {
            if self.peers[index].living_player().is_none() {
                continue;
            }
            let spawn = self.spawn_point(&taken);
            taken.push(spawn);
            let peer = &mut self.peers[index];
            peer.battle = None;
            if let Some(player) = peer.player.as_mut() {
                player.position = spawn;
            }
        }
        self.log.push(format!("The party descends to stage {}.", self.stage));
        log::info!("Lobby entered stage {}", self.stage);
        Ok(())
    }

    fn prompt(&self, index: usize) -> String {
        let peer = &self.peers[index];
        match peer.phase {
            PeerPhase::NicknameEntry => {
                format!("Welcome to Cryptcrawl! Enter your nickname: {}", peer.nickname)
            }
            PeerPhase::ClassSelect => format!(
                "Hello {}! Choose your class: 1) Warrior  2) Mage  3) Rogue",
                peer.nickname
            ),
            PeerPhase::Playing => self.snapshot(),
        }
    }

    /// Shared view: map with every living player, one status block per player, then the log.
    ///
    /// The player holding the turn is marked with `>`.
    pub fn snapshot(&self) -> String {
        let markers: Vec<Marker> = self
            .peers
            .iter()
            .zip(PLAYER_GLYPHS)
            .filter_map(|(peer, glyph)| peer.living_player().map(|p| Marker::new(p.position, glyph)))
            .collect();
        let mut out = render_map(&self.dungeon, &markers);

        for (peer, glyph) in self.peers.iter().zip(PLAYER_GLYPHS) {
            let Some(player) = &peer.player else {
                continue;
            };
            let cursor = if self.turn == Some(peer.id) { '>' } else { ' ' };
            out.push_str(&format!("{}{} {}\n", cursor, glyph, status_line(player, self.stage)));
            if !player.is_alive() {
                out.push_str("   (fallen)\n");
                continue;
            }
            if let Some(battle) = &peer.battle {
                for line in battle_panel(battle, player) {
                    out.push_str(&format!("   {}\n", line));
                }
            }
            if let Some(prompt) = peer.rewards.current() {
                out.push_str(&format!("   {}\n", reward_panel(prompt)));
            }
        }

        match self.outcome {
            Some(SessionPhase::Victory) => out.push_str("*** VICTORY ***  ENTER) New game\n"),
            Some(_) => out.push_str("*** GAME OVER ***  ENTER) New game\n"),
            None => {}
        }
        for line in log_lines(&self.log, SNAPSHOT_LOG_LINES) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EncounterSource, Monster, MonsterTemplate, Room, RoomType, TileGrid};

    fn open_floor() -> Dungeon {
        let mut grid = TileGrid::new(20, 10);
        let room = Room::new(1, Position::new(1, 1), 12, 8, RoomType::Normal);
        for pos in room.floor_positions() {
            grid.set(pos, TileType::Floor).unwrap();
        }
        Dungeon {
            stage: 1,
            grid,
            rooms: vec![Room::new(0, Position::new(14, 1), 5, 5, RoomType::Boss), room],
            corridor_order: vec![0, 1, 0],
            monsters: Vec::new(),
            chests: Vec::new(),
            traps: Vec::new(),
            player_spawn: Position::new(3, 3),
            portal: None,
        }
    }

    fn type_line(lobby: &mut Lobby, id: PeerId, text: &str) {
        for c in text.chars() {
            lobby.handle(id, Token::Char(c)).unwrap();
        }
        lobby.handle(id, Token::Enter).unwrap();
    }

    /// Lobby on a hand-built floor with the given players joined as warriors.
    fn lobby_with(names: &[&str]) -> (Lobby, Vec<PeerId>) {
        let mut config = GameConfig::new(17);
        config.animation_blinks = 2;
        let mut lobby = Lobby::new(config).unwrap();
        lobby.dungeon = open_floor();
        let mut ids = Vec::new();
        for name in names {
            let (id, _) = lobby.join().unwrap();
            type_line(&mut lobby, id, name);
            lobby.handle(id, Token::Char('1')).unwrap();
            ids.push(id);
        }
        (lobby, ids)
    }

    fn player_mut(lobby: &mut Lobby, id: PeerId) -> &mut Player {
        let index = lobby.index_of(id).unwrap();
        lobby.peers[index].player.as_mut().unwrap()
    }

    fn force_battle(lobby: &mut Lobby, id: PeerId, hp: i32, atk: i32) {
        let index = lobby.index_of(id).unwrap();
        let level = lobby.peers[index].player.as_ref().unwrap().level;
        let monster = Monster::new(MonsterTemplate::new("Dummy", 'd', hp, atk, 0, 10), Position::new(9, 9), false);
        lobby.peers[index].battle = Some(Battle::new(monster, EncounterSource::Ambush, level).with_blinks(2));
    }

    #[test]
    fn test_lobby_rejects_third_peer() {
        let mut lobby = Lobby::new(GameConfig::new(1)).unwrap();
        lobby.join().unwrap();
        lobby.join().unwrap();
        assert!(lobby.is_full());
        assert!(matches!(lobby.join(), Err(CrawlError::Protocol(_))));
    }

    #[test]
    fn test_nickname_entry() {
        let mut lobby = Lobby::new(GameConfig::new(2)).unwrap();
        let (id, frames) = lobby.join().unwrap();
        assert_eq!(frames, vec![Outbound::To(id, "Welcome to Cryptcrawl! Enter your nickname: ".to_string())]);

        lobby.handle(id, Token::Enter).unwrap();
        assert_eq!(lobby.peer(id).unwrap().phase, PeerPhase::NicknameEntry);

        for c in "Bob".chars() {
            lobby.handle(id, Token::Char(c)).unwrap();
        }
        lobby.handle(id, Token::Backspace).unwrap();
        lobby.handle(id, Token::Char('x')).unwrap();
        let frames = lobby.handle(id, Token::Enter).unwrap();
        let peer = lobby.peer(id).unwrap();
        assert_eq!(peer.nickname, "Box");
        assert_eq!(peer.phase, PeerPhase::ClassSelect);
        assert!(matches!(&frames[0], Outbound::To(_, text) if text.starts_with("Hello Box!")));
    }

    #[test]
    fn test_class_selection_starts_play() {
        let (lobby, ids) = lobby_with(&["Ann", "Ben"]);
        assert_eq!(lobby.current_turn(), Some(ids[0]));
        let ann = lobby.peer(ids[0]).unwrap().player.as_ref().unwrap();
        let ben = lobby.peer(ids[1]).unwrap().player.as_ref().unwrap();
        assert_eq!(ann.position, Position::new(3, 3));
        assert_eq!(ann.position.manhattan_distance(ben.position), 1);

        let snapshot = lobby.snapshot();
        assert!(snapshot.contains(">@ Ann the Warrior"));
        assert!(snapshot.contains(" & Ben the Warrior"));
    }

    #[test]
    fn test_turns_alternate_and_out_of_turn_input_is_ignored() {
        let (mut lobby, ids) = lobby_with(&["Ann", "Ben"]);
        player_mut(&mut lobby, ids[1]).position = Position::new(3, 6);

        assert!(lobby.handle(ids[1], Token::Char('d')).unwrap().is_empty());
        assert_eq!(lobby.peer(ids[1]).unwrap().player.as_ref().unwrap().position, Position::new(3, 6));

        let frames = lobby.handle(ids[0], Token::Char('d')).unwrap();
        assert!(matches!(frames.as_slice(), [Outbound::All(_)]));
        assert_eq!(lobby.peer(ids[0]).unwrap().player.as_ref().unwrap().position, Position::new(4, 3));
        assert_eq!(lobby.current_turn(), Some(ids[1]));

        lobby.handle(ids[1], Token::Char('w')).unwrap();
        assert_eq!(lobby.current_turn(), Some(ids[0]));
    }

    #[test]
    fn test_bumping_a_wall_keeps_the_turn() {
        let (mut lobby, ids) = lobby_with(&["Ann", "Ben"]);
        player_mut(&mut lobby, ids[0]).position = Position::new(2, 2);
        let frames = lobby.handle(ids[0], Token::Char('w')).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(lobby.current_turn(), Some(ids[0]));
        assert_eq!(lobby.log.last(), Some("You bump into a wall."));
    }

    #[test]
    fn test_battles_resolve_without_animation_frames() {
        let (mut lobby, ids) = lobby_with(&["Ann", "Ben"]);
        force_battle(&mut lobby, ids[0], 500, 1);
        lobby.handle(ids[0], Token::Char('1')).unwrap();

        let battle = lobby.peer(ids[0]).unwrap().battle.as_ref().unwrap();
        assert!(!battle.is_animating());
        assert_eq!(lobby.current_turn(), Some(ids[1]));
    }

    #[test]
    fn test_menu_navigation_keeps_the_turn() {
        let (mut lobby, ids) = lobby_with(&["Ann", "Ben"]);
        force_battle(&mut lobby, ids[0], 500, 1);
        lobby.handle(ids[0], Token::Char('2')).unwrap();
        assert_eq!(lobby.current_turn(), Some(ids[0]));
        assert_eq!(lobby.context_for(0), InputContext::SkillSelect);
        lobby.handle(ids[0], Token::Backspace).unwrap();
        assert_eq!(lobby.context_for(0), InputContext::BattleMenu);
    }

    #[test]
    fn test_wipe_ends_the_game_and_enter_resets() {
        let (mut lobby, ids) = lobby_with(&["Ann"]);
        {
            let ann = player_mut(&mut lobby, ids[0]);
            ann.hp = 1;
            ann.base.dexterity = 0;
        }
        force_battle(&mut lobby, ids[0], 10_000, 500);
        lobby.handle(ids[0], Token::Char('1')).unwrap();

        assert_eq!(lobby.outcome, Some(SessionPhase::GameOver));
        assert_eq!(lobby.current_turn(), None);
        assert!(lobby.snapshot().contains("GAME OVER"));

        let frames = lobby.handle(ids[0], Token::Enter).unwrap();
        assert_eq!(lobby.outcome, None);
        assert_eq!(lobby.peer(ids[0]).unwrap().phase, PeerPhase::ClassSelect);
        assert!(matches!(&frames[0], Outbound::To(_, text) if text.starts_with("A new descent begins.")));
    }

    #[test]
    fn test_disconnect_resets_the_game() {
        let (mut lobby, ids) = lobby_with(&["Ann", "Ben"]);
        lobby.stage = 2;
        let frames = lobby.leave(ids[1]).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], Outbound::To(id, text)
            if *id == ids[0] && text.starts_with("A player left. The game has been reset.")));
        assert_eq!(lobby.stage, 1);
        assert_eq!(lobby.peers().len(), 1);
        assert_eq!(lobby.peer(ids[0]).unwrap().phase, PeerPhase::ClassSelect);
        assert!(lobby.peer(ids[0]).unwrap().player.is_none());
        assert!(matches!(lobby.leave(ids[1]), Err(CrawlError::Protocol(_))));
    }
}
