//! # Exploration
//!
//! Map-level actions shared by the single-player session and the multiplayer lobby:
//! walking, springing traps, opening chests and cleaning up after a won fight.

use crate::generation::{random_monster, roll_chest, trap_damage, ChestContents};
use crate::{
    Battle, CrawlResult, Direction, Dungeon, EncounterSource, EntityId, MessageLog, Player,
    RewardQueue, TileType, TrapKind,
};
use rand::rngs::StdRng;

/// Result of one step on the map.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Wall, chest or map edge; nothing changed
    Blocked,
    Moved,
    /// The step started a fight; the player may or may not have moved
    Fight(Battle),
    /// A trap took the player's last HP
    Killed,
    /// The player walked onto the portal
    Portal,
}

/// Result of trying to open a chest.
#[derive(Debug, Clone)]
pub enum ChestOutcome {
    NoChest,
    Opened,
    Ambush(Battle),
}

fn battle_for(dungeon: &Dungeon, index: usize, player: &Player, blinks: u32) -> Battle {
    let monster = dungeon.monsters[index].clone();
    let source = if monster.is_boss {
        EncounterSource::Boss(monster.id)
    } else {
        EncounterSource::Roaming(monster.id)
    };
    log::debug!("Battle starts against {} ({:?})", monster.name(), source);
    Battle::new(monster, source, player.level).with_blinks(blinks)
}

/// Starts a fight with a map monster that walked into the player.
pub fn engage(dungeon: &Dungeon, monster: EntityId, player: &Player, blinks: u32) -> Option<Battle> {
    dungeon
        .monster_index(monster)
        .map(|index| battle_for(dungeon, index, player, blinks))
}

/// Moves the player one tile.
///
/// Bumping a monster starts a fight without moving. Traps fire once and turn into floor.
pub fn step_player(
    dungeon: &mut Dungeon,
    player: &mut Player,
    direction: Direction,
    blinks: u32,
    log: &mut MessageLog,
    rng: &mut StdRng,
) -> CrawlResult<StepOutcome> {
    let target = player.position.step(direction);

    if let Some(index) = dungeon.monsters.iter().position(|m| m.position == target) {
        let battle = battle_for(dungeon, index, player, blinks);
        log.push(format!("You engage the {}!", battle.monster.name()));
        return Ok(StepOutcome::Fight(battle));
    }

    let tile = match dungeon.grid.get(target) {
        None | Some(TileType::Wall) => {
            log.push("You bump into a wall.");
            return Ok(StepOutcome::Blocked);
        }
        Some(TileType::ClosedChest) => {
            log.push("A chest blocks the way. Open it instead.");
            return Ok(StepOutcome::Blocked);
        }
        Some(tile) => tile,
    };

    player.position = target;
    match tile {
        TileType::DamageTrap | TileType::BattleTrap => spring_trap(dungeon, player, blinks, log, rng),
        TileType::Portal => {
            log.push("You step into the portal.");
            Ok(StepOutcome::Portal)
        }
        _ => Ok(StepOutcome::Moved),
    }
}

fn spring_trap(
    dungeon: &mut Dungeon,
    player: &mut Player,
    blinks: u32,
    log: &mut MessageLog,
    rng: &mut StdRng,
) -> CrawlResult<StepOutcome> {
    let pos = player.position;
    let fired = dungeon.trap_at_mut(pos).and_then(|trap| trap.trigger());
    dungeon.grid.set(pos, TileType::Floor)?;

    match fired {
        None => {
            log.push("The trap here has already been sprung.");
            Ok(StepOutcome::Moved)
        }
        Some(TrapKind::Damage) => {
            let damage = trap_damage(dungeon.stage);
            player.take_damage(damage);
            log.push(format!("A trap springs! You take {} damage.", damage));
            if player.is_alive() {
                Ok(StepOutcome::Moved)
            } else {
                log.push("You have been slain by a trap.");
                Ok(StepOutcome::Killed)
            }
        }
        Some(TrapKind::Battle) => {
            let monster = random_monster(dungeon.stage, pos, rng);
            log.push(format!("An ambush! A {} leaps out.", monster.name()));
            log::debug!("Ambush at {:?} by {}", pos, monster.name());
            let battle = Battle::new(monster, EncounterSource::Ambush, player.level).with_blinks(blinks);
            Ok(StepOutcome::Fight(battle))
        }
    }
}

/// Opens the first closed chest in the four tiles around the player.
pub fn open_adjacent_chest(
    dungeon: &mut Dungeon,
    player: &mut Player,
    rewards: &mut RewardQueue,
    blinks: u32,
    log: &mut MessageLog,
    rng: &mut StdRng,
) -> CrawlResult<ChestOutcome> {
    let neighbours = player.position.cardinal_adjacent_positions();
    let Some(pos) = neighbours.into_iter().find(|&pos| {
        dungeon
            .chests
            .iter()
            .any(|c| c.position == pos && !c.opened)
    }) else {
        log.push("There is no chest next to you.");
        return Ok(ChestOutcome::NoChest);
    };

    let opened = dungeon.chest_at_mut(pos).map(|c| c.open()).unwrap_or(false);
    if !opened {
        log.push("That chest is already open.");
        return Ok(ChestOutcome::NoChest);
    }
    dungeon.grid.set(pos, TileType::Floor)?;

    match roll_chest(rng) {
        ChestContents::Ambush => {
            let monster = random_monster(dungeon.stage, pos, rng);
            log.push(format!("The chest was a trap! A {} attacks.", monster.name()));
            let battle = Battle::new(monster, EncounterSource::Ambush, player.level).with_blinks(blinks);
            Ok(ChestOutcome::Ambush(battle))
        }
        ChestContents::Empty => {
            log.push("The chest is empty.");
            Ok(ChestOutcome::Opened)
        }
        ChestContents::Loot(items) => {
            log.push(format!("You open the chest and find {} item(s).", items.len()));
            rewards.push_rewards(&[], items, player, log);
            Ok(ChestOutcome::Opened)
        }
    }
}

/// Removes the defeated map monster. A fallen boss leaves the portal behind.
///
/// Returns true when the portal was revealed.
pub fn conclude_victory(dungeon: &mut Dungeon, source: EncounterSource, log: &mut MessageLog) -> CrawlResult<bool> {
    let Some(id) = source.map_monster() else {
        return Ok(false);
    };
    let Some(monster) = dungeon.remove_monster(id) else {
        return Ok(false);
    };
    if monster.is_boss {
        dungeon.reveal_portal(monster.position)?;
        log.push("A portal opens where the boss fell.");
        log::info!("Stage {} boss defeated, portal at {:?}", dungeon.stage, monster.position);
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Chest, Monster, MonsterTemplate, PlayerClass, Position, Room, RoomType, TileGrid, Trap,
    };
    use rand::SeedableRng;

    fn corridor() -> Dungeon {
        let mut grid = TileGrid::new(20, 10);
        let room = Room::new(1, Position::new(1, 1), 12, 6, RoomType::Normal);
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
            player_spawn: Position::new(2, 2),
            portal: None,
        }
    }

    fn hero() -> Player {
        Player::new("Hero".to_string(), PlayerClass::Warrior, Position::new(2, 2))
    }

    #[test]
    fn test_walls_block() {
        let mut dungeon = corridor();
        let mut player = hero();
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = step_player(&mut dungeon, &mut player, Direction::North, 2, &mut log, &mut rng).unwrap();
        assert!(matches!(outcome, StepOutcome::Blocked));
        assert_eq!(player.position, Position::new(2, 2));
        assert_eq!(log.last(), Some("You bump into a wall."));

        let outcome = step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        assert!(matches!(outcome, StepOutcome::Moved));
        assert_eq!(player.position, Position::new(3, 2));
    }

    #[test]
    fn test_damage_trap_fires_once() {
        let mut dungeon = corridor();
        let trap_pos = Position::new(3, 2);
        dungeon.grid.set(trap_pos, TileType::DamageTrap).unwrap();
        dungeon.traps.push(Trap::new(trap_pos, TrapKind::Damage));
        let mut player = hero();
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        assert_eq!(player.hp, 110);
        assert_eq!(dungeon.grid.get(trap_pos), Some(TileType::Floor));

        step_player(&mut dungeon, &mut player, Direction::West, 2, &mut log, &mut rng).unwrap();
        step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        assert_eq!(player.hp, 110);
        assert!(dungeon.traps[0].triggered);
    }

    #[test]
    fn test_lethal_trap_kills() {
        let mut dungeon = corridor();
        let trap_pos = Position::new(3, 2);
        dungeon.grid.set(trap_pos, TileType::DamageTrap).unwrap();
        dungeon.traps.push(Trap::new(trap_pos, TrapKind::Damage));
        let mut player = hero();
        player.hp = 4;
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        assert!(matches!(outcome, StepOutcome::Killed));
    }

    #[test]
    fn test_battle_trap_starts_mandatory_ambush() {
        let mut dungeon = corridor();
        let trap_pos = Position::new(2, 3);
        dungeon.grid.set(trap_pos, TileType::BattleTrap).unwrap();
        dungeon.traps.push(Trap::new(trap_pos, TrapKind::Battle));
        let mut player = hero();
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(9);

        let outcome = step_player(&mut dungeon, &mut player, Direction::South, 2, &mut log, &mut rng).unwrap();
        let StepOutcome::Fight(battle) = outcome else {
            panic!("expected an ambush");
        };
        assert_eq!(battle.source, EncounterSource::Ambush);
        assert!(!battle.flee_allowed);
        assert_eq!(player.position, trap_pos);
        assert!(dungeon.monsters.is_empty());
    }

    #[test]
    fn test_bumping_monster_starts_fight() {
        let mut dungeon = corridor();
        let slime = Monster::new(
            MonsterTemplate::new("Slime", 's', 20, 5, 1, 10),
            Position::new(3, 2),
            false,
        );
        let id = slime.id;
        dungeon.monsters.push(slime);
        let mut player = hero();
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        let StepOutcome::Fight(battle) = outcome else {
            panic!("expected a fight");
        };
        assert_eq!(battle.source, EncounterSource::Roaming(id));
        assert!(battle.flee_allowed);
        assert_eq!(player.position, Position::new(2, 2));

        assert!(!conclude_victory(&mut dungeon, battle.source, &mut log).unwrap());
        assert!(dungeon.monsters.is_empty());
    }

    #[test]
    fn test_boss_victory_reveals_portal() {
        let mut dungeon = corridor();
        let boss = Monster::new(
            MonsterTemplate::new("Goblin King", 'G', 140, 14, 6, 120),
            Position::new(16, 3),
            true,
        );
        let source = EncounterSource::Boss(boss.id);
        dungeon.monsters.push(boss);
        let mut log = MessageLog::new();

        assert!(conclude_victory(&mut dungeon, source, &mut log).unwrap());
        assert_eq!(dungeon.portal, Some(Position::new(16, 3)));
        assert_eq!(dungeon.grid.get(Position::new(16, 3)), Some(TileType::Portal));
    }

    #[test]
    fn test_chest_opens_once() {
        let mut dungeon = corridor();
        let chest_pos = Position::new(3, 2);
        dungeon.grid.set(chest_pos, TileType::ClosedChest).unwrap();
        dungeon.chests.push(Chest::new(chest_pos));
        let mut player = hero();
        let mut rewards = RewardQueue::new();
        let mut log = MessageLog::new();
        let mut rng = StdRng::seed_from_u64(21);

        let outcome = step_player(&mut dungeon, &mut player, Direction::East, 2, &mut log, &mut rng).unwrap();
        assert!(matches!(outcome, StepOutcome::Blocked));

        let first = open_adjacent_chest(&mut dungeon, &mut player, &mut rewards, 2, &mut log, &mut rng).unwrap();
        assert!(!matches!(first, ChestOutcome::NoChest));
        assert!(dungeon.chests[0].opened);
        assert_eq!(dungeon.grid.get(chest_pos), Some(TileType::Floor));

        let queued = rewards.len();
        let log_len = log.len();
        let second = open_adjacent_chest(&mut dungeon, &mut player, &mut rewards, 2, &mut log, &mut rng).unwrap();
        assert!(matches!(second, ChestOutcome::NoChest));
        assert_eq!(rewards.len(), queued);
        assert_eq!(log.len(), log_len + 1);
    }
}
