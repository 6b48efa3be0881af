//! # Encounter Generation
//!
//! Monster rosters and placement of the boss, monsters, traps and chests on a laid-out
//! stage. Every random placement loop is bounded and falls back to a deterministic scan.

use crate::{
    Chest, CrawlResult, Dungeon, Monster, MonsterTemplate, Position, Room, StageProfile,
    TileType, Trap, TrapKind,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

/// Attempts made by rejection sampling before falling back to a scan.
pub const MAX_SPAWN_ATTEMPTS: u32 = 500;

/// Regular monsters for a stage.
pub fn stage_roster(stage: u32) -> Vec<MonsterTemplate> {
    match stage {
        0 | 1 => vec![
            MonsterTemplate::new("Slime", 's', 20, 5, 1, 10),
            MonsterTemplate::new("Goblin", 'g', 28, 7, 2, 14),
            MonsterTemplate::new("Bat", 'b', 16, 6, 0, 9),
        ],
        2 => vec![
            MonsterTemplate::new("Orc", 'o', 55, 12, 5, 30),
            MonsterTemplate::new("Skeleton", 'k', 45, 13, 8, 28),
            MonsterTemplate::new("Wolf", 'w', 40, 14, 3, 26),
        ],
        _ => vec![
            MonsterTemplate::new("Wraith", 'r', 80, 18, 10, 55),
            MonsterTemplate::new("Troll", 'T', 120, 20, 12, 65),
            MonsterTemplate::new("Dark Knight", 'K', 100, 22, 16, 70),
        ],
    }
}

/// The boss guarding a stage.
pub fn stage_boss(stage: u32) -> MonsterTemplate {
    match stage {
        0 | 1 => MonsterTemplate::new("Goblin King", 'G', 140, 14, 6, 120),
        2 => MonsterTemplate::new("Lich", 'L', 260, 22, 10, 300),
        _ => MonsterTemplate::new("Ancient Dragon", 'D', 480, 32, 18, 800),
    }
}

/// Damage dealt by a damage trap on the given stage.
pub fn trap_damage(stage: u32) -> i32 {
    5 + 5 * stage as i32
}

/// Picks a random regular monster of the stage for an ambush or a spawn.
pub fn random_monster(stage: u32, position: Position, rng: &mut StdRng) -> Monster {
    let roster = stage_roster(stage);
    let template = roster
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| MonsterTemplate::new("Slime", 's', 20, 5, 1, 10));
    Monster::new(template, position, false)
}

/// Places the boss, traps, monsters and chests for one stage.
pub fn populate(dungeon: &mut Dungeon, profile: &StageProfile, rng: &mut StdRng) -> CrawlResult<()> {
    if let Some(boss_room) = dungeon.boss_room() {
        let center = boss_room.center();
        dungeon
            .monsters
            .push(Monster::new(stage_boss(profile.stage), center, true));
    }

    place_traps(dungeon, TrapKind::Damage, profile.damage_traps, rng)?;
    place_traps(dungeon, TrapKind::Battle, profile.battle_traps, rng)?;

    for _ in 0..profile.monsters {
        match find_spot(dungeon, rng, is_open_floor) {
            Some(pos) => {
                let monster = random_monster(profile.stage, pos, rng);
                dungeon.monsters.push(monster);
            }
            None => log::warn!("Stage {}: no room left for a monster", profile.stage),
        }
    }

    place_chests(dungeon, profile.chests, rng)?;
    Ok(())
}

fn place_traps(dungeon: &mut Dungeon, kind: TrapKind, count: u32, rng: &mut StdRng) -> CrawlResult<()> {
    let tile = match kind {
        TrapKind::Damage => TileType::DamageTrap,
        TrapKind::Battle => TileType::BattleTrap,
    };
    for _ in 0..count {
        let Some(pos) = find_spot(dungeon, rng, is_open_floor) else {
            log::warn!("Stage {}: no room left for a {:?} trap", dungeon.stage, kind);
            break;
        };
        dungeon.grid.set(pos, tile)?;
        dungeon.traps.push(Trap::new(pos, kind));
    }
    Ok(())
}

fn place_chests(dungeon: &mut Dungeon, quota: u32, rng: &mut StdRng) -> CrawlResult<()> {
    let mut placed = 0;

    let room_indices: Vec<usize> = (0..dungeon.rooms.len())
        .filter(|&i| !dungeon.rooms[i].is_boss())
        .collect();
    for index in room_indices {
        if placed >= quota {
            break;
        }
        if !rng.gen_bool(0.5) {
            continue;
        }
        let corner = corner_candidates(&dungeon.rooms[index])
            .into_iter()
            .find(|&pos| is_corner(dungeon, pos));
        if let Some(pos) = corner {
            add_chest(dungeon, pos)?;
            placed += 1;
        }
    }

    while placed < quota {
        let Some(pos) = find_spot(dungeon, rng, is_open_surrounded) else {
            log::warn!(
                "Stage {}: placed {} of {} chests",
                dungeon.stage,
                placed,
                quota
            );
            break;
        };
        add_chest(dungeon, pos)?;
        placed += 1;
    }
    Ok(())
}

fn add_chest(dungeon: &mut Dungeon, pos: Position) -> CrawlResult<()> {
    dungeon.grid.set(pos, TileType::ClosedChest)?;
    dungeon.chests.push(Chest::new(pos));
    Ok(())
}

/// The four interior corners of every part of a room.
fn corner_candidates(room: &Room) -> Vec<Position> {
    room.parts().flat_map(|r| r.interior_corners()).collect()
}

/// Floor tile outside the boss room, not a room center, not the spawn, and unoccupied.
fn is_open_floor(dungeon: &Dungeon, pos: Position) -> bool {
    dungeon.grid.get(pos) == Some(TileType::Floor)
        && pos != dungeon.player_spawn
        && !dungeon.boss_room().map(|r| r.contains(pos)).unwrap_or(false)
        && !dungeon.rooms.iter().any(|r| r.center() == pos)
        && !dungeon.is_occupied(pos)
}

/// Open floor whose eight neighbours are all passable, so a chest never blocks a path.
fn is_open_surrounded(dungeon: &Dungeon, pos: Position) -> bool {
    is_open_floor(dungeon, pos)
        && pos
            .adjacent_positions()
            .iter()
            .all(|&n| dungeon.grid.is_passable(n))
}

/// Open floor touching two perpendicular walls with the three inward neighbours passable.
fn is_corner(dungeon: &Dungeon, pos: Position) -> bool {
    if !is_open_floor(dungeon, pos) {
        return false;
    }
    let grid = &dungeon.grid;
    let wall_y = if grid.is_wall(Position::new(pos.x, pos.y - 1)) {
        -1
    } else if grid.is_wall(Position::new(pos.x, pos.y + 1)) {
        1
    } else {
        return false;
    };
    let wall_x = if grid.is_wall(Position::new(pos.x - 1, pos.y)) {
        -1
    } else if grid.is_wall(Position::new(pos.x + 1, pos.y)) {
        1
    } else {
        return false;
    };

    let inward_x = Position::new(pos.x - wall_x, pos.y);
    let inward_y = Position::new(pos.x, pos.y - wall_y);
    let inward_diagonal = Position::new(pos.x - wall_x, pos.y - wall_y);
    [inward_x, inward_y, inward_diagonal]
        .iter()
        .all(|&n| grid.is_passable(n))
}

/// Rejection sampling over the grid interior, then a deterministic row-major scan.
fn find_spot<F>(dungeon: &Dungeon, rng: &mut StdRng, accept: F) -> Option<Position>
where
    F: Fn(&Dungeon, Position) -> bool,
{
    let (width, height) = (dungeon.grid.width as i32, dungeon.grid.height as i32);
    if width < 3 || height < 3 {
        return None;
    }

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let pos = Position::new(rng.gen_range(1..width - 1), rng.gen_range(1..height - 1));
        if accept(dungeon, pos) {
            return Some(pos);
        }
    }

    log::debug!("Stage {}: spawn sampling exhausted, scanning", dungeon.stage);
    (1..height - 1)
        .flat_map(|y| (1..width - 1).map(move |x| Position::new(x, y)))
        .find(|&pos| accept(dungeon, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::generation::Generator;
    use crate::{GameConfig, RoomCorridorGenerator, RoomType, TileGrid};
    use rand::SeedableRng;

    fn single_room_dungeon() -> Dungeon {
        let mut grid = TileGrid::new(20, 12);
        let room = Room::new(1, Position::new(2, 2), 8, 6, RoomType::Normal);
        for pos in room.floor_positions() {
            grid.set(pos, TileType::Floor).unwrap();
        }
        Dungeon {
            stage: 1,
            grid,
            rooms: vec![Room::new(0, Position::new(14, 2), 4, 4, RoomType::Boss), room],
            corridor_order: vec![0, 1, 0],
            monsters: Vec::new(),
            chests: Vec::new(),
            traps: Vec::new(),
            player_spawn: Position::new(5, 4),
            portal: None,
        }
    }

    #[test]
    fn test_rosters_escalate() {
        let weakest: i32 = stage_roster(1).iter().map(|t| t.max_hp).max().unwrap();
        let strongest: i32 = stage_roster(3).iter().map(|t| t.max_hp).min().unwrap();
        assert!(strongest > weakest);
        assert!(stage_boss(3).max_hp > stage_boss(2).max_hp);
        assert_eq!(trap_damage(2), 15);
    }

    #[test]
    fn test_corner_detection() {
        let dungeon = single_room_dungeon();
        assert!(is_corner(&dungeon, Position::new(3, 3)));
        assert!(is_corner(&dungeon, Position::new(8, 6)));
        assert!(!is_corner(&dungeon, Position::new(5, 3)));
        assert!(!is_corner(&dungeon, Position::new(5, 5)));
    }

    #[test]
    fn test_find_spot_skips_spawn_and_occupied() {
        let mut dungeon = single_room_dungeon();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let pos = find_spot(&dungeon, &mut rng, is_open_floor).unwrap();
            assert_ne!(pos, dungeon.player_spawn);
            dungeon.traps.push(Trap::new(pos, TrapKind::Damage));
        }
        let unique: std::collections::HashSet<_> = dungeon.traps.iter().map(|t| t.position).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_find_spot_exhaustion_returns_none() {
        let mut dungeon = single_room_dungeon();
        let mut rng = StdRng::seed_from_u64(6);
        while let Some(pos) = find_spot(&dungeon, &mut rng, is_open_floor) {
            dungeon.traps.push(Trap::new(pos, TrapKind::Battle));
        }
        // 6x4 interior minus spawn and room center
        assert_eq!(dungeon.traps.len(), 22);
    }

    #[test]
    fn test_populate_respects_boss_room() {
        let config = GameConfig::new(31);
        let mut rng = create_rng(&config);
        let dungeon = RoomCorridorGenerator::new(2).generate(&config, &mut rng).unwrap();
        let boss_room = dungeon.boss_room().unwrap().clone();

        let bosses: Vec<_> = dungeon.monsters.iter().filter(|m| m.is_boss).collect();
        assert_eq!(bosses.len(), 1);
        assert_eq!(bosses[0].position, boss_room.center());
        assert_eq!(bosses[0].name(), "Lich");

        for monster in dungeon.monsters.iter().filter(|m| !m.is_boss) {
            assert!(!boss_room.contains(monster.position));
        }
        for trap in &dungeon.traps {
            assert!(!boss_room.contains(trap.position));
            assert_ne!(trap.position, dungeon.player_spawn);
        }
        for chest in &dungeon.chests {
            assert_eq!(dungeon.grid.get(chest.position), Some(TileType::ClosedChest));
        }
    }
}
