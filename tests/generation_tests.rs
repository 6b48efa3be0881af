//! Property tests for stage generation: termination, room layout and entity placement.

use cryptcrawl::generation::utils::create_rng;
use cryptcrawl::{Dungeon, GameConfig, Generator, Position, RoomCorridorGenerator, TileType};
use proptest::prelude::*;
use std::collections::HashSet;

fn generate(seed: u64, stage: u32, width: u32, height: u32) -> (Dungeon, GameConfig) {
    let config = GameConfig::new(seed).with_size(width, height);
    let mut rng = create_rng(&config);
    let dungeon = RoomCorridorGenerator::new(stage)
        .generate(&config, &mut rng)
        .unwrap();
    (dungeon, config)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_generation_terminates_and_connects(
        seed in any::<u64>(),
        stage in 1u32..=3,
        width in 40u32..=100,
        height in 20u32..=50,
    ) {
        let (dungeon, config) = generate(seed, stage, width, height);
        let generator = RoomCorridorGenerator::new(stage);
        prop_assert!(generator.validate(&dungeon, &config).is_ok());
        prop_assert!(dungeon.unreachable_rooms().is_empty());
        prop_assert!(dungeon.grid.is_passable(dungeon.player_spawn));
    }

    #[test]
    fn test_rooms_never_overlap(
        seed in any::<u64>(),
        stage in 1u32..=3,
        width in 40u32..=100,
        height in 20u32..=50,
    ) {
        let (dungeon, _) = generate(seed, stage, width, height);
        for (i, a) in dungeon.rooms.iter().enumerate() {
            for b in dungeon.rooms.iter().skip(i + 1) {
                prop_assert!(!a.intersects(b), "rooms {} and {} overlap", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_outer_border_is_solid(
        seed in any::<u64>(),
        stage in 1u32..=3,
        width in 40u32..=100,
        height in 20u32..=50,
    ) {
        let (dungeon, _) = generate(seed, stage, width, height);
        let (w, h) = (width as i32, height as i32);
        for x in 0..w {
            prop_assert_eq!(dungeon.grid.get(Position::new(x, 0)), Some(TileType::Wall));
            prop_assert_eq!(dungeon.grid.get(Position::new(x, h - 1)), Some(TileType::Wall));
        }
        for y in 0..h {
            prop_assert_eq!(dungeon.grid.get(Position::new(0, y)), Some(TileType::Wall));
            prop_assert_eq!(dungeon.grid.get(Position::new(w - 1, y)), Some(TileType::Wall));
        }
    }

    #[test]
    fn test_entities_do_not_share_tiles(seed in any::<u64>(), stage in 1u32..=3) {
        let (dungeon, _) = generate(seed, stage, 80, 40);
        let boss_room = dungeon.boss_room().unwrap().clone();

        let bosses: Vec<_> = dungeon.monsters.iter().filter(|m| m.is_boss).collect();
        prop_assert_eq!(bosses.len(), 1);
        prop_assert!(boss_room.contains(bosses[0].position));

        let mut seen = HashSet::new();
        let positions = dungeon
            .monsters
            .iter()
            .map(|m| m.position)
            .chain(dungeon.chests.iter().map(|c| c.position))
            .chain(dungeon.traps.iter().map(|t| t.position));
        for pos in positions {
            prop_assert!(seen.insert(pos), "two entities share {:?}", pos);
        }
        prop_assert!(!seen.contains(&dungeon.player_spawn));

        for monster in dungeon.monsters.iter().filter(|m| !m.is_boss) {
            prop_assert!(!boss_room.contains(monster.position));
        }
        for chest in &dungeon.chests {
            prop_assert!(!boss_room.contains(chest.position));
            prop_assert_eq!(dungeon.grid.get(chest.position), Some(TileType::ClosedChest));
        }
    }
}

#[test]
fn test_default_size_places_ordinary_rooms() {
    for seed in 0..16 {
        for stage in 1..=3 {
            let (dungeon, _) = generate(seed, stage, 80, 40);
            let spawn_room = dungeon
                .rooms
                .iter()
                .find(|r| r.contains(dungeon.player_spawn))
                .unwrap();
            assert!(!spawn_room.is_boss(), "seed {} stage {} spawned in the boss room", seed, stage);
            assert!(dungeon.rooms.len() >= 2);
        }
    }
}

#[test]
fn test_same_seed_same_map() {
    let (first, _) = generate(4242, 2, 80, 40);
    let (second, _) = generate(4242, 2, 80, 40);
    assert_eq!(first.grid, second.grid);
    assert_eq!(first.player_spawn, second.player_spawn);
    assert_eq!(first.corridor_order, second.corridor_order);
}
