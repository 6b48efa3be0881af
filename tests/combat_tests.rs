//! Damage formulas, skill scenarios, monster scaling and chest rolls.

use cryptcrawl::{
    apply_defense, open_chest_with_rolls, split_mana_shield, Battle, Chest, ChestContents,
    EncounterSource, Monster, MonsterTemplate, Player, PlayerClass, Position, Skill, StatKind,
    Trap, TrapKind,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn warrior() -> Player {
    Player::new("Hero".to_string(), PlayerClass::Warrior, Position::new(0, 0))
}

fn template(hp: i32, def: i32) -> MonsterTemplate {
    MonsterTemplate::new("Ghoul", 'z', hp, 9, def, 20)
}

proptest! {
    #[test]
    fn test_defense_is_monotonic(raw in 1i32..10_000, def in 0i32..5_000) {
        let lower = apply_defense(raw, def);
        let higher = apply_defense(raw, def + 1);
        prop_assert!(higher <= lower);
        prop_assert!(higher >= 1);
        prop_assert!(lower <= raw);
    }

    #[test]
    fn test_mana_shield_conserves_damage(
        damage in 0i32..5_000,
        rate in 0.0f64..=1.0,
        mp in 0i32..5_000,
    ) {
        let split = split_mana_shield(damage, rate, mp);
        prop_assert_eq!(split.hp_damage + split.mp_damage, damage);
        prop_assert!(split.mp_damage >= 0);
        prop_assert!(split.mp_damage <= mp);
        prop_assert!(split.hp_damage >= 0);
    }
}

#[test]
fn test_power_strike_ignores_defense() {
    let player = warrior();
    assert_eq!(player.stat(StatKind::Atk), 4);
    assert_eq!(player.stat(StatKind::Str), 8);

    let target = Monster::new(template(200, 5), Position::new(1, 0), false);
    assert_eq!(Skill::PowerStrike.base_damage(&player, &target), Some(24));

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let hit = Skill::PowerStrike.resolve(&player, &target, &mut rng);
        assert!(!hit.missed);
        assert_eq!(hit.damage, 24);
    }
}

#[test]
fn test_monsters_scale_with_player_level() {
    let battle = Battle::new(
        Monster::new(template(50, 2), Position::new(1, 0), false),
        EncounterSource::Ambush,
        6,
    );
    assert_eq!(battle.monster.stats.max_hp, 100);
    assert_eq!(battle.monster.hp, 100);

    let boss = Monster::new(template(50, 2), Position::new(1, 0), true);
    let boss_id = boss.id;
    let battle = Battle::new(boss, EncounterSource::Boss(boss_id), 6);
    assert_eq!(battle.monster.stats.max_hp, 50);
}

#[test]
fn test_chest_rolls() {
    let mut rng = StdRng::seed_from_u64(11);
    assert_eq!(open_chest_with_rolls(0.14, 0.9, 0.9, &mut rng), ChestContents::Ambush);
    assert_eq!(open_chest_with_rolls(0.15, 0.09, 0.9, &mut rng), ChestContents::Empty);

    let expected = [(0.05, 3), (0.09, 3), (0.10, 2), (0.24, 2), (0.25, 1), (0.99, 1)];
    for (count_roll, count) in expected {
        match open_chest_with_rolls(0.5, 0.5, count_roll, &mut rng) {
            ChestContents::Loot(items) => assert_eq!(items.len(), count, "count roll {}", count_roll),
            other => panic!("expected loot, got {:?}", other),
        }
    }
}

#[test]
fn test_chest_and_trap_fire_once() {
    let mut chest = Chest::new(Position::new(2, 2));
    assert!(chest.open());
    let snapshot = chest.clone();
    assert!(!chest.open());
    assert_eq!(chest, snapshot);

    let mut trap = Trap::new(Position::new(3, 3), TrapKind::Battle);
    assert_eq!(trap.trigger(), Some(TrapKind::Battle));
    let snapshot = trap.clone();
    assert_eq!(trap.trigger(), None);
    assert_eq!(trap, snapshot);
}
