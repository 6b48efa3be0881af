//! # Monster AI
//!
//! One step per explored turn. Monsters near a player chase it greedily; the rest wander.
//! Bosses hold their room.

use crate::config::AGGRO_RANGE_SQUARED;
use crate::{Direction, Dungeon, EntityId, Position, TileType};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

/// Chance that an idle monster takes a random step.
pub const WANDER_CHANCE: f64 = 0.4;

/// A monster walked into a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encounter {
    pub monster: EntityId,
    /// Position of the player that was reached
    pub target: Position,
}

/// What a single monster decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Stay,
    Step(Position),
}

/// Moves every non-boss monster once.
///
/// `players` holds the positions of the living players. A monster whose step lands on a
/// player stays put and reports an [`Encounter`] instead.
pub fn move_monsters(dungeon: &mut Dungeon, players: &[Position], rng: &mut StdRng) -> Vec<Encounter> {
    let mut encounters = Vec::new();

    for index in 0..dungeon.monsters.len() {
        if dungeon.monsters[index].is_boss {
            continue;
        }
        let from = dungeon.monsters[index].position;
        let intent = match nearest_in_range(from, players) {
            Some(target) => chase(dungeon, from, target),
            None => wander(dungeon, from, rng),
        };

        if let Intent::Step(to) = intent {
            if players.contains(&to) {
                encounters.push(Encounter {
                    monster: dungeon.monsters[index].id,
                    target: to,
                });
            } else {
                dungeon.monsters[index].position = to;
            }
        }
    }

    encounters
}

fn nearest_in_range(from: Position, players: &[Position]) -> Option<Position> {
    players
        .iter()
        .copied()
        .filter(|&p| from.distance_squared(p) <= AGGRO_RANGE_SQUARED)
        .min_by_key(|&p| from.distance_squared(p))
}

/// Greedy step along the larger axis first, then the other axis.
fn chase(dungeon: &Dungeon, from: Position, target: Position) -> Intent {
    let dx = (target.x - from.x).signum();
    let dy = (target.y - from.y).signum();
    let horizontal = Position::new(from.x + dx, from.y);
    let vertical = Position::new(from.x, from.y + dy);

    let candidates = if (target.x - from.x).abs() >= (target.y - from.y).abs() {
        [(dx, horizontal), (dy, vertical)]
    } else {
        [(dy, vertical), (dx, horizontal)]
    };

    candidates
        .iter()
        .filter(|(delta, _)| *delta != 0)
        .map(|&(_, pos)| pos)
        .find(|&pos| pos == target || can_enter(dungeon, pos))
        .map(Intent::Step)
        .unwrap_or(Intent::Stay)
}

fn wander(dungeon: &Dungeon, from: Position, rng: &mut StdRng) -> Intent {
    if !rng.gen_bool(WANDER_CHANCE) {
        return Intent::Stay;
    }
    let Some(direction) = Direction::all().choose(rng).copied() else {
        return Intent::Stay;
    };
    let to = from.step(direction);
    if can_enter(dungeon, to) {
        Intent::Step(to)
    } else {
        Intent::Stay
    }
}

/// Plain floor, outside the boss room, with no other monster on it.
fn can_enter(dungeon: &Dungeon, pos: Position) -> bool {
    dungeon.grid.get(pos) == Some(TileType::Floor)
        && dungeon.monster_at(pos).is_none()
        && !dungeon.boss_room().map(|r| r.contains(pos)).unwrap_or(false)
}
