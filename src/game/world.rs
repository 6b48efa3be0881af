//! # World Representation
//!
//! The tile grid that decides navigability, and the [`Dungeon`] that bundles it with the
//! rooms, monsters, chests and traps of one stage.

use crate::{Chest, CrawlError, CrawlResult, EntityId, Monster, Position, Room, Trap};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Terrain symbol stored in each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    DamageTrap,
    BattleTrap,
    ClosedChest,
    Portal,
}

impl TileType {
    /// Whether an actor may stand on this tile.
    pub fn is_passable(self) -> bool {
        matches!(
            self,
            TileType::Floor | TileType::DamageTrap | TileType::BattleTrap | TileType::Portal
        )
    }

    /// Glyph used by the text snapshot. Traps stay hidden until they fire.
    pub fn glyph(self) -> char {
        match self {
            TileType::Wall => '#',
            TileType::Floor | TileType::DamageTrap | TileType::BattleTrap => '.',
            TileType::ClosedChest => '=',
            TileType::Portal => 'O',
        }
    }
}

/// Fixed-size 2D array of terrain; never resized after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Creates a grid filled with walls.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{Position, TileGrid, TileType};
    ///
    /// let grid = TileGrid::new(10, 8);
    /// assert_eq!(grid.get(Position::new(3, 3)), Some(TileType::Wall));
    /// assert_eq!(grid.get(Position::new(10, 0)), None);
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileType::Wall; (width * height) as usize],
        }
    }

    /// Checks whether a position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Gets the terrain at a position.
    pub fn get(&self, pos: Position) -> Option<TileType> {
        self.index(pos).map(|i| self.tiles[i])
    }

    /// Sets the terrain at a position.
    pub fn set(&mut self, pos: Position, tile: TileType) -> CrawlResult<()> {
        let index = self.index(pos).ok_or_else(|| {
            CrawlError::InvalidState(format!("Position {:?} is outside the grid", pos))
        })?;
        self.tiles[index] = tile;
        Ok(())
    }

    /// Whether the tile exists and is passable.
    pub fn is_passable(&self, pos: Position) -> bool {
        self.get(pos).map(TileType::is_passable).unwrap_or(false)
    }

    /// Whether the tile exists and is a wall. Out-of-bounds counts as wall.
    pub fn is_wall(&self, pos: Position) -> bool {
        self.get(pos).map(|t| t == TileType::Wall).unwrap_or(true)
    }

    /// Counts tiles of the given type.
    pub fn count(&self, tile: TileType) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// Iterates over all rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[TileType]> {
        self.tiles.chunks(self.width as usize)
    }

    /// Flood fill over passable tiles starting at `start`.
    pub fn reachable_from(&self, start: Position) -> HashSet<Position> {
        let mut visited = HashSet::new();
        if !self.is_passable(start) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(pos) = queue.pop_front() {
            for next in pos.cardinal_adjacent_positions() {
                if !visited.contains(&next) && self.is_passable(next) {
                    visited.insert(next);
                    queue.push_back(next);
                }
            }
        }

        visited
    }
}

/// One generated stage: terrain plus everything placed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dungeon {
    /// Stage number, 1-based
    pub stage: u32,
    pub grid: TileGrid,
    /// Boss room first, ordinary rooms after it in placement order
    pub rooms: Vec<Room>,
    /// Room indices in corridor order: boss, rooms by horizontal center, boss
    pub corridor_order: Vec<usize>,
    pub monsters: Vec<Monster>,
    pub chests: Vec<Chest>,
    pub traps: Vec<Trap>,
    pub player_spawn: Position,
    /// Set once the boss falls
    pub portal: Option<Position>,
}

impl Dungeon {
    /// The boss room is always index 0.
    pub fn boss_room(&self) -> Option<&Room> {
        self.rooms.first()
    }

    pub fn monster_at(&self, pos: Position) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.position == pos)
    }

    pub fn monster_index(&self, id: EntityId) -> Option<usize> {
        self.monsters.iter().position(|m| m.id == id)
    }

    /// Removes a defeated monster from the map.
    pub fn remove_monster(&mut self, id: EntityId) -> Option<Monster> {
        self.monster_index(id).map(|i| self.monsters.remove(i))
    }

    pub fn chest_at_mut(&mut self, pos: Position) -> Option<&mut Chest> {
        self.chests.iter_mut().find(|c| c.position == pos)
    }

    pub fn trap_at_mut(&mut self, pos: Position) -> Option<&mut Trap> {
        self.traps.iter_mut().find(|t| t.position == pos)
    }

    /// Whether a monster, chest or trap already sits on the position.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.monsters.iter().any(|m| m.position == pos)
            || self.chests.iter().any(|c| c.position == pos)
            || self.traps.iter().any(|t| t.position == pos)
    }

    /// Turns the boss position into a portal to the next stage.
    pub fn reveal_portal(&mut self, pos: Position) -> CrawlResult<()> {
        self.grid.set(pos, TileType::Portal)?;
        self.portal = Some(pos);
        Ok(())
    }

    /// Room indices whose center cannot be reached from the player spawn.
    ///
    /// Corridor chaining is expected to keep this empty; generation logs a warning and
    /// the integration tests assert on it.
    pub fn unreachable_rooms(&self) -> Vec<usize> {
        let reachable = self.grid.reachable_from(self.player_spawn);
        self.rooms
            .iter()
            .enumerate()
            .filter(|(_, room)| !reachable.contains(&room.center()))
            .map(|(i, _)| i)
            .collect()
    }
}
