//! # Generation Module
//!
//! Procedural content generation for dungeon stages.
//!
//! This module provides the stage profiles and configuration that drive generation, the
//! room geometry shared by layout and spawning, and the [`Generator`] trait implemented by
//! the room-and-corridor generator.

pub mod drops;
pub mod dungeon;
pub mod encounters;

pub use drops::*;
pub use dungeon::*;
pub use encounters::*;

use crate::config::{
    ANIMATION_BLINKS, DEFAULT_DUNGEON_HEIGHT, DEFAULT_DUNGEON_WIDTH, MIN_DUNGEON_HEIGHT,
    MIN_DUNGEON_WIDTH, STAGE_COUNT,
};
use crate::{CrawlError, CrawlResult, Position};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Budget for one stage: room count and sizes, L-shape odds and spawn quotas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    /// Stage number, 1-based
    pub stage: u32,
    /// Ordinary rooms to attempt (the boss room comes on top)
    pub room_count: u32,
    /// Smallest room side, walls included
    pub min_room_size: u32,
    /// Largest room side, walls included
    pub max_room_size: u32,
    /// Probability that a room is generated as an L-shape
    pub l_shape_chance: f64,
    pub damage_traps: u32,
    pub battle_traps: u32,
    pub monsters: u32,
    pub chests: u32,
}

impl StageProfile {
    /// Built-in profile for a stage. Stages past the last reuse the last profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::StageProfile;
    ///
    /// let first = StageProfile::for_stage(1);
    /// let last = StageProfile::for_stage(3);
    /// assert!(last.room_count > first.room_count);
    /// assert!(last.l_shape_chance > first.l_shape_chance);
    /// ```
    pub fn for_stage(stage: u32) -> Self {
        match stage {
            0 | 1 => Self {
                stage: 1,
                room_count: 7,
                min_room_size: 6,
                max_room_size: 10,
                l_shape_chance: 0.10,
                damage_traps: 3,
                battle_traps: 2,
                monsters: 6,
                chests: 3,
            },
            2 => Self {
                stage: 2,
                room_count: 9,
                min_room_size: 6,
                max_room_size: 11,
                l_shape_chance: 0.25,
                damage_traps: 4,
                battle_traps: 3,
                monsters: 9,
                chests: 4,
            },
            _ => Self {
                stage: 3,
                room_count: 11,
                min_room_size: 7,
                max_room_size: 12,
                l_shape_chance: 0.40,
                damage_traps: 5,
                battle_traps: 4,
                monsters: 12,
                chests: 5,
            },
        }
    }

    fn validate(&self) -> CrawlResult<()> {
        if self.min_room_size < 4 {
            return Err(CrawlError::Config(format!(
                "Stage {}: min_room_size must be at least 4",
                self.stage
            )));
        }
        if self.max_room_size < self.min_room_size {
            return Err(CrawlError::Config(format!(
                "Stage {}: max_room_size is smaller than min_room_size",
                self.stage
            )));
        }
        if !(0.0..=1.0).contains(&self.l_shape_chance) {
            return Err(CrawlError::Config(format!(
                "Stage {}: l_shape_chance must be within 0.0..=1.0",
                self.stage
            )));
        }
        if self.room_count == 0 {
            return Err(CrawlError::Config(format!(
                "Stage {}: room_count must be positive",
                self.stage
            )));
        }
        Ok(())
    }
}

/// Run configuration: seed, map size, stage profiles and animation length.
///
/// Loaded from JSON with every field optional; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Random seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
    /// One profile per stage, in order
    pub stages: Vec<StageProfile>,
    /// Ticks each battle animation blinks
    pub animation_blinks: u32,
}

impl GameConfig {
    /// Default configuration with a fixed seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::GameConfig;
    ///
    /// let config = GameConfig::new(12345);
    /// assert_eq!(config.seed, Some(12345));
    /// assert_eq!(config.stages.len(), 3);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Overrides the map size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> CrawlResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded game config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> CrawlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks map dimensions and every stage profile.
    pub fn validate(&self) -> CrawlResult<()> {
        if self.width < MIN_DUNGEON_WIDTH || self.height < MIN_DUNGEON_HEIGHT {
            return Err(CrawlError::Config(format!(
                "Map must be at least {}x{}, got {}x{}",
                MIN_DUNGEON_WIDTH, MIN_DUNGEON_HEIGHT, self.width, self.height
            )));
        }
        if self.stages.len() != STAGE_COUNT as usize {
            return Err(CrawlError::Config(format!(
                "Expected {} stage profiles, got {}",
                STAGE_COUNT,
                self.stages.len()
            )));
        }
        for profile in &self.stages {
            profile.validate()?;
            if profile.max_room_size + 4 > self.height || profile.max_room_size + 4 > self.width {
                return Err(CrawlError::Config(format!(
                    "Stage {}: rooms of size {} do not fit a {}x{} map",
                    profile.stage, profile.max_room_size, self.width, self.height
                )));
            }
        }
        Ok(())
    }

    /// The profile for a 1-based stage number.
    pub fn profile(&self, stage: u32) -> StageProfile {
        self.stages
            .get(stage.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_else(|| StageProfile::for_stage(stage))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            width: DEFAULT_DUNGEON_WIDTH,
            height: DEFAULT_DUNGEON_HEIGHT,
            stages: (1..=STAGE_COUNT).map(StageProfile::for_stage).collect(),
            animation_blinks: ANIMATION_BLINKS,
        }
    }
}

/// Axis-aligned rectangle of tiles, walls included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub top_left: Position,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(top_left: Position, width: u32, height: u32) -> Self {
        Self {
            top_left,
            width,
            height,
        }
    }

    pub fn left(&self) -> i32 {
        self.top_left.x
    }

    pub fn top(&self) -> i32 {
        self.top_left.y
    }

    /// Last column, inclusive.
    pub fn right(&self) -> i32 {
        self.top_left.x + self.width as i32 - 1
    }

    /// Last row, inclusive.
    pub fn bottom(&self) -> i32 {
        self.top_left.y + self.height as i32 - 1
    }

    pub fn center(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 / 2,
            self.top_left.y + self.height as i32 / 2,
        )
    }

    /// Inclusive-boundary overlap test: rectangles sharing even a wall tile intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.left() && pos.x <= self.right() && pos.y >= self.top() && pos.y <= self.bottom()
    }

    /// Interior tiles, walls excluded.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in (self.top() + 1)..self.bottom() {
            for x in (self.left() + 1)..self.right() {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Interior width and height.
    pub fn interior_size(&self) -> (u32, u32) {
        (self.width.saturating_sub(2), self.height.saturating_sub(2))
    }

    /// The four interior corner tiles.
    pub fn interior_corners(&self) -> [Position; 4] {
        [
            Position::new(self.left() + 1, self.top() + 1),
            Position::new(self.right() - 1, self.top() + 1),
            Position::new(self.left() + 1, self.bottom() - 1),
            Position::new(self.right() - 1, self.bottom() - 1),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    Normal,
    /// Two rectangles joined by an internal corridor
    LShape,
    /// Fixed room on the right edge holding the stage boss
    Boss,
}

/// A room in the dungeon: one rectangle, or two for an L-shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub bounds: Rect,
    /// Second rectangle of an L-shaped room
    pub wing: Option<Rect>,
    pub room_type: RoomType,
}

impl Room {
    /// Creates a single-rectangle room.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{Position, Room, RoomType};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Normal);
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// assert!(room.contains(Position::new(7, 7)));
    /// assert!(!room.contains(Position::new(20, 20)));
    /// ```
    pub fn new(id: u32, top_left: Position, width: u32, height: u32, room_type: RoomType) -> Self {
        Self {
            id,
            bounds: Rect::new(top_left, width, height),
            wing: None,
            room_type,
        }
    }

    /// Creates an L-shaped room from its main rectangle and wing.
    pub fn l_shape(id: u32, bounds: Rect, wing: Rect) -> Self {
        Self {
            id,
            bounds,
            wing: Some(wing),
            room_type: RoomType::LShape,
        }
    }

    /// Both rectangles of the room.
    pub fn parts(&self) -> impl Iterator<Item = &Rect> {
        std::iter::once(&self.bounds).chain(self.wing.iter())
    }

    /// Center of the main rectangle; corridors attach here.
    pub fn center(&self) -> Position {
        self.bounds.center()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.parts().any(|r| r.contains(pos))
    }

    pub fn intersects(&self, other: &Room) -> bool {
        self.parts()
            .any(|a| other.parts().any(|b| a.intersects(b)))
    }

    /// Interior tiles of every part, without duplicates.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut positions = self.bounds.floor_positions();
        if let Some(wing) = &self.wing {
            for pos in wing.floor_positions() {
                if !positions.contains(&pos) {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    pub fn is_boss(&self) -> bool {
        self.room_type == RoomType::Boss
    }
}

/// Trait for procedural generators.
///
/// All generation systems implement this trait, giving a consistent interface for
/// producing and checking content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GameConfig, rng: &mut StdRng) -> CrawlResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GameConfig) -> CrawlResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates the run RNG: seeded from the config, or from entropy when no seed is set.
    pub fn create_rng(config: &GameConfig) -> StdRng {
        match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
