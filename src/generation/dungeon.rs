//! # Dungeon Generation
//!
//! Room-and-corridor layout generation.
//!
//! The generator builds one stage by:
//! 1. Placing the boss room at a fixed spot on the right edge
//! 2. Placing ordinary and L-shaped rooms by bounded random sampling
//! 3. Carving pillar and wall-segment obstacles inside large rooms
//! 4. Chaining room centers with 3-wide L-shaped corridors
//! 5. Populating the stage through the encounter tables

use crate::generation::encounters::populate;
use crate::{
    CrawlError, CrawlResult, Dungeon, GameConfig, Generator, Position, Rect, Room,
    RoomType, StageProfile, TileGrid, TileType,
};
use rand::{rngs::StdRng, Rng};

/// Primary dungeon generator using the room-and-corridor algorithm.
#[derive(Debug, Clone)]
pub struct RoomCorridorGenerator {
    /// Stage whose profile drives generation, 1-based
    pub stage: u32,
    /// Maximum attempts to place a room before skipping it
    pub max_placement_attempts: u32,
    /// Maximum attempts to place a single obstacle
    pub max_obstacle_attempts: u32,
    /// Corridor width in tiles
    pub corridor_width: u32,
    /// Whether to log rooms that end up unreachable from the spawn
    pub ensure_connectivity: bool,
}

impl RoomCorridorGenerator {
    /// Creates a generator for the given stage with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::{GameConfig, Generator, RoomCorridorGenerator};
    /// use cryptcrawl::generation::utils::create_rng;
    ///
    /// let config = GameConfig::new(7);
    /// let mut rng = create_rng(&config);
    /// let dungeon = RoomCorridorGenerator::new(1).generate(&config, &mut rng).unwrap();
    /// assert!(dungeon.boss_room().unwrap().is_boss());
    /// assert!(dungeon.grid.is_passable(dungeon.player_spawn));
    /// ```
    pub fn new(stage: u32) -> Self {
        Self {
            stage: stage.max(1),
            max_placement_attempts: 100,
            max_obstacle_attempts: 20,
            corridor_width: 3,
            ensure_connectivity: true,
        }
    }

    /// The fixed boss room: right side, vertically centered, bounded size.
    pub fn boss_room(width: u32, height: u32) -> Room {
        let room_width = 14.min(width / 5);
        let room_height = 10.min(height / 3);
        let x = width as i32 - room_width as i32 - 2;
        let y = (height as i32 - room_height as i32) / 2;
        Room::new(0, Position::new(x, y), room_width, room_height, RoomType::Boss)
    }

    /// Places every ordinary room, skipping any that cannot be placed.
    fn place_rooms(
        &self,
        grid: &TileGrid,
        profile: &StageProfile,
        rooms: &mut Vec<Room>,
        rng: &mut StdRng,
    ) {
        for id in 1..=profile.room_count {
            match self.try_place_room(grid, profile, rng, id, rooms) {
                Some(room) => rooms.push(room),
                None => log::debug!(
                    "Stage {}: skipped room {} after {} attempts",
                    profile.stage,
                    id,
                    self.max_placement_attempts
                ),
            }
        }
    }

    /// Attempts to place a single room.
    fn try_place_room(
        &self,
        grid: &TileGrid,
        profile: &StageProfile,
        rng: &mut StdRng,
        room_id: u32,
        existing_rooms: &[Room],
    ) -> Option<Room> {
        for _ in 0..self.max_placement_attempts {
            let room = self.generate_room_candidate(grid, profile, rng, room_id);

            if !room.parts().all(|part| Self::rect_fits(grid, part)) {
                continue;
            }

            if existing_rooms.iter().any(|existing| room.intersects(existing)) {
                continue;
            }

            return Some(room);
        }
        None
    }

    /// Generates a candidate room, L-shaped with the stage probability.
    fn generate_room_candidate(
        &self,
        grid: &TileGrid,
        profile: &StageProfile,
        rng: &mut StdRng,
        room_id: u32,
    ) -> Room {
        let sizes = profile.min_room_size..=profile.max_room_size;
        let width = rng.gen_range(sizes.clone());
        let height = rng.gen_range(sizes.clone());
        let max_x = (grid.width as i32 - 1 - width as i32).max(1);
        let max_y = (grid.height as i32 - 1 - height as i32).max(1);
        let x = rng.gen_range(1..=max_x);
        let y = rng.gen_range(1..=max_y);
        let bounds = Rect::new(Position::new(x, y), width, height);

        if !rng.gen_bool(profile.l_shape_chance) {
            return Room {
                id: room_id,
                bounds,
                wing: None,
                room_type: RoomType::Normal,
            };
        }

        // The wing overlaps the main rectangle by two tiles along one edge.
        let wing = if rng.gen_bool(0.5) {
            let wing_width = rng.gen_range(sizes.clone());
            let wing_height = rng.gen_range(sizes).min(height);
            Rect::new(
                Position::new(x + width as i32 - 2, y + height as i32 - wing_height as i32),
                wing_width,
                wing_height,
            )
        } else {
            let wing_width = rng.gen_range(sizes.clone()).min(width);
            let wing_height = rng.gen_range(sizes);
            Rect::new(
                Position::new(x, y + height as i32 - 2),
                wing_width,
                wing_height,
            )
        };
        Room::l_shape(room_id, bounds, wing)
    }

    /// Checks that a rectangle keeps the outer border intact.
    fn rect_fits(grid: &TileGrid, rect: &Rect) -> bool {
        rect.left() >= 1
            && rect.top() >= 1
            && rect.right() <= grid.width as i32 - 2
            && rect.bottom() <= grid.height as i32 - 2
    }

    /// Carves a room's interiors, plus the internal corridor of an L-shape.
    fn carve_room(&self, grid: &mut TileGrid, room: &Room) -> CrawlResult<()> {
        for pos in room.floor_positions() {
            grid.set(pos, TileType::Floor)?;
        }
        if let Some(wing) = &room.wing {
            carve_l_tunnel(grid, room.bounds.center(), wing.center(), 1)?;
        }
        Ok(())
    }

    /// Adds pillars and short wall segments to rooms with at least 7x7 interior.
    ///
    /// One obstacle per 50 interior tiles, at least one. Every obstacle tile keeps all eight neighbours
    /// as floor and stays two tiles away from the walls, so rooms never split.
    fn add_obstacles(&self, grid: &mut TileGrid, rooms: &[Room], rng: &mut StdRng) -> CrawlResult<()> {
        for room in rooms.iter().filter(|r| !r.is_boss()) {
            let (inner_width, inner_height) = room.bounds.interior_size();
            if inner_width < 7 || inner_height < 7 {
                continue;
            }
            let count = ((inner_width * inner_height) / 50).max(1);
            for _ in 0..count {
                self.place_obstacle(grid, room, rng)?;
            }
        }
        Ok(())
    }

    fn place_obstacle(&self, grid: &mut TileGrid, room: &Room, rng: &mut StdRng) -> CrawlResult<bool> {
        let bounds = room.bounds;
        let (min_x, max_x) = (bounds.left() + 3, bounds.right() - 3);
        let (min_y, max_y) = (bounds.top() + 3, bounds.bottom() - 3);
        if min_x > max_x || min_y > max_y {
            return Ok(false);
        }

        for _ in 0..self.max_obstacle_attempts {
            let start = Position::new(rng.gen_range(min_x..=max_x), rng.gen_range(min_y..=max_y));
            let length = if rng.gen_bool(0.5) { 1 } else { rng.gen_range(2..=4) };
            let step = if rng.gen_bool(0.5) {
                Position::new(1, 0)
            } else {
                Position::new(0, 1)
            };

            let tiles: Vec<Position> = (0..length)
                .map(|i| Position::new(start.x + step.x * i, start.y + step.y * i))
                .collect();

            let fits = tiles.iter().all(|&pos| {
                pos.x <= max_x
                    && pos.y <= max_y
                    && pos != room.center()
                    && grid.get(pos) == Some(TileType::Floor)
                    && pos
                        .adjacent_positions()
                        .iter()
                        .all(|&n| grid.get(n) == Some(TileType::Floor))
            });
            if !fits {
                continue;
            }

            for pos in tiles {
                grid.set(pos, TileType::Wall)?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Corridor order: boss room, ordinary rooms by horizontal center, boss room again.
    pub fn corridor_order(rooms: &[Room]) -> Vec<usize> {
        let mut ordinary: Vec<usize> = (0..rooms.len()).filter(|&i| !rooms[i].is_boss()).collect();
        ordinary.sort_by_key(|&i| (rooms[i].center().x, rooms[i].center().y));

        let mut order = Vec::with_capacity(ordinary.len() + 2);
        order.push(0);
        order.extend(ordinary);
        if order.len() > 1 {
            order.push(0);
        }
        order
    }

    fn connect_rooms(&self, grid: &mut TileGrid, rooms: &[Room], order: &[usize]) -> CrawlResult<()> {
        for pair in order.windows(2) {
            let from = rooms[pair[0]].center();
            let to = rooms[pair[1]].center();
            carve_l_tunnel(grid, from, to, self.corridor_width)?;
        }
        Ok(())
    }

    /// Spawn at the center of the leftmost ordinary room, or inside the boss room's
    /// left edge when no other room was placed.
    fn choose_spawn(rooms: &[Room], order: &[usize]) -> Position {
        match order.get(1).filter(|&&i| i != 0) {
            Some(&index) => rooms[index].center(),
            None => {
                let boss = &rooms[0].bounds;
                Position::new(boss.left() + 1, boss.center().y)
            }
        }
    }

    /// Builds the terrain and room list for a stage without spawning anything.
    pub fn build_layout(&self, config: &GameConfig, rng: &mut StdRng) -> CrawlResult<Dungeon> {
        let profile = config.profile(self.stage);
        let mut grid = TileGrid::new(config.width, config.height);

        let mut rooms = vec![Self::boss_room(config.width, config.height)];
        self.place_rooms(&grid, &profile, &mut rooms, rng);
        for room in &rooms {
            self.carve_room(&mut grid, room)?;
        }

        self.add_obstacles(&mut grid, &rooms, rng)?;

        let corridor_order = Self::corridor_order(&rooms);
        self.connect_rooms(&mut grid, &rooms, &corridor_order)?;
        let player_spawn = Self::choose_spawn(&rooms, &corridor_order);

        Ok(Dungeon {
            stage: profile.stage,
            grid,
            rooms,
            corridor_order,
            monsters: Vec::new(),
            chests: Vec::new(),
            traps: Vec::new(),
            player_spawn,
            portal: None,
        })
    }
}

/// Carves a horizontal-then-vertical tunnel between two points.
///
/// Each segment is `width` tiles wide around its axis; the outer border is never carved.
pub fn carve_l_tunnel(grid: &mut TileGrid, from: Position, to: Position, width: u32) -> CrawlResult<()> {
    let half = (width.max(1) / 2) as i32;
    let offsets = -half..=(width.max(1) as i32 - 1 - half);

    let carve = |grid: &mut TileGrid, pos: Position| -> CrawlResult<()> {
        let inside = pos.x >= 1
            && pos.y >= 1
            && pos.x <= grid.width as i32 - 2
            && pos.y <= grid.height as i32 - 2;
        if inside {
            grid.set(pos, TileType::Floor)?;
        }
        Ok(())
    };

    for x in from.x.min(to.x)..=from.x.max(to.x) {
        for offset in offsets.clone() {
            carve(grid, Position::new(x, from.y + offset))?;
        }
    }
    for y in from.y.min(to.y)..=from.y.max(to.y) {
        for offset in offsets.clone() {
            carve(grid, Position::new(to.x + offset, y))?;
        }
    }
    Ok(())
}

impl Generator<Dungeon> for RoomCorridorGenerator {
    fn generate(&self, config: &GameConfig, rng: &mut StdRng) -> CrawlResult<Dungeon> {
        config.validate()?;
        let profile = config.profile(self.stage);

        let mut dungeon = self.build_layout(config, rng)?;
        populate(&mut dungeon, &profile, rng)?;

        if self.ensure_connectivity {
            let unreachable = dungeon.unreachable_rooms();
            if !unreachable.is_empty() {
                log::warn!(
                    "Stage {}: rooms {:?} are not reachable from the spawn",
                    profile.stage,
                    unreachable
                );
            }
        }

        log::info!(
            "{} built stage {}: {} rooms, {} monsters, {} chests, {} traps",
            self.generator_type(),
            dungeon.stage,
            dungeon.rooms.len(),
            dungeon.monsters.len(),
            dungeon.chests.len(),
            dungeon.traps.len()
        );
        Ok(dungeon)
    }

    fn validate(&self, dungeon: &Dungeon, config: &GameConfig) -> CrawlResult<()> {
        if dungeon.grid.width != config.width || dungeon.grid.height != config.height {
            return Err(CrawlError::GenerationFailed(
                "Grid dimensions do not match the configuration".to_string(),
            ));
        }
        if !dungeon.boss_room().map(Room::is_boss).unwrap_or(false) {
            return Err(CrawlError::GenerationFailed(
                "Boss room is missing".to_string(),
            ));
        }
        if !dungeon.grid.is_passable(dungeon.player_spawn) {
            return Err(CrawlError::GenerationFailed(format!(
                "Player spawn {:?} is not walkable",
                dungeon.player_spawn
            )));
        }
        let unreachable = dungeon.unreachable_rooms();
        if !unreachable.is_empty() {
            return Err(CrawlError::GenerationFailed(format!(
                "Rooms {:?} are not connected to the spawn",
                unreachable
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}
