//! # Map Display
//!
//! Plain-text drawing of a stage: terrain glyphs with monsters and players on top.

use crate::{Dungeon, Position};

/// Something drawn over the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub position: Position,
    pub glyph: char,
}

impl Marker {
    pub fn new(position: Position, glyph: char) -> Self {
        Self { position, glyph }
    }
}

/// Draws the stage as one line per row.
///
/// Hidden traps look like floor. Markers are drawn last, so players cover monsters.
///
/// # Examples
///
/// ```
/// use cryptcrawl::{render_map, GameConfig, Generator, Marker, RoomCorridorGenerator};
/// use cryptcrawl::generation::utils::create_rng;
///
/// let config = GameConfig::new(5);
/// let mut rng = create_rng(&config);
/// let dungeon = RoomCorridorGenerator::new(1).generate(&config, &mut rng).unwrap();
/// let map = render_map(&dungeon, &[Marker::new(dungeon.player_spawn, '@')]);
/// assert_eq!(map.lines().count(), config.height as usize);
/// assert_eq!(map.matches('@').count(), 1);
/// ```
pub fn render_map(dungeon: &Dungeon, markers: &[Marker]) -> String {
    let mut rows: Vec<Vec<char>> = dungeon
        .grid
        .rows()
        .map(|row| row.iter().map(|tile| tile.glyph()).collect())
        .collect();

    let monsters = dungeon
        .monsters
        .iter()
        .map(|m| Marker::new(m.position, m.icon()));
    for marker in monsters.chain(markers.iter().copied()) {
        if let Some(cell) = cell_mut(&mut rows, marker.position) {
            *cell = marker.glyph;
        }
    }

    let mut out = String::with_capacity(rows.len() * (dungeon.grid.width as usize + 1));
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out
}

fn cell_mut(rows: &mut [Vec<char>], pos: Position) -> Option<&mut char> {
    if pos.x < 0 || pos.y < 0 {
        return None;
    }
    rows.get_mut(pos.y as usize)?.get_mut(pos.x as usize)
}
