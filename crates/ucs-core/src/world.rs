#![forbid(unsafe_code)]

//! Spatial queries consumed by the walk and movement systems.
//!
//! [`World`] is the narrow surface the simulation needs from a level. The
//! in-memory [`GridWorld`] implements it for headless runs and tests; loading
//! a level from a map file is left to the caller.

use smallvec::SmallVec;

use crate::actor::ActorId;
use crate::error::{Result, SimError};
use crate::geometry::{Position, Tile};

/// Level geometry and occupancy.
pub trait World {
    /// Tile containing the pixel `p`.
    fn pixels_to_tile(&self, p: Position) -> Tile;

    /// Top-left pixel of `tile`.
    fn tile_to_pixels(&self, tile: Tile) -> Position;

    /// In bounds, not an obstacle and not occupied.
    fn is_walkable(&self, tile: Tile) -> bool;

    /// Occupants of the four tiles adjacent to `tile`.
    fn nearest_occupants(&self, tile: Tile) -> SmallVec<[ActorId; 4]>;
}

/// A rectangular tile grid held in memory.
#[derive(Debug, Clone)]
pub struct GridWorld {
    origin: Position,
    columns: i32,
    rows: i32,
    tile_width: i32,
    tile_height: i32,
    walkable: Vec<bool>,
    occupants: Vec<Option<ActorId>>,
    entry: Position,
}

impl GridWorld {
    /// An all-floor grid. The entry point is the top-left tile.
    ///
    /// # Errors
    ///
    /// [`SimError::Setup`] for a non-positive size.
    pub fn new(columns: i32, rows: i32, tile_width: i32, tile_height: i32) -> Result<Self> {
        if columns <= 0 || rows <= 0 || tile_width <= 0 || tile_height <= 0 {
            return Err(SimError::setup(format!(
                "invalid grid {columns}x{rows} with {tile_width}x{tile_height} tiles"
            )));
        }
        let cells = (columns * rows) as usize;
        Ok(Self {
            origin: Position::default(),
            columns,
            rows,
            tile_width,
            tile_height,
            walkable: vec![true; cells],
            occupants: vec![None; cells],
            entry: Position::default(),
        })
    }

    /// Build a grid from rows of text: `#` is an obstacle, `@` the entry
    /// point, anything else floor.
    ///
    /// # Errors
    ///
    /// [`SimError::Setup`] if the rows are empty or ragged, or no `@` is
    /// present.
    pub fn from_ascii(rows: &[&str], tile_width: i32, tile_height: i32) -> Result<Self> {
        let columns = rows.first().map_or(0, |r| r.chars().count()) as i32;
        if rows.iter().any(|r| r.chars().count() as i32 != columns) {
            return Err(SimError::setup("grid rows have different lengths"));
        }
        let mut grid = Self::new(columns, rows.len() as i32, tile_width, tile_height)?;
        let mut entry = None;
        for (row, line) in rows.iter().enumerate() {
            for (col, cell) in line.chars().enumerate() {
                let tile = Tile::new(col as i32, row as i32);
                match cell {
                    '#' => grid.set_obstacle(tile, true),
                    '@' => entry = Some(tile),
                    _ => {}
                }
            }
        }
        let entry = entry.ok_or_else(|| SimError::setup("no entry point defined for grid"))?;
        grid.entry = grid.tile_to_pixels(entry);
        Ok(grid)
    }

    /// Place the entry point on `tile` (snapped to its top-left pixel).
    #[must_use]
    pub fn with_entry(mut self, tile: Tile) -> Self {
        self.entry = self.tile_to_pixels(tile);
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn entry(&self) -> Position {
        self.entry
    }

    #[must_use]
    pub fn size(&self) -> (i32, i32) {
        (self.columns, self.rows)
    }

    #[must_use]
    pub fn tile_size(&self) -> (i32, i32) {
        (self.tile_width, self.tile_height)
    }

    #[must_use]
    pub fn in_bounds(&self, tile: Tile) -> bool {
        (0..self.columns).contains(&tile.col) && (0..self.rows).contains(&tile.row)
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        self.in_bounds(tile)
            .then(|| (tile.row * self.columns + tile.col) as usize)
    }

    pub fn set_obstacle(&mut self, tile: Tile, obstacle: bool) {
        if let Some(i) = self.index(tile) {
            self.walkable[i] = !obstacle;
        }
    }

    /// Record (or clear) the occupant of `tile`. Out of bounds is ignored.
    pub fn set_occupant(&mut self, tile: Tile, occupant: Option<ActorId>) {
        if let Some(i) = self.index(tile) {
            self.occupants[i] = occupant;
        }
    }

    #[must_use]
    pub fn occupant(&self, tile: Tile) -> Option<ActorId> {
        self.index(tile).and_then(|i| self.occupants[i])
    }
}

impl World for GridWorld {
    fn pixels_to_tile(&self, p: Position) -> Tile {
        Tile::new(
            (p.x - self.origin.x).div_euclid(self.tile_width),
            (p.y - self.origin.y).div_euclid(self.tile_height),
        )
    }

    fn tile_to_pixels(&self, tile: Tile) -> Position {
        Position::new(
            tile.col * self.tile_width + self.origin.x,
            tile.row * self.tile_height + self.origin.y,
        )
    }

    fn is_walkable(&self, tile: Tile) -> bool {
        self.index(tile)
            .is_some_and(|i| self.walkable[i] && self.occupants[i].is_none())
    }

    fn nearest_occupants(&self, tile: Tile) -> SmallVec<[ActorId; 4]> {
        tile.neighbours()
            .into_iter()
            .filter_map(|t| self.occupant(t))
            .collect()
    }
}
