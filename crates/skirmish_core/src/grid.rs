//! Fixed-size battlefield grid.
//!
//! The grid owns cell state only. Units live in the battlefield's arena
//! and occupied cells refer to them by [`UnitId`].

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::unit::{Unit, UnitId};

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Impassable terrain.
    Wall,
    /// Open floor with nobody on it.
    #[default]
    Empty,
    /// Open floor holding a living unit.
    Occupied(UnitId),
}

impl Tile {
    /// Returns the occupying unit, if any.
    #[must_use]
    pub const fn unit(self) -> Option<UnitId> {
        match self {
            Self::Occupied(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true if a unit could step onto this tile.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Rectangular grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell data stored in row-major (reading) order.
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create a grid with every cell empty.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; cell_count],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Row-major index of a position. The position must be in bounds.
    #[inline]
    pub(crate) fn index_of(&self, pos: Position) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Position of a row-major index.
    #[inline]
    pub(crate) fn position_of(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as u32, (index / width) as u32)
    }

    /// Check if a position is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Tile at `pos`. Out-of-bounds positions are reported as walls.
    #[must_use]
    pub fn tile_at(&self, pos: Position) -> Tile {
        if self.in_bounds(pos) {
            self.tiles[self.index_of(pos)]
        } else {
            Tile::Wall
        }
    }

    /// Set the tile at `pos`.
    /// Returns `false` if out of bounds.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> bool {
        if self.in_bounds(pos) {
            let index = self.index_of(pos);
            self.tiles[index] = tile;
            true
        } else {
            false
        }
    }

    /// True if `pos` is in bounds, not a wall and not occupied.
    #[must_use]
    pub fn is_open(&self, pos: Position) -> bool {
        self.tile_at(pos).is_empty()
    }

    /// In-bounds orthogonal neighbours of `pos` in north, west, east, south order.
    pub fn adjacent_cells(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        pos.neighbors().filter(move |p| self.in_bounds(*p))
    }

    /// Move `unit` to `to`, keeping cell occupancy in sync.
    ///
    /// # Panics
    ///
    /// Panics if `to` is not an empty cell, or if the unit's current cell
    /// is not occupied by it. Either means the round engine is broken.
    pub fn move_unit(&mut self, unit: &mut Unit, to: Position) {
        assert!(
            self.is_open(to),
            "Can't move unit {} from {} to blocked cell {}",
            unit.id,
            unit.position,
            to
        );
        assert_eq!(
            self.tile_at(unit.position),
            Tile::Occupied(unit.id),
            "Unit {} is not on its recorded cell {}",
            unit.id,
            unit.position
        );

        self.set_tile(unit.position, Tile::Empty);
        self.set_tile(to, Tile::Occupied(unit.id));
        unit.position = to;
    }

    /// Clear the cell held by `unit`.
    ///
    /// # Panics
    ///
    /// Panics if the unit's recorded cell does not hold it.
    pub fn remove_unit(&mut self, unit: &Unit) {
        assert_eq!(
            self.tile_at(unit.position),
            Tile::Occupied(unit.id),
            "Unit {} is not on its recorded cell {}",
            unit.id,
            unit.position
        );
        self.set_tile(unit.position, Tile::Empty);
    }

    /// Iterate over all positions and tiles in reading order.
    pub fn tiles(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (self.position_of(index), *tile))
    }
}
