//! Grid coordinates and reading order.
//!
//! Reading order (top-to-bottom, then left-to-right) is the single
//! tie-break used everywhere in the simulation: unit turn order,
//! destination choice, step choice and target choice.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing to the right.
    pub x: u32,
    /// Row, growing downwards.
    pub y: u32,
}

impl Position {
    /// Create a position from column and row.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours in the fixed order north, west, east, south.
    ///
    /// Neighbours that would leave the non-negative quadrant are skipped.
    /// Callers that need bounds checking against a grid do it themselves.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        let Position { x, y } = self;
        [
            y.checked_sub(1).map(|y| Position::new(x, y)),
            x.checked_sub(1).map(|x| Position::new(x, y)),
            x.checked_add(1).map(|x| Position::new(x, y)),
            y.checked_add(1).map(|y| Position::new(x, y)),
        ]
        .into_iter()
        .flatten()
    }

    /// Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True if `other` shares an edge with this position.
    #[must_use]
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_order_is_row_major() {
        let a = Position::new(5, 1);
        let b = Position::new(0, 2);
        let c = Position::new(6, 1);

        assert!(a < b, "earlier row wins regardless of column");
        assert!(a < c, "same row compares columns");

        let mut cells = vec![b, c, a];
        cells.sort();
        assert_eq!(cells, vec![a, c, b]);
    }

    #[test]
    fn test_neighbor_order() {
        let neighbors: Vec<_> = Position::new(3, 3).neighbors().collect();
        assert_eq!(
            neighbors,
            vec![
                Position::new(3, 2),
                Position::new(2, 3),
                Position::new(4, 3),
                Position::new(3, 4),
            ]
        );
    }

    #[test]
    fn test_neighbors_at_origin_skip_negative() {
        let neighbors: Vec<_> = Position::new(0, 0).neighbors().collect();
        assert_eq!(neighbors, vec![Position::new(1, 0), Position::new(0, 1)]);
    }

    #[test]
    fn test_adjacency_excludes_diagonals() {
        let origin = Position::new(2, 2);
        assert!(origin.is_adjacent(Position::new(2, 1)));
        assert!(origin.is_adjacent(Position::new(3, 2)));
        assert!(!origin.is_adjacent(Position::new(3, 3)));
        assert!(!origin.is_adjacent(origin));
    }
}
