//! Breadth-first pathfinding over the battlefield grid.
//!
//! Every step costs one, so BFS yields exact shortest distances. Movement is
//! orthogonal only, and routes pass through open cells (no walls, no units).
//! When several cells are equally good the one first in reading order wins.
//! No other tie-break or weighting exists.

use std::collections::VecDeque;

use crate::battlefield::Battlefield;
use crate::grid::Grid;
use crate::position::Position;
use crate::unit::UnitId;

/// Shortest distances from one origin to every reachable cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMap {
    width: u32,
    height: u32,
    distances: Vec<Option<u32>>,
}

impl DistanceMap {
    /// Distance from the origin to `pos`, or `None` if unreachable.
    #[must_use]
    pub fn distance(&self, pos: Position) -> Option<u32> {
        if pos.x < self.width && pos.y < self.height {
            self.distances[(pos.y as usize) * (self.width as usize) + (pos.x as usize)]
        } else {
            None
        }
    }

    /// Number of cells reached, the origin included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_some()).count()
    }
}

/// Run BFS from `origin` across open cells.
///
/// The origin itself is always at distance zero, even though it is usually
/// occupied by the unit doing the search.
#[must_use]
pub fn distance_map(grid: &Grid, origin: Position) -> DistanceMap {
    let mut distances = vec![None; grid.cell_count()];
    let mut queue = VecDeque::new();

    if grid.in_bounds(origin) {
        distances[grid.index_of(origin)] = Some(0);
        queue.push_back((origin, 0u32));
    }

    while let Some((current, distance)) = queue.pop_front() {
        for next in grid.adjacent_cells(current) {
            let index = grid.index_of(next);
            if distances[index].is_none() && grid.is_open(next) {
                distances[index] = Some(distance + 1);
                queue.push_back((next, distance + 1));
            }
        }
    }

    DistanceMap {
        width: grid.width(),
        height: grid.height(),
        distances,
    }
}

/// Cells from which the unit `id` could attack an enemy.
///
/// A cell counts when it touches a living enemy and is either empty or the
/// unit's own cell. The result is deduplicated and sorted in reading order.
#[must_use]
pub fn in_range_cells(field: &Battlefield, id: UnitId) -> Vec<Position> {
    let own = field.unit(id).position;
    let grid = field.grid();

    let mut cells: Vec<Position> = field
        .living_enemies_of(id)
        .flat_map(|enemy| grid.adjacent_cells(enemy.position))
        .filter(|&cell| cell == own || grid.is_open(cell))
        .collect();
    cells.sort();
    cells.dedup();
    cells
}

/// Pick the closest reachable cell among `candidates`.
///
/// Ties on distance go to the candidate first in reading order. Returns the
/// chosen cell with its distance, or `None` if none is reachable.
#[must_use]
pub fn choose_destination(
    grid: &Grid,
    origin: Position,
    candidates: &[Position],
) -> Option<(Position, u32)> {
    let distances = distance_map(grid, origin);
    candidates
        .iter()
        .filter_map(|&cell| distances.distance(cell).map(|d| (d, cell)))
        .min()
        .map(|(d, cell)| (cell, d))
}

/// Pick the first step from `origin` along a shortest path to `destination`.
///
/// `distance` is the shortest distance between the two. Among the open
/// neighbours of `origin` that are `distance - 1` away from `destination`,
/// the one first in reading order is returned.
#[must_use]
pub fn choose_step(
    grid: &Grid,
    origin: Position,
    destination: Position,
    distance: u32,
) -> Option<Position> {
    let remaining = distance.checked_sub(1)?;
    let from_destination = distance_map(grid, destination);

    grid.adjacent_cells(origin)
        .filter(|&cell| grid.is_open(cell))
        .filter(|&cell| from_destination.distance(cell) == Some(remaining))
        .min()
}

/// A single movement decision for one unit's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    /// In-range cell the unit is heading for.
    pub destination: Position,
    /// Shortest distance to the destination before stepping.
    pub distance: u32,
    /// Neighbouring cell the unit steps into this turn.
    pub step: Position,
}

/// Decide where the unit `id` moves this turn.
///
/// Returns `None` when the unit already stands in range of an enemy or no
/// in-range cell can be reached.
#[must_use]
pub fn plan_move(field: &Battlefield, id: UnitId) -> Option<StepPlan> {
    let origin = field.unit(id).position;
    let targets = in_range_cells(field, id);
    if targets.is_empty() || targets.binary_search(&origin).is_ok() {
        return None;
    }

    let grid = field.grid();
    let (destination, distance) = choose_destination(grid, origin, &targets)?;
    let step = choose_step(grid, origin, destination, distance)?;

    Some(StepPlan {
        destination,
        distance,
        step,
    })
}
