//! Error types for the combat simulation.

use thiserror::Error;

use crate::faction::Faction;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for all combat simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// The map has no rows or only empty rows.
    #[error("Map is empty")]
    EmptyMap,

    /// A character outside `#`, `.`, `E` and `G` was found.
    #[error("Unrecognized map character {ch:?} at ({x}, {y})")]
    UnrecognizedTile {
        /// Offending character.
        ch: char,
        /// Column of the character.
        x: u32,
        /// Row of the character.
        y: u32,
    },

    /// A row differs in length from the first row.
    #[error("Map row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of this row.
        found: u32,
    },

    /// The map holds no units of one faction.
    #[error("Map contains no {0} units")]
    MissingFaction(Faction),

    /// The attack power search passed its upper bound without a clean win.
    #[error("No casualty-free attack power found up to {max_power}")]
    SearchExhausted {
        /// Highest attack power evaluated.
        max_power: u32,
    },

    /// Invalid simulation state.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
