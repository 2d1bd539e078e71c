//! # Skirmish Core
//!
//! Deterministic turn-based combat between elves and goblins on a
//! rectangular character map.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No shared mutable state between battles
//!
//! This separation enables:
//! - Headless runners and CLIs
//! - Parallel attack power searches (one private battle per worker)
//! - Snapshot and determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tiles and occupancy
//! - [`unit`] - Combat units
//! - [`battlefield`] - Map parsing, unit arena and rendering
//! - [`pathfinding`] - Breadth-first movement decisions
//! - [`battle`] - Round engine
//! - [`search`] - Casualty-free attack power search
//! - [`rules`] - Starting stats loaded from RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod battlefield;
pub mod error;
pub mod faction;
pub mod grid;
pub mod pathfinding;
pub mod position;
pub mod rules;
pub mod search;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{
        Battle, BattleState, BattleStats, CombatEvent, Outcome, RoundOutcome, RoundReport,
        TurnOutcome,
    };
    pub use crate::battlefield::Battlefield;
    pub use crate::error::{CombatError, Result};
    pub use crate::faction::Faction;
    pub use crate::grid::{Grid, Tile};
    pub use crate::position::Position;
    pub use crate::rules::CombatRules;
    pub use crate::search::{CandidateOutcome, OutcomeSearch, SearchConfig, SearchResult};
    pub use crate::unit::{Unit, UnitId};
}
