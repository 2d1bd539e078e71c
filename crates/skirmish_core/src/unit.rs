//! Combat units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::faction::Faction;
use crate::position::Position;

/// Stable arena index of a unit.
///
/// Ids are assigned in reading order when the map is parsed and never
/// reused, so dead units keep their id for final accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Index into the unit arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Arena id.
    pub id: UnitId,
    /// Team the unit fights for.
    pub faction: Faction,
    /// Current cell. Meaningless once the unit is dead.
    pub position: Position,
    /// Remaining hit points, truncated at zero.
    pub hit_points: u32,
    /// Damage dealt per attack.
    pub attack_power: u32,
}

impl Unit {
    /// Create a unit at full health.
    #[must_use]
    pub fn new(
        id: UnitId,
        faction: Faction,
        position: Position,
        hit_points: u32,
        attack_power: u32,
    ) -> Self {
        Self {
            id,
            faction,
            position,
            hit_points,
            attack_power,
        }
    }

    /// A unit is alive while it has hit points left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    /// True if `other` fights for the opposing faction.
    #[must_use]
    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.faction != other.faction
    }

    /// Apply an attack and return the damage actually absorbed.
    ///
    /// Overkill is truncated, so the return value never exceeds the
    /// hit points the unit had before the attack.
    pub fn receive_attack(&mut self, power: u32) -> u32 {
        let absorbed = power.min(self.hit_points);
        self.hit_points -= absorbed;
        absorbed
    }
}
