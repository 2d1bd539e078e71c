//! Round engine.
//!
//! A battle is a sequence of rounds. At the start of each round the living
//! units are snapshotted in reading order and each takes one turn:
//!
//! 1. Dead units are skipped.
//! 2. If no enemy is alive anywhere the battle ends on the spot and the
//!    current round does not count.
//! 3. A unit not already next to an enemy takes one step toward the
//!    nearest in-range cell (see [`crate::pathfinding`]).
//! 4. The unit attacks the adjacent enemy with the fewest hit points,
//!    ties broken by reading order.
//!
//! # Determinism
//!
//! Nothing here depends on hashing, threads or randomness. The same map
//! and rules always produce the same rounds, events and hit points.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::error::{CombatError, Result};
use crate::faction::Faction;
use crate::pathfinding::plan_move;
use crate::position::Position;
use crate::rules::CombatRules;
use crate::unit::UnitId;

/// Lifecycle of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleState {
    /// Rounds are still being played.
    InProgress,
    /// One faction has no living units left.
    Over {
        /// Faction with units still standing.
        winner: Faction,
    },
    /// A full round passed without a single move or point of damage, so
    /// every further round would be identical.
    Stalemate,
}

impl BattleState {
    /// True once no further rounds will be played.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Something that happened during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A unit stepped into a neighbouring cell.
    Moved {
        /// The moving unit.
        unit: UnitId,
        /// Cell it left.
        from: Position,
        /// Cell it entered.
        to: Position,
    },
    /// A unit attacked an adjacent enemy.
    Attacked {
        /// The attacking unit.
        attacker: UnitId,
        /// The unit that was hit.
        target: UnitId,
        /// Attack power of the attacker.
        power: u32,
        /// Hit points actually removed, overkill truncated.
        damage: u32,
        /// Whether the attack killed the target.
        killed: bool,
    },
}

impl CombatEvent {
    /// False for attacks that removed no hit points.
    #[must_use]
    pub const fn changes_state(&self) -> bool {
        match self {
            Self::Moved { .. } => true,
            Self::Attacked { damage, .. } => *damage > 0,
        }
    }
}

/// Result of a single unit's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The unit was already dead.
    Skipped,
    /// No enemies remain; the battle is over.
    NoEnemies,
    /// The unit took its turn.
    Acted {
        /// Cell the unit stepped into, if it moved.
        moved_to: Option<Position>,
        /// Unit it attacked, if any.
        attacked: Option<UnitId>,
    },
}

/// Whether a round ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Every unit from the round snapshot had its turn.
    Completed,
    /// The round was cut short or no round was played because the battle
    /// had already ended.
    BattleOver,
}

/// Report of one call to [`Battle::run_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Whether the round counted.
    pub outcome: RoundOutcome,
    /// Moves and attacks in the order they happened.
    pub events: Vec<CombatEvent>,
}

/// Running totals kept across the whole battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BattleStats {
    /// Number of attacks made.
    pub attacks: u32,
    /// Hit points removed by all attacks.
    pub damage_dealt: u64,
    /// Units killed.
    pub kills: u32,
    /// Single steps taken.
    pub moves: u32,
}

/// Final result of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// Fully completed rounds.
    pub rounds: u32,
    /// Hit points of all surviving units.
    pub hit_points: u64,
    /// Surviving faction, `None` after a stalemate.
    pub winner: Option<Faction>,
}

impl Outcome {
    /// Completed rounds times remaining hit points.
    #[must_use]
    pub fn score(&self) -> u64 {
        u64::from(self.rounds).saturating_mul(self.hit_points)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Outcome: {} * {} = {}",
            self.rounds,
            self.hit_points,
            self.score()
        )
    }
}

/// A battle in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    field: Battlefield,
    rounds_completed: u32,
    state: BattleState,
    stats: BattleStats,
}

impl Battle {
    /// Start a battle on `field`.
    #[must_use]
    pub fn new(field: Battlefield) -> Self {
        Self {
            field,
            rounds_completed: 0,
            state: BattleState::InProgress,
            stats: BattleStats::default(),
        }
    }

    /// Parse a map and start a battle on it.
    pub fn from_lines<S: AsRef<str>>(lines: &[S], rules: &CombatRules) -> Result<Self> {
        Battlefield::parse(lines, rules).map(Self::new)
    }

    /// Current battlefield.
    #[must_use]
    pub fn battlefield(&self) -> &Battlefield {
        &self.field
    }

    /// Rounds that ran to completion so far.
    #[must_use]
    pub const fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BattleState {
        self.state
    }

    /// Totals accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> BattleStats {
        self.stats
    }

    /// True once no further rounds will be played.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Current outcome as if the battle ended now.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let winner = match self.state {
            BattleState::Over { winner } => Some(winner),
            BattleState::InProgress | BattleState::Stalemate => None,
        };
        Outcome {
            rounds: self.rounds_completed,
            hit_points: self.field.total_hit_points(),
            winner,
        }
    }

    /// Play one round.
    pub fn run_round(&mut self) -> RoundReport {
        let mut events = Vec::new();
        if self.is_finished() {
            return RoundReport {
                outcome: RoundOutcome::BattleOver,
                events,
            };
        }

        for id in self.field.units_in_reading_order() {
            if self.take_turn(id, &mut events) == TurnOutcome::NoEnemies {
                tracing::debug!(
                    rounds = self.rounds_completed,
                    hit_points = self.field.total_hit_points(),
                    "Battle over"
                );
                return RoundReport {
                    outcome: RoundOutcome::BattleOver,
                    events,
                };
            }
        }

        self.rounds_completed += 1;

        if cfg!(feature = "debug-validation") {
            if let Err(e) = self.field.verify_occupancy() {
                panic!("Occupancy broken after round {}: {e}", self.rounds_completed);
            }
        }

        if !events.iter().any(CombatEvent::changes_state) {
            tracing::debug!(rounds = self.rounds_completed, "Battle stalled");
            self.state = BattleState::Stalemate;
        } else {
            tracing::debug!(
                round = self.rounds_completed,
                events = events.len(),
                "Round completed"
            );
        }

        RoundReport {
            outcome: RoundOutcome::Completed,
            events,
        }
    }

    /// Play rounds until the battle is finished.
    pub fn run_to_end(&mut self) -> Outcome {
        while !self.is_finished() {
            self.run_round();
        }
        self.outcome()
    }

    /// Play rounds until the battle finishes or `stop` asks to halt.
    ///
    /// `stop` is checked before every round. Returns the outcome if the
    /// battle finished, or `None` if it was stopped early.
    pub fn run_until<F>(&mut self, mut stop: F) -> Option<Outcome>
    where
        F: FnMut(&Battle) -> bool,
    {
        while !self.is_finished() {
            if stop(self) {
                return None;
            }
            self.run_round();
        }
        Some(self.outcome())
    }

    /// Take the turn of unit `id`, appending what happened to `events`.
    pub fn take_turn(&mut self, id: UnitId, events: &mut Vec<CombatEvent>) -> TurnOutcome {
        let unit = self.field.unit(id);
        if !unit.is_alive() {
            return TurnOutcome::Skipped;
        }

        let faction = unit.faction;
        if !self.field.has_living(faction.enemy()) {
            self.state = BattleState::Over { winner: faction };
            return TurnOutcome::NoEnemies;
        }

        let moved_to = self.advance(id, events);
        let attacked = self.attack(id, events);

        TurnOutcome::Acted { moved_to, attacked }
    }

    fn advance(&mut self, id: UnitId, events: &mut Vec<CombatEvent>) -> Option<Position> {
        let plan = plan_move(&self.field, id)?;

        let unit = &mut self.field.units[id.index()];
        let from = unit.position;
        self.field.grid.move_unit(unit, plan.step);

        tracing::trace!(unit = %id, %from, to = %plan.step, "Unit moved");
        self.stats.moves += 1;
        events.push(CombatEvent::Moved {
            unit: id,
            from,
            to: plan.step,
        });
        Some(plan.step)
    }

    /// Adjacent living enemy with the fewest hit points, ties by reading order.
    fn choose_target(&self, id: UnitId) -> Option<UnitId> {
        let attacker = self.field.unit(id);
        self.field
            .grid()
            .adjacent_cells(attacker.position)
            .filter_map(|cell| self.field.unit_at(cell))
            .filter(|other| other.is_alive() && other.is_enemy_of(attacker))
            .min_by_key(|other| (other.hit_points, other.position))
            .map(|other| other.id)
    }

    fn attack(&mut self, id: UnitId, events: &mut Vec<CombatEvent>) -> Option<UnitId> {
        let target_id = self.choose_target(id)?;
        let power = self.field.unit(id).attack_power;

        let target = &mut self.field.units[target_id.index()];
        assert!(target.is_alive(), "Unit {id} attacked dead unit {target_id}");
        let damage = target.receive_attack(power);
        let killed = !target.is_alive();

        if killed {
            self.field.grid.remove_unit(&self.field.units[target_id.index()]);
            self.stats.kills += 1;
        }
        self.stats.attacks += 1;
        self.stats.damage_dealt += u64::from(damage);

        tracing::trace!(attacker = %id, target = %target_id, damage, killed, "Unit attacked");
        events.push(CombatEvent::Attacked {
            attacker: id,
            target: target_id,
            power,
            damage,
            killed,
        });
        Some(target_id)
    }

    /// Compute a hash of the battle state for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.rounds_completed.hash(&mut hasher);
        self.state.hash(&mut hasher);

        // Units in id order, dead records included.
        self.field.units.len().hash(&mut hasher);
        for unit in &self.field.units {
            unit.id.hash(&mut hasher);
            unit.faction.hash(&mut hasher);
            unit.hit_points.hash(&mut hasher);
            unit.attack_power.hash(&mut hasher);
            if unit.is_alive() {
                unit.position.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize battle state to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CombatError::InvalidState(format!("Failed to serialize battle: {e}")))
    }

    /// Deserialize battle state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| CombatError::InvalidState(format!("Failed to deserialize battle: {e}")))
    }
}
