//! Attack power search.
//!
//! Finds the lowest attack power for one faction at which it wins without
//! losing a single unit. Candidates are tried in increasing order, and each
//! replays the whole battle from a fresh copy of the starting layout. The
//! scan is linear because survival is not known to be monotonic in attack
//! power.
//!
//! Each candidate is independent. [`OutcomeSearch::evaluate`] accepts a
//! cancellation check so a parallel driver can abandon candidates that a
//! lower successful power has already made irrelevant.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::battle::{Battle, Outcome};
use crate::battlefield::Battlefield;
use crate::error::{CombatError, Result};
use crate::faction::Faction;
use crate::rules::CombatRules;

/// Search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Faction whose attack power is tuned and which must suffer no losses.
    pub protected: Faction,
    /// First power to try. Defaults to one above the faction's rule power.
    pub start_power: Option<u32>,
    /// Last power to try. Defaults to the starting hit points, at which
    /// every hit kills and higher powers cannot change the battle.
    pub max_power: Option<u32>,
}

impl SearchConfig {
    /// Reject bounds that cannot describe a search.
    pub fn validate(&self) -> Result<()> {
        if self.start_power == Some(0) || self.max_power == Some(0) {
            return Err(CombatError::InvalidState(
                "search powers must be positive".into(),
            ));
        }
        if let (Some(start), Some(max)) = (self.start_power, self.max_power) {
            if start > max {
                return Err(CombatError::InvalidState(format!(
                    "search start power {start} exceeds max power {max}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            protected: Faction::Elf,
            start_power: None,
            max_power: None,
        }
    }
}

/// Result of replaying the battle at one candidate power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The battle ended with no losses for the protected faction.
    Survived(Outcome),
    /// A protected unit died; the battle was abandoned at that point.
    Lost {
        /// Rounds completed before the battle was abandoned.
        rounds: u32,
        /// Dead protected units at that point.
        casualties: usize,
    },
    /// The caller cancelled evaluation.
    Cancelled,
}

/// The lowest casualty-free attack power and the battle it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    /// Attack power given to the protected faction.
    pub power: u32,
    /// Outcome of the battle at that power.
    pub outcome: Outcome,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Needed AttackPower: {}, {}", self.power, self.outcome)
    }
}

/// Linear search over attack powers for the protected faction.
///
/// ```
/// use skirmish_core::battlefield::Battlefield;
/// use skirmish_core::rules::CombatRules;
/// use skirmish_core::search::{OutcomeSearch, SearchConfig};
///
/// let rules = CombatRules::default();
/// let map = ["#######", "#.G...#", "#...EG#", "#.#.#G#", "#..G#E#", "#.....#", "#######"];
/// let template = Battlefield::parse(&map, &rules).unwrap();
///
/// let result = OutcomeSearch::new(&template, &rules, SearchConfig::default())
///     .run()
///     .unwrap();
/// assert_eq!(result.to_string(), "Needed AttackPower: 15, Outcome: 29 * 172 = 4988");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OutcomeSearch<'a> {
    template: &'a Battlefield,
    protected: Faction,
    start_power: u32,
    max_power: u32,
}

impl<'a> OutcomeSearch<'a> {
    /// Prepare a search over `template`, which is never modified.
    #[must_use]
    pub fn new(template: &'a Battlefield, rules: &CombatRules, config: SearchConfig) -> Self {
        let start_power = config
            .start_power
            .unwrap_or_else(|| rules.attack_power_for(config.protected) + 1);
        let max_power = config
            .max_power
            .unwrap_or_else(|| start_power.max(rules.hit_points));

        Self {
            template,
            protected: config.protected,
            start_power,
            max_power,
        }
    }

    /// Faction being protected.
    #[must_use]
    pub const fn protected(&self) -> Faction {
        self.protected
    }

    /// First candidate power.
    #[must_use]
    pub const fn start_power(&self) -> u32 {
        self.start_power
    }

    /// Last candidate power.
    #[must_use]
    pub const fn max_power(&self) -> u32 {
        self.max_power
    }

    /// Candidate powers in evaluation order.
    #[must_use]
    pub fn powers(&self) -> RangeInclusive<u32> {
        self.start_power..=self.max_power
    }

    /// Replay the battle with the protected faction at `power`.
    ///
    /// `cancel` is polled before every round; returning `true` abandons the
    /// candidate.
    pub fn evaluate<C>(&self, power: u32, cancel: C) -> CandidateOutcome
    where
        C: Fn() -> bool,
    {
        let mut field = self.template.clone();
        field.set_attack_power(self.protected, power);
        let mut battle = Battle::new(field);

        let protected = self.protected;
        let mut cancelled = false;
        let finished = battle.run_until(|b| {
            if cancel() {
                cancelled = true;
                return true;
            }
            b.battlefield().casualties(protected) > 0
        });

        let casualties = battle.battlefield().casualties(protected);
        match finished {
            Some(outcome) if casualties == 0 => CandidateOutcome::Survived(outcome),
            _ if cancelled => CandidateOutcome::Cancelled,
            _ => CandidateOutcome::Lost {
                rounds: battle.rounds_completed(),
                casualties,
            },
        }
    }

    /// Try every candidate in order and return the first clean win.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::SearchExhausted`] if no power up to the bound
    /// avoids losses.
    pub fn run(&self) -> Result<SearchResult> {
        for power in self.powers() {
            match self.evaluate(power, || false) {
                CandidateOutcome::Survived(outcome) => {
                    tracing::info!(power, %outcome, "Found casualty-free attack power");
                    return Ok(SearchResult { power, outcome });
                }
                CandidateOutcome::Lost { rounds, casualties } => {
                    tracing::debug!(power, rounds, casualties, "Candidate lost units");
                }
                CandidateOutcome::Cancelled => {}
            }
        }

        Err(CombatError::SearchExhausted {
            max_power: self.max_power,
        })
    }
}
