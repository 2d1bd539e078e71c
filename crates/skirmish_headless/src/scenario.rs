//! Scenario loading and verification.
//!
//! A scenario bundles a map with the rules to fight it under, the search
//! parameters, and optionally the answer lines it must produce:
//!
//! ```ron
//! (
//!     name: "Walkthrough",
//!     description: "Three goblins against two elves",
//!     map: [
//!         "#######",
//!         "#.G...#",
//!         "#...EG#",
//!         "#.#.#G#",
//!         "#..G#E#",
//!         "#.....#",
//!         "#######",
//!     ],
//!     rules: (hit_points: 200, attack_power: 3),
//!     search: (protected: Elf),
//!     expected_outcome: Some("Outcome: 47 * 590 = 27730"),
//!     expected_search: Some("Needed AttackPower: 15, Outcome: 29 * 172 = 4988"),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::battle::Battle;
use skirmish_core::battlefield::Battlefield;
use skirmish_core::error::CombatError;
use skirmish_core::rules::CombatRules;
use skirmish_core::search::{OutcomeSearch, SearchConfig};
use thiserror::Error;

use crate::parallel::run_parallel_search;
use crate::report::{BattleReport, SearchReport};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The map or rules were rejected, or the search found nothing.
    #[error("Scenario cannot be played: {0}")]
    Combat(#[from] CombatError),
}

/// A map with its rules and expected answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map rows.
    pub map: Vec<String>,
    /// Starting stats.
    #[serde(default)]
    pub rules: CombatRules,
    /// Attack power search parameters.
    #[serde(default)]
    pub search: SearchConfig,
    /// Expected answer line of the plain battle.
    #[serde(default)]
    pub expected_outcome: Option<String>,
    /// Expected answer line of the search.
    #[serde(default)]
    pub expected_search: Option<String>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.rules.validate()?;
        scenario.search.validate()?;
        Ok(scenario)
    }

    /// Parse the scenario's map under its rules.
    pub fn battlefield(&self) -> Result<Battlefield, ScenarioError> {
        Ok(Battlefield::parse(&self.map, &self.rules)?)
    }

    /// Play the battle and run the search, then compare both answer lines
    /// against the expected ones.
    ///
    /// `parallelism` is passed to [`run_parallel_search`]. A search that
    /// finds no casualty-free power leaves `search` empty; it only counts
    /// as a mismatch when the scenario expects a search answer.
    pub fn run(&self, parallelism: usize) -> Result<ScenarioReport, ScenarioError> {
        let template = self.battlefield()?;

        let mut battle = Battle::new(template.clone());
        battle.run_to_end();
        let battle = BattleReport::from_battle(&battle);

        let search = OutcomeSearch::new(&template, &self.rules, self.search);
        let (search, search_line) = match run_parallel_search(&search, parallelism) {
            Ok(result) => {
                let report = SearchReport::new(self.search.protected, &result, parallelism);
                let line = report.line.clone();
                (Some(report), line)
            }
            Err(e @ CombatError::SearchExhausted { .. }) => {
                tracing::warn!(scenario = %self.name, error = %e, "Search found no answer");
                (None, e.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        let mut mismatches = Vec::new();
        if let Some(expected) = &self.expected_outcome {
            if *expected != battle.line {
                mismatches.push(Mismatch {
                    expected: expected.clone(),
                    actual: battle.line.clone(),
                });
            }
        }
        if let Some(expected) = &self.expected_search {
            if *expected != search_line {
                mismatches.push(Mismatch {
                    expected: expected.clone(),
                    actual: search_line,
                });
            }
        }

        for mismatch in &mismatches {
            tracing::warn!(
                scenario = %self.name,
                expected = %mismatch.expected,
                actual = %mismatch.actual,
                "Scenario answer mismatch"
            );
        }

        Ok(ScenarioReport {
            name: self.name.clone(),
            battle,
            search,
            mismatches,
        })
    }
}

/// An answer line that differed from the scenario's expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Line the scenario expected.
    pub expected: String,
    /// Line actually produced.
    pub actual: String,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// The plain battle.
    pub battle: BattleReport,
    /// The attack power search, if it found an answer.
    pub search: Option<SearchReport>,
    /// Expected lines that were not produced.
    pub mismatches: Vec<Mismatch>,
}

impl ScenarioReport {
    /// True if every expected line matched.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}
