//! JSON reports for finished battles and searches.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::battle::{Battle, BattleStats, Outcome};
use skirmish_core::faction::Faction;
use skirmish_core::search::SearchResult;

/// Summary of one battle played to the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Fully completed rounds.
    pub rounds: u32,
    /// Hit points of the survivors.
    pub hit_points: u64,
    /// Rounds times hit points.
    pub score: u64,
    /// Surviving faction, `None` after a stalemate.
    pub winner: Option<Faction>,
    /// Living units per faction at the end.
    pub survivors: Vec<(Faction, usize)>,
    /// Totals over the whole battle.
    pub stats: BattleStats,
    /// The answer line as printed.
    pub line: String,
}

impl BattleReport {
    /// Build a report from a finished battle.
    #[must_use]
    pub fn from_battle(battle: &Battle) -> Self {
        let outcome = battle.outcome();
        let survivors = Faction::ALL
            .iter()
            .map(|&faction| (faction, battle.battlefield().living(faction).count()))
            .collect();

        Self {
            rounds: outcome.rounds,
            hit_points: outcome.hit_points,
            score: outcome.score(),
            winner: outcome.winner,
            survivors,
            stats: battle.stats(),
            line: outcome.to_string(),
        }
    }

    /// Outcome this report describes.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        Outcome {
            rounds: self.rounds,
            hit_points: self.hit_points,
            winner: self.winner,
        }
    }
}

/// Summary of an attack power search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Faction that had to survive without losses.
    pub protected: Faction,
    /// Lowest casualty-free attack power.
    pub power: u32,
    /// Rounds of the winning battle.
    pub rounds: u32,
    /// Hit points left after the winning battle.
    pub hit_points: u64,
    /// Rounds times hit points.
    pub score: u64,
    /// Worker threads used, 0 for a sequential scan.
    pub parallelism: usize,
    /// The answer line as printed.
    pub line: String,
}

impl SearchReport {
    /// Build a report from a search result.
    #[must_use]
    pub fn new(protected: Faction, result: &SearchResult, parallelism: usize) -> Self {
        Self {
            protected,
            power: result.power,
            rounds: result.outcome.rounds,
            hit_points: result.outcome.hit_points,
            score: result.outcome.score(),
            parallelism,
            line: result.to_string(),
        }
    }
}

/// Write any report to `path` as pretty-printed JSON.
pub fn save_json<T: Serialize>(report: &T, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Read a report written by [`save_json`].
pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<T> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::rules::CombatRules;

    fn finished_battle() -> Battle {
        let mut battle = Battle::from_lines(
            &[
                "#######", //
                "#.G...#", //
                "#...EG#", //
                "#.#.#G#", //
                "#..G#E#", //
                "#.....#", //
                "#######",
            ],
            &CombatRules::default(),
        )
        .unwrap();
        battle.run_to_end();
        battle
    }

    #[test]
    fn test_battle_report_fields() {
        let report = BattleReport::from_battle(&finished_battle());
        assert_eq!(report.rounds, 47);
        assert_eq!(report.hit_points, 590);
        assert_eq!(report.score, 27730);
        assert_eq!(report.winner, Some(Faction::Goblin));
        assert_eq!(
            report.survivors,
            vec![(Faction::Elf, 0), (Faction::Goblin, 4)]
        );
        assert_eq!(report.line, "Outcome: 47 * 590 = 27730");
        assert_eq!(report.outcome().score(), report.score);
    }

    #[test]
    fn test_search_report_line() {
        let result = SearchResult {
            power: 15,
            outcome: Outcome {
                rounds: 29,
                hit_points: 172,
                winner: Some(Faction::Elf),
            },
        };
        let report = SearchReport::new(Faction::Elf, &result, 4);
        assert_eq!(report.score, 4988);
        assert_eq!(report.line, "Needed AttackPower: 15, Outcome: 29 * 172 = 4988");
    }

    #[test]
    fn test_json_save_load() {
        let report = BattleReport::from_battle(&finished_battle());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("battle.json");

        save_json(&report, &path).unwrap();
        assert!(path.exists());

        let loaded: BattleReport = load_json(&path).unwrap();
        assert_eq!(loaded, report);
    }
}
