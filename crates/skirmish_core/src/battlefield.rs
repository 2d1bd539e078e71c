//! Battlefield: the grid together with its unit arena.
//!
//! Parsing accepts only the puzzle's character set:
//!
//! | Char | Meaning |
//! |------|---------|
//! | `#`  | wall    |
//! | `.`  | open    |
//! | `E`  | elf     |
//! | `G`  | goblin  |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::faction::Faction;
use crate::grid::{Grid, Tile};
use crate::position::Position;
use crate::rules::CombatRules;
use crate::unit::{Unit, UnitId};

/// Grid plus every unit that has taken part in the battle.
///
/// Dead units stay in the arena so their ids remain valid, but they no
/// longer occupy a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battlefield {
    pub(crate) grid: Grid,
    pub(crate) units: Vec<Unit>,
}

impl Battlefield {
    /// Parse a map from its rows.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid rules, an empty map, rows of differing
    /// width, characters outside the map alphabet, or a map missing a faction.
    pub fn parse<S: AsRef<str>>(lines: &[S], rules: &CombatRules) -> Result<Self> {
        rules.validate()?;
        let first = lines.first().ok_or(CombatError::EmptyMap)?;
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(CombatError::EmptyMap);
        }

        let mut grid = Grid::new(width as u32, lines.len() as u32);
        let mut units = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(CombatError::RaggedRow {
                    row: y as u32,
                    expected: width as u32,
                    found: found as u32,
                });
            }

            for (x, ch) in line.chars().enumerate() {
                let pos = Position::new(x as u32, y as u32);
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' => Tile::Empty,
                    marker => {
                        let faction =
                            Faction::from_marker(marker).ok_or(CombatError::UnrecognizedTile {
                                ch: marker,
                                x: pos.x,
                                y: pos.y,
                            })?;
                        let id = UnitId(units.len() as u32);
                        units.push(Unit::new(
                            id,
                            faction,
                            pos,
                            rules.hit_points,
                            rules.attack_power_for(faction),
                        ));
                        Tile::Occupied(id)
                    }
                };
                grid.set_tile(pos, tile);
            }
        }

        for faction in Faction::ALL {
            if !units.iter().any(|u| u.faction == faction) {
                return Err(CombatError::MissingFaction(faction));
            }
        }

        Ok(Self { grid, units })
    }

    /// Parse a map from a multi-line string.
    ///
    /// Trailing blank lines are ignored and `\r\n` line endings are accepted.
    pub fn parse_str(map: &str, rules: &CombatRules) -> Result<Self> {
        let mut lines: Vec<&str> = map.lines().collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        Self::parse(&lines, rules)
    }

    /// The underlying grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Every unit, living or dead, in id order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Look up a unit by id.
    ///
    /// # Panics
    ///
    /// Panics if the id did not come from this battlefield.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    /// The living unit standing at `pos`, if any.
    #[must_use]
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.grid.tile_at(pos).unit().map(|id| self.unit(id))
    }

    /// Living units sorted by reading order of their cells.
    #[must_use]
    pub fn units_in_reading_order(&self) -> Vec<UnitId> {
        let mut living: Vec<&Unit> = self.units.iter().filter(|u| u.is_alive()).collect();
        living.sort_by_key(|u| u.position);
        living.into_iter().map(|u| u.id).collect()
    }

    /// Living units of `faction`.
    pub fn living(&self, faction: Faction) -> impl Iterator<Item = &Unit> + '_ {
        self.units
            .iter()
            .filter(move |u| u.faction == faction && u.is_alive())
    }

    /// True if at least one unit of `faction` is alive.
    #[must_use]
    pub fn has_living(&self, faction: Faction) -> bool {
        self.living(faction).next().is_some()
    }

    /// Living enemies of the unit `id`.
    pub fn living_enemies_of(&self, id: UnitId) -> impl Iterator<Item = &Unit> + '_ {
        self.living(self.unit(id).faction.enemy())
    }

    /// Sum of hit points over all living units.
    #[must_use]
    pub fn total_hit_points(&self) -> u64 {
        self.units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u64::from(u.hit_points))
            .sum()
    }

    /// Number of dead units of `faction`.
    #[must_use]
    pub fn casualties(&self, faction: Faction) -> usize {
        self.units
            .iter()
            .filter(|u| u.faction == faction && !u.is_alive())
            .count()
    }

    /// Give every unit of `faction` the attack power `power`.
    pub fn set_attack_power(&mut self, faction: Faction, power: u32) {
        for unit in self.units.iter_mut().filter(|u| u.faction == faction) {
            unit.attack_power = power;
        }
    }

    /// Check that grid occupancy and unit positions agree.
    ///
    /// Every living unit must sit on a cell holding its id, and no cell may
    /// refer to a dead or unknown unit.
    pub fn verify_occupancy(&self) -> Result<()> {
        for unit in self.units.iter().filter(|u| u.is_alive()) {
            if self.grid.tile_at(unit.position) != Tile::Occupied(unit.id) {
                return Err(CombatError::InvalidState(format!(
                    "unit {} is not on its recorded cell {}",
                    unit.id, unit.position
                )));
            }
        }
        for (pos, tile) in self.grid.tiles() {
            if let Tile::Occupied(id) = tile {
                let unit = self.units.get(id.index()).ok_or_else(|| {
                    CombatError::InvalidState(format!("cell {pos} refers to unknown unit {id}"))
                })?;
                if !unit.is_alive() || unit.position != pos {
                    return Err(CombatError::InvalidState(format!(
                        "cell {pos} refers to unit {id} which is elsewhere or dead"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the map with each row's units and hit points appended.
    ///
    /// ```text
    /// #.G...#   G(200)
    /// #...EG#   E(197), G(197)
    /// ```
    #[must_use]
    pub fn render_with_hit_points(&self) -> String {
        let mut out = String::new();
        for y in 0..self.grid.height() {
            let mut annotations = Vec::new();
            for x in 0..self.grid.width() {
                let pos = Position::new(x, y);
                out.push(self.tile_char(pos));
                if let Some(unit) = self.unit_at(pos) {
                    annotations.push(format!("{}({})", unit.faction.marker(), unit.hit_points));
                }
            }
            if !annotations.is_empty() {
                out.push_str("   ");
                out.push_str(&annotations.join(", "));
            }
            out.push('\n');
        }
        out
    }

    fn tile_char(&self, pos: Position) -> char {
        match self.grid.tile_at(pos) {
            Tile::Wall => '#',
            Tile::Empty => '.',
            Tile::Occupied(id) => self.unit(id).faction.marker(),
        }
    }
}

impl fmt::Display for Battlefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                write!(f, "{}", self.tile_char(Position::new(x, y)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: [&str; 4] = ["#####", "#G.E#", "#.#G#", "#####"];

    fn parse(lines: &[&str]) -> Result<Battlefield> {
        Battlefield::parse(lines, &CombatRules::default())
    }

    #[test]
    fn test_parse_builds_grid_and_units() {
        let field = parse(&SMALL).unwrap();

        assert_eq!(field.grid().width(), 5);
        assert_eq!(field.grid().height(), 4);
        assert_eq!(field.units().len(), 3);
        assert_eq!(field.grid().tile_at(Position::new(0, 0)), Tile::Wall);
        assert_eq!(field.grid().tile_at(Position::new(2, 1)), Tile::Empty);

        let goblin = field.unit_at(Position::new(1, 1)).unwrap();
        assert_eq!(goblin.faction, Faction::Goblin);
        assert_eq!(goblin.hit_points, 200);
        assert_eq!(goblin.attack_power, 3);
        field.verify_occupancy().unwrap();
    }

    #[test]
    fn test_unit_ids_follow_reading_order() {
        let field = parse(&SMALL).unwrap();
        let positions: Vec<_> = field.units().iter().map(|u| u.position).collect();
        assert_eq!(
            positions,
            vec![Position::new(1, 1), Position::new(3, 1), Position::new(3, 2)]
        );
    }

    #[test]
    fn test_rules_apply_per_faction() {
        let rules = CombatRules::default().with_attack_power(Faction::Elf, 20);
        let field = Battlefield::parse(&SMALL, &rules).unwrap();
        let elf = field.living(Faction::Elf).next().unwrap();
        assert_eq!(elf.attack_power, 20);
        assert!(field.living(Faction::Goblin).all(|g| g.attack_power == 3));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = parse(&["#####", "#GxE#", "#####"]).unwrap_err();
        assert_eq!(
            err,
            CombatError::UnrecognizedTile {
                ch: 'x',
                x: 2,
                y: 1
            }
        );
    }

    #[test]
    fn test_ragged_rows() {
        let err = parse(&["#####", "#G.E", "#####"]).unwrap_err();
        assert_eq!(
            err,
            CombatError::RaggedRow {
                row: 1,
                expected: 5,
                found: 4
            }
        );
    }

    #[test]
    fn test_missing_faction() {
        let err = parse(&["#####", "#G.G#", "#####"]).unwrap_err();
        assert_eq!(err, CombatError::MissingFaction(Faction::Elf));

        let err = parse(&["#####", "#E..#", "#####"]).unwrap_err();
        assert_eq!(err, CombatError::MissingFaction(Faction::Goblin));
    }

    #[test]
    fn test_empty_map() {
        let empty: [&str; 0] = [];
        assert_eq!(parse(&empty).unwrap_err(), CombatError::EmptyMap);
        assert_eq!(parse(&[""]).unwrap_err(), CombatError::EmptyMap);
    }

    #[test]
    fn test_parse_str_accepts_crlf_and_trailing_newline() {
        let field =
            Battlefield::parse_str("#####\r\n#G.E#\r\n#####\r\n\n", &CombatRules::default())
                .unwrap();
        assert_eq!(field.grid().height(), 3);
    }

    #[test]
    fn test_display_round_trips_map() {
        let field = parse(&SMALL).unwrap();
        assert_eq!(field.to_string(), SMALL.join("\n") + "\n");
    }

    #[test]
    fn test_render_with_hit_points() {
        let mut field = parse(&SMALL).unwrap();
        field.units[1].hit_points = 197;
        let rendered = field.render_with_hit_points();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "#####");
        assert_eq!(lines[1], "#G.E#   G(200), E(197)");
        assert_eq!(lines[2], "#.#G#   G(200)");
    }

    #[test]
    fn test_parse_rejects_invalid_rules() {
        let rules = CombatRules {
            hit_points: 0,
            ..CombatRules::default()
        };
        assert!(matches!(
            Battlefield::parse(&SMALL, &rules),
            Err(CombatError::InvalidState(_))
        ));

        let rules = CombatRules::default().with_attack_power(Faction::Goblin, 0);
        assert!(Battlefield::parse(&SMALL, &rules).is_err());
    }

    #[test]
    fn test_total_hit_points_does_not_overflow() {
        let rules = CombatRules {
            hit_points: u32::MAX,
            ..CombatRules::default()
        };
        let field = Battlefield::parse(&SMALL, &rules).unwrap();
        assert_eq!(field.total_hit_points(), 3 * u64::from(u32::MAX));
    }

    #[test]
    fn test_hit_points_and_casualties() {
        let mut field = parse(&SMALL).unwrap();
        assert_eq!(field.total_hit_points(), 600);

        let dead = field.units[2].clone();
        field.units[2].hit_points = 0;
        field.grid.remove_unit(&dead);

        assert_eq!(field.total_hit_points(), 400);
        assert_eq!(field.casualties(Faction::Goblin), 1);
        assert_eq!(field.casualties(Faction::Elf), 0);
        assert_eq!(field.units_in_reading_order(), vec![UnitId(0), UnitId(1)]);
        field.verify_occupancy().unwrap();
    }

    #[test]
    fn test_verify_occupancy_detects_stale_cell() {
        let mut field = parse(&SMALL).unwrap();
        field.units[0].hit_points = 0;
        assert!(field.verify_occupancy().is_err());
    }
}
