//! Faction definitions and identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two opposing teams on the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Elves, marked `E` on the map.
    Elf,
    /// Goblins, marked `G` on the map.
    Goblin,
}

impl Faction {
    /// Both factions in a fixed order.
    pub const ALL: [Faction; 2] = [Faction::Elf, Faction::Goblin];

    /// Parse a map marker character.
    #[must_use]
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'E' => Some(Self::Elf),
            'G' => Some(Self::Goblin),
            _ => None,
        }
    }

    /// The map marker for this faction.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Elf => 'E',
            Self::Goblin => 'G',
        }
    }

    /// The opposing faction.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Elf => Self::Goblin,
            Self::Goblin => Self::Elf,
        }
    }

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Elf => "Elf",
            Self::Goblin => "Goblin",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Faction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elf" | "elves" | "e" => Ok(Self::Elf),
            "goblin" | "goblins" | "g" => Ok(Self::Goblin),
            other => Err(format!("unknown faction '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_round_trip() {
        for faction in Faction::ALL {
            assert_eq!(Faction::from_marker(faction.marker()), Some(faction));
        }
        assert_eq!(Faction::from_marker('#'), None);
    }

    #[test]
    fn test_enemy_is_symmetric() {
        assert_eq!(Faction::Elf.enemy(), Faction::Goblin);
        assert_eq!(Faction::Goblin.enemy().enemy(), Faction::Goblin);
    }

    #[test]
    fn test_parse_faction_names() {
        assert_eq!("Elf".parse::<Faction>(), Ok(Faction::Elf));
        assert_eq!("goblins".parse::<Faction>(), Ok(Faction::Goblin));
        assert!("orc".parse::<Faction>().is_err());
    }
}
