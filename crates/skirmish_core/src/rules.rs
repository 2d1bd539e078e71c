//! Combat rules shared by every battle.
//!
//! Rules load from RON, and every field is optional:
//!
//! ```
//! use skirmish_core::rules::CombatRules;
//! use skirmish_core::faction::Faction;
//!
//! let rules = CombatRules::from_ron_str("(elf_attack_power: Some(15))").unwrap();
//! assert_eq!(rules.hit_points, 200);
//! assert_eq!(rules.attack_power_for(Faction::Elf), 15);
//! assert_eq!(rules.attack_power_for(Faction::Goblin), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::faction::Faction;

/// Starting hit points for every unit.
pub const DEFAULT_HIT_POINTS: u32 = 200;

/// Attack power for every unit without an override.
pub const DEFAULT_ATTACK_POWER: u32 = 3;

/// Starting stats applied to units when a map is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Hit points each unit starts with.
    pub hit_points: u32,
    /// Attack power of every unit unless its faction overrides it.
    pub attack_power: u32,
    /// Attack power override for elves.
    pub elf_attack_power: Option<u32>,
    /// Attack power override for goblins.
    pub goblin_attack_power: Option<u32>,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            hit_points: DEFAULT_HIT_POINTS,
            attack_power: DEFAULT_ATTACK_POWER,
            elf_attack_power: None,
            goblin_attack_power: None,
        }
    }
}

impl CombatRules {
    /// Parse rules from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let rules: Self = ron::from_str(ron)
            .map_err(|e| CombatError::InvalidState(format!("Failed to parse rules: {e}")))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject rule sets that cannot produce a battle.
    ///
    /// Units need hit points to be alive, and every attack must remove at
    /// least one hit point or a battle could never end.
    pub fn validate(&self) -> Result<()> {
        if self.hit_points == 0 {
            return Err(CombatError::InvalidState(
                "hit_points must be positive".into(),
            ));
        }
        if self.attack_power == 0 {
            return Err(CombatError::InvalidState(
                "attack_power must be positive".into(),
            ));
        }
        for faction in Faction::ALL {
            if self.attack_power_for(faction) == 0 {
                return Err(CombatError::InvalidState(format!(
                    "{faction} attack power must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Attack power for units of `faction`.
    #[must_use]
    pub fn attack_power_for(&self, faction: Faction) -> u32 {
        let override_power = match faction {
            Faction::Elf => self.elf_attack_power,
            Faction::Goblin => self.goblin_attack_power,
        };
        override_power.unwrap_or(self.attack_power)
    }

    /// Copy of these rules with `faction` fixed at `power`.
    #[must_use]
    pub fn with_attack_power(mut self, faction: Faction, power: u32) -> Self {
        match faction {
            Faction::Elf => self.elf_attack_power = Some(power),
            Faction::Goblin => self.goblin_attack_power = Some(power),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = CombatRules::default();
        assert_eq!(rules.hit_points, 200);
        assert_eq!(rules.attack_power_for(Faction::Elf), 3);
        assert_eq!(rules.attack_power_for(Faction::Goblin), 3);
    }

    #[test]
    fn test_override_only_touches_one_faction() {
        let rules = CombatRules::default().with_attack_power(Faction::Goblin, 9);
        assert_eq!(rules.attack_power_for(Faction::Goblin), 9);
        assert_eq!(rules.attack_power_for(Faction::Elf), 3);
    }

    #[test]
    fn test_parse_full_ron() {
        let rules = CombatRules::from_ron_str(
            "(hit_points: 50, attack_power: 7, elf_attack_power: None, goblin_attack_power: Some(1))",
        )
        .unwrap();
        assert_eq!(rules.hit_points, 50);
        assert_eq!(rules.attack_power_for(Faction::Elf), 7);
        assert_eq!(rules.attack_power_for(Faction::Goblin), 1);
    }

    #[test]
    fn test_zero_hit_points_rejected() {
        assert!(CombatRules::from_ron_str("(hit_points: 0)").is_err());
    }

    #[test]
    fn test_zero_attack_power_rejected() {
        assert!(CombatRules::from_ron_str("(attack_power: 0)").is_err());
        assert!(CombatRules::from_ron_str("(elf_attack_power: Some(0))").is_err());
        assert!(CombatRules::from_ron_str("(goblin_attack_power: Some(0))").is_err());
        // A zero base power is still rejected when both factions override it.
        assert!(CombatRules::from_ron_str(
            "(attack_power: 0, elf_attack_power: Some(3), goblin_attack_power: Some(3))"
        )
        .is_err());
    }

    #[test]
    fn test_huge_hit_points_accepted() {
        let rules = CombatRules::from_ron_str("(hit_points: 4294967295)").unwrap();
        assert_eq!(rules.hit_points, u32::MAX);
    }

    #[test]
    fn test_malformed_ron_rejected() {
        let err = CombatRules::from_ron_str("(hit_points: \"lots\")").unwrap_err();
        assert!(matches!(err, CombatError::InvalidState(_)));
    }
}
