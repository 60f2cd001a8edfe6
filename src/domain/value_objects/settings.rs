//! Engine rule settings value object
//!
//! Settings are plain data with serde derives so they can be reported over the
//! HTTP API and overridden from the environment.

use serde::{Deserialize, Serialize};

/// Tunable rule knobs for the session engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    // Turn order
    /// Initiative used by allies without an owning character
    pub ally_default_initiative: i32,
    /// Initiative assigned to a character declaring a long rest
    pub long_rest_initiative: i32,
    pub monster_initiative_min: i32,
    pub monster_initiative_max: i32,

    // Scenario
    /// Defeat once the round number exceeds this value (0 = no limit)
    pub max_rounds: u32,
    pub default_milestones: Vec<u8>,

    // Rest
    pub long_rest_heal: i32,

    // Summons
    pub max_summon_range: u32,

    // Loot
    pub loot_collect_range: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ally_default_initiative: 50,
            long_rest_initiative: 99,
            monster_initiative_min: 1,
            monster_initiative_max: 99,
            max_rounds: 0,
            default_milestones: vec![25, 50, 75, 100],
            long_rest_heal: 2,
            max_summon_range: 3,
            loot_collect_range: 1,
        }
    }
}

impl EngineSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ally_default_initiative: env_or("HEXHAVEN_ALLY_INITIATIVE", defaults.ally_default_initiative),
            long_rest_initiative: env_or("HEXHAVEN_LONG_REST_INITIATIVE", defaults.long_rest_initiative),
            monster_initiative_min: env_or("HEXHAVEN_MONSTER_INITIATIVE_MIN", defaults.monster_initiative_min),
            monster_initiative_max: env_or("HEXHAVEN_MONSTER_INITIATIVE_MAX", defaults.monster_initiative_max),
            max_rounds: env_or("HEXHAVEN_MAX_ROUNDS", defaults.max_rounds),
            default_milestones: defaults.default_milestones,
            long_rest_heal: env_or("HEXHAVEN_LONG_REST_HEAL", defaults.long_rest_heal),
            max_summon_range: env_or("HEXHAVEN_MAX_SUMMON_RANGE", defaults.max_summon_range),
            loot_collect_range: env_or("HEXHAVEN_LOOT_COLLECT_RANGE", defaults.loot_collect_range),
        }
    }

    /// Gold value of one loot token at the given scenario level
    pub fn gold_per_loot_token(&self, scenario_level: u32) -> u32 {
        match scenario_level {
            0..=1 => 2,
            2..=3 => 3,
            4..=5 => 4,
            6 => 5,
            _ => 6,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_per_loot_token_scales_with_level() {
        let settings = EngineSettings::default();
        assert_eq!(settings.gold_per_loot_token(0), 2);
        assert_eq!(settings.gold_per_loot_token(3), 3);
        assert_eq!(settings.gold_per_loot_token(7), 6);
    }
}
