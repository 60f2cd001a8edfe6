//! Scenario definitions as delivered by content

use serde::{Deserialize, Serialize};

use crate::domain::entities::{BoardMap, MonsterStats, ObjectiveDefinition, SummonDefinition, Treasure};
use crate::domain::value_objects::{AxialCoord, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Adjustment applied to the scenario level when spawning monsters
    pub fn level_offset(&self) -> i32 {
        match self {
            Difficulty::Easy => -1,
            Difficulty::Normal => 0,
            Difficulty::Hard => 1,
            Difficulty::VeryHard => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub position: AxialCoord,
    #[serde(default)]
    pub elite: bool,
}

/// One monster type with its stat lines and spawn points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterGroup {
    pub monster_type: String,
    pub normal: MonsterStats,
    /// Elite stat line; normal stats are reused when absent
    #[serde(default)]
    pub elite: Option<MonsterStats>,
    pub spawns: Vec<MonsterSpawn>,
    #[serde(default)]
    pub is_boss: bool,
}

impl MonsterGroup {
    pub fn stats_for(&self, elite: bool) -> &MonsterStats {
        match (&self.elite, elite) {
            (Some(stats), true) => stats,
            _ => &self.normal,
        }
    }
}

/// Ownerless allied figure placed at setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllySpawn {
    pub id: EntityId,
    pub position: AxialCoord,
    pub definition: SummonDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioObjectives {
    pub primary: ObjectiveDefinition,
    #[serde(default)]
    pub secondary: Vec<ObjectiveDefinition>,
    /// Any of these completing means defeat
    #[serde(default)]
    pub failure_conditions: Vec<ObjectiveDefinition>,
}

impl ScenarioObjectives {
    /// Primary first, then secondary, then failure conditions
    pub fn all(&self) -> impl Iterator<Item = &ObjectiveDefinition> {
        std::iter::once(&self.primary)
            .chain(self.secondary.iter())
            .chain(self.failure_conditions.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: u32,
    pub board: BoardMap,
    pub starting_positions: Vec<AxialCoord>,
    #[serde(default)]
    pub monster_groups: Vec<MonsterGroup>,
    #[serde(default)]
    pub allies: Vec<AllySpawn>,
    #[serde(default)]
    pub treasures: Vec<Treasure>,
    pub objectives: ScenarioObjectives,
    /// Defeat once this many rounds have passed without victory
    #[serde(default)]
    pub round_limit: Option<u32>,
}

impl ScenarioDefinition {
    /// Scenario level after applying the room difficulty
    pub fn effective_level(&self, difficulty: Difficulty) -> u32 {
        (self.level as i32 + difficulty.level_offset()).clamp(0, 7) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ObjectiveKind;

    #[test]
    fn test_effective_level_clamps() {
        let scenario = ScenarioDefinition {
            id: "s".into(),
            name: "Black Barrow".into(),
            level: 0,
            board: BoardMap::hexagon(2),
            starting_positions: vec![AxialCoord::new(0, 0)],
            monster_groups: vec![],
            allies: vec![],
            treasures: vec![],
            objectives: ScenarioObjectives {
                primary: ObjectiveDefinition::new("p", ObjectiveKind::KillAllMonsters),
                secondary: vec![],
                failure_conditions: vec![],
            },
            round_limit: None,
        };
        assert_eq!(scenario.effective_level(Difficulty::Easy), 0);
        assert_eq!(scenario.effective_level(Difficulty::VeryHard), 2);
        assert_eq!(scenario.objectives.all().count(), 1);
    }
}
