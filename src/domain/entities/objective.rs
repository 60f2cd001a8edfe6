//! Scenario objectives and their progress tracking

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AxialCoord, EntityId};

/// Template of an objective, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectiveKind {
    KillAllMonsters,
    KillMonsterType {
        monster_type: String,
        /// Required kills; all of that type when absent
        #[serde(default)]
        count: Option<u32>,
    },
    KillBoss {
        #[serde(default)]
        boss_type: Option<String>,
    },
    SurviveRounds {
        rounds: u32,
    },
    CollectLoot {
        amount: u32,
    },
    ReachLocation {
        hexes: Vec<AxialCoord>,
        /// Every character must stand on a target hex instead of any one
        #[serde(default)]
        all_characters: bool,
    },
    ProtectNpc {
        npc_id: EntityId,
    },
    /// Completes once the round count passes the limit
    TimeLimit {
        rounds: u32,
    },
    NoDamage,
    MinimumHealth {
        /// Percent of max health every active character must keep
        percent: u32,
    },
    CollectTreasure {
        /// Treasures to collect; every treasure on the board when empty
        #[serde(default)]
        treasure_ids: Vec<String>,
    },
    Escape {
        exits: Vec<AxialCoord>,
    },
    Custom {
        predicate: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

impl ObjectiveKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectiveKind::KillAllMonsters => "kill_all_monsters",
            ObjectiveKind::KillMonsterType { .. } => "kill_monster_type",
            ObjectiveKind::KillBoss { .. } => "kill_boss",
            ObjectiveKind::SurviveRounds { .. } => "survive_rounds",
            ObjectiveKind::CollectLoot { .. } => "collect_loot",
            ObjectiveKind::ReachLocation { .. } => "reach_location",
            ObjectiveKind::ProtectNpc { .. } => "protect_npc",
            ObjectiveKind::TimeLimit { .. } => "time_limit",
            ObjectiveKind::NoDamage => "no_damage",
            ObjectiveKind::MinimumHealth { .. } => "minimum_health",
            ObjectiveKind::CollectTreasure { .. } => "collect_treasure",
            ObjectiveKind::Escape { .. } => "escape",
            ObjectiveKind::Custom { .. } => "custom",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRewards {
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub gold: u32,
}

/// An objective as declared by scenario content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: ObjectiveKind,
    /// Progress percentages announced once each; engine defaults when empty
    #[serde(default)]
    pub milestones: Vec<u8>,
    #[serde(default = "default_track_progress")]
    pub track_progress: bool,
    #[serde(default)]
    pub rewards: ObjectiveRewards,
}

fn default_track_progress() -> bool {
    true
}

impl ObjectiveDefinition {
    pub fn new(id: impl Into<String>, kind: ObjectiveKind) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            kind,
            milestones: Vec::new(),
            track_progress: true,
            rewards: ObjectiveRewards::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rewards(mut self, rewards: ObjectiveRewards) -> Self {
        self.rewards = rewards;
        self
    }
}

/// Running progress of one objective inside a room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgressEntry {
    pub current: u32,
    pub target: u32,
    pub percent: u8,
    pub milestones_reached: Vec<u8>,
    pub notified_milestones: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_definition_from_content_json() {
        let json = r#"{
            "id": "primary-kill-all",
            "type": "kill_all_monsters",
            "description": "Defeat all enemies",
            "milestones": [25, 50, 75, 100]
        }"#;
        let def: ObjectiveDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.kind, ObjectiveKind::KillAllMonsters);
        assert!(def.track_progress);
        assert_eq!(def.milestones, vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_tagged_objective_with_fields() {
        let json = r#"{"id":"o","type":"kill_monster_type","monster_type":"bandit-guard","count":2}"#;
        let def: ObjectiveDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.kind.type_name(), "kill_monster_type");
    }
}
