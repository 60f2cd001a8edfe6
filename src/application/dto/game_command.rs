//! Inbound game commands
//!
//! Every command names the acting figure by `character_id`. Movement, attack
//! and end-turn commands may also name a player-controlled summon owned by the
//! sender's character.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{RestType, SummonDefinition};
use crate::domain::value_objects::{AxialCoord, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameCommand {
    SelectCards {
        character_id: EntityId,
        top_card_id: String,
        bottom_card_id: String,
    },
    MoveCharacter {
        character_id: EntityId,
        target_hex: AxialCoord,
    },
    AttackTarget {
        character_id: EntityId,
        target_id: EntityId,
    },
    CollectLoot {
        character_id: EntityId,
        hex: AxialCoord,
    },
    EndTurn {
        character_id: EntityId,
    },
    PlaceSummon {
        character_id: EntityId,
        summon: SummonDefinition,
        target_hex: AxialCoord,
        #[serde(default)]
        max_range: Option<u32>,
    },
    ExecuteRest {
        character_id: EntityId,
        rest_type: RestType,
        #[serde(default)]
        card_to_lose: Option<String>,
    },
}

impl GameCommand {
    pub fn character_id(&self) -> EntityId {
        match self {
            GameCommand::SelectCards { character_id, .. }
            | GameCommand::MoveCharacter { character_id, .. }
            | GameCommand::AttackTarget { character_id, .. }
            | GameCommand::CollectLoot { character_id, .. }
            | GameCommand::EndTurn { character_id }
            | GameCommand::PlaceSummon { character_id, .. }
            | GameCommand::ExecuteRest { character_id, .. } => *character_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameCommand::SelectCards { .. } => "select_cards",
            GameCommand::MoveCharacter { .. } => "move_character",
            GameCommand::AttackTarget { .. } => "attack_target",
            GameCommand::CollectLoot { .. } => "collect_loot",
            GameCommand::EndTurn { .. } => "end_turn",
            GameCommand::PlaceSummon { .. } => "place_summon",
            GameCommand::ExecuteRest { .. } => "execute_rest",
        }
    }
}

/// Character a player brings into a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSetup {
    pub name: String,
    pub class_name: String,
    pub max_health: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_from_client_json() {
        let id = EntityId::new();
        let json = format!(
            r#"{{"type":"move_character","character_id":"{}","target_hex":{{"q":1,"r":-1}}}}"#,
            id
        );
        let command: GameCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(command.character_id(), id);
        assert_eq!(command.name(), "move_character");
    }

    #[test]
    fn test_rest_command_defaults_card() {
        let id = EntityId::new();
        let json = format!(
            r#"{{"type":"execute_rest","character_id":"{}","rest_type":"short"}}"#,
            id
        );
        let command: GameCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(
            command,
            GameCommand::ExecuteRest {
                character_id: id,
                rest_type: RestType::Short,
                card_to_lose: None,
            }
        );
    }
}
