//! Views of a room sent to clients and the HTTP API

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{RoomSession, ScenarioOutcome, SessionPhase};
use crate::domain::entities::{CombatantCore, Difficulty, EntityType, LootToken, ObjectiveProgressEntry, Treasure};
use crate::domain::services::TurnOrderEntry;
use crate::domain::value_objects::{AxialCoord, Condition, ElementalState, EntityId, RoomId};

/// Public state of one figure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureView {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub position: AxialCoord,
    pub current_health: i32,
    pub max_health: i32,
    pub conditions: Vec<Condition>,
    pub shield: u32,
    pub is_dead: bool,
    #[serde(default)]
    pub is_exhausted: bool,
    /// Controlling user for characters, owning character for summons
    #[serde(default)]
    pub controller: Option<String>,
}

impl FigureView {
    fn from_core(core: &CombatantCore, is_exhausted: bool, controller: Option<String>) -> Self {
        Self {
            id: core.id,
            name: core.name.clone(),
            entity_type: core.entity_type,
            position: core.position,
            current_health: core.current_health,
            max_health: core.max_health,
            conditions: core.conditions.iter().copied().collect(),
            shield: core.shield,
            is_dead: core.is_dead,
            is_exhausted,
            controller,
        }
    }
}

/// Snapshot replayed to a client joining or rejoining a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateView {
    pub room_id: RoomId,
    pub scenario_id: String,
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub round: u32,
    pub turn_index: Option<usize>,
    pub turn_order: Vec<TurnOrderEntry>,
    pub characters: Vec<FigureView>,
    pub monsters: Vec<FigureView>,
    pub summons: Vec<FigureView>,
    pub loot: Vec<LootToken>,
    pub treasures: Vec<Treasure>,
    pub elements: ElementalState,
    pub objectives: Vec<(String, ObjectiveProgressEntry)>,
    pub outcome: Option<ScenarioOutcome>,
}

impl From<&RoomSession> for RoomStateView {
    fn from(room: &RoomSession) -> Self {
        Self {
            room_id: room.id,
            scenario_id: room.scenario.id.clone(),
            scenario_name: room.scenario.name.clone(),
            difficulty: room.difficulty,
            phase: room.phase,
            round: room.round,
            turn_index: room.turn.active_index,
            turn_order: room.turn.order.clone(),
            characters: room
                .roster
                .characters
                .iter()
                .map(|c| FigureView::from_core(&c.core, c.is_exhausted, Some(c.user_id.clone())))
                .collect(),
            monsters: room
                .roster
                .monsters
                .iter()
                .map(|m| FigureView::from_core(&m.core, false, None))
                .collect(),
            summons: room
                .roster
                .summons
                .iter()
                .map(|s| FigureView::from_core(&s.core, false, s.owner_id.map(|o| o.to_string())))
                .collect(),
            loot: room.loot.clone(),
            treasures: room.treasures.clone(),
            elements: room.elements,
            objectives: room
                .objective_progress
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
            outcome: room.outcome.clone(),
        }
    }
}

/// Room listing entry for the HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub scenario_id: String,
    pub scenario_name: String,
    pub phase: SessionPhase,
    pub round: u32,
    pub player_count: usize,
}

impl From<&RoomSession> for RoomSummary {
    fn from(room: &RoomSession) -> Self {
        Self {
            room_id: room.id,
            scenario_id: room.scenario.id.clone(),
            scenario_name: room.scenario.name.clone(),
            phase: room.phase,
            round: room.round,
            player_count: room.roster.characters.len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequestDto {
    pub scenario_id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Fixed RNG seed for reproducible rooms
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponseDto {
    pub room_id: RoomId,
    pub scenario_id: String,
    pub scenario_name: String,
}
