//! Game events - Notifications broadcast to every participant of a room
//!
//! Events are produced by the session orchestrator in the order things
//! happened and serialized with a snake_case `type` tag.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{EntityType, ExhaustionReason, RestType};
use crate::domain::services::turn_order::TurnOrderEntry;
use crate::domain::value_objects::{
    AxialCoord, Condition, ElementalState, EntityId, LootId, ModifierValue,
};

/// Per-character summary sent when a scenario ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub player_id: String,
    pub character_id: EntityId,
    pub character_name: String,
    pub class_name: String,
    pub experience: u32,
    pub gold: u32,
    pub loot_collected: u32,
    pub damage_dealt: u32,
    pub monsters_killed: u32,
    pub exhausted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round_number: u32,
        turn_order: Vec<TurnOrderEntry>,
    },

    TurnStarted {
        entity_id: EntityId,
        entity_type: EntityType,
        turn_index: usize,
    },

    CardsSelected {
        player_id: String,
        character_id: EntityId,
        top_initiative: i32,
        bottom_initiative: i32,
    },

    CharacterMoved {
        character_id: EntityId,
        from: AxialCoord,
        to: AxialCoord,
        path: Vec<AxialCoord>,
        distance: u32,
    },

    AttackResolved {
        attacker_id: EntityId,
        target_id: EntityId,
        damage: i32,
        modifier: ModifierValue,
        target_dead: bool,
        target_health: i32,
        #[serde(default)]
        retaliate_damage: i32,
        #[serde(default)]
        forced_to: Option<AxialCoord>,
        #[serde(default)]
        conditions_applied: Vec<Condition>,
    },

    MonsterActivated {
        monster_id: EntityId,
        focus_target: Option<EntityId>,
        path: Vec<AxialCoord>,
        attacked: bool,
    },

    SummonActivated {
        summon_id: EntityId,
        focus_target: Option<EntityId>,
        path: Vec<AxialCoord>,
        attacked: bool,
    },

    SummonPlaced {
        summon_id: EntityId,
        owner_id: EntityId,
        name: String,
        position: AxialCoord,
    },

    LootSpawned {
        loot_id: LootId,
        position: AxialCoord,
        gold: u32,
    },

    LootCollected {
        character_id: EntityId,
        position: AxialCoord,
        gold: u32,
        /// Set when a scenario treasure rather than a loot token was picked up
        #[serde(default)]
        treasure_id: Option<String>,
    },

    ElementalStateUpdated {
        elements: ElementalState,
    },

    ObjectiveProgress {
        objective_id: String,
        current: u32,
        target: u32,
        percentage: u8,
        milestone: Option<u8>,
    },

    CharacterExhausted {
        character_id: EntityId,
        reason: ExhaustionReason,
    },

    RestCompleted {
        character_id: EntityId,
        rest_type: RestType,
        card_lost: Option<String>,
        healed: i32,
    },

    RoundCompleted {
        round_number: u32,
    },

    ScenarioCompleted {
        victory: bool,
        reason: String,
        experience: u32,
        gold: u32,
        loot: u32,
        player_stats: Vec<PlayerStat>,
    },
}

impl GameEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::TurnStarted { .. } => "turn_started",
            GameEvent::CardsSelected { .. } => "cards_selected",
            GameEvent::CharacterMoved { .. } => "character_moved",
            GameEvent::AttackResolved { .. } => "attack_resolved",
            GameEvent::MonsterActivated { .. } => "monster_activated",
            GameEvent::SummonActivated { .. } => "summon_activated",
            GameEvent::SummonPlaced { .. } => "summon_placed",
            GameEvent::LootSpawned { .. } => "loot_spawned",
            GameEvent::LootCollected { .. } => "loot_collected",
            GameEvent::ElementalStateUpdated { .. } => "elemental_state_updated",
            GameEvent::ObjectiveProgress { .. } => "objective_progress",
            GameEvent::CharacterExhausted { .. } => "character_exhausted",
            GameEvent::RestCompleted { .. } => "rest_completed",
            GameEvent::RoundCompleted { .. } => "round_completed",
            GameEvent::ScenarioCompleted { .. } => "scenario_completed",
        }
    }
}
