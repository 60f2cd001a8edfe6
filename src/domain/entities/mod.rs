//! Domain entities - Core game objects with identity

mod ability_card;
mod board;
mod character;
mod combatant;
mod monster;
mod objective;
mod scenario;
mod summon;

pub use ability_card::{AbilityCard, ActionKind, CardAction, CardSelection, TurnStats};
pub use board::{BoardHex, BoardMap, LootToken, Terrain, Treasure};
pub use character::{Character, ExhaustionReason, RestType};
pub use combatant::{CombatProfile, Combatant, CombatantCore, EntityType, Retaliate};
pub use monster::{Monster, MonsterStats};
pub use objective::{ObjectiveDefinition, ObjectiveKind, ObjectiveProgressEntry, ObjectiveRewards};
pub use scenario::{
    AllySpawn, Difficulty, MonsterGroup, MonsterSpawn, ScenarioDefinition, ScenarioObjectives,
};
pub use summon::{Summon, SummonDefinition};
