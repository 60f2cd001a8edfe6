//! Content ports - Interfaces for cards and scenario content
//!
//! Content is static, read-only data. The engine only looks it up; loading it
//! from files or a database is the adapter's business.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{AbilityCard, Difficulty, Monster, ScenarioDefinition};
use crate::domain::value_objects::RoomId;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content not found: {0}")]
    NotFound(String),
    #[error("Invalid content: {0}")]
    Invalid(String),
    #[error("Content source unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of checking a card pair against a class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardValidation {
    pub valid: bool,
    pub top_card: Option<AbilityCard>,
    pub bottom_card: Option<AbilityCard>,
    pub errors: Vec<String>,
}

// =============================================================================
// Card Content Port
// =============================================================================

#[async_trait]
pub trait ContentPort: Send + Sync {
    async fn get_card_by_id(&self, card_id: &str) -> Result<Option<AbilityCard>, ContentError>;

    async fn get_cards_by_class(&self, class_name: &str) -> Result<Vec<AbilityCard>, ContentError>;

    /// Both cards must exist, differ and belong to the class
    async fn validate_card_selection(
        &self,
        top_card_id: &str,
        bottom_card_id: &str,
        class_name: &str,
    ) -> Result<CardValidation, ContentError>;
}

// =============================================================================
// Scenario Content Port
// =============================================================================

#[async_trait]
pub trait ScenarioPort: Send + Sync {
    async fn load_scenario(&self, scenario_id: &str) -> Result<Option<ScenarioDefinition>, ContentError>;

    /// Monsters for a new room, with ids derived from the room id
    async fn spawn_monsters(
        &self,
        scenario: &ScenarioDefinition,
        room_id: RoomId,
        difficulty: Difficulty,
    ) -> Result<Vec<Monster>, ContentError>;

    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, ContentError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub level: u32,
}
