//! Inventory port - Equipped item bonuses

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

use super::ContentError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedBonuses {
    pub attack_bonus: i32,
    pub defense_bonus: i32,
}

#[async_trait]
pub trait InventoryPort: Send + Sync {
    async fn get_equipped_bonuses(&self, character_id: EntityId) -> Result<EquippedBonuses, ContentError>;
}
