//! In-memory inventory - Equipped item bonuses per character

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{ContentError, EquippedBonuses, InventoryPort};
use crate::domain::value_objects::EntityId;

/// Characters without an entry have nothing equipped
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    bonuses: RwLock<HashMap<EntityId, EquippedBonuses>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn equip(&self, character_id: EntityId, bonuses: EquippedBonuses) {
        self.bonuses.write().await.insert(character_id, bonuses);
    }
}

#[async_trait]
impl InventoryPort for InMemoryInventory {
    async fn get_equipped_bonuses(&self, character_id: EntityId) -> Result<EquippedBonuses, ContentError> {
        Ok(self
            .bonuses
            .read()
            .await
            .get(&character_id)
            .copied()
            .unwrap_or_default())
    }
}
