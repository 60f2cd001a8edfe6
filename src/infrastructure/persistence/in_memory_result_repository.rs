use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::dto::GameResult;
use crate::application::ports::outbound::{GameResultRepository, RepositoryError};
use crate::domain::value_objects::RoomId;

/// Result store used when no database is configured, and by tests
#[derive(Debug, Default)]
pub struct InMemoryGameResultRepository {
    results: RwLock<HashMap<RoomId, GameResult>>,
}

impl InMemoryGameResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl GameResultRepository for InMemoryGameResultRepository {
    async fn save_game_result(&self, result: &GameResult) -> Result<(), RepositoryError> {
        let mut results = self.results.write().await;
        if results.contains_key(&result.room_id) {
            return Err(RepositoryError::Conflict(result.room_id));
        }
        results.insert(result.room_id, result.clone());
        Ok(())
    }

    async fn get_game_result(&self, room_id: RoomId) -> Result<Option<GameResult>, RepositoryError> {
        Ok(self.results.read().await.get(&room_id).cloned())
    }
}
