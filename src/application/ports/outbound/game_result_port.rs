//! Game result repository port - Persistence of finished scenarios

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::GameResult;
use crate::domain::value_objects::RoomId;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A result for the room was already saved
    #[error("Game result already exists for room {0}")]
    Conflict(RoomId),
    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait GameResultRepository: Send + Sync {
    async fn save_game_result(&self, result: &GameResult) -> Result<(), RepositoryError>;

    async fn get_game_result(&self, room_id: RoomId) -> Result<Option<GameResult>, RepositoryError>;
}
