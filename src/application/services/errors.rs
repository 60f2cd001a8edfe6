//! Game errors - What a rejected command reports back to its sender

use crate::application::ports::outbound::{ContentError, RepositoryError};
use crate::domain::services::TurnOrderError;

/// Errors returned by command handlers
///
/// None of these change room state: every command validates before it
/// mutates.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The command is illegal in the current state
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Stable code sent to clients alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION_ERROR",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::Conflict(_) => "CONFLICT",
            GameError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ContentError> for GameError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(what) => GameError::NotFound(what),
            ContentError::Invalid(what) => GameError::Validation(what),
            ContentError::Unavailable(what) => GameError::Internal(what),
        }
    }
}

impl From<RepositoryError> for GameError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(room_id) => {
                GameError::Conflict(format!("Result for room {} already saved", room_id))
            }
            RepositoryError::Database(message) => GameError::Internal(message),
        }
    }
}

impl From<TurnOrderError> for GameError {
    fn from(err: TurnOrderError) -> Self {
        GameError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RoomId;

    #[test]
    fn test_error_codes() {
        assert_eq!(GameError::validation("Not your turn").code(), "VALIDATION_ERROR");
        assert_eq!(GameError::not_found("room").code(), "NOT_FOUND");
        assert_eq!(GameError::Validation("Not your turn".into()).to_string(), "Not your turn");
    }

    #[test]
    fn test_repository_conflict_maps_to_conflict() {
        let err: GameError = RepositoryError::Conflict(RoomId::new()).into();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn test_content_errors_map_by_kind() {
        let err: GameError = ContentError::Invalid("bad card".into()).into();
        assert!(matches!(err, GameError::Validation(_)));
        let err: GameError = ContentError::Unavailable("disk".into()).into();
        assert!(matches!(err, GameError::Internal(_)));
    }
}
