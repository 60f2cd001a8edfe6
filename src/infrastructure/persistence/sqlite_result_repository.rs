use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::application::dto::GameResult;
use crate::application::ports::outbound::{GameResultRepository, RepositoryError};
use crate::domain::events::PlayerStat;
use crate::domain::value_objects::RoomId;

type ResultRow = (String, String, String, bool, String, i64, i64, i64, i64, String, DateTime<Utc>);

pub struct SqliteGameResultRepository {
    pool: SqlitePool,
}

impl SqliteGameResultRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS game_results (
                room_id TEXT PRIMARY KEY,
                scenario_id TEXT NOT NULL,
                scenario_name TEXT NOT NULL,
                victory INTEGER NOT NULL,
                reason TEXT NOT NULL,
                rounds_completed INTEGER NOT NULL,
                experience INTEGER NOT NULL,
                gold INTEGER NOT NULL,
                loot INTEGER NOT NULL,
                player_stats TEXT NOT NULL,
                completed_at TIMESTAMP NOT NULL
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl GameResultRepository for SqliteGameResultRepository {
    async fn save_game_result(&self, result: &GameResult) -> Result<(), RepositoryError> {
        let player_stats = serde_json::to_string(&result.player_stats)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO game_results (room_id, scenario_id, scenario_name, victory, reason, rounds_completed, experience, gold, loot, player_stats, completed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(result.room_id.to_string())
        .bind(&result.scenario_id)
        .bind(&result.scenario_name)
        .bind(result.victory)
        .bind(&result.reason)
        .bind(result.rounds_completed as i64)
        .bind(result.experience as i64)
        .bind(result.gold as i64)
        .bind(result.loot as i64)
        .bind(player_stats)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(result.room_id)
            }
            e => RepositoryError::Database(e.to_string()),
        })?;

        Ok(())
    }

    async fn get_game_result(&self, room_id: RoomId) -> Result<Option<GameResult>, RepositoryError> {
        let row: Option<ResultRow> = sqlx::query_as(
            "SELECT room_id, scenario_id, scenario_name, victory, reason, rounds_completed, experience, gold, loot, player_stats, completed_at FROM game_results WHERE room_id = ?",
        )
        .bind(room_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some((id, scenario_id, scenario_name, victory, reason, rounds, experience, gold, loot, stats, completed_at)) = row else {
            return Ok(None);
        };

        let uuid = Uuid::parse_str(&id).map_err(|e| RepositoryError::Database(e.to_string()))?;
        let player_stats: Vec<PlayerStat> =
            serde_json::from_str(&stats).map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(Some(GameResult {
            room_id: RoomId::from_uuid(uuid),
            scenario_id,
            scenario_name,
            victory,
            reason,
            rounds_completed: rounds as u32,
            experience: experience as u32,
            gold: gold as u32,
            loot: loot as u32,
            player_stats,
            completed_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::EntityId;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repository() -> SqliteGameResultRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteGameResultRepository::new(pool).await.unwrap()
    }

    fn result(room_id: RoomId) -> GameResult {
        GameResult {
            room_id,
            scenario_id: "black-barrow".into(),
            scenario_name: "Black Barrow".into(),
            victory: true,
            reason: "All monsters defeated".into(),
            rounds_completed: 4,
            experience: 6,
            gold: 9,
            loot: 3,
            player_stats: vec![PlayerStat {
                player_id: "p1".into(),
                character_id: EntityId::new(),
                character_name: "Grok".into(),
                class_name: "brute".into(),
                experience: 6,
                gold: 9,
                loot_collected: 3,
                damage_dealt: 14,
                monsters_killed: 2,
                exhausted: false,
            }],
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_result() {
        let repo = repository().await;
        let saved = result(RoomId::new());
        repo.save_game_result(&saved).await.unwrap();

        let loaded = repo.get_game_result(saved.room_id).await.unwrap().unwrap();
        assert_eq!(loaded.scenario_id, saved.scenario_id);
        assert_eq!(loaded.player_stats, saved.player_stats);
        assert_eq!(loaded.rounds_completed, 4);
        assert!(repo.get_game_result(RoomId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_save_for_room_conflicts() {
        let repo = repository().await;
        let saved = result(RoomId::new());
        repo.save_game_result(&saved).await.unwrap();

        let err = repo.save_game_result(&saved).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(id) if id == saved.room_id));
    }
}
