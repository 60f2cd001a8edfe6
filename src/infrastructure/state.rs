//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::{mpsc, RwLock};

use crate::application::dto::{CreateRoomRequestDto, CreateRoomResponseDto};
use crate::application::ports::outbound::{
    ContentPort, GameResultRepository, InventoryPort, ScenarioPort,
};
use crate::application::services::{GameError, SessionOrchestrator};
use crate::domain::aggregates::RoomSession;
use crate::domain::services::ObjectiveEvaluator;
use crate::domain::value_objects::{EngineSettings, RoomId};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::content::InMemoryContentStore;
use crate::infrastructure::inventory::InMemoryInventory;
use crate::infrastructure::pathfinding::HexPathfinder;
use crate::infrastructure::persistence::{InMemoryGameResultRepository, SqliteGameResultRepository};
use crate::infrastructure::session::{reap_closed_rooms, RoomActor, RoomRegistry};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub scenarios: Arc<dyn ScenarioPort>,
    pub orchestrator: SessionOrchestrator,
    /// Running rooms and which client is in which
    pub rooms: Arc<RwLock<RoomRegistry>>,
    /// Stopped room actors report here so the registry can drop them
    closed_rooms: mpsc::UnboundedSender<RoomId>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let content = match &config.content_path {
            Some(path) => InMemoryContentStore::from_file(path)?,
            None => {
                tracing::info!("No CONTENT_PATH set, using built-in content");
                InMemoryContentStore::demo()
            }
        };
        let content = Arc::new(content);

        let results: Arc<dyn GameResultRepository> = match &config.database_url {
            Some(url) => {
                let pool = SqlitePoolOptions::new()
                    .connect(url)
                    .await
                    .with_context(|| format!("Failed to connect to {}", url))?;
                Arc::new(
                    SqliteGameResultRepository::new(pool)
                        .await
                        .context("Failed to prepare the game_results table")?,
                )
            }
            None => {
                tracing::info!("No DATABASE_URL set, game results are kept in memory");
                Arc::new(InMemoryGameResultRepository::new())
            }
        };

        Ok(Self::from_parts(
            config,
            content.clone(),
            content,
            Arc::new(InMemoryInventory::new()),
            results,
            EngineSettings::from_env(),
        ))
    }

    /// Must be called inside a tokio runtime; it starts the room reaper
    pub fn from_parts(
        config: AppConfig,
        content: Arc<dyn ContentPort>,
        scenarios: Arc<dyn ScenarioPort>,
        inventory: Arc<dyn InventoryPort>,
        results: Arc<dyn GameResultRepository>,
        settings: EngineSettings,
    ) -> Self {
        let orchestrator = SessionOrchestrator::new(
            content,
            inventory,
            Arc::new(HexPathfinder),
            results,
            ObjectiveEvaluator::default(),
            settings,
        );
        let rooms = Arc::new(RwLock::new(RoomRegistry::new()));
        let (closed_rooms, closed) = mpsc::unbounded_channel();
        tokio::spawn(reap_closed_rooms(rooms.clone(), closed));

        Self {
            config,
            scenarios,
            orchestrator,
            rooms,
            closed_rooms,
        }
    }

    /// Load the scenario, spawn its monsters and start a room actor
    pub async fn create_room(
        &self,
        request: CreateRoomRequestDto,
    ) -> Result<CreateRoomResponseDto, GameError> {
        let scenario = self
            .scenarios
            .load_scenario(&request.scenario_id)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Scenario {}", request.scenario_id)))?;
        if scenario.starting_positions.is_empty() {
            return Err(GameError::validation("Scenario has no starting positions"));
        }

        let room_id = RoomId::new();
        let monsters = self
            .scenarios
            .spawn_monsters(&scenario, room_id, request.difficulty)
            .await?;
        let seed = request
            .seed
            .or(self.config.rng_seed)
            .unwrap_or_else(rand::random);

        let response = CreateRoomResponseDto {
            room_id,
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
        };
        let room = RoomSession::new(room_id, scenario, request.difficulty, monsters, seed);
        let handle = RoomActor::spawn(
            room,
            self.orchestrator.clone(),
            self.closed_rooms.clone(),
        );
        self.rooms.write().await.insert(handle);

        tracing::info!(%room_id, scenario = %response.scenario_id, difficulty = ?request.difficulty, seed, "Room created");
        Ok(response)
    }
}
