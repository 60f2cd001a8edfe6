//! Room API routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::{CreateRoomRequestDto, CreateRoomResponseDto, RoomSummary};
use crate::application::ports::outbound::ScenarioSummary;
use crate::application::services::GameError;
use crate::domain::value_objects::RoomId;
use crate::infrastructure::state::AppState;

/// List running rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    // Collect handles first so the registry lock is not held while rooms answer
    let handles = state.rooms.read().await.handles();

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.summary().await {
            Ok(summary) => summaries.push(summary),
            Err(e) => tracing::warn!(room_id = %handle.room_id, error = %e, "Skipping room"),
        }
    }
    Json(summaries)
}

/// Get one room's summary
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoomSummary>, (StatusCode, String)> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid room ID".to_string()))?;
    let room_id = RoomId::from_uuid(uuid);

    let handle = state
        .rooms
        .read()
        .await
        .get(room_id)
        .map_err(|e| error_response(e.into()))?;
    let summary = handle
        .summary()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(summary))
}

/// Create a room for a scenario
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequestDto>,
) -> Result<(StatusCode, Json<CreateRoomResponseDto>), (StatusCode, String)> {
    let response = state.create_room(req).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List scenarios rooms can be created from
pub async fn list_scenarios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScenarioSummary>>, (StatusCode, String)> {
    let scenarios = state
        .scenarios
        .list_scenarios()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(scenarios))
}

fn error_response(err: GameError) -> (StatusCode, String) {
    let status = match &err {
        GameError::Validation(_) => StatusCode::BAD_REQUEST,
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::Conflict(_) => StatusCode::CONFLICT,
        GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::domain::value_objects::EngineSettings;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::content::InMemoryContentStore;
    use crate::infrastructure::http::create_routes;
    use crate::infrastructure::inventory::InMemoryInventory;
    use crate::infrastructure::persistence::InMemoryGameResultRepository;

    fn app() -> axum::Router {
        let content = Arc::new(InMemoryContentStore::demo());
        let state = AppState::from_parts(
            AppConfig::default(),
            content.clone(),
            content,
            Arc::new(InMemoryInventory::new()),
            Arc::new(InMemoryGameResultRepository::new()),
            EngineSettings::default(),
        );
        create_routes().with_state(Arc::new(state))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_rooms() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/rooms",
                r#"{"scenario_id":"black-barrow","difficulty":"hard","seed":42}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["scenario_id"], "black-barrow");
        let room_id = created["room_id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get("/api/rooms")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rooms = json_body(response).await;
        assert_eq!(rooms.as_array().unwrap().len(), 1);
        assert_eq!(rooms[0]["room_id"], room_id.as_str());
        assert_eq!(rooms[0]["phase"], "lobby");
        assert_eq!(rooms[0]["player_count"], 0);

        let response = app
            .oneshot(get(&format!("/api/rooms/{}", room_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["scenario_name"], created["scenario_name"]);
    }

    #[tokio::test]
    async fn test_unknown_scenario_is_not_found() {
        let response = app()
            .oneshot(post_json("/api/rooms", r#"{"scenario_id":"nowhere"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let response = app()
            .oneshot(get(&format!("/api/rooms/{}", RoomId::new())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app().oneshot(get("/api/rooms/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_scenarios() {
        let response = app().oneshot(get("/api/scenarios")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let scenarios = json_body(response).await;
        assert!(scenarios
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["id"] == "black-barrow"));
    }
}
