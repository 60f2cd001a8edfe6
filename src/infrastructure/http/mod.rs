//! HTTP REST API routes

mod room_routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

pub use room_routes::*;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Room routes
        .route("/api/rooms", get(room_routes::list_rooms))
        .route("/api/rooms", post(room_routes::create_room))
        .route("/api/rooms/{id}", get(room_routes::get_room))
        // Content
        .route("/api/scenarios", get(room_routes::list_scenarios))
}
