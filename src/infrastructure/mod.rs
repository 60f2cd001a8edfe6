//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Content: card and scenario definitions loaded from JSON
//! - Pathfinding: hex-grid movement search
//! - Persistence: SQLite and in-memory game result storage
//! - HTTP: REST API routes for rooms and scenarios
//! - WebSocket: Real-time communication with player clients
//! - Session: one actor task per running room
//! - Config and State: application wiring

pub mod config;
pub mod content;
pub mod http;
pub mod inventory;
pub mod pathfinding;
pub mod persistence;
pub mod session;
pub mod state;
pub mod websocket;
