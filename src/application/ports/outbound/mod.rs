//! Outbound ports - Interfaces that the application requires from external systems

mod content_port;
mod game_result_port;
mod inventory_port;
mod pathfinding_port;

pub use content_port::{CardValidation, ContentError, ContentPort, ScenarioPort, ScenarioSummary};
pub use game_result_port::{GameResultRepository, RepositoryError};
pub use inventory_port::{EquippedBonuses, InventoryPort};
pub use pathfinding_port::PathfindingPort;
