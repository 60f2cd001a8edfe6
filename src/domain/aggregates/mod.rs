//! Aggregates - Cluster of domain objects treated as a single unit

mod accumulated_stats;
mod room_session;
mod roster;

pub use accumulated_stats::AccumulatedStats;
pub use room_session::{RoomSession, ScenarioOutcome, SessionPhase, TurnState};
pub use roster::Roster;
