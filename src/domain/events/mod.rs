//! Domain events - Notifications of state changes within a room

pub mod game_events;

pub use game_events::{GameEvent, PlayerStat};
