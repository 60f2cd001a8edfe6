//! Finished-scenario record handed to persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::RoomSession;
use crate::domain::events::PlayerStat;
use crate::domain::value_objects::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub room_id: RoomId,
    pub scenario_id: String,
    pub scenario_name: String,
    pub victory: bool,
    pub reason: String,
    pub rounds_completed: u32,
    pub experience: u32,
    pub gold: u32,
    pub loot: u32,
    pub player_stats: Vec<PlayerStat>,
    pub completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn from_session(room: &RoomSession, player_stats: Vec<PlayerStat>) -> Self {
        let (victory, reason) = room
            .outcome
            .as_ref()
            .map(|o| (o.victory, o.reason.clone()))
            .unwrap_or((false, String::new()));
        Self {
            room_id: room.id,
            scenario_id: room.scenario.id.clone(),
            scenario_name: room.scenario.name.clone(),
            victory,
            reason,
            rounds_completed: room.stats.rounds_completed,
            experience: player_stats.iter().map(|p| p.experience).sum(),
            gold: player_stats.iter().map(|p| p.gold).sum(),
            loot: room.stats.total_loot_collected,
            player_stats,
            completed_at: Utc::now(),
        }
    }
}
