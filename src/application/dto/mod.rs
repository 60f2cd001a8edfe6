//! Data Transfer Objects - For API boundaries
//!
//! Commands in, results and room views out. Infrastructure serializes these
//! without reaching into the aggregate directly.

mod game_command;
mod game_result;
mod room_state;

pub use game_command::{CharacterSetup, GameCommand};
pub use game_result::GameResult;
pub use room_state::{
    CreateRoomRequestDto, CreateRoomResponseDto, FigureView, RoomStateView, RoomSummary,
};
