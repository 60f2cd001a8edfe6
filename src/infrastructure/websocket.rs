//! WebSocket handler for player connections
//!
//! One connection is one client. A client joins a single room at a time;
//! everything it sends afterwards is routed to that room's actor.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::application::dto::{CharacterSetup, GameCommand, RoomStateView};
use crate::application::services::GameError;
use crate::domain::events::GameEvent;
use crate::domain::value_objects::{EntityId, RoomId};
use crate::infrastructure::session::{ClientId, RoomParticipant};
use crate::infrastructure::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let client_id = ClientId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    tracing::info!(%client_id, "New WebSocket connection established");

    // Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to serialize server message"),
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if let Some(response) = handle_message(msg, &state, client_id, &tx).await {
                        if tx.send(response).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(%client_id, error = %e, "Failed to parse message");
                    let error = ServerMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: format!("Invalid message format: {}", e),
                    };
                    if tx.send(error).is_err() {
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(%client_id, "WebSocket connection closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(%client_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // The room keeps running while anyone is left; the player can rejoin
    // until then. An emptied room stops and the reaper unregisters it.
    let handle = state.rooms.write().await.leave(client_id);
    if let Some(handle) = handle {
        handle.leave(client_id).await;
    }

    send_task.abort();
    tracing::info!(%client_id, "WebSocket connection terminated");
}

/// Route one client message; the return value goes back to that client only
async fn handle_message(
    msg: ClientMessage,
    state: &AppState,
    client_id: ClientId,
    sender: &mpsc::UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    let result = match msg {
        ClientMessage::Heartbeat => return Some(ServerMessage::Pong),

        ClientMessage::JoinRoom {
            room_id,
            user_id,
            character,
        } => {
            tracing::debug!(%client_id, %room_id, %user_id, "Joining room");
            join_room(state, client_id, room_id, user_id, character, sender).await
        }

        ClientMessage::StartGame => {
            let room = state.rooms.read().await.room_of(client_id);
            match room {
                Ok(handle) => handle.start(client_id).await,
                Err(e) => Err(e.into()),
            }
        }

        ClientMessage::Command { command } => {
            tracing::debug!(%client_id, command = command.name(), "Received command");
            let room = state.rooms.read().await.room_of(client_id);
            match room {
                Ok(handle) => handle.command(client_id, command).await,
                Err(e) => Err(e.into()),
            }
        }
    };

    result.err().map(|e| {
        tracing::debug!(%client_id, error = %e, "Request rejected");
        ServerMessage::from(e)
    })
}

async fn join_room(
    state: &AppState,
    client_id: ClientId,
    room_id: RoomId,
    user_id: String,
    character: Option<CharacterSetup>,
    sender: &mpsc::UnboundedSender<ServerMessage>,
) -> Result<(), GameError> {
    let handle = state.rooms.read().await.get(room_id)?;
    let participant = RoomParticipant {
        client_id,
        user_id,
        sender: sender.clone(),
    };
    handle.join(participant, character).await?;

    let previous = state.rooms.write().await.enter(client_id, room_id);
    if let Some(previous) = previous {
        previous.leave(client_id).await;
    }
    Ok(())
}

// ============================================================================
// Message Types
// ============================================================================

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room; a character is created when the room is still in the lobby
    JoinRoom {
        room_id: RoomId,
        user_id: String,
        #[serde(default)]
        character: Option<CharacterSetup>,
    },
    /// Close the lobby and deal the first round
    StartGame,
    /// A game command for the room the client is in
    Command { command: GameCommand },
    /// Heartbeat ping
    Heartbeat,
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent to a client after joining or rejoining, with the full room state
    RoomState {
        room_id: RoomId,
        character_id: Option<EntityId>,
        state: RoomStateView,
    },
    /// Another participant joined (broadcast to the others)
    PlayerJoined {
        user_id: String,
        character_id: Option<EntityId>,
    },
    /// A participant disconnected; their character stays in the room
    PlayerLeft { user_id: String },
    /// Something happened in the room
    Event { event: GameEvent },
    /// A request was rejected; sent only to the requester
    Error { code: String, message: String },
    /// Heartbeat response
    Pong,
}

impl From<GameError> for ServerMessage {
    fn from(err: GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
