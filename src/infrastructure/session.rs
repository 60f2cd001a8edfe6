//! Room sessions for connected clients
//!
//! Every room runs in its own task ([`RoomActor`]) that owns the
//! [`RoomSession`] and its participants, and works through a queue of
//! requests strictly in order. The [`RoomRegistry`] only hands out
//! [`RoomHandle`]s and remembers which client is in which room.
//!
//! A room stops once its last participant leaves or its scenario completes.
//! The stopped actor reports its id on the closed-room channel and
//! [`reap_closed_rooms`] drops it from the registry.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::application::dto::{CharacterSetup, GameCommand, RoomStateView, RoomSummary};
use crate::application::services::{GameError, SessionOrchestrator};
use crate::domain::aggregates::{RoomSession, SessionPhase};
use crate::domain::entities::Difficulty;
use crate::domain::events::GameEvent;
use crate::domain::value_objects::{EntityId, RoomId};
use crate::infrastructure::websocket::ServerMessage;

/// Requests queued per room before the actor applies backpressure
const ROOM_QUEUE_CAPACITY: usize = 64;

/// Unique identifier for a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),
    #[error("Client is not in a room")]
    NotInRoom,
    #[error("Room {0} is no longer running")]
    RoomClosed(RoomId),
}

impl From<RegistryError> for GameError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::RoomNotFound(_) | RegistryError::NotInRoom => {
                GameError::NotFound(err.to_string())
            }
            RegistryError::RoomClosed(_) => GameError::Internal(err.to_string()),
        }
    }
}

/// A connected client inside a room
#[derive(Debug, Clone)]
pub struct RoomParticipant {
    pub client_id: ClientId,
    pub user_id: String,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

// ============================================================================
// Room actor
// ============================================================================

type Reply<T> = oneshot::Sender<Result<T, GameError>>;

#[derive(Debug)]
enum RoomRequest {
    Join {
        participant: RoomParticipant,
        character: Option<CharacterSetup>,
        reply: Reply<Option<EntityId>>,
    },
    Start {
        client_id: ClientId,
        reply: Reply<()>,
    },
    Command {
        client_id: ClientId,
        command: GameCommand,
        reply: Reply<()>,
    },
    Leave {
        client_id: ClientId,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
}

/// Owner of one room's state; all mutation happens on its task
pub struct RoomActor {
    room: RoomSession,
    orchestrator: SessionOrchestrator,
    participants: HashMap<ClientId, RoomParticipant>,
    receiver: mpsc::Receiver<RoomRequest>,
    closed: mpsc::UnboundedSender<RoomId>,
}

impl RoomActor {
    /// Start the actor task and return a handle to it
    pub fn spawn(
        room: RoomSession,
        orchestrator: SessionOrchestrator,
        closed: mpsc::UnboundedSender<RoomId>,
    ) -> RoomHandle {
        let (sender, receiver) = mpsc::channel(ROOM_QUEUE_CAPACITY);
        let handle = RoomHandle {
            room_id: room.id,
            scenario_id: room.scenario.id.clone(),
            difficulty: room.difficulty,
            sender,
        };
        let actor = Self {
            room,
            orchestrator,
            participants: HashMap::new(),
            receiver,
            closed,
        };
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        tracing::info!(room_id = %self.room.id, scenario = %self.room.scenario.id, "Room actor started");
        while let Some(request) = self.receiver.recv().await {
            if self.handle(request).await.is_break() {
                break;
            }
        }
        tracing::info!(room_id = %self.room.id, phase = %self.room.phase, "Room actor stopped");
        if self.closed.send(self.room.id).is_err() {
            tracing::debug!(room_id = %self.room.id, "Nobody is reaping closed rooms");
        }
    }

    async fn handle(&mut self, request: RoomRequest) -> ControlFlow<()> {
        match request {
            RoomRequest::Join {
                participant,
                character,
                reply,
            } => {
                let result = self.join(participant, character).await;
                let _ = reply.send(result);
                ControlFlow::Continue(())
            }
            RoomRequest::Start { client_id, reply } => {
                let result = self.start(client_id);
                let _ = reply.send(result);
                self.drain_ai().await;
                self.stop_if_completed()
            }
            RoomRequest::Command {
                client_id,
                command,
                reply,
            } => {
                let result = self.command(client_id, command).await;
                let _ = reply.send(result);
                self.drain_ai().await;
                self.stop_if_completed()
            }
            RoomRequest::Leave { client_id } => {
                if let Some(participant) = self.participants.remove(&client_id) {
                    tracing::info!(
                        room_id = %self.room.id,
                        user_id = %participant.user_id,
                        "Participant left"
                    );
                    self.broadcast(&ServerMessage::PlayerLeft {
                        user_id: participant.user_id,
                    });
                    if self.participants.is_empty() {
                        tracing::info!(room_id = %self.room.id, "Last participant left");
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            }
            RoomRequest::Summary { reply } => {
                let _ = reply.send(RoomSummary::from(&self.room));
                ControlFlow::Continue(())
            }
        }
    }

    /// A completed room has already handed its result to the repository
    fn stop_if_completed(&self) -> ControlFlow<()> {
        if self.room.phase == SessionPhase::Completed {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Seat a participant, creating their character while the room is in the
    /// lobby. Anyone joining gets the full room state, which is how a
    /// reconnecting player catches up.
    async fn join(
        &mut self,
        participant: RoomParticipant,
        character: Option<CharacterSetup>,
    ) -> Result<Option<EntityId>, GameError> {
        let existing = self
            .room
            .roster
            .character_for_user(&participant.user_id)
            .map(|c| c.core.id);
        let character_id = match (existing, character) {
            (Some(id), _) => Some(id),
            (None, Some(setup)) => Some(
                self.orchestrator
                    .join_character(&mut self.room, &participant.user_id, setup)
                    .await?,
            ),
            (None, None) => None,
        };

        tracing::info!(
            room_id = %self.room.id,
            client_id = %participant.client_id,
            user_id = %participant.user_id,
            rejoin = existing.is_some(),
            "Participant joined"
        );
        self.broadcast(&ServerMessage::PlayerJoined {
            user_id: participant.user_id.clone(),
            character_id,
        });
        send(
            &participant,
            ServerMessage::RoomState {
                room_id: self.room.id,
                character_id,
                state: RoomStateView::from(&self.room),
            },
        );
        self.participants.insert(participant.client_id, participant);
        Ok(character_id)
    }

    fn start(&mut self, client_id: ClientId) -> Result<(), GameError> {
        self.participant(client_id)?;
        let events = self.orchestrator.start_game(&mut self.room)?;
        self.broadcast_events(events);
        Ok(())
    }

    async fn command(&mut self, client_id: ClientId, command: GameCommand) -> Result<(), GameError> {
        let user_id = self.participant(client_id)?.user_id.clone();
        let events = self
            .orchestrator
            .handle_command(&mut self.room, &user_id, command)
            .await?;
        self.broadcast_events(events);
        Ok(())
    }

    /// Run queued AI turns one at a time, broadcasting each before the next
    async fn drain_ai(&mut self) {
        while self.room.turn.ai_scheduled && self.room.phase == SessionPhase::ActiveTurn {
            let events = self.orchestrator.run_scheduled_ai(&mut self.room).await;
            self.broadcast_events(events);
        }
    }

    fn participant(&self, client_id: ClientId) -> Result<&RoomParticipant, GameError> {
        self.participants
            .get(&client_id)
            .ok_or_else(|| GameError::validation("Join the room first"))
    }

    fn broadcast_events(&self, events: Vec<GameEvent>) {
        for event in events {
            self.broadcast(&ServerMessage::Event { event });
        }
    }

    fn broadcast(&self, message: &ServerMessage) {
        for participant in self.participants.values() {
            send(participant, message.clone());
        }
    }
}

fn send(participant: &RoomParticipant, message: ServerMessage) {
    if let Err(e) = participant.sender.send(message) {
        tracing::warn!(client_id = %participant.client_id, error = %e, "Failed to send message to client");
    }
}

// ============================================================================
// Handles and registry
// ============================================================================

/// Cheap, cloneable address of a running room
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub room_id: RoomId,
    pub scenario_id: String,
    pub difficulty: Difficulty,
    sender: mpsc::Sender<RoomRequest>,
}

impl RoomHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RoomRequest,
    ) -> Result<T, GameError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| RegistryError::RoomClosed(self.room_id))?;
        response
            .await
            .map_err(|_| GameError::from(RegistryError::RoomClosed(self.room_id)))?
    }

    pub async fn join(
        &self,
        participant: RoomParticipant,
        character: Option<CharacterSetup>,
    ) -> Result<Option<EntityId>, GameError> {
        self.request(|reply| RoomRequest::Join {
            participant,
            character,
            reply,
        })
        .await
    }

    pub async fn start(&self, client_id: ClientId) -> Result<(), GameError> {
        self.request(|reply| RoomRequest::Start { client_id, reply })
            .await
    }

    pub async fn command(&self, client_id: ClientId, command: GameCommand) -> Result<(), GameError> {
        self.request(|reply| RoomRequest::Command {
            client_id,
            command,
            reply,
        })
        .await
    }

    pub async fn leave(&self, client_id: ClientId) {
        if self.sender.send(RoomRequest::Leave { client_id }).await.is_err() {
            tracing::debug!(room_id = %self.room_id, "Leave sent to a stopped room");
        }
    }

    pub async fn summary(&self) -> Result<RoomSummary, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RoomRequest::Summary { reply })
            .await
            .map_err(|_| RegistryError::RoomClosed(self.room_id))?;
        response
            .await
            .map_err(|_| RegistryError::RoomClosed(self.room_id))
    }
}

/// Running rooms and the clients inside them
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    client_rooms: HashMap<ClientId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: RoomHandle) {
        tracing::info!(room_id = %handle.room_id, "Room registered");
        self.rooms.insert(handle.room_id, handle);
    }

    pub fn get(&self, room_id: RoomId) -> Result<RoomHandle, RegistryError> {
        self.rooms
            .get(&room_id)
            .cloned()
            .ok_or(RegistryError::RoomNotFound(room_id))
    }

    pub fn handles(&self) -> Vec<RoomHandle> {
        let mut handles: Vec<RoomHandle> = self.rooms.values().cloned().collect();
        handles.sort_by_key(|h| h.room_id);
        handles
    }

    /// Record that a client is now in a room, returning the room it left
    pub fn enter(&mut self, client_id: ClientId, room_id: RoomId) -> Option<RoomHandle> {
        let previous = self.client_rooms.insert(client_id, room_id)?;
        if previous == room_id {
            return None;
        }
        self.rooms.get(&previous).cloned()
    }

    pub fn room_of(&self, client_id: ClientId) -> Result<RoomHandle, RegistryError> {
        let room_id = self
            .client_rooms
            .get(&client_id)
            .ok_or(RegistryError::NotInRoom)?;
        self.get(*room_id)
    }

    /// Forget a client; the caller tells the room
    pub fn leave(&mut self, client_id: ClientId) -> Option<RoomHandle> {
        let room_id = self.client_rooms.remove(&client_id)?;
        self.rooms.get(&room_id).cloned()
    }

    /// Drop a room and every client still pointing at it
    pub fn remove(&mut self, room_id: RoomId) -> Option<RoomHandle> {
        let handle = self.rooms.remove(&room_id)?;
        self.client_rooms.retain(|_, room| *room != room_id);
        tracing::info!(%room_id, "Room removed");
        Some(handle)
    }
}

/// Remove rooms from the registry as their actors stop
pub async fn reap_closed_rooms(
    rooms: Arc<RwLock<RoomRegistry>>,
    mut closed: mpsc::UnboundedReceiver<RoomId>,
) {
    while let Some(room_id) = closed.recv().await {
        rooms.write().await.remove(room_id);
    }
}
