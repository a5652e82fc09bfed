use serde::{Deserialize, Serialize};

use crate::game::state::{Board, Entity, EntityId, Obstacle, Phase};
use crate::game::systems::movement::DirectionSet;
use crate::lobby::room::StartError;

/// Messages from client to server.
///
/// Everything except `JoinRoom`, `CreateRoom` and `Ping` acts on the room
/// the sender currently belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Join (or create) a room by id
    JoinRoom { room_id: String, player_name: String },
    /// Designate the chaser; `None` means the sender
    SetChaser { entity_id: Option<EntityId> },
    /// Pick a display glyph
    SetEmoji { emoji: String },
    /// Toggle obstacles for the room
    SetObstaclesEnabled { enabled: bool },
    /// Start a round
    StartGame,
    /// Movement intent for this cadence slot
    Move { directions: DirectionSet },
    /// Return the room to the lobby
    NewRound,
    /// Leave the room
    Leave,
    /// Ping for latency measurement
    Ping { timestamp: u64 },
    /// Join a fresh room under a generated id
    CreateRoom { player_name: String },
}

/// Messages from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Sent to the joiner only
    Joined { entity: Entity, room: RoomSnapshot },
    /// Join was rejected
    JoinRejected { reason: String },
    /// Lobby-level change (membership, roles, reset)
    RoomUpdated(RoomSnapshot),
    /// Round began; snapshot holds spawn positions and obstacles
    GameStarted(RoomSnapshot),
    /// An accepted move (and any capture it caused)
    GameUpdated(RoomSnapshot),
    /// Start refused; sent to the requester only
    StartRejected { reason: StartError },
    /// Room went back to the lobby
    NewRound,
    /// A member changed glyph
    EmojiUpdated { entity_id: EntityId, emoji: String },
    /// Obstacles toggled; carries the layout now in effect
    ObstaclesUpdated {
        enabled: bool,
        obstacles: Vec<Obstacle>,
    },
    /// Pong response with server timestamp
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
}

impl ServerMessage {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Joined { .. } => "joined",
            ServerMessage::JoinRejected { .. } => "join_rejected",
            ServerMessage::RoomUpdated(_) => "room_updated",
            ServerMessage::GameStarted(_) => "game_started",
            ServerMessage::GameUpdated(_) => "game_updated",
            ServerMessage::StartRejected { .. } => "start_rejected",
            ServerMessage::NewRound => "new_round",
            ServerMessage::EmojiUpdated { .. } => "emoji_updated",
            ServerMessage::ObstaclesUpdated { .. } => "obstacles_updated",
            ServerMessage::Pong { .. } => "pong",
        }
    }
}

/// Full room state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub phase: Phase,
    pub board: Board,
    pub obstacles: Vec<Obstacle>,
    pub obstacles_enabled: bool,
    pub entities: Vec<Entity>,
}

impl RoomSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers (compatible with TypeScript client)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
/// Uses legacy config for fixed-size integers (compatible with TypeScript client)
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
