use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info};

use crate::game::constants::net::ROOM_ID_ATTEMPTS;
use crate::game::state::{Entity, EntityId, Phase};
use crate::lobby::naming::{generate_room_id_with, normalize_room_id};
use crate::lobby::room::{GameRoom, RoomError};

/// A room behind its own lock; rooms never wait on each other
pub type SharedRoom = Arc<Mutex<GameRoom>>;

/// Room directory: owns every room and the member -> room mapping.
///
/// Rooms are created on first join and evicted once their last member
/// leaves. Lock order is directory first, then room.
pub struct RoomDirectory {
    rooms: HashMap<String, SharedRoom>,
    member_rooms: HashMap<EntityId, String>,
    max_rooms: usize,
    max_players: usize,
    obstacles_default: bool,
}

/// Outcome of a successful join
#[derive(Debug, Clone)]
pub struct JoinReceipt {
    pub room_id: String,
    pub entity: Entity,
    pub created_room: bool,
}

/// Outcome of a successful leave
#[derive(Debug, Clone)]
pub struct LeaveReceipt {
    pub room_id: String,
    pub entity: Entity,
    /// Room was empty afterwards and has been dropped
    pub evicted: bool,
    /// A round in progress ended because of this departure
    pub finished_round: bool,
}

impl RoomDirectory {
    pub fn new(max_rooms: usize, max_players: usize, obstacles_default: bool) -> Self {
        Self {
            rooms: HashMap::new(),
            member_rooms: HashMap::new(),
            max_rooms,
            max_players,
            obstacles_default,
        }
    }

    /// Create an empty room under `room_id`
    pub fn create_room(&mut self, room_id: &str) -> Result<SharedRoom, DirectoryError> {
        let room_id = normalize_room_id(room_id).ok_or(DirectoryError::InvalidRoomId)?;
        if self.rooms.contains_key(&room_id) {
            return Err(DirectoryError::RoomExists);
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(DirectoryError::TooManyRooms);
        }

        info!("Creating room {}", room_id);
        let room = Arc::new(Mutex::new(GameRoom::new(
            room_id.clone(),
            self.max_players,
            self.obstacles_default,
        )));
        self.rooms.insert(room_id, room.clone());
        Ok(room)
    }

    /// Pick a generated id that no live room uses
    pub fn unused_room_id<R: Rng>(&self, rng: &mut R) -> Result<String, DirectoryError> {
        if self.rooms.len() >= self.max_rooms {
            return Err(DirectoryError::TooManyRooms);
        }
        (0..ROOM_ID_ATTEMPTS)
            .map(|_| generate_room_id_with(rng))
            .find(|id| !self.rooms.contains_key(id))
            .ok_or(DirectoryError::RoomExists)
    }

    /// Join `room_id`, creating the room if it does not exist yet
    pub fn join(
        &mut self,
        room_id: &str,
        entity_id: EntityId,
        name: &str,
    ) -> Result<JoinReceipt, DirectoryError> {
        if self.member_rooms.contains_key(&entity_id) {
            return Err(DirectoryError::AlreadyInRoom);
        }
        let room_id = normalize_room_id(room_id).ok_or(DirectoryError::InvalidRoomId)?;

        let (shared, created_room) = match self.rooms.get(&room_id) {
            Some(room) => (room.clone(), false),
            None => (self.create_room(&room_id)?, true),
        };

        let (joined, members) = {
            let mut room = shared.lock();
            let joined = room.join(entity_id, name);
            (joined, room.entity_count())
        };

        let entity = match joined {
            Ok(entity) => entity,
            Err(err) => {
                // Don't leave behind a room this join just created
                if created_room && members == 0 {
                    self.rooms.remove(&room_id);
                }
                return Err(err.into());
            }
        };

        self.member_rooms.insert(entity_id, room_id.clone());
        debug!("{} joined {} ({} members)", entity.name, room_id, members);

        Ok(JoinReceipt {
            room_id,
            entity,
            created_room,
        })
    }

    /// Remove a member from its room, evicting the room if it is now empty
    pub fn leave(&mut self, entity_id: EntityId) -> Result<LeaveReceipt, DirectoryError> {
        let room_id = self
            .member_rooms
            .remove(&entity_id)
            .ok_or(DirectoryError::NotInRoom)?;

        let shared = self
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(DirectoryError::RoomNotFound)?;

        let (entity, finished_round, evicted) = {
            let mut room = shared.lock();
            let was_playing = room.phase() == Phase::Playing;
            let entity = room.leave(entity_id).ok_or(DirectoryError::NotInRoom)?;
            let finished_round = was_playing && room.phase() == Phase::Finished;
            (entity, finished_round, room.is_empty())
        };

        if evicted {
            self.evict(&room_id);
        }

        Ok(LeaveReceipt {
            room_id,
            entity,
            evicted,
            finished_round,
        })
    }

    /// Drop a room and forget all of its members
    pub fn evict(&mut self, room_id: &str) -> Option<SharedRoom> {
        let shared = self.rooms.remove(room_id)?;
        {
            let room = shared.lock();
            for id in room.entity_ids() {
                self.member_rooms.remove(&id);
            }
            info!("Evicted room {} after {}s", room_id, room.age().as_secs());
        }
        Some(shared)
    }

    pub fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.get(room_id).cloned()
    }

    /// Id of the room a member currently belongs to
    pub fn room_id_of(&self, entity_id: EntityId) -> Option<&str> {
        self.member_rooms.get(&entity_id).map(String::as_str)
    }

    /// Room a member currently belongs to
    pub fn room_of(&self, entity_id: EntityId) -> Option<SharedRoom> {
        let room_id = self.member_rooms.get(&entity_id)?;
        self.rooms.get(room_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Members across all rooms
    pub fn member_count(&self) -> usize {
        self.member_rooms.len()
    }

    /// Summary of every room (for logs and metrics)
    pub fn list_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .values()
            .map(|shared| {
                let room = shared.lock();
                RoomInfo {
                    id: room.id().to_string(),
                    entity_count: room.entity_count(),
                    phase: room.phase(),
                    age_secs: room.age().as_secs(),
                }
            })
            .collect()
    }

    /// Rooms with a round in progress
    pub fn playing_count(&self) -> usize {
        self.rooms
            .values()
            .filter(|room| room.lock().phase() == Phase::Playing)
            .count()
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new(100, crate::game::constants::room::MAX_PLAYERS, true)
    }
}

/// Room information for listing
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub id: String,
    pub entity_count: usize,
    pub phase: Phase,
    pub age_secs: u64,
}

/// Directory errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("Too many rooms")]
    TooManyRooms,
    #[error("Room is full")]
    RoomFull,
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room already exists")]
    RoomExists,
    #[error("Already in a room")]
    AlreadyInRoom,
    #[error("Not in a room")]
    NotInRoom,
    #[error("Invalid room id")]
    InvalidRoomId,
}

impl From<RoomError> for DirectoryError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::RoomFull => DirectoryError::RoomFull,
            RoomError::DuplicateEntity => DirectoryError::AlreadyInRoom,
        }
    }
}
