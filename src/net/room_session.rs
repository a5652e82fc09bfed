//! Message dispatcher between connections and the room directory
//!
//! Synchronous: one client message in, deliveries out through `emit`.
//! Each room sits behind its own lock and its deliveries are emitted while
//! that lock is held, so every recipient sees a room's updates in the order
//! they were applied. The transport owns the streams; every room rule can
//! be exercised without a network.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::game::state::EntityId;
use crate::lobby::manager::RoomDirectory;
use crate::lobby::naming::sanitize_player_name;
use crate::lobby::room::{GameRoom, MoveOutcome};
use crate::metrics::Metrics;
use crate::net::protocol::{ClientMessage, ServerMessage};

/// One outgoing message and who should receive it
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: Vec<EntityId>,
    pub message: ServerMessage,
}

impl Delivery {
    pub fn to_one(id: EntityId, message: ServerMessage) -> Self {
        Self {
            to: vec![id],
            message,
        }
    }

    /// Every current member of `room`
    pub fn to_room(room: &GameRoom, message: ServerMessage) -> Self {
        Self {
            to: room.entity_ids(),
            message,
        }
    }
}

/// Shared front of the room directory; safe to call from many tasks
pub struct RoomSession {
    directory: Mutex<RoomDirectory>,
    metrics: Arc<Metrics>,
}

impl RoomSession {
    pub fn new(directory: RoomDirectory, metrics: Arc<Metrics>) -> Self {
        Self {
            directory: Mutex::new(directory),
            metrics,
        }
    }

    /// Lock the directory (membership only; rooms have their own locks)
    pub fn directory(&self) -> MutexGuard<'_, RoomDirectory> {
        self.directory.lock()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Handle one message from `sender` at server time `now_ms`
    pub fn handle<E>(&self, sender: EntityId, message: ClientMessage, now_ms: u64, mut emit: E)
    where
        E: FnMut(Delivery),
    {
        match message {
            ClientMessage::JoinRoom { room_id, player_name } => {
                self.join(sender, Some(&room_id), &player_name, &mut emit)
            }
            ClientMessage::CreateRoom { player_name } => {
                self.join(sender, None, &player_name, &mut emit)
            }
            ClientMessage::SetChaser { entity_id } => {
                let target = entity_id.unwrap_or(sender);
                self.with_room(sender, &mut emit, |room, _| {
                    if room.set_chaser(target) {
                        debug!("Room {}: chaser is now {}", room.id(), target);
                        vec![Delivery::to_room(room, ServerMessage::RoomUpdated(room.snapshot()))]
                    } else {
                        Vec::new()
                    }
                })
            }
            ClientMessage::SetEmoji { emoji } => self.with_room(sender, &mut emit, |room, _| {
                match room.set_emoji(sender, &emoji) {
                    Some(emoji) => vec![Delivery::to_room(
                        room,
                        ServerMessage::EmojiUpdated {
                            entity_id: sender,
                            emoji,
                        },
                    )],
                    None => Vec::new(),
                }
            }),
            ClientMessage::SetObstaclesEnabled { enabled } => {
                self.with_room(sender, &mut emit, |room, _| {
                    room.set_obstacles_enabled(enabled);
                    debug!("Room {}: obstacles enabled = {}", room.id(), enabled);
                    vec![
                        Delivery::to_room(
                            room,
                            ServerMessage::ObstaclesUpdated {
                                enabled,
                                obstacles: room.active_obstacles().to_vec(),
                            },
                        ),
                        Delivery::to_room(room, ServerMessage::RoomUpdated(room.snapshot())),
                    ]
                })
            }
            ClientMessage::StartGame => {
                self.with_room(sender, &mut emit, |room, metrics| match room.start() {
                    Ok(()) => {
                        Metrics::incr(&metrics.rounds_started);
                        vec![Delivery::to_room(room, ServerMessage::GameStarted(room.snapshot()))]
                    }
                    Err(reason) => {
                        debug!("Room {}: start refused ({})", room.id(), reason);
                        vec![Delivery::to_one(sender, ServerMessage::StartRejected { reason })]
                    }
                })
            }
            ClientMessage::Move { directions } => self.with_room(sender, &mut emit, |room, metrics| {
                match room.apply_move(sender, directions) {
                    MoveOutcome::Moved { caught, round_over, .. } => {
                        Metrics::incr(&metrics.moves_accepted);
                        Metrics::add(&metrics.captures, caught.len() as u64);
                        if round_over {
                            Metrics::incr(&metrics.rounds_finished);
                        }
                        vec![Delivery::to_room(room, ServerMessage::GameUpdated(room.snapshot()))]
                    }
                    MoveOutcome::Blocked | MoveOutcome::Ignored => {
                        Metrics::incr(&metrics.moves_rejected);
                        Vec::new()
                    }
                }
            }),
            ClientMessage::NewRound => self.with_room(sender, &mut emit, |room, _| {
                room.reset();
                vec![
                    Delivery::to_room(room, ServerMessage::NewRound),
                    Delivery::to_room(room, ServerMessage::RoomUpdated(room.snapshot())),
                ]
            }),
            ClientMessage::Leave => self.leave(sender, &mut emit),
            ClientMessage::Ping { timestamp } => emit(Delivery::to_one(
                sender,
                ServerMessage::Pong {
                    client_timestamp: timestamp,
                    server_timestamp: now_ms,
                },
            )),
        }
    }

    /// Connection closed: same as an explicit leave
    pub fn disconnect<E>(&self, sender: EntityId, mut emit: E)
    where
        E: FnMut(Delivery),
    {
        self.leave(sender, &mut emit)
    }

    /// Join `room_id`, or a freshly generated room when `None`
    fn join<E>(&self, sender: EntityId, room_id: Option<&str>, raw_name: &str, emit: &mut E)
    where
        E: FnMut(Delivery),
    {
        let reject = |reason: String| {
            Delivery::to_one(sender, ServerMessage::JoinRejected { reason })
        };

        let Some(name) = sanitize_player_name(raw_name) else {
            warn!("Rejecting join with empty/invalid name");
            emit(reject("Invalid player name".to_string()));
            return;
        };

        let mut directory = self.directory.lock();
        let room_id = match room_id {
            Some(room_id) => room_id.to_string(),
            None => match directory.unused_room_id(&mut rand::thread_rng()) {
                Ok(room_id) => room_id,
                Err(e) => {
                    warn!("Cannot create a room for '{}': {}", name, e);
                    emit(reject(e.to_string()));
                    return;
                }
            },
        };

        let receipt = match directory.join(&room_id, sender, &name) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Rejecting join of '{}' to '{}': {}", name, room_id.trim(), e);
                emit(reject(e.to_string()));
                return;
            }
        };
        self.sync_directory_gauges(&directory);
        info!("{} joined room {}", receipt.entity.name, receipt.room_id);

        let Some(shared) = directory.get(&receipt.room_id) else {
            return;
        };
        let room = shared.lock();
        let snapshot = room.snapshot();
        emit(Delivery::to_one(
            sender,
            ServerMessage::Joined {
                entity: receipt.entity,
                room: snapshot.clone(),
            },
        ));
        emit(Delivery::to_room(&room, ServerMessage::RoomUpdated(snapshot)));
    }

    fn leave<E>(&self, sender: EntityId, emit: &mut E)
    where
        E: FnMut(Delivery),
    {
        let mut directory = self.directory.lock();
        let receipt = match directory.leave(sender) {
            Ok(receipt) => receipt,
            Err(_) => return,
        };
        self.sync_directory_gauges(&directory);
        info!("{} left room {}", receipt.entity.name, receipt.room_id);

        if receipt.finished_round {
            Metrics::incr(&self.metrics.rounds_finished);
        }
        if receipt.evicted {
            return;
        }
        let Some(shared) = directory.get(&receipt.room_id) else {
            return;
        };
        let room = shared.lock();
        emit(Delivery::to_room(&room, ServerMessage::RoomUpdated(room.snapshot())));
    }

    /// Run `f` on the sender's room and emit its deliveries before the
    /// room is released. Non-members get nothing back.
    fn with_room<E, F>(&self, sender: EntityId, emit: &mut E, f: F)
    where
        E: FnMut(Delivery),
        F: FnOnce(&mut GameRoom, &Metrics) -> Vec<Delivery>,
    {
        let Some(shared) = self.directory.lock().room_of(sender) else {
            debug!("Dropping request from {} (not in a room)", sender);
            return;
        };
        let mut room = shared.lock();
        for delivery in f(&mut *room, &self.metrics) {
            emit(delivery);
        }
    }

    /// Refresh the playing-rooms gauge and log a per-room summary
    pub fn report(&self) {
        use std::sync::atomic::Ordering;
        let directory = self.directory.lock();
        let playing = directory.playing_count();
        self.metrics
            .rooms_playing
            .store(playing as u64, Ordering::Relaxed);

        let rooms = directory.list_rooms();
        if !rooms.is_empty() {
            info!("{} rooms open, {} playing", rooms.len(), playing);
        }
        for room in rooms {
            debug!(
                "Room {}: {} members, {:?}, up {}s",
                room.id, room.entity_count, room.phase, room.age_secs
            );
        }
    }

    fn sync_directory_gauges(&self, directory: &RoomDirectory) {
        use std::sync::atomic::Ordering;
        self.metrics
            .rooms_active
            .store(directory.room_count() as u64, Ordering::Relaxed);
        self.metrics
            .players_connected
            .store(directory.member_count() as u64, Ordering::Relaxed);
    }
}
