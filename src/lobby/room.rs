use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::game::constants::movement::BASE_SPEED;
use crate::game::constants::{obstacles, room};
use crate::game::geometry::clamp_to_board;
use crate::game::state::{Board, Entity, EntityId, Obstacle, Phase, Role};
use crate::game::systems::capture::{detect_captures, is_round_over};
use crate::game::systems::movement::{resolve_move, resolve_step, DirectionSet, Resolution};
use crate::game::systems::obstacles::generate;
use crate::net::protocol::RoomSnapshot;
use crate::util::vec2::Vec2;

/// Why a round could not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum StartError {
    #[error("Need at least {} players", room::MIN_PLAYERS)]
    NeedPlayers,
    #[error("Someone has to be the chaser")]
    NeedChaser,
    #[error("Round already in progress")]
    InProgress,
}

impl StartError {
    /// Reason category as sent to clients
    pub fn reason(&self) -> &'static str {
        match self {
            StartError::NeedPlayers => "needPlayers",
            StartError::NeedChaser => "needChaser",
            StartError::InProgress => "inProgress",
        }
    }
}

/// Room errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,
    #[error("Entity already in room")]
    DuplicateEntity,
}

/// Result of a movement intent
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Not playing, unknown entity, or entity already caught
    Ignored,
    /// Resolver rejected the move; nothing changed
    Blocked,
    /// Position written; lists anyone caught by this move
    Moved {
        position: Vec2,
        caught: Vec<EntityId>,
        round_over: bool,
    },
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

/// Room state machine: waiting -> playing -> finished -> waiting
pub struct GameRoom {
    id: String,
    phase: Phase,
    board: Board,
    max_players: usize,
    /// Join order; chased spawn rows follow it
    entities: Vec<Entity>,
    obstacles: Vec<Obstacle>,
    obstacles_enabled: bool,
    created_at: Instant,
}

impl GameRoom {
    pub fn new(id: impl Into<String>, max_players: usize, obstacles_enabled: bool) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Waiting,
            board: Board::default(),
            max_players: max_players.clamp(room::MIN_PLAYERS, room::MAX_PLAYERS),
            entities: Vec::new(),
            obstacles: Vec::new(),
            obstacles_enabled,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= self.max_players
    }

    pub fn obstacles_enabled(&self) -> bool {
        self.obstacles_enabled
    }

    /// Obstacles that take part in movement; empty while disabled
    pub fn active_obstacles(&self) -> &[Obstacle] {
        if self.obstacles_enabled {
            &self.obstacles
        } else {
            &[]
        }
    }

    pub fn chaser(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.role == Role::Chaser)
    }

    /// Add an entity as chased at the sentinel position.
    ///
    /// Valid in any phase. A mid-round joiner is in play at once and lands on
    /// the board with their first move.
    pub fn join(&mut self, id: EntityId, name: impl Into<String>) -> Result<Entity, RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        if self.entity(id).is_some() {
            return Err(RoomError::DuplicateEntity);
        }

        let entity = Entity::new(id, name.into());
        debug!("{} joined room {} ({:?})", entity.name, self.id, self.phase);
        self.entities.push(entity.clone());
        Ok(entity)
    }

    /// Remove an entity. Mid-round, the round ends if no chased entity is left.
    pub fn leave(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        let entity = self.entities.remove(index);

        if self.phase == Phase::Playing && is_round_over(&self.entities) {
            info!("Room {} finished: last chased entity left", self.id);
            self.phase = Phase::Finished;
        }
        Some(entity)
    }

    /// Make `id` the only chaser. No change when `id` is not in the room.
    pub fn set_chaser(&mut self, id: EntityId) -> bool {
        if self.entity(id).is_none() {
            return false;
        }
        for entity in &mut self.entities {
            entity.role = if entity.id == id {
                Role::Chaser
            } else {
                Role::Chased
            };
        }
        true
    }

    /// Set a display glyph. Returns the stored value, or `None` if ignored.
    pub fn set_emoji(&mut self, id: EntityId, emoji: &str) -> Option<String> {
        let emoji: String = emoji.trim().chars().take(room::MAX_EMOJI_CHARS).collect();
        if emoji.is_empty() {
            return None;
        }
        let entity = self.entity_mut(id)?;
        entity.emoji = emoji.clone();
        Some(emoji)
    }

    pub fn set_obstacles_enabled(&mut self, enabled: bool) {
        self.set_obstacles_enabled_with_rng(enabled, &mut rand::thread_rng());
    }

    /// Toggle obstacles; enabling with none stored lays them out around the
    /// current positions.
    pub fn set_obstacles_enabled_with_rng<R: Rng>(&mut self, enabled: bool, rng: &mut R) {
        self.obstacles_enabled = enabled;
        if enabled && self.obstacles.is_empty() {
            let positions: Vec<Vec2> = self.entities.iter().map(|e| e.position).collect();
            self.obstacles = generate(&self.board, &positions, obstacles::COUNT, rng);
        }
    }

    pub fn start(&mut self) -> Result<(), StartError> {
        self.start_with_rng(&mut rand::thread_rng())
    }

    /// Position everyone, lay out obstacles and begin the round
    pub fn start_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<(), StartError> {
        if self.phase == Phase::Playing {
            return Err(StartError::InProgress);
        }
        if self.entities.len() < room::MIN_PLAYERS {
            return Err(StartError::NeedPlayers);
        }
        if self.chaser().is_none() {
            return Err(StartError::NeedChaser);
        }

        let board = self.board;
        let mut chased_index = 0usize;
        for entity in &mut self.entities {
            let spawn = match entity.role {
                Role::Chaser => Vec2::new(room::CHASER_SPAWN_X, board.height / 2.0),
                Role::Chased => {
                    let row = room::CHASED_SPAWN_TOP
                        + room::CHASED_SPAWN_SPACING * chased_index as f32;
                    chased_index += 1;
                    Vec2::new(board.width - room::CHASED_SPAWN_INSET, row)
                }
            };
            entity.position = clamp_to_board(spawn, &board);
            entity.is_alive = true;
            entity.is_caught = false;
        }

        self.obstacles = if self.obstacles_enabled {
            let positions: Vec<Vec2> = self.entities.iter().map(|e| e.position).collect();
            generate(&board, &positions, obstacles::COUNT, rng)
        } else {
            Vec::new()
        };

        self.phase = Phase::Playing;
        info!(
            "Room {} started with {} entities and {} obstacles",
            self.id,
            self.entities.len(),
            self.obstacles.len()
        );
        Ok(())
    }

    /// Apply a direction-set move at base speed
    pub fn apply_move(&mut self, id: EntityId, directions: DirectionSet) -> MoveOutcome {
        self.apply_with(id, |position, board, obstacles| {
            resolve_move(position, directions, BASE_SPEED, board, obstacles)
        })
    }

    /// Apply a free displacement (bot steps)
    pub fn apply_step(&mut self, id: EntityId, displacement: Vec2) -> MoveOutcome {
        self.apply_with(id, |position, board, obstacles| {
            resolve_step(position, displacement, board, obstacles)
        })
    }

    fn apply_with<F>(&mut self, id: EntityId, resolve: F) -> MoveOutcome
    where
        F: FnOnce(Vec2, &Board, &[Obstacle]) -> Resolution,
    {
        if self.phase != Phase::Playing {
            return MoveOutcome::Ignored;
        }
        let current = match self.entity(id) {
            Some(entity) if entity.is_active() => entity.position,
            _ => return MoveOutcome::Ignored,
        };

        let position = match resolve(current, &self.board, self.active_obstacles()) {
            Resolution::Moved(position) => position,
            Resolution::Rejected => return MoveOutcome::Blocked,
        };
        if let Some(entity) = self.entity_mut(id) {
            entity.position = position;
        }

        let caught = detect_captures(&mut self.entities);
        let round_over = is_round_over(&self.entities);
        if round_over {
            info!("Room {} finished: every chased entity caught", self.id);
            self.phase = Phase::Finished;
        }

        MoveOutcome::Moved {
            position,
            caught,
            round_over,
        }
    }

    /// Back to the lobby from any phase; obstacles are regenerated on next start
    pub fn reset(&mut self) {
        for entity in &mut self.entities {
            entity.reset_for_lobby();
        }
        self.obstacles.clear();
        self.phase = Phase::Waiting;
        debug!("Room {} reset", self.id);
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            phase: self.phase,
            board: self.board,
            obstacles: self.active_obstacles().to_vec(),
            obstacles_enabled: self.obstacles_enabled,
            entities: self.entities.clone(),
        }
    }

    /// Get room age
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}
