//! Core game state definitions
//!
//! Entities, obstacles, roles and phases shared by the room state machine,
//! the movement resolver and the opponent controller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::{board, room};
use crate::util::vec2::Vec2;

/// Unique entity identifier (one per connection or bot)
pub type EntityId = Uuid;

/// Rectangular board extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: f32,
    pub height: f32,
}

impl Board {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Smallest legal position (margin applied)
    pub fn min_position(&self) -> Vec2 {
        Vec2::new(board::MARGIN, board::MARGIN)
    }

    /// Largest legal position (margin applied)
    pub fn max_position(&self) -> Vec2 {
        Vec2::new(self.width - board::MARGIN, self.height - board::MARGIN)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(board::WIDTH, board::HEIGHT)
    }
}

/// Role an entity plays in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Chaser,
    Chased,
}

impl Role {
    /// The role this role plays against
    pub fn opponent(self) -> Role {
        match self {
            Role::Chaser => Role::Chased,
            Role::Chased => Role::Chaser,
        }
    }
}

/// Room lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Lobby: players join and pick roles
    Waiting,
    /// Round in progress
    Playing,
    /// Every chased entity has been caught
    Finished,
}

/// A participant (human or bot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub emoji: String,
    pub role: Role,
    pub position: Vec2,
    pub is_alive: bool,
    pub is_caught: bool,
}

impl Entity {
    pub fn new(id: EntityId, name: String) -> Self {
        Self {
            id,
            name,
            emoji: room::DEFAULT_EMOJI.to_string(),
            role: Role::Chased,
            position: Vec2::ZERO,
            is_alive: true,
            is_caught: false,
        }
    }

    pub fn is_chaser(&self) -> bool {
        self.role == Role::Chaser
    }

    /// Still in play: alive and not caught
    pub fn is_active(&self) -> bool {
        self.is_alive && !self.is_caught
    }

    pub fn mark_caught(&mut self) {
        self.is_caught = true;
        self.is_alive = false;
    }

    /// Back to the lobby defaults, keeping identity, role and glyph
    pub fn reset_for_lobby(&mut self) {
        self.position = Vec2::ZERO;
        self.is_alive = true;
        self.is_caught = false;
    }
}

/// Static obstacle placed for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub glyph: String,
}

impl Obstacle {
    pub fn new(position: Vec2, glyph: impl Into<String>) -> Self {
        Self {
            x: position.x,
            y: position.y,
            glyph: glyph.into(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}
