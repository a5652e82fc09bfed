//! Motion resolver
//!
//! Turns a movement intent into a candidate position, clamps it to the board
//! and rejects it outright when it would overlap an obstacle. There is no
//! sliding: a blocked move leaves the entity where it was.

use serde::{Deserialize, Serialize};

use crate::game::constants::collision::{ENTITY_RADIUS, OBSTACLE_RADIUS};
use crate::game::constants::movement::DIAGONAL_FACTOR;
use crate::game::geometry::{circles_overlap, clamp_to_board};
use crate::game::state::{Board, Obstacle};
use crate::util::vec2::Vec2;

/// Cardinal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn bit(self) -> u8 {
        match self {
            Direction::Up => 0b0001,
            Direction::Down => 0b0010,
            Direction::Left => 0b0100,
            Direction::Right => 0b1000,
        }
    }

    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::UP,
            Direction::Down => Vec2::DOWN,
            Direction::Left => Vec2::LEFT,
            Direction::Right => Vec2::RIGHT,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Set of requested directions; iteration order is always up, down, left, right
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Direction>", into = "Vec<Direction>")]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn single(direction: Direction) -> Self {
        Self {
            bits: direction.bit(),
        }
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.insert(direction);
        self
    }

    pub fn insert(&mut self, direction: Direction) {
        self.bits |= direction.bit();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.bits &= !direction.bit();
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.bits & direction.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl From<Vec<Direction>> for DirectionSet {
    fn from(directions: Vec<Direction>) -> Self {
        directions.into_iter().collect()
    }
}

impl From<DirectionSet> for Vec<Direction> {
    fn from(set: DirectionSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::empty();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

/// Result of resolving one movement intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The entity may occupy this position
    Moved(Vec2),
    /// Nothing happens this tick
    Rejected,
}

impl Resolution {
    pub fn position(self) -> Option<Vec2> {
        match self {
            Resolution::Moved(position) => Some(position),
            Resolution::Rejected => None,
        }
    }
}

/// True if an entity centred at `position` would overlap any obstacle
pub fn blocked_by_obstacle(position: Vec2, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|obstacle| {
        circles_overlap(position, ENTITY_RADIUS, obstacle.position(), OBSTACLE_RADIUS)
    })
}

/// Resolve a direction-set move.
///
/// One direction moves `speed` on its axis. Two or more apply
/// `speed * DIAGONAL_FACTOR` for every requested direction, each clamped to
/// the board as it is applied, so opposite pairs cancel and three or more
/// directions are not renormalized.
pub fn resolve_move(
    position: Vec2,
    directions: DirectionSet,
    speed: f32,
    board: &Board,
    obstacles: &[Obstacle],
) -> Resolution {
    if directions.is_empty() {
        return Resolution::Rejected;
    }

    let step = if directions.len() == 1 {
        speed
    } else {
        speed * DIAGONAL_FACTOR
    };

    let mut candidate = position;
    for direction in directions.iter() {
        candidate = clamp_to_board(candidate + direction.unit() * step, board);
    }

    accept_unless_blocked(candidate, obstacles)
}

/// Resolve an arbitrary displacement (used by the opponent controller)
pub fn resolve_step(
    position: Vec2,
    displacement: Vec2,
    board: &Board,
    obstacles: &[Obstacle],
) -> Resolution {
    if !displacement.is_finite() {
        return Resolution::Rejected;
    }
    accept_unless_blocked(clamp_to_board(position + displacement, board), obstacles)
}

fn accept_unless_blocked(candidate: Vec2, obstacles: &[Obstacle]) -> Resolution {
    if blocked_by_obstacle(candidate, obstacles) {
        Resolution::Rejected
    } else {
        Resolution::Moved(candidate)
    }
}
