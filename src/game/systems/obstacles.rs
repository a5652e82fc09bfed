//! Obstacle layout generator
//!
//! Places a fixed number of obstacles by rejection sampling, keeping clear of
//! every entity and of the reserved movement corridors, then guarantees that
//! no entity starts the round boxed in.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::game::constants::board::MARGIN;
use crate::game::constants::movement::BASE_SPEED;
use crate::game::constants::obstacles::*;
use crate::game::geometry::distance;
use crate::game::state::{Board, Obstacle};
use crate::game::systems::movement::{resolve_move, Direction, DirectionSet, Resolution};
use crate::util::vec2::Vec2;

/// Generate a full layout: placement followed by the path-guarantee pass.
///
/// May return fewer than `count` obstacles when the retry budget runs out.
pub fn generate<R: Rng>(
    board: &Board,
    entities: &[Vec2],
    count: usize,
    rng: &mut R,
) -> Vec<Obstacle> {
    let mut obstacles = place(board, entities, count, rng);
    ensure_movement_paths(&mut obstacles, board, entities);
    obstacles
}

/// Rejection-sample up to `count` obstacle positions
pub fn place<R: Rng>(
    board: &Board,
    entities: &[Vec2],
    count: usize,
    rng: &mut R,
) -> Vec<Obstacle> {
    let mut obstacles = Vec::with_capacity(count);

    for _ in 0..count {
        let found = (0..MAX_ATTEMPTS)
            .map(|_| sample_position(board, rng))
            .find(|candidate| is_valid_position(*candidate, entities));

        match found {
            Some(position) => {
                let glyph = GLYPHS.choose(rng).copied().unwrap_or(GLYPHS[0]);
                obstacles.push(Obstacle::new(position, glyph));
            }
            None => debug!("No valid obstacle position after {} attempts", MAX_ATTEMPTS),
        }
    }

    obstacles
}

/// Remove obstacles around any entity that cannot take a single cardinal step
pub fn ensure_movement_paths(obstacles: &mut Vec<Obstacle>, board: &Board, entities: &[Vec2]) {
    for &entity in entities {
        if has_clear_direction(entity, board, obstacles) {
            continue;
        }
        let before = obstacles.len();
        obstacles.retain(|obstacle| distance(entity, obstacle.position()) > PATH_CLEAR_RADIUS);
        debug!(
            "Entity at ({:.0}, {:.0}) boxed in, cleared {} obstacles",
            entity.x,
            entity.y,
            before - obstacles.len()
        );
    }
}

/// True if at least one of the four cardinal single steps is unobstructed
pub fn has_clear_direction(position: Vec2, board: &Board, obstacles: &[Obstacle]) -> bool {
    Direction::ALL.into_iter().any(|direction| {
        matches!(
            resolve_move(
                position,
                DirectionSet::single(direction),
                BASE_SPEED,
                board,
                obstacles,
            ),
            Resolution::Moved(_)
        )
    })
}

fn sample_position<R: Rng>(board: &Board, rng: &mut R) -> Vec2 {
    Vec2::new(
        sample_axis(MARGIN, board.width - MARGIN, rng),
        sample_axis(MARGIN, board.height - MARGIN, rng),
    )
}

fn sample_axis<R: Rng>(low: f32, high: f32, rng: &mut R) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

fn is_valid_position(candidate: Vec2, entities: &[Vec2]) -> bool {
    !too_close_to_entities(candidate, entities) && !blocks_corridor(candidate, entities)
}

fn too_close_to_entities(candidate: Vec2, entities: &[Vec2]) -> bool {
    entities
        .iter()
        .any(|entity| distance(*entity, candidate) < ENTITY_CLEARANCE)
}

fn blocks_corridor(candidate: Vec2, entities: &[Vec2]) -> bool {
    entities.iter().any(|entity| {
        let near_row = (candidate.y - entity.y).abs() < CORRIDOR_REACH;

        let left = entity.x < LEFT_CORRIDOR_TRIGGER_X
            && (candidate.x - LEFT_CORRIDOR_X).abs() < CORRIDOR_HALF_WIDTH
            && near_row;
        let right = entity.x > RIGHT_CORRIDOR_TRIGGER_X
            && (candidate.x - RIGHT_CORRIDOR_X).abs() < CORRIDOR_HALF_WIDTH
            && near_row;
        let center = candidate.x > CENTER_CORRIDOR_MIN_X
            && candidate.x < CENTER_CORRIDOR_MAX_X
            && (candidate.y - CENTER_CORRIDOR_Y).abs() < CORRIDOR_HALF_WIDTH;

        left || right || center
    })
}
