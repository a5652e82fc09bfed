//! Capture detection
//!
//! Asymmetric by role: only the chaser catches, only chased entities are
//! caught. Both sides use the same entity radius, so a capture is a centre
//! distance below `CAPTURE_DISTANCE`.

use crate::game::constants::collision::ENTITY_RADIUS;
use crate::game::geometry::circles_overlap;
use crate::game::state::{Entity, EntityId, Role};

/// Mark every active chased entity touching the active chaser as caught.
///
/// Returns the ids caught by this pass, in entity order.
pub fn detect_captures(entities: &mut [Entity]) -> Vec<EntityId> {
    let chaser = match entities
        .iter()
        .find(|e| e.role == Role::Chaser && e.is_alive)
    {
        Some(chaser) => chaser.position,
        None => return Vec::new(),
    };

    let mut caught = Vec::new();
    for entity in entities
        .iter_mut()
        .filter(|e| e.role == Role::Chased && e.is_active())
    {
        if circles_overlap(chaser, ENTITY_RADIUS, entity.position, ENTITY_RADIUS) {
            entity.mark_caught();
            caught.push(entity.id);
        }
    }
    caught
}

/// Number of chased entities still alive and uncaught in this round
pub fn remaining_chased(entities: &[Entity]) -> usize {
    entities
        .iter()
        .filter(|e| e.role == Role::Chased && e.is_active())
        .count()
}

/// The round ends once no chased entity remains in play
pub fn is_round_over(entities: &[Entity]) -> bool {
    remaining_chased(entities) == 0
}
