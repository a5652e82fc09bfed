//! Pure geometry helpers used by movement, layout and capture

use crate::game::state::Board;
use crate::util::vec2::Vec2;

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance_to(b)
}

/// Clamp a position into the board minus its margin
#[inline]
pub fn clamp_to_board(position: Vec2, board: &Board) -> Vec2 {
    position.clamp(board.min_position(), board.max_position())
}

/// Two circles overlap when their centres are closer than the sum of radii
#[inline]
pub fn circles_overlap(p1: Vec2, r1: f32, p2: Vec2, r2: f32) -> bool {
    distance(p1, p2) < r1 + r2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Vec2::new(7.0, 7.0), Vec2::new(7.0, 7.0)), 0.0);
    }

    #[test]
    fn test_clamp_to_board() {
        let board = Board::default();
        assert_eq!(clamp_to_board(Vec2::new(0.0, 0.0), &board), Vec2::new(20.0, 20.0));
        assert_eq!(
            clamp_to_board(Vec2::new(1000.0, 700.0), &board),
            Vec2::new(780.0, 580.0)
        );
        assert_eq!(
            clamp_to_board(Vec2::new(400.0, 300.0), &board),
            Vec2::new(400.0, 300.0)
        );
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        let a = Vec2::new(100.0, 100.0);
        assert!(circles_overlap(a, 15.0, Vec2::new(134.0, 100.0), 20.0));
        assert!(!circles_overlap(a, 15.0, Vec2::new(135.0, 100.0), 20.0));
    }
}
