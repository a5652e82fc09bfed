//! Autonomous opponent controller
//!
//! Drives the solo-mode bot. Each reconsideration first runs the mode
//! transition and then acts on the chosen [`BotMode`]. The controller only
//! proposes a displacement; the room routes it through the motion resolver
//! like any human move.
//!
//! Chased transition order, highest priority first:
//!
//! | Condition | Mode |
//! |---|---|
//! | escape budget running, or entering a corner zone | `CornerEscape` |
//! | opponent closer than `FLEE_RADIUS` | `Flee` |
//! | momentum left and stuck count below limit | `ExploreMomentum` |
//! | target kept, persistence left, not yet reached | `ExploreTarget` |
//! | a fresh target scores | `ExploreTarget` |
//! | otherwise | `ExploreRandom` |
//!
//! A chaser is always in `Pursue`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::constants::ai::*;
use crate::game::constants::movement::BASE_SPEED;
use crate::game::geometry::distance;
use crate::game::state::{Board, Role};
use crate::game::systems::movement::Direction;
use crate::util::vec2::Vec2;

/// Named difficulty tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            "nightmare" => Some(Self::Nightmare),
            _ => None,
        }
    }

    /// Fixed tuning for this tier when playing `role`
    pub fn profile(self, role: Role) -> DifficultyProfile {
        let (chaser, chased, reaction_interval_ms, pathfinding_accuracy) = match self {
            Difficulty::Easy => (1.1, 1.15, 100, 0.7),
            Difficulty::Medium => (1.12, 1.17, 50, 0.85),
            Difficulty::Hard => (1.2, 1.15, 10, 0.95),
            Difficulty::Nightmare => (3.0, 2.5, 16, 1.0),
        };
        DifficultyProfile {
            speed_multiplier: match role {
                Role::Chaser => chaser,
                Role::Chased => chased,
            },
            reaction_interval_ms,
            pathfinding_accuracy,
        }
    }
}

/// Tuning numbers for one tier and role
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub speed_multiplier: f32,
    /// Minimum real time between two reconsiderations
    pub reaction_interval_ms: u64,
    /// Reserved tuning hook; no behaviour reads it yet
    pub pathfinding_accuracy: f32,
}

impl DifficultyProfile {
    /// Displacement length of one bot step
    pub fn step_length(&self) -> f32 {
        BASE_SPEED * self.speed_multiplier
    }
}

/// Behaviour state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    /// Head straight for the opponent
    Pursue,
    /// Move directly away from a nearby opponent
    Flee,
    /// Time-boxed run toward the board centre
    CornerEscape,
    /// Coast along the last committed direction
    ExploreMomentum,
    /// Walk toward an exploration waypoint
    ExploreTarget,
    /// Single random cardinal step
    ExploreRandom,
}

/// Outcome of one reconsideration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub mode: BotMode,
    /// Proposed displacement; `None` means stay put this time
    pub step: Option<Vec2>,
}

/// Per-bot scratch state, kept apart from the authoritative entity record
#[derive(Debug, Clone)]
pub struct OpponentController {
    role: Role,
    difficulty: Difficulty,
    profile: DifficultyProfile,
    mode: BotMode,
    last_update_ms: Option<u64>,
    last_position: Option<Vec2>,
    stuck_ticks: u32,
    target: Option<Vec2>,
    target_persistence: u32,
    momentum: Option<Vec2>,
    momentum_ticks: u32,
    escaping: bool,
    escape_ticks: u32,
}

impl OpponentController {
    pub fn new(role: Role, difficulty: Difficulty) -> Self {
        Self {
            role,
            difficulty,
            profile: difficulty.profile(role),
            mode: match role {
                Role::Chaser => BotMode::Pursue,
                Role::Chased => BotMode::ExploreTarget,
            },
            last_update_ms: None,
            last_position: None,
            stuck_ticks: 0,
            target: None,
            target_persistence: 0,
            momentum: None,
            momentum_ticks: 0,
            escaping: false,
            escape_ticks: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Mode chosen by the most recent reconsideration
    pub fn mode(&self) -> BotMode {
        self.mode
    }

    /// Glyph the bot renders with for its role
    pub fn emoji(&self) -> &'static str {
        match self.role {
            Role::Chaser => CHASER_EMOJI,
            Role::Chased => CHASED_EMOJI,
        }
    }

    /// Reconsider at `now_ms`.
    ///
    /// Returns `None` while the reaction interval has not elapsed since the
    /// previous reconsideration. The first call always runs.
    pub fn update<R: Rng>(
        &mut self,
        now_ms: u64,
        me: Vec2,
        opponent: Vec2,
        board: &Board,
        rng: &mut R,
    ) -> Option<Decision> {
        if let Some(last) = self.last_update_ms {
            if now_ms.saturating_sub(last) < self.profile.reaction_interval_ms {
                return None;
            }
        }
        self.last_update_ms = Some(now_ms);

        let mode = self.select_mode(me, opponent, board, rng);
        self.mode = mode;
        let step = self.act(mode, me, opponent, board, rng);
        Some(Decision { mode, step })
    }

    /// Transition function: picks the mode for this reconsideration and
    /// performs the bookkeeping tied to entering it.
    fn select_mode<R: Rng>(
        &mut self,
        me: Vec2,
        opponent: Vec2,
        board: &Board,
        rng: &mut R,
    ) -> BotMode {
        if self.role == Role::Chaser {
            return BotMode::Pursue;
        }

        self.track_stuck(me);

        if !self.escaping && in_corner_zone(me, board) {
            self.escaping = true;
            self.escape_ticks = CORNER_ESCAPE_TICKS;
            self.clear_target();
        }
        if self.escaping {
            return BotMode::CornerEscape;
        }

        if distance(me, opponent) < FLEE_RADIUS {
            return BotMode::Flee;
        }

        if self.stuck_ticks > STUCK_RESET_THRESHOLD {
            self.clear_target();
            self.clear_momentum();
            self.stuck_ticks = 0;
        }

        if self.momentum.is_some()
            && self.momentum_ticks > 0
            && self.stuck_ticks < MOMENTUM_STUCK_LIMIT
        {
            return BotMode::ExploreMomentum;
        }

        if let Some(target) = self.target {
            if self.target_persistence > 0 && distance(me, target) > TARGET_REACHED_DISTANCE {
                self.target_persistence -= 1;
                return BotMode::ExploreTarget;
            }
        }

        match pick_target(me, opponent, board) {
            Some(target) => {
                self.target = Some(target);
                self.target_persistence =
                    rng.gen_range(TARGET_PERSISTENCE_MIN..TARGET_PERSISTENCE_MAX);
                BotMode::ExploreTarget
            }
            None => BotMode::ExploreRandom,
        }
    }

    fn act<R: Rng>(
        &mut self,
        mode: BotMode,
        me: Vec2,
        opponent: Vec2,
        board: &Board,
        rng: &mut R,
    ) -> Option<Vec2> {
        let speed = self.profile.step_length();

        match mode {
            BotMode::Pursue => {
                let (direction, gap) = (opponent - me).normalize_with_length();
                (gap >= PURSUIT_STOP_DISTANCE).then(|| direction * speed)
            }
            BotMode::Flee => {
                self.clear_momentum();
                self.clear_target();
                let mut direction = (me - opponent).normalize();
                if direction == Vec2::ZERO {
                    // Standing on the opponent: any way out will do.
                    direction = (board.center() - me).normalize();
                }
                (direction != Vec2::ZERO).then(|| direction * speed)
            }
            BotMode::CornerEscape => {
                self.escape_ticks = self.escape_ticks.saturating_sub(1);
                if self.escape_ticks == 0 {
                    self.escaping = false;
                    return None;
                }
                let direction = (board.center() - me).normalize();
                if direction == Vec2::ZERO {
                    return None;
                }
                self.momentum = Some(direction);
                self.momentum_ticks = CORNER_ESCAPE_MOMENTUM;
                Some(direction * speed)
            }
            BotMode::ExploreMomentum => {
                self.momentum_ticks -= 1;
                self.momentum.map(|direction| direction * speed)
            }
            BotMode::ExploreTarget => {
                let target = self.target?;
                let (direction, gap) = (target - me).normalize_with_length();
                if gap <= MIN_STEP_DISTANCE {
                    return None;
                }
                self.momentum = Some(direction);
                self.momentum_ticks = rng.gen_range(MOMENTUM_MIN..MOMENTUM_MAX);
                Some(direction * speed)
            }
            BotMode::ExploreRandom => Direction::ALL
                .choose(rng)
                .map(|direction| direction.unit() * speed),
        }
    }

    fn track_stuck(&mut self, me: Vec2) {
        let moved = self
            .last_position
            .map_or(f32::INFINITY, |last| distance(last, me));
        if moved < STUCK_DISPLACEMENT {
            self.stuck_ticks += 1;
        } else {
            self.stuck_ticks = 0;
        }
        self.last_position = Some(me);
    }

    fn clear_target(&mut self) {
        self.target = None;
        self.target_persistence = 0;
    }

    fn clear_momentum(&mut self) {
        self.momentum = None;
        self.momentum_ticks = 0;
    }
}

/// True inside any of the four square corner zones
pub fn in_corner_zone(position: Vec2, board: &Board) -> bool {
    let near_left = position.x < CORNER_ZONE;
    let near_right = position.x > board.width - CORNER_ZONE;
    let near_top = position.y < CORNER_ZONE;
    let near_bottom = position.y > board.height - CORNER_ZONE;
    (near_left || near_right) && (near_top || near_bottom)
}

/// Twelve fixed waypoints: corners, edge midpoints and quarter points
pub fn exploration_waypoints(board: &Board) -> [Vec2; 12] {
    let (w, h) = (board.width, board.height);
    [
        Vec2::new(100.0, 100.0),
        Vec2::new(w - 100.0, 100.0),
        Vec2::new(100.0, h - 100.0),
        Vec2::new(w - 100.0, h - 100.0),
        Vec2::new(w / 2.0, 100.0),
        Vec2::new(w / 2.0, h - 100.0),
        Vec2::new(100.0, h / 2.0),
        Vec2::new(w - 100.0, h / 2.0),
        Vec2::new(w / 4.0, h / 4.0),
        Vec2::new(3.0 * w / 4.0, h / 4.0),
        Vec2::new(w / 4.0, 3.0 * h / 4.0),
        Vec2::new(3.0 * w / 4.0, 3.0 * h / 4.0),
    ]
}

/// Best waypoint: far from the opponent, not too far from us, never on top of us
pub fn pick_target(me: Vec2, opponent: Vec2, board: &Board) -> Option<Vec2> {
    exploration_waypoints(board)
        .into_iter()
        .filter(|waypoint| distance(*waypoint, me) > TARGET_MIN_DISTANCE)
        .map(|waypoint| {
            let score = distance(waypoint, opponent)
                - distance(waypoint, me) * TARGET_SELF_DISTANCE_WEIGHT;
            (waypoint, score)
        })
        .fold(None, |best: Option<(Vec2, f32)>, candidate| match best {
            Some((_, best_score)) if best_score >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(waypoint, _)| waypoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPSILON: f32 = 1e-4;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_difficulty_tables() {
        let chaser: Vec<f32> = Difficulty::ALL
            .iter()
            .map(|d| d.profile(Role::Chaser).speed_multiplier)
            .collect();
        assert_eq!(chaser, vec![1.1, 1.12, 1.2, 3.0]);

        let chased: Vec<f32> = Difficulty::ALL
            .iter()
            .map(|d| d.profile(Role::Chased).speed_multiplier)
            .collect();
        assert_eq!(chased, vec![1.15, 1.17, 1.15, 2.5]);

        let reaction: Vec<u64> = Difficulty::ALL
            .iter()
            .map(|d| d.profile(Role::Chaser).reaction_interval_ms)
            .collect();
        assert_eq!(reaction, vec![100, 50, 10, 16]);

        assert_eq!(Difficulty::Hard.profile(Role::Chased).pathfinding_accuracy, 0.95);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Nightmare"), Some(Difficulty::Nightmare));
        assert_eq!(Difficulty::parse(" easy "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("impossible"), None);
    }

    #[test]
    fn test_reaction_throttle() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chaser, Difficulty::Easy);
        let me = Vec2::new(100.0, 300.0);
        let them = Vec2::new(400.0, 300.0);
        let mut rng = rng();

        assert!(bot.update(1_000, me, them, &board, &mut rng).is_some());
        assert!(bot.update(1_050, me, them, &board, &mut rng).is_none());
        assert!(bot.update(1_099, me, them, &board, &mut rng).is_none());
        assert!(bot.update(1_100, me, them, &board, &mut rng).is_some());
    }

    #[test]
    fn test_pursuit_step() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chaser, Difficulty::Medium);
        let decision = bot
            .update(0, Vec2::new(100.0, 300.0), Vec2::new(400.0, 300.0), &board, &mut rng())
            .unwrap();
        assert_eq!(decision.mode, BotMode::Pursue);
        let step = decision.step.unwrap();
        assert!((step.x - 5.0 * 1.12).abs() < EPSILON);
        assert!(step.y.abs() < EPSILON);
    }

    #[test]
    fn test_pursuit_holds_when_close() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chaser, Difficulty::Hard);
        let decision = bot
            .update(0, Vec2::new(100.0, 300.0), Vec2::new(103.0, 300.0), &board, &mut rng())
            .unwrap();
        assert_eq!(decision.step, None);
    }

    #[test]
    fn test_flee_moves_away_and_drops_momentum() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Easy);
        bot.momentum = Some(Vec2::RIGHT);
        bot.momentum_ticks = 7;
        bot.target = Some(Vec2::new(700.0, 500.0));
        bot.target_persistence = 20;

        let decision = bot
            .update(0, Vec2::new(400.0, 300.0), Vec2::new(400.0, 200.0), &board, &mut rng())
            .unwrap();

        assert_eq!(decision.mode, BotMode::Flee);
        let step = decision.step.unwrap();
        assert!(step.x.abs() < EPSILON);
        assert!((step.y - 5.0 * 1.15).abs() < EPSILON);
        assert_eq!(bot.momentum, None);
        assert_eq!(bot.target, None);
    }

    #[test]
    fn test_flee_on_top_of_opponent_still_moves() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Easy);
        let spot = Vec2::new(200.0, 300.0);
        let decision = bot.update(0, spot, spot, &board, &mut rng()).unwrap();
        assert_eq!(decision.mode, BotMode::Flee);
        let step = decision.step.unwrap();
        assert!(step.is_finite());
        assert!(step.x > 0.0);
    }

    #[test]
    fn test_corner_escape_budget() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Hard);
        let mut rng = rng();
        let corner = Vec2::new(30.0, 30.0);
        let opponent = Vec2::new(60.0, 60.0);

        // Escape overrides flee even with the opponent right there.
        for tick in 0..(CORNER_ESCAPE_TICKS - 1) as u64 {
            let decision = bot.update(tick * 10, corner, opponent, &board, &mut rng).unwrap();
            assert_eq!(decision.mode, BotMode::CornerEscape);
            let step = decision.step.unwrap();
            assert!(step.x > 0.0 && step.y > 0.0);
        }

        let last = bot
            .update((CORNER_ESCAPE_TICKS as u64) * 10, corner, opponent, &board, &mut rng)
            .unwrap();
        assert_eq!(last, Decision { mode: BotMode::CornerEscape, step: None });
        assert!(!bot.escaping);
        assert_eq!(bot.momentum_ticks, CORNER_ESCAPE_MOMENTUM);
    }

    #[test]
    fn test_corner_zone_detection() {
        let board = Board::default();
        assert!(in_corner_zone(Vec2::new(59.0, 59.0), &board));
        assert!(in_corner_zone(Vec2::new(741.0, 541.0), &board));
        assert!(!in_corner_zone(Vec2::new(30.0, 300.0), &board));
        assert!(!in_corner_zone(Vec2::new(60.0, 60.0), &board));
    }

    #[test]
    fn test_pick_target_scores() {
        let board = Board::default();
        let target = pick_target(Vec2::new(400.0, 300.0), Vec2::new(100.0, 100.0), &board);
        assert_eq!(target, Some(Vec2::new(700.0, 500.0)));
    }

    #[test]
    fn test_pick_target_skips_nearby_waypoints() {
        let board = Board::default();
        let me = Vec2::new(700.0, 500.0);
        let target = pick_target(me, Vec2::new(100.0, 100.0), &board).unwrap();
        assert!(distance(target, me) > TARGET_MIN_DISTANCE);
    }

    #[test]
    fn test_explore_then_coast() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Easy);
        let mut rng = rng();
        let me = Vec2::new(400.0, 300.0);
        let opponent = Vec2::new(100.0, 100.0);

        let first = bot.update(0, me, opponent, &board, &mut rng).unwrap();
        assert_eq!(first.mode, BotMode::ExploreTarget);
        assert_eq!(bot.target, Some(Vec2::new(700.0, 500.0)));
        assert!((TARGET_PERSISTENCE_MIN..TARGET_PERSISTENCE_MAX).contains(&bot.target_persistence));
        assert!((MOMENTUM_MIN..MOMENTUM_MAX).contains(&bot.momentum_ticks));

        let step = first.step.unwrap();
        let moved = me + step;
        let second = bot.update(100, moved, opponent, &board, &mut rng).unwrap();
        assert_eq!(second.mode, BotMode::ExploreMomentum);
        assert!(second.step.unwrap().approx_eq(step, EPSILON));
    }

    #[test]
    fn test_stuck_bot_resets_exploration() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Hard);
        let mut rng = rng();
        let me = Vec2::new(400.0, 300.0);
        let opponent = Vec2::new(100.0, 100.0);

        // Position never changes, as if every step were rejected.
        for tick in 0..=STUCK_RESET_THRESHOLD as u64 {
            bot.update(tick * 10, me, opponent, &board, &mut rng);
        }
        assert_eq!(bot.stuck_ticks, STUCK_RESET_THRESHOLD);

        let decision = bot
            .update((STUCK_RESET_THRESHOLD as u64 + 1) * 10, me, opponent, &board, &mut rng)
            .unwrap();
        assert_eq!(bot.stuck_ticks, 0);
        assert_eq!(decision.mode, BotMode::ExploreTarget);
    }

    #[test]
    fn test_stuck_bot_skips_momentum() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Hard);
        let mut rng = rng();
        bot.stuck_ticks = MOMENTUM_STUCK_LIMIT;
        bot.last_position = Some(Vec2::new(400.0, 300.0));
        bot.momentum = Some(Vec2::LEFT);
        bot.momentum_ticks = 3;

        let decision = bot
            .update(0, Vec2::new(400.0, 300.0), Vec2::new(100.0, 100.0), &board, &mut rng)
            .unwrap();
        assert_eq!(decision.mode, BotMode::ExploreTarget);
    }

    #[test]
    fn test_random_step_is_cardinal() {
        let board = Board::default();
        let mut bot = OpponentController::new(Role::Chased, Difficulty::Easy);
        let step = bot
            .act(BotMode::ExploreRandom, Vec2::new(400.0, 300.0), Vec2::ZERO, &board, &mut rng())
            .unwrap();
        assert!((step.length() - 5.0 * 1.15).abs() < EPSILON);
        assert!(step.x.abs() < EPSILON || step.y.abs() < EPSILON);
    }

    #[test]
    fn test_bot_emoji() {
        assert_eq!(OpponentController::new(Role::Chaser, Difficulty::Easy).emoji(), "🤖");
        assert_eq!(OpponentController::new(Role::Chased, Difficulty::Easy).emoji(), "👾");
    }
}
