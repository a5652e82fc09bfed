//! Solo mode: one human against the autonomous opponent
//!
//! Runs entirely in-process on a private [`GameRoom`], so the bot goes
//! through the same motion resolver and capture rule as any human.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use uuid::Uuid;

use crate::game::state::{EntityId, Phase, Role};
use crate::game::systems::ai::{Difficulty, OpponentController};
use crate::game::systems::movement::DirectionSet;
use crate::game::throttle::InputThrottle;
use crate::lobby::naming::sanitize_player_name;
use crate::lobby::room::{GameRoom, MoveOutcome, RoomError, StartError};
use crate::net::protocol::RoomSnapshot;

const SOLO_ROOM_ID: &str = "solo";
const BOT_NAME: &str = "AI";
const FALLBACK_NAME: &str = "Player";

#[derive(Debug, thiserror::Error)]
pub enum SoloError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Start(#[from] StartError),
}

/// A running solo match
pub struct SoloMatch {
    room: GameRoom,
    human: EntityId,
    bot: EntityId,
    controller: OpponentController,
    throttle: InputThrottle,
    rng: StdRng,
}

impl SoloMatch {
    pub fn new(
        name: &str,
        human_role: Role,
        difficulty: Difficulty,
        obstacles_enabled: bool,
    ) -> Result<Self, SoloError> {
        Self::with_rng(name, human_role, difficulty, obstacles_enabled, StdRng::from_entropy())
    }

    /// Same as `new` with a caller-supplied rng (deterministic layouts and bot choices)
    pub fn with_rng(
        name: &str,
        human_role: Role,
        difficulty: Difficulty,
        obstacles_enabled: bool,
        mut rng: StdRng,
    ) -> Result<Self, SoloError> {
        let name = sanitize_player_name(name).unwrap_or_else(|| FALLBACK_NAME.to_string());
        let mut room = GameRoom::new(SOLO_ROOM_ID, 2, obstacles_enabled);

        let human = Uuid::new_v4();
        let bot = Uuid::new_v4();
        room.join(human, name)?;
        room.join(bot, BOT_NAME)?;

        let bot_role = human_role.opponent();
        room.set_chaser(match human_role {
            Role::Chaser => human,
            Role::Chased => bot,
        });

        let controller = OpponentController::new(bot_role, difficulty);
        room.set_emoji(bot, controller.emoji());
        room.start_with_rng(&mut rng)?;

        info!(
            "Solo match started: human {:?} vs {:?} bot ({:?})",
            human_role, bot_role, difficulty
        );

        Ok(Self {
            room,
            human,
            bot,
            controller,
            throttle: InputThrottle::default(),
            rng,
        })
    }

    /// Advance the bot by one frame and report the phase
    pub fn frame(&mut self, now_ms: u64) -> Phase {
        if self.room.phase() != Phase::Playing {
            return self.room.phase();
        }
        let (Some(me), Some(opponent)) = (self.room.entity(self.bot), self.room.entity(self.human))
        else {
            return self.room.phase();
        };
        let (me, opponent) = (me.position, opponent.position);
        let board = *self.room.board();

        let decision = self
            .controller
            .update(now_ms, me, opponent, &board, &mut self.rng);
        if let Some(step) = decision.and_then(|d| d.step) {
            self.room.apply_step(self.bot, step);
        }
        self.room.phase()
    }

    /// Apply a human move, at most once per intent interval.
    ///
    /// An empty set does not use up the interval.
    pub fn steer(&mut self, now_ms: u64, directions: DirectionSet) -> MoveOutcome {
        if directions.is_empty() || !self.throttle.allow(now_ms) {
            return MoveOutcome::Ignored;
        }
        self.room.apply_move(self.human, directions)
    }

    /// Play again with the same roles and difficulty
    pub fn restart(&mut self) -> Result<(), StartError> {
        self.room.reset();
        self.room.start_with_rng(&mut self.rng)?;
        self.controller = OpponentController::new(self.controller.role(), self.controller.difficulty());
        self.throttle.reset();
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.room.phase()
    }

    pub fn room(&self) -> &GameRoom {
        &self.room
    }

    pub fn human_id(&self) -> EntityId {
        self.human
    }

    pub fn bot_id(&self) -> EntityId {
        self.bot
    }

    pub fn controller(&self) -> &OpponentController {
        &self.controller
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        self.room.snapshot()
    }

    /// True once the human has caught the bot (or been caught)
    pub fn human_won(&self) -> Option<bool> {
        if self.room.phase() != Phase::Finished {
            return None;
        }
        let bot_caught = self.room.entity(self.bot).map_or(false, |e| e.is_caught);
        let human_caught = self.room.entity(self.human).map_or(false, |e| e.is_caught);
        match self.controller.role() {
            Role::Chased => Some(bot_caught),
            Role::Chaser => Some(!human_caught),
        }
    }
}
