/// Board geometry - fixed for the lifetime of a room
pub mod board {
    /// Logical board width
    pub const WIDTH: f32 = 800.0;
    /// Logical board height
    pub const HEIGHT: f32 = 600.0;
    /// Entities never get closer than this to any board edge
    pub const MARGIN: f32 = 20.0;
}

/// Movement constants
pub mod movement {
    /// Displacement per accepted move for a single direction
    pub const BASE_SPEED: f32 = 5.0;
    /// Per-axis factor applied when more than one direction is requested (1/sqrt 2)
    pub const DIAGONAL_FACTOR: f32 = 0.707_106_78;
    /// Client-side intent cadence in Hz
    pub const INTENT_RATE_HZ: u32 = 20;
    /// Minimum gap between two intents in milliseconds
    pub const INTENT_INTERVAL_MS: u64 = 1000 / INTENT_RATE_HZ as u64;
}

/// Collision radii and thresholds
pub mod collision {
    /// Assumed radius of every entity
    pub const ENTITY_RADIUS: f32 = 15.0;
    /// Fixed radius of every obstacle
    pub const OBSTACLE_RADIUS: f32 = 20.0;
    /// Chaser and chased closer than this (centre to centre) is a capture
    pub const CAPTURE_DISTANCE: f32 = ENTITY_RADIUS * 2.0;
}

/// Obstacle layout constants
pub mod obstacles {
    /// Obstacles requested per round
    pub const COUNT: usize = 10;
    /// Sampling attempts per obstacle before it is dropped
    pub const MAX_ATTEMPTS: u32 = 100;
    /// Minimum distance between a candidate and any entity at placement time
    pub const ENTITY_CLEARANCE: f32 = 100.0;
    /// Half-width of every reserved corridor
    pub const CORRIDOR_HALF_WIDTH: f32 = 40.0;
    /// Vertical reach of the side corridors around an entity
    pub const CORRIDOR_REACH: f32 = 100.0;
    /// Left corridor centre line and the entity x below which it applies
    pub const LEFT_CORRIDOR_X: f32 = 100.0;
    pub const LEFT_CORRIDOR_TRIGGER_X: f32 = 200.0;
    /// Right corridor centre line and the entity x above which it applies
    pub const RIGHT_CORRIDOR_X: f32 = 700.0;
    pub const RIGHT_CORRIDOR_TRIGGER_X: f32 = 600.0;
    /// Horizontal corridor through the middle third of the board
    pub const CENTER_CORRIDOR_Y: f32 = 300.0;
    pub const CENTER_CORRIDOR_MIN_X: f32 = 300.0;
    pub const CENTER_CORRIDOR_MAX_X: f32 = 500.0;
    /// Obstacles within this distance of a boxed-in entity are removed
    pub const PATH_CLEAR_RADIUS: f32 = 80.0;
    /// Glyphs an obstacle may render as
    pub const GLYPHS: [&str; 8] = ["🪨", "🌳", "🏠", "🚗", "📦", "🪑", "🗿", "🛡️"];
}

/// Room lifecycle constants
pub mod room {
    /// Minimum entities required to start a round
    pub const MIN_PLAYERS: usize = 2;
    /// Hard cap on entities per room (keeps every chased spawn row on the board)
    pub const MAX_PLAYERS: usize = 8;
    /// Chaser spawn x (y is the vertical centre)
    pub const CHASER_SPAWN_X: f32 = 50.0;
    /// Chased spawn column, measured from the right edge
    pub const CHASED_SPAWN_INSET: f32 = 100.0;
    /// First chased spawn row and spacing between rows
    pub const CHASED_SPAWN_TOP: f32 = 100.0;
    pub const CHASED_SPAWN_SPACING: f32 = 80.0;
    /// Glyph shown for a human until they pick one
    pub const DEFAULT_EMOJI: &str = "💀";
    /// Longest accepted emoji string (in chars)
    pub const MAX_EMOJI_CHARS: usize = 8;
}

/// Autonomous opponent constants
pub mod ai {
    /// Chased bot flees when the opponent is closer than this
    pub const FLEE_RADIUS: f32 = 150.0;
    /// Chaser bot stops when already this close to its target
    pub const PURSUIT_STOP_DISTANCE: f32 = 5.0;
    /// Size of the square corner zones that trigger an escape
    pub const CORNER_ZONE: f32 = 60.0;
    /// Reconsiderations spent escaping a corner
    pub const CORNER_ESCAPE_TICKS: u32 = 30;
    /// Momentum armed while escaping a corner
    pub const CORNER_ESCAPE_MOMENTUM: u32 = 10;
    /// Displacement below which a reconsideration counts as stuck
    pub const STUCK_DISPLACEMENT: f32 = 2.0;
    /// Stuck reconsiderations before all exploration state is dropped
    pub const STUCK_RESET_THRESHOLD: u32 = 10;
    /// Momentum is only honoured while stuck count is below this
    pub const MOMENTUM_STUCK_LIMIT: u32 = 5;
    /// A target closer than this counts as reached
    pub const TARGET_REACHED_DISTANCE: f32 = 20.0;
    /// Candidates closer than this to the bot are never picked
    pub const TARGET_MIN_DISTANCE: f32 = 50.0;
    /// Weight of the bot's own distance in the target score
    pub const TARGET_SELF_DISTANCE_WEIGHT: f32 = 0.2;
    /// Target persistence range in reconsiderations, `[min, max)`
    pub const TARGET_PERSISTENCE_MIN: u32 = 30;
    pub const TARGET_PERSISTENCE_MAX: u32 = 50;
    /// Momentum duration range in reconsiderations, `[min, max)`
    pub const MOMENTUM_MIN: u32 = 5;
    pub const MOMENTUM_MAX: u32 = 15;
    /// Steps toward a target shorter than this are skipped
    pub const MIN_STEP_DISTANCE: f32 = 2.0;
    /// Glyphs for the solo bot
    pub const CHASER_EMOJI: &str = "🤖";
    pub const CHASED_EMOJI: &str = "👾";
}

/// Networking constants
pub mod net {
    /// Maximum reliable message size
    pub const MAX_MESSAGE_SIZE: usize = 65536;
    /// Longest accepted player name (in chars)
    pub const MAX_NAME_CHARS: usize = 16;
    /// Longest accepted room id
    pub const MAX_ROOM_ID_LEN: usize = 16;
    /// Length of generated room ids
    pub const GENERATED_ROOM_ID_LEN: usize = 6;
    /// Draws before giving up on finding a free generated id
    pub const ROOM_ID_ATTEMPTS: usize = 32;
}
