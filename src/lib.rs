//! Chase Arena Server Library
//!
//! A room-based chase game server using WebTransport: one chaser, one or
//! more chased, an obstacle layout per round, and an autonomous opponent
//! for solo play.
//!
//! # Features
//!
//! - `metrics_extended` - per-message handling time percentiles (enabled by default)

pub mod config;
pub mod util;
pub mod game;
pub mod lobby;
pub mod net;
pub mod metrics;
