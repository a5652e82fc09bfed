//! Rooms and the directory that owns them
//!
//! Handles room lifecycle, member assignment and name hygiene.

pub mod room;
pub mod manager;
pub mod naming;
