pub mod constants;
pub mod geometry;
pub mod state;
pub mod systems;
pub mod throttle;
pub mod solo;
