pub mod movement;
pub mod obstacles;
pub mod capture;
pub mod ai;
