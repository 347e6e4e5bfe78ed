pub mod drive_core;
pub mod physics;
pub mod state;
pub mod vehicle;
