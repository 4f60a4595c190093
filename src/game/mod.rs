//! Game simulation modules

pub mod combat;
pub mod physics;
pub mod player;
pub mod tick;
pub mod world;

pub use world::World;
