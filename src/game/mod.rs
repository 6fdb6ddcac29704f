//! Session and event-relay engine

pub mod authority;
pub mod items;
pub mod relay;
pub mod scheduler;
pub mod session;
pub mod spawn;
pub mod world;

pub use scheduler::run_item_spawner;
pub use world::{World, WorldState};
