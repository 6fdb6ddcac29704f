//! Static map data

pub mod walls;

pub use walls::{MapError, WallGrid};
