//! WebSocket transport

pub mod handler;
pub mod hub;
pub mod protocol;
