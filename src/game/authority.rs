//! Acceptance policy for client-reported player state

use crate::ws::protocol::LocationUpdate;

use super::session::Player;

/// Decides what happens to a state update before it is stored and relayed.
/// Returning `None` drops the update.
pub trait StateAuthority: Send + Sync {
    fn review(&self, player: &Player, update: LocationUpdate) -> Option<LocationUpdate>;
}

/// Clients own their own state; updates pass through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClientTrust;

impl StateAuthority for ClientTrust {
    fn review(&self, _player: &Player, update: LocationUpdate) -> Option<LocationUpdate> {
        Some(update)
    }
}
