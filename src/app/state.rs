//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{World, WorldState};
use crate::map::WallGrid;
use crate::ws::hub::ConnectionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<World>,
}

impl AppState {
    pub fn new(config: Config, walls: WallGrid) -> Self {
        let config = Arc::new(config);

        // Every open socket, joined or not
        let hub = Arc::new(ConnectionHub::new());

        let world = Arc::new(World::new(WorldState::new(&config.game, walls), hub));

        Self { config, world }
    }
}
