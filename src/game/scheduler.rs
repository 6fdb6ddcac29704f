//! Periodic item spawner

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use super::world::World;

/// Attempt one item spawn every `period`, first attempt after one full period.
pub async fn run_item_spawner(world: Arc<World>, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "Item spawner started");

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        world.spawn_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::world::WorldState;
    use crate::map::WallGrid;
    use crate::ws::hub::ConnectionHub;
    use crate::ws::protocol::ServerMsg;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn spawns_on_each_period_up_to_cap() {
        let config = GameConfig {
            max_items: 2,
            rng_seed: Some(5),
            ..GameConfig::default()
        };
        let hub = Arc::new(ConnectionHub::new());
        let mut rx = hub.register(Uuid::new_v4());
        let world = Arc::new(World::new(
            WorldState::new(&config, WallGrid::open(60, 60)),
            hub,
        ));

        let period = Duration::from_secs(10);
        let task = tokio::spawn(run_item_spawner(world.clone(), period));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(world.item_count(), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(world.item_count(), 2);

        let mut spawned = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ServerMsg::SpawnItem(item) = msg {
                spawned.push(item.id);
            }
        }
        assert_eq!(spawned, vec![0, 1]);

        task.abort();
    }
}
