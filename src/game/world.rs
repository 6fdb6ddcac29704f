//! World state and the coordinating owner that serializes all mutations

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::map::WallGrid;
use crate::ws::hub::ConnectionHub;
use crate::ws::protocol::{ClientMsg, LocationUpdate, ServerMsg};

use super::authority::{ClientTrust, StateAuthority};
use super::items::{ItemRegistry, SpawnSkip};
use super::relay::{relay, BulletIds, Outbound};
use super::session::{SessionError, SessionRegistry};
use super::spawn::SpawnPlacer;

/// All mutable game state. Handlers take `&mut self` and return what
/// should be sent, so they run without a transport.
pub struct WorldState {
    sessions: SessionRegistry,
    items: ItemRegistry,
    placer: SpawnPlacer,
    bullets: BulletIds,
    rng: ChaCha8Rng,
    authority: Box<dyn StateAuthority>,
}

impl WorldState {
    pub fn new(config: &GameConfig, walls: WallGrid) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        Self {
            sessions: SessionRegistry::new(config.initial_health),
            items: ItemRegistry::new(config.max_items),
            placer: SpawnPlacer::new(walls, config),
            bullets: BulletIds::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            authority: Box::new(ClientTrust),
        }
    }

    pub fn with_authority(mut self, authority: impl StateAuthority + 'static) -> Self {
        self.authority = Box::new(authority);
        self
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    /// Dispatch one inbound event from `sender`
    pub fn handle(&mut self, sender: Uuid, msg: ClientMsg) -> Vec<Outbound> {
        if let ClientMsg::Username(nickname) = msg {
            return self.join(sender, nickname);
        }

        if !self.sessions.contains(&sender) {
            debug!(conn_id = %sender, event = msg.name(), "Event before join, dropping");
            return Vec::new();
        }

        match msg {
            ClientMsg::EatItem(item_id) => self.eat_item(sender, item_id),
            ClientMsg::SendLocation(update) => self.send_location(sender, update),
            other => relay(sender, other, &mut self.bullets).into_iter().collect(),
        }
    }

    fn join(&mut self, conn_id: Uuid, nickname: String) -> Vec<Outbound> {
        let player = match self
            .sessions
            .join(conn_id, nickname, &self.placer, &mut self.rng)
        {
            Ok(player) => player,
            Err(e @ SessionError::AlreadyJoined(_)) => {
                warn!(conn_id = %conn_id, error = %e, "Ignoring repeated join");
                return Vec::new();
            }
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Join failed");
                return Vec::new();
            }
        };

        info!(
            conn_id = %conn_id,
            nickname = %player.nickname,
            x = player.x,
            y = player.y,
            player_count = self.sessions.len(),
            "Player joined"
        );

        let mut out = vec![
            Outbound::only(conn_id, ServerMsg::UserId(conn_id)),
            Outbound::only(conn_id, ServerMsg::ItemInit(self.items.positions())),
        ];
        out.extend(
            self.sessions
                .snapshot()
                .iter()
                .map(|p| Outbound::only(conn_id, ServerMsg::JoinUser(p.info()))),
        );
        out.push(Outbound::all_except(
            conn_id,
            ServerMsg::JoinUser(player.info()),
        ));
        out
    }

    fn send_location(&mut self, sender: Uuid, update: LocationUpdate) -> Vec<Outbound> {
        let Some(player) = self.sessions.get_mut(&sender) else {
            return Vec::new();
        };
        let Some(update) = self.authority.review(player, update) else {
            debug!(conn_id = %sender, "State update rejected");
            return Vec::new();
        };
        player.apply(&update);

        relay(sender, ClientMsg::SendLocation(update), &mut self.bullets)
            .into_iter()
            .collect()
    }

    fn eat_item(&mut self, sender: Uuid, item_id: u64) -> Vec<Outbound> {
        match self.items.consume(item_id) {
            Some(_) => {
                debug!(
                    conn_id = %sender,
                    item_id,
                    live_items = self.items.len(),
                    "Item consumed"
                );
                vec![Outbound::all_except(sender, ServerMsg::DeleteItem(item_id))]
            }
            None => {
                debug!(conn_id = %sender, item_id, "Item already gone");
                Vec::new()
            }
        }
    }

    /// Drop the connection's player, if it ever joined
    pub fn disconnect(&mut self, conn_id: Uuid, reason: &str) -> Vec<Outbound> {
        match self.sessions.leave(&conn_id) {
            Some(player) => {
                info!(
                    conn_id = %conn_id,
                    nickname = %player.nickname,
                    reason,
                    player_count = self.sessions.len(),
                    "Player left"
                );
                vec![Outbound::all_except(conn_id, ServerMsg::LeaveUser(conn_id))]
            }
            None => {
                debug!(conn_id = %conn_id, reason, "Connection closed before joining");
                Vec::new()
            }
        }
    }

    /// One scheduler tick: spawn an item if below capacity
    pub fn spawn_tick(&mut self) -> Vec<Outbound> {
        match self.items.try_spawn(&self.placer, &mut self.rng) {
            Ok(item) => {
                info!(
                    item_id = item.id,
                    x = item.x,
                    y = item.y,
                    live_items = self.items.len(),
                    "Item spawned"
                );
                vec![Outbound::all(ServerMsg::SpawnItem(item.into()))]
            }
            Err(SpawnSkip::AtCapacity) => {
                debug!(live_items = self.items.len(), "Item cap reached");
                Vec::new()
            }
            Err(SpawnSkip::NoFreeTile) => {
                warn!("Item spawn skipped, no free tile");
                Vec::new()
            }
        }
    }
}

/// Shared handle: one lock around the world, delivery to the hub happens
/// while it is held so broadcasts follow mutation order.
pub struct World {
    state: Mutex<WorldState>,
    hub: Arc<ConnectionHub>,
}

impl World {
    pub fn new(state: WorldState, hub: Arc<ConnectionHub>) -> Self {
        Self {
            state: Mutex::new(state),
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn handle(&self, sender: Uuid, msg: ClientMsg) {
        let mut state = self.state.lock();
        let out = state.handle(sender, msg);
        self.hub.dispatch(out);
    }

    pub fn disconnect(&self, conn_id: Uuid, reason: &str) {
        let mut state = self.state.lock();
        let out = state.disconnect(conn_id, reason);
        self.hub.dispatch(out);
    }

    pub fn spawn_tick(&self) {
        let mut state = self.state.lock();
        let out = state.spawn_tick();
        self.hub.dispatch(out);
    }

    pub fn player_count(&self) -> usize {
        self.state.lock().sessions().len()
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().items().len()
    }
}
