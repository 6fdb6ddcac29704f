//! Connection hub - per-connection outbound queues and fan-out delivery

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;
use uuid::Uuid;

use crate::game::relay::{Outbound, Scope};
use crate::ws::protocol::ServerMsg;

/// Outbound queue depth per connection
pub const OUTBOUND_CAPACITY: usize = 256;

/// Every open connection, joined or not
pub struct ConnectionHub {
    conns: DashMap<Uuid, mpsc::Sender<ServerMsg>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
        }
    }

    /// Open a queue for a new connection
    pub fn register(&self, conn_id: Uuid) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        self.conns.insert(conn_id, tx);
        rx
    }

    pub fn unregister(&self, conn_id: &Uuid) {
        self.conns.remove(conn_id);
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Deliver in order. Never blocks: a full or closed queue loses the
    /// message for that connection only.
    pub fn dispatch(&self, out: Vec<Outbound>) {
        for Outbound { scope, msg } in out {
            match scope {
                Scope::Only(conn_id) => {
                    if let Some(tx) = self.conns.get(&conn_id) {
                        deliver(&conn_id, tx.value(), msg);
                    }
                }
                Scope::All | Scope::AllExcept(_) => {
                    for entry in self.conns.iter() {
                        if scope.includes(entry.key()) {
                            deliver(entry.key(), entry.value(), msg.clone());
                        }
                    }
                }
            }
        }
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(conn_id: &Uuid, tx: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
    match tx.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(msg)) => {
            warn!(conn_id = %conn_id, event = msg.name(), "Outbound queue full, dropping");
        }
        Err(TrySendError::Closed(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::Receiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut msgs = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    #[tokio::test]
    async fn dispatch_honours_scope() {
        let hub = ConnectionHub::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);

        hub.dispatch(vec![
            Outbound::all(ServerMsg::DeleteItem(1)),
            Outbound::all_except(a, ServerMsg::DeleteItem(2)),
            Outbound::only(a, ServerMsg::DeleteItem(3)),
        ]);

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMsg::DeleteItem(1), ServerMsg::DeleteItem(3)]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMsg::DeleteItem(1), ServerMsg::DeleteItem(2)]
        );
    }

    #[tokio::test]
    async fn unregistered_connections_get_nothing() {
        let hub = ConnectionHub::new();
        let a = Uuid::new_v4();
        let mut rx_a = hub.register(a);
        hub.unregister(&a);
        assert!(hub.is_empty());

        hub.dispatch(vec![Outbound::all(ServerMsg::DeleteItem(1))]);
        assert!(rx_a.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let hub = ConnectionHub::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);

        let flood = (0..OUTBOUND_CAPACITY as u64 + 10)
            .map(|i| Outbound::all(ServerMsg::DeleteItem(i)))
            .collect();
        hub.dispatch(flood);

        assert_eq!(drain(&mut rx_a).len(), OUTBOUND_CAPACITY);
        assert_eq!(drain(&mut rx_b).len(), OUTBOUND_CAPACITY);
    }
}
