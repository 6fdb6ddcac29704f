//! Event relay - fan-out rules for gameplay events
//!
//! Things a client initiates and predicts locally (movement, collisions,
//! item pickup) go to everyone else. Anything that needs a server-issued id,
//! or that every client must see confirmed, goes to everyone.

use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Who receives an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every connection, sender included
    All,
    /// Every connection except this one
    AllExcept(Uuid),
    /// Just this connection
    Only(Uuid),
}

impl Scope {
    pub fn includes(&self, conn_id: &Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::AllExcept(id) => id != conn_id,
            Scope::Only(id) => id == conn_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub scope: Scope,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn all(msg: ServerMsg) -> Self {
        Self {
            scope: Scope::All,
            msg,
        }
    }

    pub fn all_except(id: Uuid, msg: ServerMsg) -> Self {
        Self {
            scope: Scope::AllExcept(id),
            msg,
        }
    }

    pub fn only(id: Uuid, msg: ServerMsg) -> Self {
        Self {
            scope: Scope::Only(id),
            msg,
        }
    }
}

/// Process-wide bullet id source
#[derive(Debug, Default)]
pub struct BulletIds {
    next: u64,
}

impl BulletIds {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Route a relayed event. `username` and `eat_item` touch registries and
/// are handled by the world, so they yield `None` here.
pub fn relay(sender: Uuid, msg: ClientMsg, bullets: &mut BulletIds) -> Option<Outbound> {
    let out = match msg {
        ClientMsg::SendLocation(update) => {
            Outbound::all_except(sender, ServerMsg::UpdateState(update))
        }
        ClientMsg::ShootBullet(mut shot) => {
            shot.insert("bulletId".to_string(), bullets.next_id().into());
            Outbound::all(ServerMsg::Bullets(shot))
        }
        ClientMsg::ShootFire(data) => Outbound::all(ServerMsg::Fires(data)),
        ClientMsg::Knifeswing(data) => Outbound::all(ServerMsg::Knifeswings(data)),
        ClientMsg::Bombthrowing(data) => Outbound::all(ServerMsg::Bombs(data)),
        ClientMsg::Collision(data) => Outbound::all_except(sender, ServerMsg::Deletebullet(data)),
        ClientMsg::Death(report) | ClientMsg::Deathknife(report) => {
            Outbound::all(ServerMsg::Killed(report))
        }
        ClientMsg::Username(_) | ClientMsg::EatItem(_) => return None,
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{KillReport, LocationUpdate};
    use serde_json::json;

    fn relay_value(msg: ClientMsg) -> (Uuid, Outbound) {
        let sender = Uuid::new_v4();
        let out = relay(sender, msg, &mut BulletIds::default()).unwrap();
        (sender, out)
    }

    #[test]
    fn scope_membership() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(Scope::All.includes(&a));
        assert!(!Scope::AllExcept(a).includes(&a));
        assert!(Scope::AllExcept(a).includes(&b));
        assert!(Scope::Only(a).includes(&a));
        assert!(!Scope::Only(a).includes(&b));
    }

    #[test]
    fn bullets_get_increasing_ids_and_reach_everyone() {
        let sender = Uuid::new_v4();
        let mut bullets = BulletIds::default();
        let shot = json!({"x": 10, "y": 20, "angle": 0});

        let mut ids = Vec::new();
        for _ in 0..3 {
            let msg = ClientMsg::ShootBullet(shot.as_object().unwrap().clone());
            let out = relay(sender, msg, &mut bullets).unwrap();
            assert_eq!(out.scope, Scope::All);
            match out.msg {
                ServerMsg::Bullets(data) => {
                    assert_eq!(data["x"], 10);
                    assert_eq!(data["angle"], 0);
                    ids.push(data["bulletId"].as_u64().unwrap());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn client_predicted_events_skip_sender() {
        let (sender, out) = relay_value(ClientMsg::SendLocation(LocationUpdate::default()));
        assert_eq!(out.scope, Scope::AllExcept(sender));
        assert_eq!(out.msg.name(), "update_state");

        let (sender, out) = relay_value(ClientMsg::Collision(json!({"bulletId": 4})));
        assert_eq!(out.scope, Scope::AllExcept(sender));
        assert_eq!(out.msg, ServerMsg::Deletebullet(json!({"bulletId": 4})));
    }

    #[test]
    fn attacks_and_deaths_reach_everyone_unchanged() {
        let payload = json!({"x": 1, "owner": "abc"});
        let cases = [
            (ClientMsg::ShootFire(payload.clone()), "fires"),
            (ClientMsg::Knifeswing(payload.clone()), "knifeswings"),
            (ClientMsg::Bombthrowing(payload.clone()), "bombs"),
        ];
        for (msg, name) in cases {
            let (_, out) = relay_value(msg);
            assert_eq!(out.scope, Scope::All);
            assert_eq!(out.msg.name(), name);
        }

        let report = KillReport {
            dead_user: "victim".into(),
            weapon: json!({"bulletId": 9}),
        };
        for msg in [
            ClientMsg::Death(report.clone()),
            ClientMsg::Deathknife(report.clone()),
        ] {
            let (_, out) = relay_value(msg);
            assert_eq!(out, Outbound::all(ServerMsg::Killed(report.clone())));
        }
    }

    #[test]
    fn registry_events_are_not_relayed() {
        let mut bullets = BulletIds::default();
        let id = Uuid::new_v4();
        assert!(relay(id, ClientMsg::Username("x".into()), &mut bullets).is_none());
        assert!(relay(id, ClientMsg::EatItem(1), &mut bullets).is_none());
    }
}
