//! Session registry - one player per joined connection

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::ws::protocol::{LocationUpdate, PlayerInfo};

use super::spawn::SpawnPlacer;

/// Starting weapon id
const DEFAULT_WEAPON: u32 = 1;

/// Player state as last reported by its owning client
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub nickname: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub health: f64,
    pub kills: u32,
    pub hits: u32,
    pub weapon: u32,
    join_seq: u64,
}

impl Player {
    fn new(id: Uuid, nickname: String, (x, y): (f64, f64), health: f64, join_seq: u64) -> Self {
        Self {
            id,
            nickname,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            health,
            kills: 0,
            hits: 0,
            weapon: DEFAULT_WEAPON,
            join_seq,
        }
    }

    /// Overwrite the client-owned fields
    pub fn apply(&mut self, update: &LocationUpdate) {
        self.x = update.x;
        self.y = update.y;
        self.dx = update.dx;
        self.dy = update.dy;
        self.health = update.state;
        self.kills = update.kill;
        self.hits = update.hit;
        self.weapon = update.weapon;
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            nickname: self.nickname.clone(),
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            state: self.health,
            kill: self.kills,
            hit: self.hits,
            weapon: self.weapon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Connection {0} already joined")]
    AlreadyJoined(Uuid),

    #[error("No spawn points configured")]
    NoSpawnPoint,
}

pub struct SessionRegistry {
    players: HashMap<Uuid, Player>,
    initial_health: i32,
    next_seq: u64,
}

impl SessionRegistry {
    pub fn new(initial_health: i32) -> Self {
        Self {
            players: HashMap::new(),
            initial_health,
            next_seq: 0,
        }
    }

    /// Create a player at a random spawn point. A second join on the same
    /// connection is rejected and leaves the existing player untouched.
    pub fn join<R: Rng>(
        &mut self,
        id: Uuid,
        nickname: String,
        placer: &SpawnPlacer,
        rng: &mut R,
    ) -> Result<Player, SessionError> {
        if self.players.contains_key(&id) {
            return Err(SessionError::AlreadyJoined(id));
        }

        let spawn = placer.player_spawn(rng).ok_or(SessionError::NoSpawnPoint)?;
        let player = Player::new(id, nickname, spawn, f64::from(self.initial_health), self.next_seq);
        self.next_seq += 1;
        self.players.insert(id, player.clone());
        Ok(player)
    }

    pub fn leave(&mut self, id: &Uuid) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// All live players in join order
    pub fn snapshot(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.join_seq);
        players
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::map::WallGrid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn setup() -> (SessionRegistry, SpawnPlacer, ChaCha8Rng) {
        (
            SessionRegistry::new(100),
            SpawnPlacer::new(WallGrid::open(60, 60), &GameConfig::default()),
            ChaCha8Rng::seed_from_u64(42),
        )
    }

    #[test]
    fn join_sets_defaults() {
        let (mut sessions, placer, mut rng) = setup();
        let id = Uuid::new_v4();

        let player = sessions.join(id, "neo".into(), &placer, &mut rng).unwrap();
        assert_eq!(player.id, id);
        assert_eq!(player.health, 100.0);
        assert_eq!((player.kills, player.hits, player.weapon), (0, 0, 1));
        assert_eq!((player.dx, player.dy), (0.0, 0.0));
        assert_eq!(player.x as u32 % 32, 0);
        assert_eq!(sessions.get(&id), Some(&player));
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let (mut sessions, placer, mut rng) = setup();
        let id = Uuid::new_v4();

        sessions.join(id, "first".into(), &placer, &mut rng).unwrap();
        assert_eq!(
            sessions.join(id, "second".into(), &placer, &mut rng),
            Err(SessionError::AlreadyJoined(id))
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.get(&id).unwrap().nickname, "first");
    }

    #[test]
    fn leave_of_unknown_id_is_noop() {
        let (mut sessions, _, _) = setup();
        assert!(sessions.leave(&Uuid::new_v4()).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn replay_matches_joined_minus_left() {
        let (mut sessions, placer, mut rng) = setup();
        let ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
        let mut expected = HashSet::new();

        // Interleave joins, repeated joins, and repeated leaves
        for (i, id) in ids.iter().enumerate() {
            let _ = sessions.join(*id, format!("p{i}"), &placer, &mut rng);
            expected.insert(*id);
            if i % 3 == 0 {
                let _ = sessions.join(*id, "again".into(), &placer, &mut rng);
            }
            if i % 2 == 1 {
                sessions.leave(&ids[i - 1]);
                sessions.leave(&ids[i - 1]);
                expected.remove(&ids[i - 1]);
            }
        }

        let live: HashSet<Uuid> = sessions.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(live, expected);
    }

    #[test]
    fn snapshot_keeps_join_order() {
        let (mut sessions, placer, mut rng) = setup();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            sessions.join(*id, "p".into(), &placer, &mut rng).unwrap();
        }
        sessions.leave(&ids[1]);

        let order: Vec<Uuid> = sessions.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3], ids[4]]);
    }

    #[test]
    fn apply_overwrites_client_fields() {
        let (mut sessions, placer, mut rng) = setup();
        let id = Uuid::new_v4();
        sessions.join(id, "neo".into(), &placer, &mut rng).unwrap();

        let update = LocationUpdate {
            x: 10.0,
            y: 20.0,
            dx: 1.0,
            dy: -1.0,
            state: 55.0,
            kill: 2,
            hit: 4,
            weapon: 3,
            ..LocationUpdate::default()
        };
        sessions.get_mut(&id).unwrap().apply(&update);

        let info = sessions.get(&id).unwrap().info();
        assert_eq!((info.x, info.y, info.dx, info.dy), (10.0, 20.0, 1.0, -1.0));
        assert_eq!((info.state, info.kill, info.hit, info.weapon), (55.0, 2, 4, 3));
        assert_eq!(info.nickname, "neo");
    }
}
