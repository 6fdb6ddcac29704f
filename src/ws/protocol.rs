//! WebSocket protocol message definitions
//! Every frame is a named event: `{"event": "<name>", "data": <payload>}`

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Join request carrying the chosen nickname
    Username(String),

    /// Periodic self-reported state
    SendLocation(LocationUpdate),

    /// Projectile fired; the server stamps a bullet id on it
    ShootBullet(Map<String, Value>),

    /// Area/fire attack
    ShootFire(Value),

    /// Melee swing
    Knifeswing(Value),

    /// Throwable
    Bombthrowing(Value),

    /// Projectile hit something, clients drop it locally
    Collision(Value),

    /// Death by projectile
    Death(KillReport),

    /// Death by melee
    Deathknife(KillReport),

    /// Item picked up. Ids arrive as numbers or as the string keys of `item_init`
    #[serde(deserialize_with = "item_id")]
    EatItem(u64),
}

impl ClientMsg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Username(_) => "username",
            Self::SendLocation(_) => "send_location",
            Self::ShootBullet(_) => "shoot_bullet",
            Self::ShootFire(_) => "shoot_fire",
            Self::Knifeswing(_) => "knifeswing",
            Self::Bombthrowing(_) => "bombthrowing",
            Self::Collision(_) => "collision",
            Self::Death(_) => "death",
            Self::Deathknife(_) => "deathknife",
            Self::EatItem(_) => "eat_item",
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    /// The connection's own player id
    UserId(Uuid),

    /// Every live item, keyed by id
    ItemInit(BTreeMap<u64, ItemPos>),

    /// A player is (or already was) in the game
    JoinUser(PlayerInfo),

    /// A player disconnected
    LeaveUser(Uuid),

    /// Relayed `send_location`
    UpdateState(LocationUpdate),

    /// Relayed `shoot_bullet` with `bulletId` added
    Bullets(Map<String, Value>),

    Fires(Value),

    Knifeswings(Value),

    Bombs(Value),

    /// Relayed `collision`
    Deletebullet(Value),

    /// Relayed `death` or `deathknife`
    Killed(KillReport),

    SpawnItem(ItemInfo),

    DeleteItem(u64),
}

impl ServerMsg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserId(_) => "user_id",
            Self::ItemInit(_) => "item_init",
            Self::JoinUser(_) => "join_user",
            Self::LeaveUser(_) => "leave_user",
            Self::UpdateState(_) => "update_state",
            Self::Bullets(_) => "bullets",
            Self::Fires(_) => "fires",
            Self::Knifeswings(_) => "knifeswings",
            Self::Bombs(_) => "bombs",
            Self::Deletebullet(_) => "deletebullet",
            Self::Killed(_) => "killed",
            Self::SpawnItem(_) => "spawn_item",
            Self::DeleteItem(_) => "delete_item",
        }
    }
}

/// Client-reported player state, relayed as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdate {
    pub id: String,
    pub nickname: String,
    #[serde(deserialize_with = "loose_number")]
    pub x: f64,
    #[serde(deserialize_with = "loose_number")]
    pub y: f64,
    #[serde(deserialize_with = "loose_number")]
    pub dx: f64,
    #[serde(deserialize_with = "loose_number")]
    pub dy: f64,
    /// Health
    #[serde(deserialize_with = "loose_number")]
    pub state: f64,
    #[serde(deserialize_with = "loose_count")]
    pub kill: u32,
    #[serde(deserialize_with = "loose_count")]
    pub hit: u32,
    #[serde(deserialize_with = "loose_count")]
    pub weapon: u32,
}

/// Who died and what killed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillReport {
    pub dead_user: String,
    /// Bullet or knife swing reference, opaque to the server
    #[serde(default)]
    pub weapon: Value,
}

/// Player info for join announcements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub nickname: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    /// Health
    pub state: f64,
    pub kill: u32,
    pub hit: u32,
    pub weapon: u32,
}

/// Item position inside `item_init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPos {
    pub x: u32,
    pub y: u32,
}

/// A freshly spawned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: u64,
    pub x: u32,
    pub y: u32,
}

// ============================================================================
// Lenient field decoding
// ============================================================================

/// A JSON scalar as browser clients send it
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(u64),
    Float(f64),
    Text(String),
    Other(de::IgnoredAny),
}

fn item_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Int(id) => Ok(id),
        Loose::Text(raw) => raw
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid item id {raw:?}"))),
        Loose::Float(_) | Loose::Other(_) => Err(de::Error::custom("item id must be an integer")),
    }
}

/// Numbers, numeric strings, anything else reads as zero
fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match Loose::deserialize(deserializer)? {
        Loose::Int(n) => n as f64,
        Loose::Float(n) => n,
        Loose::Text(raw) => raw.trim().parse().unwrap_or(0.0),
        Loose::Other(_) => 0.0,
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

/// Counters and weapon ids; fractions truncate, negatives clamp to zero
fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    loose_number(deserializer).map(|n| n.max(0.0) as u32)
}
