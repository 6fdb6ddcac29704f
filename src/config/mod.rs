//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// A `(col, row)` tile coordinate
pub type Tile = (u32, u32);

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS (comma-separated)
    pub client_origin: String,
    /// Directory holding the built client bundle
    pub static_dir: PathBuf,
    /// JSON file with wall occupancy grids keyed by map name
    pub wall_data_path: PathBuf,
    /// Max inbound frames per second per connection
    pub input_rate_limit: u32,

    pub game: GameConfig,
}

/// Gameplay constants
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Which grid to pick out of the wall data file
    pub map_name: String,
    /// Tile edge in pixels
    pub tile_size: u32,
    /// Map width in pixels
    pub map_width: u32,
    /// Map height in pixels
    pub map_height: u32,
    /// Health a player joins with
    pub initial_health: i32,
    /// Player spawn tiles as (col, row)
    pub spawn_points: Vec<Tile>,
    /// Period of the item spawner
    pub item_spawn_interval: Duration,
    /// Max concurrently live items
    pub max_items: usize,
    /// Individual tiles items may never land on, as (x, y)
    pub reserved_tiles: Vec<Tile>,
    /// Items never land where both x and y are <= this
    pub safe_corner: u32,
    /// Random draws before falling back to a full grid scan
    pub placement_attempts: u32,
    /// Fixed seed for the world RNG; random when unset
    pub rng_seed: Option<u64>,
}

impl GameConfig {
    /// Grid width in tiles
    pub fn cols(&self) -> u32 {
        self.map_width / self.tile_size
    }

    /// Grid height in tiles
    pub fn rows(&self) -> u32 {
        self.map_height / self.tile_size
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.tile_size == 0
            || self.map_width % self.tile_size != 0
            || self.map_height % self.tile_size != 0
        {
            return Err(ConfigError::Invalid(
                "MAP_WIDTH/MAP_HEIGHT",
                format!(
                    "{}x{} is not a multiple of tile size {}",
                    self.map_width, self.map_height, self.tile_size
                ),
            ));
        }
        if self.spawn_points.is_empty() {
            return Err(ConfigError::Invalid("SPAWN_POINTS", "list is empty".to_string()));
        }
        if let Some(&(col, row)) = self
            .spawn_points
            .iter()
            .find(|(col, row)| *col >= self.cols() || *row >= self.rows())
        {
            return Err(ConfigError::Invalid(
                "SPAWN_POINTS",
                format!("{col}:{row} lies outside the map"),
            ));
        }
        Ok(self)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_name: "wall_tile_coordinate".to_string(),
            tile_size: 32,
            map_width: 1920,
            map_height: 1920,
            initial_health: 100,
            spawn_points: vec![(2, 16), (2, 57), (16, 23), (52, 52), (40, 39), (57, 2)],
            item_spawn_interval: Duration::from_millis(10_000),
            max_items: 5,
            reserved_tiles: vec![(29, 41), (32, 41), (58, 58)],
            safe_corner: 2,
            placement_attempts: 1000,
            rng_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:80".to_string())
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            map_name: env::var("MAP_NAME").unwrap_or(defaults.map_name),
            tile_size: parse_var("TILE_SIZE", defaults.tile_size)?,
            map_width: parse_var("MAP_WIDTH", defaults.map_width)?,
            map_height: parse_var("MAP_HEIGHT", defaults.map_height)?,
            initial_health: parse_var("INITIAL_HEALTH", defaults.initial_health)?,
            spawn_points: match env::var("SPAWN_POINTS") {
                Ok(raw) => parse_tiles(&raw).map_err(|e| ConfigError::Invalid("SPAWN_POINTS", e))?,
                Err(_) => defaults.spawn_points,
            },
            item_spawn_interval: Duration::from_millis(parse_var(
                "ITEM_SPAWN_INTERVAL_MS",
                defaults.item_spawn_interval.as_millis() as u64,
            )?),
            max_items: parse_var("MAX_ITEMS", defaults.max_items)?,
            reserved_tiles: match env::var("RESERVED_TILES") {
                Ok(raw) => {
                    parse_tiles(&raw).map_err(|e| ConfigError::Invalid("RESERVED_TILES", e))?
                }
                Err(_) => defaults.reserved_tiles,
            },
            safe_corner: parse_var("SAFE_CORNER", defaults.safe_corner)?,
            placement_attempts: parse_var("PLACEMENT_ATTEMPTS", defaults.placement_attempts)?,
            rng_seed: match env::var("RNG_SEED") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|_| ConfigError::Invalid("RNG_SEED", raw.clone()))?,
                ),
                Err(_) => None,
            },
        }
        .validate()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:80".to_string()),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "build".to_string())
                .into(),
            wall_data_path: env::var("WALL_DATA_PATH")
                .unwrap_or_else(|_| "wall_data.json".to_string())
                .into(),
            input_rate_limit: parse_var("INPUT_RATE_LIMIT", 240)?,
            game,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Parse `a:b,c:d` into tile pairs
pub fn parse_tiles(raw: &str) -> Result<Vec<Tile>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (a, b) = pair
                .split_once(':')
                .ok_or_else(|| format!("expected a:b, got {pair:?}"))?;
            let a = a.trim().parse().map_err(|_| format!("bad number in {pair:?}"))?;
            let b = b.trim().parse().map_err(|_| format!("bad number in {pair:?}"))?;
            Ok((a, b))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    #[error("Invalid server address format")]
    InvalidAddress,
}
