//! Spawn placement - player spawn points and item tile sampling

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::{GameConfig, Tile};
use crate::map::WallGrid;

/// Picks positions for new players and new items
#[derive(Debug, Clone)]
pub struct SpawnPlacer {
    walls: WallGrid,
    tile_size: u32,
    spawn_points: Vec<Tile>,
    reserved_tiles: Vec<Tile>,
    safe_corner: u32,
    attempts: u32,
}

impl SpawnPlacer {
    pub fn new(walls: WallGrid, config: &GameConfig) -> Self {
        Self {
            walls,
            tile_size: config.tile_size,
            spawn_points: config.spawn_points.clone(),
            reserved_tiles: config.reserved_tiles.clone(),
            safe_corner: config.safe_corner,
            attempts: config.placement_attempts,
        }
    }

    pub fn walls(&self) -> &WallGrid {
        &self.walls
    }

    /// Whether an item may sit on tile `(x, y)`
    pub fn is_allowed(&self, x: u32, y: u32) -> bool {
        !self.walls.is_wall(x, y)
            && !self.reserved_tiles.contains(&(x, y))
            && !(x <= self.safe_corner && y <= self.safe_corner)
    }

    /// Pixel position of a uniformly chosen player spawn point
    pub fn player_spawn<R: Rng>(&self, rng: &mut R) -> Option<(f64, f64)> {
        self.spawn_points.choose(rng).map(|&(col, row)| {
            (
                (col * self.tile_size) as f64,
                (row * self.tile_size) as f64,
            )
        })
    }

    /// Pixel position for a new item, or `None` when no tile qualifies
    pub fn item_position<R: Rng>(&self, rng: &mut R) -> Option<(u32, u32)> {
        self.item_tile(rng)
            .map(|(x, y)| (x * self.tile_size, y * self.tile_size))
    }

    /// Rejection sampling, bounded by `attempts`, then a full scan.
    pub fn item_tile<R: Rng>(&self, rng: &mut R) -> Option<Tile> {
        let (cols, rows) = (self.walls.cols(), self.walls.rows());
        if cols == 0 || rows == 0 {
            return None;
        }

        for _ in 0..self.attempts {
            let x = rng.gen_range(0..cols);
            let y = rng.gen_range(0..rows);
            if self.is_allowed(x, y) {
                return Some((x, y));
            }
        }

        debug!(attempts = self.attempts, "Sampling exhausted, scanning grid");
        let candidates = self.candidates();
        let picked = candidates.choose(rng).copied();
        if picked.is_none() {
            warn!("No free tile left for item placement");
        }
        picked
    }

    /// Every tile an item may occupy, row by row
    pub fn candidates(&self) -> Vec<Tile> {
        let (cols, rows) = (self.walls.cols(), self.walls.rows());
        (0..rows)
            .flat_map(|y| (0..cols).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_allowed(x, y))
            .collect()
    }
}
