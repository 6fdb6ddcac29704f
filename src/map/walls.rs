//! Wall occupancy grid loaded once at startup

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

/// Immutable row-major wall grid, `true` marks an impassable tile
#[derive(Debug, Clone)]
pub struct WallGrid {
    cols: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl WallGrid {
    /// Read `map_name` out of a JSON object of `name -> [[0|1, ...], ...]`
    /// and check it matches the expected dimensions.
    pub fn load(path: &Path, map_name: &str, cols: u32, rows: u32) -> Result<Self, MapError> {
        let raw = fs::read_to_string(path).map_err(|source| MapError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, map_name, cols, rows)
    }

    pub fn parse(raw: &str, map_name: &str, cols: u32, rows: u32) -> Result<Self, MapError> {
        let mut maps: HashMap<String, Value> = serde_json::from_str(raw)?;
        let grid = maps
            .remove(map_name)
            .ok_or_else(|| MapError::UnknownMap(map_name.to_string()))?;
        let grid: Vec<Vec<u8>> = serde_json::from_value(grid)?;
        Self::from_rows(&grid, cols, rows)
    }

    pub fn from_rows(grid: &[Vec<u8>], cols: u32, rows: u32) -> Result<Self, MapError> {
        if grid.len() != rows as usize {
            return Err(MapError::Dimensions {
                expected: (cols, rows),
                found: format!("{} rows", grid.len()),
            });
        }

        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for (y, row) in grid.iter().enumerate() {
            if row.len() != cols as usize {
                return Err(MapError::Dimensions {
                    expected: (cols, rows),
                    found: format!("row {} has {} tiles", y, row.len()),
                });
            }
            cells.extend(row.iter().map(|&tile| tile != 0));
        }

        Ok(Self { cols, rows, cells })
    }

    /// A grid with no walls at all
    pub fn open(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            cells: vec![false; (cols * rows) as usize],
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Out-of-range tiles count as walls
    #[inline]
    pub fn is_wall(&self, x: u32, y: u32) -> bool {
        if x >= self.cols || y >= self.rows {
            return true;
        }
        self.cells[(y * self.cols + x) as usize]
    }

    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|&&wall| wall).count()
    }
}

/// Wall data errors, all fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read wall data {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed wall data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Wall data has no map named {0:?}")]
    UnknownMap(String),

    #[error("Wall grid should be {}x{} tiles, found {found}", .expected.0, .expected.1)]
    Dimensions { expected: (u32, u32), found: String },
}
