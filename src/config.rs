use std::time::Duration;

use anyhow::{ensure, Result};

use crate::snake::Cell;

/// Board geometry and pacing. Coordinates are in board units, one tile is
/// `tile_size` units wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub board_width: i32,
    pub board_height: i32,
    pub tile_size: i32,
    pub tick_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: 600,
            board_height: 400,
            tile_size: 10,
            tick_interval: Duration::from_millis(100),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tile_size > 0, "tile size must be positive, got {}", self.tile_size);
        ensure!(
            self.board_width > 0 && self.board_height > 0,
            "board must be non-empty, got {}x{}",
            self.board_width,
            self.board_height
        );
        ensure!(
            self.board_width % self.tile_size == 0 && self.board_height % self.tile_size == 0,
            "board {}x{} is not a whole number of {}-unit tiles",
            self.board_width,
            self.board_height,
            self.tile_size
        );
        ensure!(!self.tick_interval.is_zero(), "tick interval must be non-zero");
        Ok(())
    }

    /// Number of tile columns.
    pub fn columns(&self) -> i32 {
        self.board_width / self.tile_size
    }

    /// Number of tile rows.
    pub fn rows(&self) -> i32 {
        self.board_height / self.tile_size
    }

    /// Tile-aligned center of the board, where every round starts.
    pub fn center(&self) -> Cell {
        Cell::new(
            self.columns() / 2 * self.tile_size,
            self.rows() / 2 * self.tile_size,
        )
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.board_width && cell.y >= 0 && cell.y < self.board_height
    }
}
