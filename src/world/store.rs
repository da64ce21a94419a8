//! Authoritative tile grid and bounded change log for one room
//!
//! The store owns the grid; every mutation goes through [`WorldStore::apply`],
//! which stamps a strictly increasing server timestamp and appends to the
//! change log. The grid is the materialized view, the log is what replicates
//! to polling clients. The log is capped; once entries have been dropped,
//! clients whose watermark predates the drop are told to resync from a full
//! snapshot instead of receiving a silently incomplete delta.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::util::time::unix_millis;

use super::tile::TileType;

/// One applied tile mutation, as replicated to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMutation {
    pub x: usize,
    pub y: usize,
    /// `None` means the cell was cleared
    pub tile: Option<TileType>,
    pub author_id: String,
    /// Server-assigned stamp; strictly increasing within a room
    pub server_timestamp: u64,
}

/// Why a mutation was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("coordinates ({x}, {y}) outside world bounds {width}x{height}")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

/// Result of a delta pull against a watermark
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// All mutations after the watermark, in stamp order
    Changes(Vec<TileMutation>),
    /// The log no longer reaches back to the watermark; caller must
    /// re-request a full snapshot
    Stale,
}

/// Full-state snapshot for joins and stale-client recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub width: usize,
    pub height: usize,
    /// Grid indexed `[x][y]`
    pub grid: Vec<Vec<Option<TileType>>>,
    /// Watermark covering everything in this snapshot
    pub watermark: u64,
}

/// Authoritative world state for one room
pub struct WorldStore {
    width: usize,
    height: usize,
    grid: Vec<Vec<Option<TileType>>>,
    changes: VecDeque<TileMutation>,
    log_cap: usize,
    /// Stamp of the most recently applied mutation
    last_stamp: u64,
    /// Stamp of the newest entry dropped by truncation (0 = nothing dropped)
    last_dropped_stamp: u64,
}

impl WorldStore {
    /// Create a store over a pre-generated grid
    pub fn new(grid: Vec<Vec<Option<TileType>>>, height: usize, log_cap: usize) -> Self {
        let width = grid.len();
        debug_assert!(grid.iter().all(|col| col.len() == height));
        Self {
            width,
            height,
            grid,
            changes: VecDeque::new(),
            log_cap,
            last_stamp: 0,
            last_dropped_stamp: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Current watermark: the stamp of the latest applied mutation
    pub fn watermark(&self) -> u64 {
        self.last_stamp
    }

    /// Validate and apply one mutation, returning the stamped entry
    ///
    /// Out-of-range coordinates are rejected outright, never clamped; a
    /// rejected mutation does not touch the grid or the log. Concurrent
    /// submissions against the same tile both succeed and converge by
    /// last-write-wins on the server stamp.
    pub fn apply(
        &mut self,
        x: i64,
        y: i64,
        tile: Option<TileType>,
        author_id: &str,
    ) -> Result<TileMutation, ApplyError> {
        if x < 0 || x >= self.width as i64 || y < 0 || y >= self.height as i64 {
            return Err(ApplyError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        // Wall clocks can tick backwards or stall within a millisecond;
        // the stamp must still be strictly increasing per room.
        let stamp = unix_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;

        let mutation = TileMutation {
            x: x as usize,
            y: y as usize,
            tile,
            author_id: author_id.to_string(),
            server_timestamp: stamp,
        };

        self.grid[mutation.x][mutation.y] = tile;
        self.changes.push_back(mutation.clone());

        while self.changes.len() > self.log_cap {
            if let Some(dropped) = self.changes.pop_front() {
                self.last_dropped_stamp = dropped.server_timestamp;
            }
        }

        Ok(mutation)
    }

    /// All mutations stamped after `watermark`, or [`Delta::Stale`] when
    /// truncation has dropped entries the caller has not seen
    pub fn changes_since(&self, watermark: u64) -> Delta {
        if watermark < self.last_dropped_stamp {
            return Delta::Stale;
        }

        let recent: Vec<TileMutation> = self
            .changes
            .iter()
            .filter(|m| m.server_timestamp > watermark)
            .cloned()
            .collect();
        Delta::Changes(recent)
    }

    /// Clone the full grid along with the watermark that covers it
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            width: self.width,
            height: self.height,
            grid: self.grid.clone(),
            watermark: self.last_stamp,
        }
    }

    /// Read a single cell; panics if out of range (internal use only)
    #[cfg(test)]
    pub fn cell(&self, x: usize, y: usize) -> Option<TileType> {
        self.grid[x][y]
    }
}
