//! Tile material definitions

use serde::{Deserialize, Serialize};

/// Materials a grid cell can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Grass,
    Dirt,
    Stone,
    Wood,
    Water,
    Diamond,
    Gold,
    Iron,
}

impl Default for TileType {
    fn default() -> Self {
        Self::Dirt
    }
}
