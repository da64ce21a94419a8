//! Seeded terrain generation for new rooms
//!
//! Terrain is the baseline a room's grid starts from; it is generated once
//! on room creation and never replayed through the change log. The seed is
//! derived from the room id, so the same id always produces the same world.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::tile::TileType;

/// Derive a stable terrain seed from a room identifier
pub fn seed_for_room(room_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    room_id.hash(&mut hasher);
    hasher.finish()
}

/// Generate a terrain grid of the given dimensions, indexed `[x][y]`
pub fn generate(width: usize, height: usize, seed: u64) -> Vec<Vec<Option<TileType>>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = vec![vec![None; height]; width];

    let ground_level = (height as f32 * 0.6) as i64;

    for x in 0..width {
        // Rolling hills around the ground line
        let offset = ((x as f32 * 0.05).sin() * 8.0) as i64;
        let surface = (ground_level + offset).clamp(0, height as i64 - 1) as usize;

        for y in surface..height {
            let depth = y - surface;
            let tile = if depth == 0 {
                TileType::Grass
            } else if depth < 5 {
                TileType::Dirt
            } else if depth < 15 {
                TileType::Stone
            } else if rng.gen_bool(0.1) {
                TileType::Diamond
            } else {
                TileType::Stone
            };
            grid[x][y] = Some(tile);
        }

        // Occasional tree trunks above the surface
        if surface > 10 && rng.gen_bool(0.08) {
            for tree_y in surface.saturating_sub(4)..surface {
                grid[x][tree_y] = Some(TileType::Wood);
            }
        }

        // Scattered ore seams below the surface
        if rng.gen_bool(0.05) {
            let ore_y = surface + rng.gen_range(5..15);
            if ore_y < height {
                let ore = if rng.gen_bool(0.3) {
                    TileType::Iron
                } else if rng.gen_bool(0.1) {
                    TileType::Diamond
                } else {
                    TileType::Gold
                };
                grid[x][ore_y] = Some(ore);
            }
        }
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_is_deterministic() {
        let a = generate(150, 80, 42);
        let b = generate(150, 80, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(150, 80, 1);
        let b = generate(150, 80, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn room_id_seed_is_stable() {
        assert_eq!(seed_for_room("alpha"), seed_for_room("alpha"));
    }

    #[test]
    fn dimensions_match_request() {
        let grid = generate(30, 20, 7);
        assert_eq!(grid.len(), 30);
        assert!(grid.iter().all(|col| col.len() == 20));
    }

    #[test]
    fn sky_is_empty_and_ground_is_solid() {
        let grid = generate(150, 80, 99);
        // Well above the ground line nothing but the odd tree trunk exists
        for x in 0..150 {
            assert!(grid[x][0].is_none() || grid[x][0] == Some(TileType::Wood));
            // Bottom row is always filled
            assert!(grid[x][79].is_some());
        }
    }
}
