//! Test data generators for synthetic reflectivity fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use storm_common::{CellCoord, ReflectivityGrid};

/// Creates a grid filled with a constant value.
///
/// Useful for testing edge cases and simple scenarios.
pub fn constant_grid(width: usize, height: usize, value: f32) -> ReflectivityGrid {
    ReflectivityGrid::new(vec![value; width * height], width, height)
        .expect("constant grid dimensions are consistent")
}

/// Creates a zero grid with rectangular blocks of a given value.
///
/// Each block is `(row_start, row_end, col_start, col_end, value)` with
/// half-open row/col ranges. Blocks are painted in order, so later blocks
/// overwrite earlier ones.
pub fn grid_with_blocks(
    width: usize,
    height: usize,
    blocks: &[(usize, usize, usize, usize, f32)],
) -> ReflectivityGrid {
    let mut data = vec![0.0f32; width * height];
    for &(row_start, row_end, col_start, col_end, value) in blocks {
        for row in row_start..row_end.min(height) {
            for col in col_start..col_end.min(width) {
                data[row * width + col] = value;
            }
        }
    }
    ReflectivityGrid::new(data, width, height).expect("block grid dimensions are consistent")
}

/// Creates a reflectivity field with square storm cells on a calm background.
///
/// Each storm is `(center_row, center_col, half_side, dbz)`; the painted
/// square is clamped to the grid. Background cells are 5.0 dBZ, well below
/// any storm threshold used in tests.
pub fn reflectivity_grid_with_storms(
    width: usize,
    height: usize,
    storms: &[(usize, usize, usize, f32)],
) -> ReflectivityGrid {
    let mut data = vec![5.0f32; width * height];
    for &(center_row, center_col, half_side, dbz) in storms {
        let row_start = center_row.saturating_sub(half_side);
        let col_start = center_col.saturating_sub(half_side);
        let row_end = (center_row + half_side + 1).min(height);
        let col_end = (center_col + half_side + 1).min(width);
        for row in row_start..row_end {
            for col in col_start..col_end {
                data[row * width + col] = dbz;
            }
        }
    }
    ReflectivityGrid::new(data, width, height).expect("storm grid dimensions are consistent")
}

/// Creates a deterministic pseudo-random pool of candidate centers.
///
/// Uses a simple hash so the same seed always produces the same pool;
/// coordinates are uniform over the grid interior.
pub fn pseudo_random_pool(count: usize, width: usize, height: usize, seed: u32) -> Vec<CellCoord> {
    let mut pool = Vec::with_capacity(count);
    for i in 0..count {
        let row = simple_hash(i as u32, 0, seed) as usize % height;
        let col = simple_hash(i as u32, 1, seed) as usize % width;
        pool.push(CellCoord::new(row, col));
    }
    pool
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_grid() {
        let grid = constant_grid(10, 5, 42.0);
        assert_eq!(grid.shape(), (5, 10));
        assert!(grid.values().iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_grid_with_blocks() {
        let grid = grid_with_blocks(10, 10, &[(2, 4, 2, 5, 50.0)]);
        assert_eq!(grid.get(2, 2), Some(50.0));
        assert_eq!(grid.get(3, 4), Some(50.0));
        assert_eq!(grid.get(4, 2), Some(0.0));
        assert_eq!(grid.get(2, 5), Some(0.0));
    }

    #[test]
    fn test_storm_grid_clamps_at_edges() {
        let grid = reflectivity_grid_with_storms(8, 8, &[(0, 0, 2, 45.0)]);
        assert_eq!(grid.get(0, 0), Some(45.0));
        assert_eq!(grid.get(2, 2), Some(45.0));
        assert_eq!(grid.get(3, 3), Some(5.0));
    }

    #[test]
    fn test_pool_deterministic() {
        let a = pseudo_random_pool(50, 100, 100, 7);
        let b = pseudo_random_pool(50, 100, 100, 7);
        assert_eq!(a, b, "same seed should produce same pool");

        let c = pseudo_random_pool(50, 100, 100, 8);
        assert_ne!(a, c, "different seed should produce different pool");
    }

    #[test]
    fn test_pool_in_bounds() {
        for cell in pseudo_random_pool(200, 37, 53, 3) {
            assert!(cell.row < 53);
            assert!(cell.col < 37);
        }
    }
}
