//! Region centroid extraction.

use tracing::debug;

use storm_common::CellCoord;

use crate::label::LabelMap;

/// Candidate centers extracted from one labeled grid, plus counts for the
/// regions that were considered and dropped. Undersized regions are
/// filtered here, and the counts keep that filtering observable.
#[derive(Debug, Clone)]
pub struct RegionCensus {
    /// One centroid per kept region, in label order.
    pub centers: Vec<CellCoord>,
    /// Regions present in the label map.
    pub regions_total: usize,
    /// Regions dropped for being under the pixel threshold.
    pub regions_dropped: usize,
}

/// Per-region accumulator for one pass over the label map.
#[derive(Debug, Clone, Copy, Default)]
struct RegionAccum {
    count: usize,
    row_sum: u64,
    col_sum: u64,
}

/// Reduce each labeled region to its centroid, dropping regions smaller
/// than `min_pixels`.
///
/// The centroid is the mean member row and column truncated toward zero,
/// so a region spanning rows 2..=3 centers on row 2. Output order follows
/// label order: raster-scan first-touch, not any strength ranking.
pub fn extract_centroids(map: &LabelMap, min_pixels: usize) -> RegionCensus {
    let mut accums = vec![RegionAccum::default(); map.num_regions()];

    let (_, width) = map.shape();
    for (idx, &label) in map.labels().iter().enumerate() {
        if label == 0 {
            continue;
        }
        let accum = &mut accums[(label - 1) as usize];
        accum.count += 1;
        accum.row_sum += (idx / width) as u64;
        accum.col_sum += (idx % width) as u64;
    }

    let mut centers = Vec::new();
    let mut regions_dropped = 0usize;
    for accum in &accums {
        if accum.count < min_pixels {
            regions_dropped += 1;
            continue;
        }
        let row = (accum.row_sum as f64 / accum.count as f64) as usize;
        let col = (accum.col_sum as f64 / accum.count as f64) as usize;
        centers.push(CellCoord::new(row, col));
    }

    debug!(
        regions_total = accums.len(),
        regions_dropped, "extracted centroids"
    );

    RegionCensus {
        centers,
        regions_total: accums.len(),
        regions_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::label_regions;
    use test_utils::grid_with_blocks;

    #[test]
    fn test_centroid_truncates_mean() {
        // Cells (2,2)-(2,4) and (3,2)-(3,4) at 50 dBZ: mean row 2.5 -> 2,
        // mean col 3.0 -> 3.
        let grid = grid_with_blocks(10, 10, &[(2, 4, 2, 5, 50.0)]);
        let map = label_regions(&grid, 35.0);
        let census = extract_centroids(&map, 4);

        assert_eq!(census.centers, vec![CellCoord::new(2, 3)]);
        assert_eq!(census.regions_total, 1);
        assert_eq!(census.regions_dropped, 0);
    }

    #[test]
    fn test_undersized_region_dropped_and_counted() {
        let grid = grid_with_blocks(10, 10, &[(1, 2, 1, 3, 50.0), (5, 8, 5, 8, 60.0)]);
        let map = label_regions(&grid, 35.0);
        // First region has 2 cells, second has 9.
        let census = extract_centroids(&map, 4);

        assert_eq!(census.centers, vec![CellCoord::new(6, 6)]);
        assert_eq!(census.regions_total, 2);
        assert_eq!(census.regions_dropped, 1);
    }

    #[test]
    fn test_empty_map() {
        let grid = grid_with_blocks(5, 5, &[]);
        let map = label_regions(&grid, 35.0);
        let census = extract_centroids(&map, 1);

        assert!(census.centers.is_empty());
        assert_eq!(census.regions_total, 0);
        assert_eq!(census.regions_dropped, 0);
    }

    #[test]
    fn test_output_follows_label_order() {
        // A small region high in the grid and a big one lower down: label
        // order (raster scan) puts the small one first even though the big
        // one is larger.
        let grid = grid_with_blocks(30, 30, &[(0, 2, 20, 22, 50.0), (10, 20, 0, 10, 70.0)]);
        let map = label_regions(&grid, 35.0);
        let census = extract_centroids(&map, 1);

        assert_eq!(census.centers.len(), 2);
        assert_eq!(census.centers[0], CellCoord::new(0, 20));
        assert_eq!(census.centers[1], CellCoord::new(14, 4));
    }
}
