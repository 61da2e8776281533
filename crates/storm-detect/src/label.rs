//! Connected-region labeling of above-threshold cells.

use storm_common::ReflectivityGrid;

/// Labeled regions of one grid.
///
/// Labels run 1..=`num_regions`; 0 is background. Labels are assigned in
/// raster-scan first-touch order: region 1 is the one whose topmost-leftmost
/// cell comes first, and so on. Downstream code relies on that order being
/// stable, not on any ranking by size or intensity.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Vec<u32>,
    num_regions: usize,
    width: usize,
    height: usize,
}

impl LabelMap {
    /// Number of labeled regions.
    pub fn num_regions(&self) -> usize {
        self.num_regions
    }

    /// Label of a cell; 0 for background or out-of-bounds.
    pub fn label_at(&self, row: usize, col: usize) -> u32 {
        if row >= self.height || col >= self.width {
            return 0;
        }
        self.labels[row * self.width + col]
    }

    /// The raw label buffer in row-major order.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Grid shape as (height, width).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Offsets of the 8 neighbors (orthogonal and diagonal).
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Label the maximal 8-connected regions of cells with `value >= threshold`.
///
/// Every foreground cell lands in exactly one region; NaN cells never
/// compare above the threshold and so are background. A grid with no
/// foreground yields a map with zero regions.
pub fn label_regions(grid: &ReflectivityGrid, threshold: f32) -> LabelMap {
    let (height, width) = grid.shape();
    let values = grid.values();
    let mut labels = vec![0u32; values.len()];
    let mut num_regions = 0usize;

    let mut queue: Vec<(usize, usize)> = Vec::new();

    for row in 0..height {
        for col in 0..width {
            let idx = row * width + col;
            if labels[idx] != 0 || !(values[idx] >= threshold) {
                continue;
            }

            // New region: flood fill from this raster-scan seed.
            num_regions += 1;
            let label = num_regions as u32;
            labels[idx] = label;
            queue.push((row, col));

            while let Some((r, c)) = queue.pop() {
                for (dr, dc) in NEIGHBORS {
                    let nr = r as i64 + dr;
                    let nc = c as i64 + dc;
                    if nr < 0 || nc < 0 || nr >= height as i64 || nc >= width as i64 {
                        continue;
                    }
                    let nidx = nr as usize * width + nc as usize;
                    if labels[nidx] == 0 && values[nidx] >= threshold {
                        labels[nidx] = label;
                        queue.push((nr as usize, nc as usize));
                    }
                }
            }
        }
    }

    LabelMap {
        labels,
        num_regions,
        width,
        height,
    }
}
