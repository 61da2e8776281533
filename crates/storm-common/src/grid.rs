//! In-memory reflectivity grid and grid-cell coordinates.

use serde::{Deserialize, Serialize};

/// A single 2-D reflectivity field, one per frame.
///
/// Values are stored in row-major order (row 0 first). The grid is
/// constructed once by a frame loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectivityGrid {
    /// Grid values in row-major order.
    data: Vec<f32>,
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
}

impl ReflectivityGrid {
    /// Create a grid from row-major data.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Get the value at a grid cell.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Grid shape as (height, width), i.e. (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw row-major values.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extract a rectangular window as a new row-major buffer.
    ///
    /// Rows `row_start..row_end` and columns `col_start..col_end`
    /// (half-open). Ranges are clamped to the grid, so the returned buffer
    /// may be smaller than requested; callers that need an exact shape
    /// must check the returned dimensions.
    pub fn window(
        &self,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> (Vec<f32>, usize, usize) {
        let row_end = row_end.min(self.height);
        let col_end = col_end.min(self.width);
        if row_start >= row_end || col_start >= col_end {
            return (Vec::new(), 0, 0);
        }

        let out_width = col_end - col_start;
        let out_height = row_end - row_start;
        let mut out = Vec::with_capacity(out_width * out_height);
        for row in row_start..row_end {
            let offset = row * self.width;
            out.extend_from_slice(&self.data[offset + col_start..offset + col_end]);
        }
        (out, out_width, out_height)
    }
}

/// Integer grid coordinates of a cell, (row, col).
///
/// Persisted everywhere as a `[row, col]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Euclidean distance to another cell, in cell units.
    pub fn distance_to(&self, other: &CellCoord) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

impl From<(usize, usize)> for CellCoord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<CellCoord> for (usize, usize) {
    fn from(c: CellCoord) -> Self {
        (c.row, c.col)
    }
}
