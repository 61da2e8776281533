//! Geographic coordinate axes and points.

use serde::{Deserialize, Serialize};

use crate::grid::CellCoord;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// 1-D coordinate axes for a frame's grid.
///
/// `lat` is indexed by row, `lon` by column. All frames in a run are
/// required to share one coordinate grid; [`GeoAxes::same_grid`] is the
/// cheap check the cropper uses to validate that precondition.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAxes {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl GeoAxes {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Self {
        Self { lat, lon }
    }

    /// Look up the geographic point for a grid cell.
    ///
    /// Returns `None` when the cell lies outside the axes.
    pub fn point_for(&self, cell: CellCoord) -> Option<GeoPoint> {
        let lat = self.lat.get(cell.row).copied()?;
        let lon = self.lon.get(cell.col).copied()?;
        Some(GeoPoint { lat, lon })
    }

    /// Check whether another set of axes describes the same coordinate grid.
    ///
    /// Compares lengths and endpoint values rather than every element, which
    /// is enough to catch a frame from a different product or domain.
    pub fn same_grid(&self, other: &GeoAxes) -> bool {
        fn endpoints_match(a: &[f64], b: &[f64]) -> bool {
            if a.len() != b.len() {
                return false;
            }
            match (a.first(), a.last(), b.first(), b.last()) {
                (Some(af), Some(al), Some(bf), Some(bl)) => {
                    (af - bf).abs() < 1e-9 && (al - bl).abs() < 1e-9
                }
                _ => a.is_empty() && b.is_empty(),
            }
        }
        endpoints_match(&self.lat, &other.lat) && endpoints_match(&self.lon, &other.lon)
    }
}
