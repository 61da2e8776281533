//! Common types shared across the storm patch extraction pipeline.

pub mod config;
pub mod geo;
pub mod grid;

pub use config::PipelineConfig;
pub use geo::{GeoAxes, GeoPoint};
pub use grid::{CellCoord, ReflectivityGrid};
