//! Storm detection for reflectivity frames.
//!
//! The detection pipeline runs in three stages: threshold-and-label
//! connected regions ([`label_regions`]), reduce each sufficiently large
//! region to its centroid ([`extract_centroids`]), then greedily pick a
//! bounded, well-separated subset of the pooled candidates
//! ([`select_centers`]). [`analyze_samples`] drives all three over one or
//! more sample frames.

pub mod analysis;
pub mod centroid;
pub mod label;
pub mod select;

pub use analysis::{analyze_samples, AnalysisError, AnalysisOutcome};
pub use centroid::{extract_centroids, RegionCensus};
pub use label::{label_regions, LabelMap};
pub use select::select_centers;
