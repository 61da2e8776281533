//! Patch cropping over a full frame series.
//!
//! Once analysis has fixed the selected centers, [`PatchCropper`] walks the
//! ordered frame list, crops one fixed-size window per center per frame,
//! and accumulates the run metadata record. Individual frame failures are
//! isolated (logged, counted, and skipped) so one bad file never costs
//! the rest of the series.

pub mod cropper;
pub mod error;

pub use cropper::{CropReport, PatchCropper};
pub use error::{CropError, Result};
