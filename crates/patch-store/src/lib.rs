//! Persistence for the storm patch pipeline's outputs.
//!
//! A [`PatchStore`] owns one output directory and everything inside it: the
//! persisted analysis result (the selected centers), the per-case patch
//! series, and the run metadata record. The analysis result is the only
//! channel between the analysis and cropping stages: cropping re-loads it
//! rather than re-detecting, so the two stages can run in separate
//! invocations.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{AnalysisResult, CaseCount, PatchStore, RunMetadata};
