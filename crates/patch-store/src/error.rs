//! Error types for the patch store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur persisting or re-loading pipeline outputs.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no analysis result at {0}; run `stormcrop analyze` first")]
    MissingAnalysis(PathBuf),

    #[error("failed to write patch: {0}")]
    Patch(#[from] frame_io::FrameError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
