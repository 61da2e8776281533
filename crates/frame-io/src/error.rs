//! Error types for frame I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while listing, extracting, or loading frames.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid NPY data in {path}: {reason}")]
    Npy { path: PathBuf, reason: String },

    #[error("invalid frame sidecar {path}: {reason}")]
    Sidecar { path: PathBuf, reason: String },

    #[error("decompression failed for {path}: {reason}")]
    Decompression { path: PathBuf, reason: String },
}

impl FrameError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only raw I/O failures are considered transient; malformed data stays
    /// malformed no matter how often it is re-read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FrameError::Io(_))
    }
}

/// Result type for frame I/O operations.
pub type Result<T> = std::result::Result<T, FrameError>;
