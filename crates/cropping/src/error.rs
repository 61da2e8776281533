//! Error types for cropping runs.

use thiserror::Error;

/// Errors that abort a cropping run.
///
/// Per-frame load and processing failures are not here; those are caught
/// at the frame boundary and tallied in the run report instead.
#[derive(Error, Debug)]
pub enum CropError {
    /// The sorted source list was empty. Callers report this and stop; it
    /// is not a process failure.
    #[error("no input frames to crop")]
    NoFrames,

    /// A frame's coordinate axes disagree with the first processed frame's.
    /// All frames in a run must share one coordinate grid; a violation
    /// means the input directory mixes products, so the run stops rather
    /// than emit patches with wrong geo-coordinates.
    #[error("coordinate axes of frame {frame} do not match the first processed frame")]
    AxesMismatch { frame: usize },

    /// Persisting an output failed in a way that is not frame-local.
    #[error(transparent)]
    Store(#[from] patch_store::StoreError),
}

/// Result type for cropping operations.
pub type Result<T> = std::result::Result<T, CropError>;
