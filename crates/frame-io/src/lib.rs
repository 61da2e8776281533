//! Frame loading for the storm patch pipeline.
//!
//! Grid file formats are an external concern; this crate defines the
//! [`FrameLoader`] boundary the pipeline is written against and ships one
//! concrete implementation, [`NpyFrameStore`], which reads frames from NPY
//! grid files with JSON coordinate sidecars. It also handles the gzip
//! archive extraction stage that precedes loading.

pub mod error;
pub mod extract;
pub mod loader;
pub mod npy;

pub use error::{FrameError, Result};
pub use extract::extract_archives;
pub use loader::{list_frames, Frame, FrameLoader, NpyFrameStore};
