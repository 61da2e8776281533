//! The frame loading boundary and its NPY-backed implementation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use storm_common::{GeoAxes, ReflectivityGrid};

use crate::error::{FrameError, Result};
use crate::npy;

/// One loaded frame: the reflectivity grid, its coordinate axes, and the
/// frame's timestamp if the source carried one.
#[derive(Debug, Clone)]
pub struct Frame {
    pub grid: ReflectivityGrid,
    pub axes: GeoAxes,
    pub timestamp: Option<String>,
}

/// The boundary the pipeline loads frames through.
///
/// Grid file formats live behind this trait; the pipeline itself never
/// parses them.
pub trait FrameLoader {
    /// Load a single frame from a source path.
    fn load_frame(&self, source: &Path) -> Result<Frame>;
}

/// Frame store reading `<stem>.npy` grids with `<stem>.json` sidecars.
///
/// The sidecar carries the coordinate axes and up to two timestamp fields;
/// `valid_time` is preferred, `time` is the fallback.
#[derive(Debug, Default, Clone)]
pub struct NpyFrameStore;

#[derive(Debug, Serialize, Deserialize)]
struct FrameSidecar {
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl NpyFrameStore {
    pub fn new() -> Self {
        Self
    }

    /// Write a frame as an NPY grid plus JSON sidecar.
    ///
    /// The companion to [`FrameLoader::load_frame`]; used to build frame
    /// directories in tests and tooling.
    pub fn write_frame(&self, grid_path: &Path, frame: &Frame) -> Result<()> {
        let (rows, cols) = frame.grid.shape();
        npy::write_file(grid_path, frame.grid.values(), (rows, cols))?;

        let sidecar = FrameSidecar {
            latitude: frame.axes.lat.clone(),
            longitude: frame.axes.lon.clone(),
            valid_time: frame.timestamp.clone(),
            time: None,
        };
        let sidecar_path = grid_path.with_extension("json");
        let json = serde_json::to_string_pretty(&sidecar).map_err(|e| FrameError::Sidecar {
            path: sidecar_path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&sidecar_path, json)?;
        Ok(())
    }
}

impl FrameLoader for NpyFrameStore {
    fn load_frame(&self, source: &Path) -> Result<Frame> {
        let (data, (rows, cols)) = npy::read_file(source)?;
        let grid = ReflectivityGrid::new(data, cols, rows).ok_or_else(|| FrameError::Npy {
            path: source.to_path_buf(),
            reason: "shape does not match data length".to_string(),
        })?;

        let sidecar_path = source.with_extension("json");
        let sidecar_err = |reason: String| FrameError::Sidecar {
            path: sidecar_path.clone(),
            reason,
        };

        let raw = std::fs::read_to_string(&sidecar_path)?;
        let sidecar: FrameSidecar =
            serde_json::from_str(&raw).map_err(|e| sidecar_err(e.to_string()))?;

        if sidecar.latitude.len() != rows {
            return Err(sidecar_err(format!(
                "latitude axis has {} entries for {} rows",
                sidecar.latitude.len(),
                rows
            )));
        }
        if sidecar.longitude.len() != cols {
            return Err(sidecar_err(format!(
                "longitude axis has {} entries for {} columns",
                sidecar.longitude.len(),
                cols
            )));
        }

        // Two timestamp fields may be present; prefer valid_time.
        let timestamp = sidecar.valid_time.or(sidecar.time);

        debug!(source = %source.display(), rows, cols, "loaded frame");

        Ok(Frame {
            grid,
            axes: GeoAxes::new(sidecar.latitude, sidecar.longitude),
            timestamp,
        })
    }
}

/// List the frame sources in a directory, sorted by filename.
///
/// Non-recursive; only `.npy` files are considered. Byte-order filename
/// sorting is the run's frame order, so zero-padded frame names sort the
/// way they were written. An empty directory yields an empty list, which
/// callers treat as "nothing to do" rather than an error.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            FrameError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")
            }))
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("npy") {
            frames.push(path.to_path_buf());
        }
    }
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storm_common::GeoAxes;

    fn sample_frame() -> Frame {
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        Frame {
            grid: ReflectivityGrid::new(data, 3, 2).unwrap(),
            axes: GeoAxes::new(vec![40.0, 39.9], vec![-100.0, -99.9, -99.8]),
            timestamp: Some("2024-06-01T12:00".to_string()),
        }
    }

    #[test]
    fn test_write_then_load_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000.npy");

        let store = NpyFrameStore::new();
        store.write_frame(&path, &sample_frame()).unwrap();

        let loaded = store.load_frame(&path).unwrap();
        assert_eq!(loaded.grid.shape(), (2, 3));
        assert_eq!(loaded.grid.get(1, 2), Some(5.0));
        assert_eq!(loaded.axes.lat.len(), 2);
        assert_eq!(loaded.timestamp.as_deref(), Some("2024-06-01T12:00"));
    }

    #[test]
    fn test_load_frame_prefers_valid_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000.npy");

        npy::write_file(&path, &[0.0; 4], (2, 2)).unwrap();
        std::fs::write(
            path.with_extension("json"),
            r#"{"latitude": [1.0, 2.0], "longitude": [3.0, 4.0],
                "valid_time": "2024-06-01T12:00", "time": "1999-01-01T00:00"}"#,
        )
        .unwrap();

        let frame = NpyFrameStore::new().load_frame(&path).unwrap();
        assert_eq!(frame.timestamp.as_deref(), Some("2024-06-01T12:00"));
    }

    #[test]
    fn test_load_frame_falls_back_to_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000.npy");

        npy::write_file(&path, &[0.0; 4], (2, 2)).unwrap();
        std::fs::write(
            path.with_extension("json"),
            r#"{"latitude": [1.0, 2.0], "longitude": [3.0, 4.0], "time": "1999-01-01T00:00"}"#,
        )
        .unwrap();

        let frame = NpyFrameStore::new().load_frame(&path).unwrap();
        assert_eq!(frame.timestamp.as_deref(), Some("1999-01-01T00:00"));
    }

    #[test]
    fn test_load_frame_rejects_axis_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000.npy");

        npy::write_file(&path, &[0.0; 4], (2, 2)).unwrap();
        std::fs::write(
            path.with_extension("json"),
            r#"{"latitude": [1.0], "longitude": [3.0, 4.0]}"#,
        )
        .unwrap();

        let err = NpyFrameStore::new().load_frame(&path).unwrap_err();
        assert!(matches!(err, FrameError::Sidecar { .. }));
    }

    #[test]
    fn test_load_frame_missing_sidecar_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000.npy");
        npy::write_file(&path, &[0.0; 4], (2, 2)).unwrap();

        let err = NpyFrameStore::new().load_frame(&path).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_list_frames_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_002.npy", "frame_000.npy", "frame_001.npy", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let frames = list_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["frame_000.npy", "frame_001.npy", "frame_002.npy"]);
    }

    #[test]
    fn test_list_frames_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_frames(dir.path()).unwrap().is_empty());
    }
}
