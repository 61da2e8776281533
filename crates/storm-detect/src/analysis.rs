//! Sample-frame analysis: pool candidates, then select centers.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use frame_io::{FrameError, FrameLoader};
use storm_common::{CellCoord, PipelineConfig};

use crate::centroid::extract_centroids;
use crate::label::label_regions;
use crate::select::select_centers;

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The very first sample frame could not be loaded. Without it there is
    /// no grid shape to select against, so the analysis cannot proceed.
    #[error("failed to load the first sample frame {path}: {source}")]
    FirstSample {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    /// No frame sources were provided.
    #[error("no sample frames available")]
    NoSamples,
}

/// Result of one analysis run over the sample frames.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The selected centers, in selection order.
    pub centers: Vec<CellCoord>,
    /// Candidates pooled across all sample frames before selection.
    pub pool_size: usize,
    /// Shape of the first sample frame's grid, (rows, cols).
    pub grid_shape: (usize, usize),
    /// Sample frames successfully analyzed.
    pub samples_analyzed: usize,
    /// Sample frames skipped after a load failure.
    pub samples_failed: usize,
}

/// Analyze up to `config.sample_files` frames and select patch centers.
///
/// Candidate centroids from each sample are concatenated into one pool in
/// frame order with no cross-frame deduplication, so a storm visible in two
/// samples contributes two near-duplicate candidates. A load failure on the
/// first sample is fatal; failures on later samples are logged and skipped.
/// The grid shape used for bounds checks comes from the first sample.
pub fn analyze_samples<L: FrameLoader>(
    loader: &L,
    sources: &[PathBuf],
    config: &PipelineConfig,
) -> Result<AnalysisOutcome, AnalysisError> {
    if sources.is_empty() {
        return Err(AnalysisError::NoSamples);
    }

    let samples = &sources[..sources.len().min(config.sample_files)];

    let mut pool: Vec<CellCoord> = Vec::new();
    let mut grid_shape = None;
    let mut samples_analyzed = 0usize;
    let mut samples_failed = 0usize;

    for (i, source) in samples.iter().enumerate() {
        info!(
            sample = i + 1,
            total = samples.len(),
            source = %source.display(),
            "analyzing sample frame"
        );

        let frame = match loader.load_frame(source) {
            Ok(frame) => frame,
            Err(e) if i == 0 => {
                return Err(AnalysisError::FirstSample {
                    path: source.clone(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "skipping sample frame");
                samples_failed += 1;
                continue;
            }
        };

        if grid_shape.is_none() {
            grid_shape = Some(frame.grid.shape());
        }

        let map = label_regions(&frame.grid, config.threshold_dbz);
        let census = extract_centroids(&map, config.min_storm_pixels);
        info!(
            storms = census.centers.len(),
            dropped = census.regions_dropped,
            "sample frame analyzed"
        );

        pool.extend(census.centers);
        samples_analyzed += 1;
    }

    // The first sample always loads (or we bailed above), so the shape is set.
    let grid_shape = grid_shape.unwrap_or((0, 0));

    let centers = select_centers(&pool, grid_shape, config);
    info!(
        pool = pool.len(),
        selected = centers.len(),
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        centers,
        pool_size: pool.len(),
        grid_shape,
        samples_analyzed,
        samples_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_io::{Frame, NpyFrameStore};
    use storm_common::GeoAxes;
    use test_utils::reflectivity_grid_with_storms;

    /// Write a synthetic frame directory and return the sorted source list.
    fn frame_dir(
        dir: &std::path::Path,
        grids: &[storm_common::ReflectivityGrid],
    ) -> Vec<PathBuf> {
        let store = NpyFrameStore::new();
        for (i, grid) in grids.iter().enumerate() {
            let (rows, cols) = grid.shape();
            let frame = Frame {
                grid: grid.clone(),
                axes: GeoAxes::new(
                    (0..rows).map(|r| 50.0 - r as f64 * 0.01).collect(),
                    (0..cols).map(|c| -110.0 + c as f64 * 0.01).collect(),
                ),
                timestamp: Some(format!("2024-06-01T12:{:02}", i)),
            };
            store
                .write_frame(&dir.join(format!("frame_{:03}.npy", i)), &frame)
                .unwrap();
        }
        frame_io::list_frames(dir).unwrap()
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            threshold_dbz: 35.0,
            min_storm_pixels: 9,
            min_distance: 10.0,
            max_patches: 4,
            patch_size: 8,
            sample_files: 2,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_single_sample_selects_storm() {
        let dir = tempfile::tempdir().unwrap();
        let grid = reflectivity_grid_with_storms(64, 64, &[(30, 30, 2, 50.0)]);
        let sources = frame_dir(dir.path(), &[grid]);

        let outcome = analyze_samples(&NpyFrameStore::new(), &sources, &test_config()).unwrap();
        assert_eq!(outcome.centers, vec![CellCoord::new(30, 30)]);
        assert_eq!(outcome.grid_shape, (64, 64));
        assert_eq!(outcome.samples_analyzed, 1);
        assert_eq!(outcome.samples_failed, 0);
    }

    #[test]
    fn test_pool_concatenates_without_dedup() {
        // The same storm in both samples shows up twice in the pool; the
        // separation rule then keeps only one selected center.
        let dir = tempfile::tempdir().unwrap();
        let grid = reflectivity_grid_with_storms(64, 64, &[(30, 30, 2, 50.0)]);
        let sources = frame_dir(dir.path(), &[grid.clone(), grid]);

        let outcome = analyze_samples(&NpyFrameStore::new(), &sources, &test_config()).unwrap();
        assert_eq!(outcome.pool_size, 2);
        assert_eq!(outcome.centers.len(), 1);
        assert_eq!(outcome.samples_analyzed, 2);
    }

    #[test]
    fn test_first_sample_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = vec![dir.path().join("frame_000.npy")];

        let err = analyze_samples(&NpyFrameStore::new(), &missing, &test_config()).unwrap_err();
        assert!(matches!(err, AnalysisError::FirstSample { .. }));
    }

    #[test]
    fn test_later_sample_failure_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let grid = reflectivity_grid_with_storms(64, 64, &[(30, 30, 2, 50.0)]);
        let mut sources = frame_dir(dir.path(), &[grid]);
        sources.push(dir.path().join("frame_999.npy"));

        let outcome = analyze_samples(&NpyFrameStore::new(), &sources, &test_config()).unwrap();
        assert_eq!(outcome.samples_analyzed, 1);
        assert_eq!(outcome.samples_failed, 1);
        assert_eq!(outcome.centers.len(), 1);
    }

    #[test]
    fn test_empty_sources() {
        let err = analyze_samples(&NpyFrameStore::new(), &[], &test_config()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoSamples));
    }

    #[test]
    fn test_sample_files_limits_frames_read() {
        let dir = tempfile::tempdir().unwrap();
        let a = reflectivity_grid_with_storms(64, 64, &[(20, 20, 2, 50.0)]);
        let b = reflectivity_grid_with_storms(64, 64, &[(40, 40, 2, 50.0)]);
        let sources = frame_dir(dir.path(), &[a, b]);

        let mut cfg = test_config();
        cfg.sample_files = 1;

        let outcome = analyze_samples(&NpyFrameStore::new(), &sources, &cfg).unwrap();
        assert_eq!(outcome.samples_analyzed, 1);
        assert_eq!(outcome.pool_size, 1);
        assert_eq!(outcome.centers, vec![CellCoord::new(20, 20)]);
    }
}
