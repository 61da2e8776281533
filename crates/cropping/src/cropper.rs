//! The multi-frame cropping run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use frame_io::{Frame, FrameLoader};
use patch_store::{PatchStore, RunMetadata};
use storm_common::{CellCoord, GeoAxes, GeoPoint, PipelineConfig};

use crate::error::{CropError, Result};

/// Summary of one cropping run.
///
/// `frames_failed` and `shape_mismatches` make partial output visible: a
/// run that "succeeded" with holes in the series reports exactly how many
/// frames and patches are missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CropReport {
    pub frames_total: usize,
    pub frames_ok: usize,
    pub frames_failed: usize,
    pub patches_written: usize,
    pub shape_mismatches: usize,
}

impl CropReport {
    /// Whether every frame produced its full set of patches.
    pub fn all_succeeded(&self) -> bool {
        self.frames_failed == 0 && self.shape_mismatches == 0
    }
}

/// Outcome of processing one frame.
#[derive(Debug)]
struct FrameOutcome {
    ordinal: usize,
    timestamp: Option<String>,
    patches_written: usize,
    shape_mismatches: usize,
    status: FrameStatus,
    /// The frame's axes, kept only for a completed frame so the run can
    /// establish its reference coordinate grid.
    axes: Option<GeoAxes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStatus {
    Completed,
    Failed,
    AxesMismatch,
}

impl FrameOutcome {
    fn failed(ordinal: usize, shape_mismatches: usize) -> Self {
        Self {
            ordinal,
            timestamp: None,
            patches_written: 0,
            shape_mismatches,
            status: FrameStatus::Failed,
            axes: None,
        }
    }
}

/// Crops every selected center out of every frame in a sorted source list.
///
/// Frames are processed in list order; that order is the frame ordinal used
/// for patch filenames and metadata keys, so re-ordering the inputs changes
/// the output. The default mode is strictly sequential. With
/// `config.parallel` the frames after the first completed one fan out over
/// a thread pool: patch files are keyed by (case, frame ordinal) so writers
/// never collide, and per-frame results funnel back into one ordered
/// accumulator.
pub struct PatchCropper<'a, L> {
    loader: &'a L,
    store: &'a PatchStore,
    config: &'a PipelineConfig,
}

impl<'a, L: FrameLoader + Sync> PatchCropper<'a, L> {
    pub fn new(loader: &'a L, store: &'a PatchStore, config: &'a PipelineConfig) -> Self {
        Self {
            loader,
            store,
            config,
        }
    }

    /// Run the crop over all sources, then write the run metadata record.
    ///
    /// The metadata is written once, after the frame loop. Patches from
    /// frames processed before a fatal error survive on disk, but the
    /// metadata record does not exist until the run completes.
    pub fn run(&self, sources: &[PathBuf], centers: &[CellCoord]) -> Result<CropReport> {
        if sources.is_empty() {
            return Err(CropError::NoFrames);
        }

        info!(
            frames = sources.len(),
            centers = centers.len(),
            parallel = self.config.parallel,
            "starting cropping run"
        );

        self.store.create_case_dirs(centers.len())?;

        let mut report = CropReport {
            frames_total: sources.len(),
            ..CropReport::default()
        };
        let mut timestamps: BTreeMap<usize, String> = BTreeMap::new();

        // The first completed frame establishes the run's reference axes;
        // every later frame is validated against them. Geo-coordinates for
        // the selected centers are derived from that one frame and never
        // recomputed.
        let mut reference: Option<GeoAxes> = None;
        let mut centers_gps: Vec<GeoPoint> = Vec::new();

        let mut fan_out_from = sources.len();
        for (ordinal, source) in sources.iter().enumerate() {
            let outcome = self.process_frame(ordinal, source, centers, reference.as_ref());

            if reference.is_none() {
                if let Some(axes) = outcome.axes.clone() {
                    centers_gps = convert_centers(&axes, centers);
                    reference = Some(axes);

                    if self.config.parallel {
                        self.absorb(&mut report, &mut timestamps, outcome)?;
                        fan_out_from = ordinal + 1;
                        break;
                    }
                }
            }

            self.absorb(&mut report, &mut timestamps, outcome)?;
        }

        if self.config.parallel && fan_out_from < sources.len() {
            let outcomes: Vec<FrameOutcome> = sources[fan_out_from..]
                .par_iter()
                .enumerate()
                .map(|(i, source)| {
                    self.process_frame(fan_out_from + i, source, centers, reference.as_ref())
                })
                .collect();

            for outcome in outcomes {
                self.absorb(&mut report, &mut timestamps, outcome)?;
            }
        }

        let metadata = RunMetadata {
            patch_size: self.config.patch_size,
            centers: centers.to_vec(),
            centers_gps,
            num_files: sources.len(),
            timestamps,
        };
        self.store.write_metadata(&metadata)?;

        if report.all_succeeded() {
            info!(
                frames = report.frames_ok,
                patches = report.patches_written,
                "cropping complete"
            );
        } else {
            warn!(
                frames_ok = report.frames_ok,
                frames_failed = report.frames_failed,
                shape_mismatches = report.shape_mismatches,
                patches = report.patches_written,
                "cropping finished with gaps"
            );
        }

        Ok(report)
    }

    /// Fold one frame's outcome into the run accumulators.
    fn absorb(
        &self,
        report: &mut CropReport,
        timestamps: &mut BTreeMap<usize, String>,
        outcome: FrameOutcome,
    ) -> Result<()> {
        report.shape_mismatches += outcome.shape_mismatches;
        match outcome.status {
            FrameStatus::Completed => {
                report.frames_ok += 1;
                report.patches_written += outcome.patches_written;
                if let Some(ts) = outcome.timestamp {
                    timestamps.insert(outcome.ordinal, ts);
                }
            }
            FrameStatus::Failed => {
                report.frames_failed += 1;
            }
            FrameStatus::AxesMismatch => {
                return Err(CropError::AxesMismatch {
                    frame: outcome.ordinal,
                });
            }
        }
        Ok(())
    }

    /// Load, validate, crop, and persist one frame.
    ///
    /// Any failure here is frame-local: the outcome records it and the run
    /// moves on. No patch file is written for a frame that fails, so a
    /// frame is either fully present in the series or fully absent.
    fn process_frame(
        &self,
        ordinal: usize,
        source: &Path,
        centers: &[CellCoord],
        reference: Option<&GeoAxes>,
    ) -> FrameOutcome {
        let started = Instant::now();

        let frame = match self.load_with_retry(source) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    frame = ordinal,
                    source = %source.display(),
                    error = %e,
                    "frame load failed, skipping"
                );
                return FrameOutcome::failed(ordinal, 0);
            }
        };

        if let Some(reference) = reference {
            if !frame.axes.same_grid(reference) {
                warn!(frame = ordinal, source = %source.display(), "coordinate axes mismatch");
                return FrameOutcome {
                    ordinal,
                    timestamp: None,
                    patches_written: 0,
                    shape_mismatches: 0,
                    status: FrameStatus::AxesMismatch,
                    axes: None,
                };
            }
        }

        let timestamp = frame.timestamp.as_deref().map(normalize_timestamp);

        // Crop all windows first, write second: if the frame misses its
        // deadline or a write fails, nothing partial stays on disk.
        let half = self.config.half_patch();
        let expected = (self.config.patch_size, self.config.patch_size);
        let mut crops: Vec<(usize, Vec<f32>)> = Vec::with_capacity(centers.len());
        let mut shape_mismatches = 0usize;

        for (i, &center) in centers.iter().enumerate() {
            let (data, width, height) = frame.grid.window(
                center.row.saturating_sub(half),
                center.row + half,
                center.col.saturating_sub(half),
                center.col + half,
            );
            if (height, width) != expected {
                shape_mismatches += 1;
                debug!(
                    case = i + 1,
                    frame = ordinal,
                    got_height = height,
                    got_width = width,
                    "patch shape mismatch, skipping"
                );
                continue;
            }
            crops.push((i + 1, data));
        }

        if let Some(deadline) = self.config.frame_deadline_secs {
            if started.elapsed() > Duration::from_secs(deadline) {
                warn!(
                    frame = ordinal,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "frame exceeded deadline, discarding"
                );
                return FrameOutcome::failed(ordinal, shape_mismatches);
            }
        }

        let mut written = 0usize;
        for (case, data) in &crops {
            if let Err(e) = self.store.write_patch(*case, ordinal, data, expected) {
                warn!(
                    frame = ordinal,
                    case,
                    error = %e,
                    "patch write failed, discarding frame"
                );
                self.remove_frame_patches(centers.len(), ordinal);
                return FrameOutcome::failed(ordinal, shape_mismatches);
            }
            written += 1;
        }

        info!(
            frame = ordinal + 1,
            source = %source.display(),
            patches = written,
            "frame processed"
        );

        FrameOutcome {
            ordinal,
            timestamp,
            patches_written: written,
            shape_mismatches,
            status: FrameStatus::Completed,
            axes: Some(frame.axes),
        }
    }

    /// Load a frame, retrying I/O-class failures a bounded number of times.
    /// Malformed data is never retried.
    fn load_with_retry(&self, source: &Path) -> frame_io::Result<Frame> {
        let mut attempt = 0u32;
        loop {
            match self.loader.load_frame(source) {
                Ok(frame) => return Ok(frame),
                Err(e) if e.is_retryable() && attempt < self.config.load_retries => {
                    attempt += 1;
                    warn!(
                        source = %source.display(),
                        attempt,
                        error = %e,
                        "retrying frame load"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Best-effort removal of whatever this frame already wrote.
    fn remove_frame_patches(&self, num_centers: usize, ordinal: usize) {
        for case in 1..=num_centers {
            let _ = std::fs::remove_file(self.store.patch_path(case, ordinal));
        }
    }
}

/// Map the selected centers to geographic points via the reference axes.
fn convert_centers(axes: &GeoAxes, centers: &[CellCoord]) -> Vec<GeoPoint> {
    centers
        .iter()
        .filter_map(|&center| {
            let point = axes.point_for(center);
            if point.is_none() {
                warn!(
                    row = center.row,
                    col = center.col,
                    "center outside reference axes, no geo-coordinate"
                );
            }
            point
        })
        .collect()
}

/// Normalize a frame timestamp to minute precision, `YYYY-MM-DDTHH:MM`.
///
/// Unrecognized strings pass through unchanged rather than being dropped.
fn normalize_timestamp(raw: &str) -> String {
    const MINUTE: &str = "%Y-%m-%dT%H:%M";

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(MINUTE).to_string();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return ndt.format(MINUTE).to_string();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(raw, MINUTE) {
        return ndt.format(MINUTE).to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rfc3339() {
        assert_eq!(
            normalize_timestamp("2024-06-01T12:30:45Z"),
            "2024-06-01T12:30"
        );
        assert_eq!(
            normalize_timestamp("2024-06-01T12:30:45+02:00"),
            "2024-06-01T10:30"
        );
    }

    #[test]
    fn test_normalize_naive() {
        assert_eq!(
            normalize_timestamp("2024-06-01T12:30:45"),
            "2024-06-01T12:30"
        );
        assert_eq!(normalize_timestamp("2024-06-01T12:30"), "2024-06-01T12:30");
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize_timestamp("yesterday-ish"), "yesterday-ish");
    }
}
