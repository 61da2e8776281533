//! The pipeline stages behind each CLI subcommand.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use cropping::{CropError, PatchCropper};
use frame_io::{FrameLoader, NpyFrameStore};
use patch_store::{AnalysisResult, PatchStore};
use storm_common::PipelineConfig;
use storm_detect::analyze_samples;

use crate::preview;

/// Analyze sample frames, select centers, and persist the analysis result.
pub fn run_analyze(
    data_dir: &Path,
    output_dir: &Path,
    write_preview: bool,
    config: &PipelineConfig,
) -> Result<()> {
    let sources = frame_io::list_frames(data_dir)
        .with_context(|| format!("listing frames in {}", data_dir.display()))?;
    if sources.is_empty() {
        info!(dir = %data_dir.display(), "no frame files found, nothing to analyze");
        return Ok(());
    }

    let loader = NpyFrameStore::new();
    let outcome = analyze_samples(&loader, &sources, config)?;

    info!(
        selected = outcome.centers.len(),
        pool = outcome.pool_size,
        "selected storm centers"
    );
    for (i, center) in outcome.centers.iter().enumerate() {
        info!(case = i + 1, row = center.row, col = center.col, "center");
    }

    let store = PatchStore::new(output_dir);
    store.save_analysis(&AnalysisResult {
        centers: outcome.centers.clone(),
    })?;

    // The preview is a side-effect for humans; its failure must never
    // change the pipeline's result.
    if write_preview {
        match loader.load_frame(&sources[0]) {
            Ok(frame) => {
                let path = output_dir.join("storm_centers.png");
                match preview::write_selection_preview(
                    &frame.grid,
                    &outcome.centers,
                    config.patch_size,
                    &path,
                ) {
                    Ok(()) => info!(path = %path.display(), "wrote selection preview"),
                    Err(e) => warn!(error = %e, "preview rendering failed"),
                }
            }
            Err(e) => warn!(error = %e, "could not reload first frame for preview"),
        }
    }

    Ok(())
}

/// Crop patch series from every frame using the saved analysis result.
pub fn run_crop(
    data_dir: &Path,
    output_dir: &Path,
    parallel: bool,
    config: &PipelineConfig,
) -> Result<()> {
    let store = PatchStore::new(output_dir);
    let analysis = store.load_analysis()?;

    let sources = frame_io::list_frames(data_dir)
        .with_context(|| format!("listing frames in {}", data_dir.display()))?;

    info!(
        frames = sources.len(),
        centers = analysis.centers.len(),
        "cropping patch series"
    );

    let mut config = config.clone();
    config.parallel = config.parallel || parallel;

    let loader = NpyFrameStore::new();
    let cropper = PatchCropper::new(&loader, &store, &config);

    let report = match cropper.run(&sources, &analysis.centers) {
        Ok(report) => report,
        Err(CropError::NoFrames) => {
            info!(dir = %data_dir.display(), "no frame files found, nothing to crop");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for case in store.verify()? {
        info!(case = %case.case_name, patches = case.patches, "case verified");
    }

    if report.all_succeeded() {
        info!(
            frames = report.frames_ok,
            patches = report.patches_written,
            "all frames cropped successfully"
        );
    } else {
        warn!(
            frames_ok = report.frames_ok,
            frames_failed = report.frames_failed,
            shape_mismatches = report.shape_mismatches,
            "cropping finished with gaps; the patch series has holes"
        );
    }

    Ok(())
}

/// Extract .gz archives into the raw frame directory.
pub fn run_extract(compressed_dir: &Path, data_dir: &Path) -> Result<()> {
    let extracted = frame_io::extract_archives(compressed_dir, data_dir)
        .with_context(|| format!("extracting archives from {}", compressed_dir.display()))?;
    info!(count = extracted.len(), dir = %data_dir.display(), "archives extracted");
    Ok(())
}
