//! On-disk layout and record schemas.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use walkdir::WalkDir;

use frame_io::npy;
use storm_common::{CellCoord, GeoPoint};

use crate::error::{Result, StoreError};

/// Filename of the persisted analysis result.
const ANALYSIS_FILE: &str = "analysis_results.json";

/// Filename of the run metadata record.
const METADATA_FILE: &str = "metadata.json";

/// The persisted analysis result: the ordered selected centers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub centers: Vec<CellCoord>,
}

/// Aggregate record describing one cropping run.
///
/// Built incrementally across frames and written once at the end of the
/// run. `timestamps` is keyed by the frame's original ordinal in the sorted
/// source list, so a failed frame leaves a visible hole rather than
/// shifting later entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub patch_size: usize,
    pub centers: Vec<CellCoord>,
    pub centers_gps: Vec<GeoPoint>,
    pub num_files: usize,
    pub timestamps: BTreeMap<usize, String>,
}

/// Patch count for one case directory, as recounted from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseCount {
    pub case_name: String,
    pub patches: usize,
}

/// Handle on one output directory.
#[derive(Debug, Clone)]
pub struct PatchStore {
    root: PathBuf,
}

impl PatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the persisted analysis result.
    pub fn analysis_path(&self) -> PathBuf {
        self.root.join(ANALYSIS_FILE)
    }

    /// Path of the run metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Directory of one case; `case` is the 1-based selection ordinal.
    pub fn case_dir(&self, case: usize) -> PathBuf {
        self.root.join(format!("case_{:02}", case))
    }

    /// Path of one patch artifact; `frame` is the 0-based frame ordinal.
    pub fn patch_path(&self, case: usize, frame: usize) -> PathBuf {
        self.case_dir(case).join(format!("frame_{:03}.npy", frame))
    }

    /// Persist the analysis result, creating the output directory.
    pub fn save_analysis(&self, result: &AnalysisResult) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(result)?;
        fs::write(self.analysis_path(), json)?;
        info!(path = %self.analysis_path().display(), centers = result.centers.len(), "saved analysis result");
        Ok(())
    }

    /// Re-load a previously persisted analysis result.
    ///
    /// This is how cropping learns its centers; a missing file means
    /// analysis has not been run yet.
    pub fn load_analysis(&self) -> Result<AnalysisResult> {
        let path = self.analysis_path();
        if !path.exists() {
            return Err(StoreError::MissingAnalysis(path));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Create the per-case directories for `count` selected centers.
    pub fn create_case_dirs(&self, count: usize) -> Result<()> {
        for case in 1..=count {
            fs::create_dir_all(self.case_dir(case))?;
        }
        Ok(())
    }

    /// Write one patch artifact. `shape` must be the patch's actual shape;
    /// the caller has already verified it matches the configured size.
    pub fn write_patch(
        &self,
        case: usize,
        frame: usize,
        data: &[f32],
        shape: (usize, usize),
    ) -> Result<()> {
        npy::write_file(&self.patch_path(case, frame), data, shape)?;
        Ok(())
    }

    /// Write the run metadata record. Called once, after the frame loop.
    pub fn write_metadata(&self, metadata: &RunMetadata) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(self.metadata_path(), json)?;
        info!(path = %self.metadata_path().display(), "wrote run metadata");
        Ok(())
    }

    /// Re-load the run metadata record.
    pub fn load_metadata(&self) -> Result<RunMetadata> {
        let raw = fs::read_to_string(self.metadata_path())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Recount the persisted patches per case directory.
    pub fn verify(&self) -> Result<Vec<CaseCount>> {
        let mut counts = Vec::new();

        let mut case_dirs: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")
                }))
            })?;
            let path = entry.path();
            let is_case = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("case_"))
                    .unwrap_or(false);
            if is_case {
                case_dirs.push(path.to_path_buf());
            }
        }
        case_dirs.sort();

        for dir in case_dirs {
            let patches = fs::read_dir(&dir)?
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.path().extension().and_then(|x| x.to_str()) == Some("npy")
                })
                .count();
            let case_name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            info!(case = %case_name, patches, "verified case");
            counts.push(CaseCount { case_name, patches });
        }

        Ok(counts)
    }
}
