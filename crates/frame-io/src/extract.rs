//! Gzip archive extraction for downloaded frame files.
//!
//! Archived inputs arrive as `<name>.gz`; extraction strips the suffix and
//! writes the decompressed file into the raw data directory. A file that
//! fails to decompress is logged and skipped so one bad download does not
//! block the rest of the batch.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{FrameError, Result};

/// Extract every `*.gz` file in `src_dir` into `dst_dir`.
///
/// Returns the paths of the successfully extracted files, in filename
/// order. An empty source directory yields an empty list.
pub fn extract_archives(src_dir: &Path, dst_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dst_dir)?;

    let mut archives = Vec::new();
    for entry in WalkDir::new(src_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            FrameError::Io(e.into_io_error().unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "walkdir error")
            }))
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            archives.push(path.to_path_buf());
        }
    }
    archives.sort();

    if archives.is_empty() {
        info!(dir = %src_dir.display(), "no .gz archives found");
        return Ok(Vec::new());
    }

    info!(count = archives.len(), "extracting archives");

    let mut extracted = Vec::new();
    for archive in &archives {
        // frame_000.npy.gz -> frame_000.npy
        let Some(stem) = archive.file_stem() else {
            continue;
        };
        let target = dst_dir.join(stem);

        match extract_one(archive, &target) {
            Ok(bytes) => {
                info!(
                    archive = %archive.display(),
                    target = %target.display(),
                    bytes,
                    "extracted"
                );
                extracted.push(target);
            }
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "extraction failed, skipping");
                // A half-written target would be indistinguishable from a
                // valid frame; remove it.
                let _ = fs::remove_file(&target);
            }
        }
    }

    info!(
        extracted = extracted.len(),
        failed = archives.len() - extracted.len(),
        "extraction complete"
    );
    Ok(extracted)
}

/// Decompress a single gzip archive to `target`, returning the byte count.
fn extract_one(archive: &Path, target: &Path) -> Result<u64> {
    let mut decoder = GzDecoder::new(File::open(archive)?);
    let mut out = File::create(target)?;
    io::copy(&mut decoder, &mut out).map_err(|e| FrameError::Decompression {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_extract_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("frame_000.npy.gz"), gzip(b"grid data")).unwrap();

        let extracted = extract_archives(src.path(), dst.path()).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(
            extracted[0].file_name().unwrap().to_str().unwrap(),
            "frame_000.npy"
        );
        assert_eq!(std::fs::read(&extracted[0]).unwrap(), b"grid data");
    }

    #[test]
    fn test_extract_skips_corrupt_archive() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("bad.npy.gz"), b"not gzip at all").unwrap();
        std::fs::write(src.path().join("good.npy.gz"), gzip(b"ok")).unwrap();

        let extracted = extract_archives(src.path(), dst.path()).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(
            extracted[0].file_name().unwrap().to_str().unwrap(),
            "good.npy"
        );
        // The corrupt archive must not leave a partial target behind.
        assert!(!dst.path().join("bad.npy").exists());
    }

    #[test]
    fn test_extract_empty_dir() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        assert!(extract_archives(src.path(), dst.path()).unwrap().is_empty());
    }

    #[test]
    fn test_extract_ignores_other_files() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("readme.txt"), b"hello").unwrap();
        assert!(extract_archives(src.path(), dst.path()).unwrap().is_empty());
    }
}
