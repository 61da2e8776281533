//! Configuration for the storm patch extraction pipeline.

use serde::{Deserialize, Serialize};

/// Immutable configuration passed into each pipeline stage.
///
/// Defaults match the MRMS composite-reflectivity setup the pipeline was
/// built for: 35 dBZ storm threshold on a ~0.01 degree CONUS grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum reflectivity (dBZ) for a cell to count as storm foreground.
    pub threshold_dbz: f32,

    /// Minimum pixel count for a labeled region to be kept.
    pub min_storm_pixels: usize,

    /// Minimum Euclidean separation between selected centers, in cells.
    pub min_distance: f64,

    /// Maximum number of centers selected per analysis.
    pub max_patches: usize,

    /// Side length of the square patches, in cells.
    pub patch_size: usize,

    /// Number of frames sampled during analysis.
    pub sample_files: usize,

    /// Extra attempts for I/O-class frame load failures during cropping.
    pub load_retries: u32,

    /// Optional per-frame wall-clock bound during cropping, in seconds.
    /// A frame that exceeds it is treated as a recoverable per-frame failure.
    pub frame_deadline_secs: Option<u64>,

    /// Fan cropping out across frames with a thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_dbz: 35.0,
            min_storm_pixels: 100,
            min_distance: 500.0,
            max_patches: 6,
            patch_size: 1468,
            sample_files: 1,
            load_retries: 2,
            frame_deadline_secs: None,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STORM_THRESHOLD_DBZ") {
            if let Ok(v) = val.parse() {
                config.threshold_dbz = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_MIN_PIXELS") {
            if let Ok(v) = val.parse() {
                config.min_storm_pixels = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_MIN_DISTANCE") {
            if let Ok(v) = val.parse() {
                config.min_distance = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_MAX_PATCHES") {
            if let Ok(v) = val.parse() {
                config.max_patches = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_PATCH_SIZE") {
            if let Ok(v) = val.parse() {
                config.patch_size = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_SAMPLE_FILES") {
            if let Ok(v) = val.parse() {
                config.sample_files = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_LOAD_RETRIES") {
            if let Ok(v) = val.parse() {
                config.load_retries = v;
            }
        }

        if let Ok(val) = std::env::var("STORM_FRAME_DEADLINE_SECS") {
            if let Ok(v) = val.parse() {
                config.frame_deadline_secs = Some(v);
            }
        }

        if let Ok(val) = std::env::var("STORM_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.patch_size == 0 {
            return Err("patch_size must be > 0".to_string());
        }

        if self.max_patches == 0 {
            return Err("max_patches must be > 0".to_string());
        }

        if self.min_storm_pixels == 0 {
            return Err("min_storm_pixels must be > 0".to_string());
        }

        if self.sample_files == 0 {
            return Err("sample_files must be > 0".to_string());
        }

        if !self.threshold_dbz.is_finite() {
            return Err("threshold_dbz must be finite".to_string());
        }

        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err("min_distance must be finite and >= 0".to_string());
        }

        Ok(())
    }

    /// Half of the patch side, the margin used by bounds checks and crops.
    pub fn half_patch(&self) -> usize {
        self.patch_size / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold_dbz, 35.0);
        assert_eq!(config.min_storm_pixels, 100);
        assert_eq!(config.min_distance, 500.0);
        assert_eq!(config.max_patches, 6);
        assert_eq!(config.patch_size, 1468);
        assert_eq!(config.sample_files, 1);
        assert_eq!(config.load_retries, 2);
        assert_eq!(config.frame_deadline_secs, None);
        assert!(!config.parallel);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_ok());

        config.patch_size = 0;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.max_patches = 0;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.min_distance = f64::NAN;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.min_distance = -1.0;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.threshold_dbz = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_half_patch() {
        let mut config = PipelineConfig::default();
        config.patch_size = 20;
        assert_eq!(config.half_patch(), 10);

        config.patch_size = 21;
        assert_eq!(config.half_patch(), 10);
    }
}
