use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default maximum difference score for two images to count as similar
pub const DEFAULT_THRESHOLD: f64 = 0.02;

/// Default edge length of the canonical resize target
pub const DEFAULT_RESIZE: u32 = 512;

/// Resampling kernel used when two images need a common geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration for a comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum difference score (0.0-1.0) at which two images are similar
    pub threshold: f64,

    /// Width of the canonical buffer used for images of different geometry
    pub resize_width: u32,

    /// Height of the canonical buffer used for images of different geometry
    pub resize_height: u32,

    /// Resampling kernel for the canonical buffer
    pub resize_filter: ResizeFilter,

    /// Number of decode threads (0 = auto)
    pub threads: usize,

    /// Abort the run on the first file that fails to load
    pub strict: bool,

    /// Record every match on both images instead of only the first one visited
    pub symmetric_edges: bool,

    /// Show a progress bar while decoding
    pub show_progress: bool,

    /// Where files marked as duplicates are moved
    pub duplicates_dir: PathBuf,

    /// Whether to run without moving files
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            resize_width: DEFAULT_RESIZE,
            resize_height: DEFAULT_RESIZE,
            resize_filter: ResizeFilter::Triangle,
            threads: 0, // Auto
            strict: false,
            symmetric_edges: false,
            show_progress: false,
            duplicates_dir: PathBuf::from("duplicates"),
            dry_run: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;

        if self.resize_width == 0 || self.resize_height == 0 {
            return Err(Error::Configuration(format!(
                "Resize target must be non-zero, got {}x{}",
                self.resize_width, self.resize_height
            )));
        }

        Ok(())
    }

    /// Canonical resize target as (width, height)
    pub fn resize_target(&self) -> (u32, u32) {
        (self.resize_width, self.resize_height)
    }

    /// Number of decode threads, resolving 0 to the CPU count
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Reject thresholds outside [0, 1], NaN included
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::Configuration(format!(
            "Threshold must be between 0 and 1, got {}",
            threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.threshold, 0.02);
        assert_eq!(config.resize_target(), (512, 512));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        for threshold in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let config = Config {
                threshold,
                ..Config::default()
            };
            assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        }
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
    }

    #[test]
    fn test_zero_resize_target_rejected() {
        let config = Config {
            resize_height: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_worker_threads_auto() {
        let config = Config::default();
        assert!(config.worker_threads() >= 1);

        let config = Config {
            threads: 3,
            ..Config::default()
        };
        assert_eq!(config.worker_threads(), 3);
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            threshold: 0.1,
            symmetric_edges: true,
            resize_filter: ResizeFilter::Nearest,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.threshold, 0.1);
        assert!(loaded.symmetric_edges);
        assert_eq!(loaded.resize_filter, ResizeFilter::Nearest);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "threshold": 0.05 }"#).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.threshold, 0.05);
        assert_eq!(loaded.resize_target(), (512, 512));
    }
}
