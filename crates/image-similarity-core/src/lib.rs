//! Core functionality for grouping similar images.
//!
//! This library provides the components of a comparison run:
//! - File discovery and decoding with per-path memoization
//! - Geometry normalization with a per-path resize cache
//! - The pixel-set difference metric
//! - Pairwise comparison and the report handed to collaborators
//!
//! Previews and relocation of duplicates live alongside the engine but never
//! influence a comparison.

// -- External Dependencies --
use log::info;
use std::path::Path;
use std::time::Instant;

// -- Internal Modules --
mod cache;
mod error;

// -- Public Re-exports --
pub use comparator::{Comparator, Comparison, ComparisonStats};
pub use config::*;
pub use error::{Error, Result};
pub use graph::{SimilarSet, SimilarityEdge, SimilarityGraph};
pub use normalize::GeometryNormalizer;
pub use report::{ReportEntry, ReportSummary, SimilarityReport};
pub use store::{ImageStore, LoadFailure, LoadReport};
pub use types::*;

// -- Public Modules --
pub mod action;
pub mod comparator;
pub mod config;
pub mod discovery;
pub mod graph;
pub mod logging;
pub mod metric;
pub mod normalize;
pub mod preview;
pub mod report;
pub mod store;
pub mod types;

/// Main entry point for a comparison run
pub struct SimilarityEngine {
    config: Config,
}

impl SimilarityEngine {
    /// Create a new engine, rejecting invalid configuration up front
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load every image in `directory`, compare all pairs and build a report.
    ///
    /// Each call starts with empty decode, resize and pixel-set caches.
    pub fn run(&self, directory: &Path) -> Result<SimilarityReport> {
        let start = Instant::now();
        info!(
            "Comparing images in {} (threshold {})",
            directory.display(),
            self.config.threshold
        );

        let store = ImageStore::new(&self.config);
        let loaded = store.load_all(directory)?;

        let comparator = Comparator::from_config(&self.config);
        let comparison = comparator.compare(&loaded.images, self.config.threshold)?;

        let report = SimilarityReport::new(
            &loaded.images,
            comparison,
            self.config.threshold,
            loaded.failures,
        );

        info!(
            "Run finished in {:.2?}: {} of {} images have similar images",
            start.elapsed(),
            report.matched().count(),
            report.len()
        );
        Ok(report)
    }
}
