use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::comparator::{Comparison, ComparisonStats};
use crate::error::{Error, Result};
use crate::graph::{SimilarSet, SimilarityEdge};
use crate::store::LoadFailure;
use crate::types::{ImageRecord, Resolution};

/// One image and the images judged similar to it
#[derive(Debug, Clone)]
pub struct ReportEntry {
    record: Arc<ImageRecord>,
    similar: SimilarSet,
}

impl ReportEntry {
    pub fn record(&self) -> &Arc<ImageRecord> {
        &self.record
    }

    pub fn path(&self) -> &Path {
        self.record.path()
    }

    pub fn size_kb(&self) -> Result<u64> {
        self.record.size_kb()
    }

    pub fn resolution(&self) -> Resolution {
        self.record.resolution()
    }

    /// Similar images, most similar first
    pub fn similar(&self) -> &SimilarSet {
        &self.similar
    }

    pub fn has_matches(&self) -> bool {
        !self.similar.is_empty()
    }

    pub fn is_duplicate(&self) -> bool {
        self.record.is_duplicate()
    }
}

/// Everything a collaborator may read after a run
#[derive(Debug)]
pub struct SimilarityReport {
    entries: Vec<ReportEntry>,
    index: HashMap<PathBuf, usize>,
    stats: ComparisonStats,
    threshold: f64,
    failures: Vec<LoadFailure>,
}

impl SimilarityReport {
    /// Build a report from the compared images, in slice order
    pub fn new(
        images: &[Arc<ImageRecord>],
        comparison: Comparison,
        threshold: f64,
        failures: Vec<LoadFailure>,
    ) -> Self {
        let Comparison { mut graph, stats } = comparison;

        let mut entries = Vec::with_capacity(images.len());
        let mut index = HashMap::with_capacity(images.len());
        for record in images {
            if index.contains_key(record.path()) {
                continue;
            }
            index.insert(record.path().to_path_buf(), entries.len());
            entries.push(ReportEntry {
                record: Arc::clone(record),
                similar: graph.take(record.path()),
            });
        }

        Self {
            entries,
            index,
            stats,
            threshold,
            failures,
        }
    }

    pub fn get(&self, path: &Path) -> Option<&ReportEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Every compared image, including those without matches
    pub fn all(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }

    /// Images with at least one similar image
    pub fn matched(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| entry.has_matches())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matched path → matched paths, without scores
    pub fn as_path_map(&self) -> BTreeMap<PathBuf, BTreeSet<PathBuf>> {
        self.matched()
            .map(|entry| {
                let similar = entry.similar.paths().map(Path::to_path_buf).collect();
                (entry.path().to_path_buf(), similar)
            })
            .collect()
    }

    /// Matched path → edges sorted by score
    pub fn as_score_map(&self) -> BTreeMap<PathBuf, Vec<SimilarityEdge>> {
        self.matched()
            .map(|entry| {
                (
                    entry.path().to_path_buf(),
                    entry.similar.as_slice().to_vec(),
                )
            })
            .collect()
    }

    /// Flag `path` as a duplicate. Has no effect on comparisons.
    pub fn mark_duplicate(&self, path: &Path) -> Result<()> {
        self.set_duplicate(path, true)
    }

    pub fn unmark_duplicate(&self, path: &Path) -> Result<()> {
        self.set_duplicate(path, false)
    }

    fn set_duplicate(&self, path: &Path, duplicate: bool) -> Result<()> {
        let entry = self
            .get(path)
            .ok_or_else(|| Error::UnknownImage(path.to_path_buf()))?;
        entry.record.set_duplicate(duplicate);
        Ok(())
    }

    pub fn marked_duplicates(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| entry.is_duplicate())
    }

    pub fn stats(&self) -> ComparisonStats {
        self.stats
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Files that were discovered but not loaded
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Serializable snapshot of the matched images
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            generated_at: Utc::now(),
            threshold: self.threshold,
            images_compared: self.entries.len(),
            stats: self.stats,
            matched: self
                .matched()
                .map(|entry| EntrySummary {
                    path: entry.path().to_path_buf(),
                    size_kb: entry.size_kb().ok(),
                    resolution: entry.resolution(),
                    duplicate: entry.is_duplicate(),
                    similar: entry.similar.as_slice().to_vec(),
                })
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|failure| FailureSummary {
                    path: failure.path.clone(),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    pub path: PathBuf,
    pub size_kb: Option<u64>,
    pub resolution: Resolution,
    pub duplicate: bool,
    pub similar: Vec<SimilarityEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureSummary {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    pub images_compared: usize,
    pub stats: ComparisonStats,
    pub matched: Vec<EntrySummary>,
    pub failures: Vec<FailureSummary>,
}
