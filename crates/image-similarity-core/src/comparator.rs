use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::cache::KeyedCache;
use crate::config::{validate_threshold, Config, ResizeFilter};
use crate::error::Result;
use crate::graph::{SimilarityEdge, SimilarityGraph};
use crate::metric::{self, PixelSet, Verdict};
use crate::normalize::GeometryNormalizer;
use crate::types::ImageRecord;

/// Which buffer of an image a pixel set was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Variant {
    Original,
    Resized,
}

/// Counters collected during one comparison run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonStats {
    /// Unordered pairs scored
    pub pairs_evaluated: usize,
    /// Pairs that went through the canonical resize
    pub resized_pairs: usize,
    /// Resize operations performed, at most one per image
    pub resizes: usize,
    /// Pairs resolved by the identical-buffer fast path
    pub exact_matches: usize,
    /// Pairs at or under the threshold
    pub matches: usize,
}

/// Output of [`Comparator::compare`]
#[derive(Debug, Clone)]
pub struct Comparison {
    pub graph: SimilarityGraph,
    pub stats: ComparisonStats,
}

/// Caches owned by a single `compare` call
struct RunCaches {
    normalizer: GeometryNormalizer,
    pixel_sets: KeyedCache<(PathBuf, Variant), PixelSet>,
}

/// Scores every unordered pair of images exactly once.
///
/// The comparator only holds settings. Resized buffers and pixel sets are
/// cached for the duration of one [`compare`](Comparator::compare) call and
/// dropped when it returns.
#[derive(Debug, Clone)]
pub struct Comparator {
    target: (u32, u32),
    filter: ResizeFilter,
    symmetric: bool,
}

impl Comparator {
    pub fn new(target: (u32, u32), filter: ResizeFilter) -> Self {
        Self {
            target,
            filter,
            symmetric: false,
        }
    }

    /// Resize settings and edge symmetry taken from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resize_target(), config.resize_filter)
            .with_symmetric_edges(config.symmetric_edges)
    }

    /// Also record each match on the image visited second
    pub fn with_symmetric_edges(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    /// Compare all images and collect edges scoring at or under `threshold`.
    ///
    /// Images are visited in slice order. Once an image has been the left
    /// side of the outer loop it is done, and later images skip it, so each
    /// unordered pair is scored once, from the side visited first. Unless
    /// symmetric edges are enabled, the edge is recorded on that side only.
    /// Every input image has an entry in the graph, matched or not.
    pub fn compare(&self, images: &[Arc<ImageRecord>], threshold: f64) -> Result<Comparison> {
        validate_threshold(threshold)?;

        let caches = RunCaches {
            normalizer: GeometryNormalizer::new(self.target, self.filter),
            pixel_sets: KeyedCache::new(),
        };
        let mut graph = SimilarityGraph::new();
        let mut stats = ComparisonStats::default();
        let mut done: HashSet<&Path> = HashSet::with_capacity(images.len());

        for left in images {
            graph.add_node(left.path());
            if done.contains(left.path()) {
                continue;
            }

            for right in images {
                if right.path() == left.path() || done.contains(right.path()) {
                    continue;
                }

                let (verdict, resized, exact) = score_pair(&caches, left, right, threshold)?;
                stats.pairs_evaluated += 1;
                if resized {
                    stats.resized_pairs += 1;
                }
                if exact {
                    stats.exact_matches += 1;
                }

                debug!(
                    "{} ~ {}: score {:.6}{}",
                    left.path().display(),
                    right.path().display(),
                    verdict.score,
                    if verdict.is_match { " (match)" } else { "" }
                );

                if verdict.is_match {
                    stats.matches += 1;
                    graph.add_edge(left.path(), SimilarityEdge::new(right.path(), verdict.score));
                    if self.symmetric {
                        graph.add_edge(right.path(), SimilarityEdge::new(left.path(), verdict.score));
                    }
                }
            }

            done.insert(left.path());
        }
        stats.resizes = caches.normalizer.resize_count();

        info!(
            "Compared {} pairs across {} images: {} matches ({} exact, {} resized pairs, {} resizes)",
            stats.pairs_evaluated,
            done.len(),
            stats.matches,
            stats.exact_matches,
            stats.resized_pairs,
            stats.resizes
        );

        Ok(Comparison { graph, stats })
    }
}

/// Verdict for one pair, plus whether it was resized and whether it was exact
fn score_pair(
    caches: &RunCaches,
    left: &ImageRecord,
    right: &ImageRecord,
    threshold: f64,
) -> Result<(Verdict, bool, bool)> {
    let pair = caches.normalizer.normalized(left, right);
    metric::ensure_same_geometry(&pair.left, &pair.right)?;

    if metric::identical(&pair.left, &pair.right) {
        return Ok((Verdict::identical(), pair.resized, true));
    }

    let variant = if pair.resized {
        Variant::Resized
    } else {
        Variant::Original
    };
    let left_set = pixel_set(caches, left.path(), variant, &pair.left);
    let right_set = pixel_set(caches, right.path(), variant, &pair.right);
    let score = metric::difference_sets(&left_set, &right_set)?;

    Ok((Verdict::from_score(score, threshold), pair.resized, false))
}

fn pixel_set(caches: &RunCaches, path: &Path, variant: Variant, buffer: &RgbaImage) -> Arc<PixelSet> {
    let key = (path.to_path_buf(), variant);
    let result = caches
        .pixel_sets
        .get_or_try_insert_with::<std::convert::Infallible, _>(&key, || {
            Ok(PixelSet::from_buffer(buffer))
        });
    match result {
        Ok(set) => set,
        Err(never) => match never {},
    }
}
