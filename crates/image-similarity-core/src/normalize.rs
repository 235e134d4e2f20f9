use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::config::{Config, ResizeFilter};
use crate::types::ImageRecord;

/// True iff both buffers have the same width and the same height
pub fn comparable(left: &RgbaImage, right: &RgbaImage) -> bool {
    left.dimensions() == right.dimensions()
}

/// A pair of buffers ready for the metric
#[derive(Debug, Clone)]
pub struct NormalizedPair {
    pub left: Arc<RgbaImage>,
    pub right: Arc<RgbaImage>,
    /// Whether the canonical resize path was taken
    pub resized: bool,
}

/// Brings pairs of images to a common geometry.
///
/// Images that already share dimensions are passed through untouched.
/// Otherwise both are resized to the canonical target, and each path is
/// resized at most once for the lifetime of the normalizer.
pub struct GeometryNormalizer {
    target: (u32, u32),
    filter: FilterType,
    resized: KeyedCache<PathBuf, RgbaImage>,
}

impl GeometryNormalizer {
    pub fn new(target: (u32, u32), filter: ResizeFilter) -> Self {
        Self {
            target,
            filter: filter.into(),
            resized: KeyedCache::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resize_target(), config.resize_filter)
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    /// Canonically sized buffer for `record`, served from the cache after the first call
    pub fn resized(&self, record: &ImageRecord) -> Arc<RgbaImage> {
        if record.pixels().dimensions() == self.target {
            return Arc::clone(record.pixels());
        }

        let (width, height) = self.target;
        let result = self
            .resized
            .get_or_try_insert_with::<Infallible, _>(&record.path().to_path_buf(), || {
                debug!(
                    "Resizing {} from {} to {}x{}",
                    record.path().display(),
                    record.resolution(),
                    width,
                    height
                );
                Ok(imageops::resize(
                    record.pixels().as_ref(),
                    width,
                    height,
                    self.filter,
                ))
            });

        match result {
            Ok(buffer) => buffer,
            Err(never) => match never {},
        }
    }

    /// Buffers for `left` and `right` with equal geometry
    pub fn normalized(&self, left: &ImageRecord, right: &ImageRecord) -> NormalizedPair {
        if comparable(left.pixels(), right.pixels()) {
            return NormalizedPair {
                left: Arc::clone(left.pixels()),
                right: Arc::clone(right.pixels()),
                resized: false,
            };
        }

        NormalizedPair {
            left: self.resized(left),
            right: self.resized(right),
            resized: true,
        }
    }

    /// Number of resize operations actually performed
    pub fn resize_count(&self) -> usize {
        self.resized.computed()
    }

    /// Number of paths holding a cached resized buffer
    pub fn cached(&self) -> usize {
        self.resized.len()
    }
}
