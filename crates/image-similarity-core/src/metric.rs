//! # Pixel-set difference
//!
//! Two same-size buffers are compared by the *sets* of distinct colors they
//! contain. Pixel position and repetition are discarded, so two images with
//! the same palette in a different arrangement score as identical.
//!
//! With `Sa` and `Sb` the color sets and `d = |Sa Δ Sb|`:
//!
//! ```text
//! score = (d / |Sa| + d / |Sb|) / 2
//! ```
//!
//! The raw formula exceeds 1 for largely disjoint palettes; scores saturate
//! at 1.0 so every score lies in `[0, 1]`.
//!
//! Buffers that are byte-for-byte identical skip the set construction and
//! score exactly 0.0.

use image::RgbaImage;
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Distinct colors of a buffer, each RGBA pixel packed into a `u32`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSet {
    colors: HashSet<u32>,
}

impl PixelSet {
    pub fn from_buffer(buffer: &RgbaImage) -> Self {
        let colors = buffer
            .pixels()
            .map(|pixel| u32::from_be_bytes(pixel.0))
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Size of the symmetric difference with `other`
    pub fn symmetric_difference_len(&self, other: &PixelSet) -> usize {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let shared = small
            .colors
            .iter()
            .filter(|color| large.colors.contains(color))
            .count();
        self.len() + other.len() - 2 * shared
    }
}

/// Outcome of comparing two buffers against a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub is_match: bool,
    pub score: f64,
}

impl Verdict {
    /// Verdict for byte-identical buffers
    pub fn identical() -> Self {
        Self {
            is_match: true,
            score: 0.0,
        }
    }

    pub fn from_score(score: f64, threshold: f64) -> Self {
        Self {
            is_match: score <= threshold,
            score,
        }
    }
}

/// Difference score between two precomputed pixel sets
pub fn difference_sets(left: &PixelSet, right: &PixelSet) -> Result<f64> {
    if left.is_empty() || right.is_empty() {
        return Err(Error::EmptyPixelSet);
    }

    let d = left.symmetric_difference_len(right) as f64;
    let score = (d / left.len() as f64 + d / right.len() as f64) / 2.0;
    Ok(score.min(1.0))
}

/// Difference score between two buffers of equal geometry
pub fn difference(left: &RgbaImage, right: &RgbaImage) -> Result<f64> {
    ensure_same_geometry(left, right)?;
    difference_sets(&PixelSet::from_buffer(left), &PixelSet::from_buffer(right))
}

/// True when both buffers hold exactly the same pixels
pub fn identical(left: &RgbaImage, right: &RgbaImage) -> bool {
    std::ptr::eq(left, right)
        || (left.dimensions() == right.dimensions() && left.as_raw() == right.as_raw())
}

/// Decide whether two buffers of equal geometry are the same image
pub fn same(left: &RgbaImage, right: &RgbaImage, threshold: f64) -> Result<Verdict> {
    if identical(left, right) {
        return Ok(Verdict::identical());
    }
    Ok(Verdict::from_score(difference(left, right)?, threshold))
}

pub(crate) fn ensure_same_geometry(left: &RgbaImage, right: &RgbaImage) -> Result<()> {
    if left.dimensions() != right.dimensions() {
        return Err(Error::GeometryMismatch {
            left: left.dimensions(),
            right: right.dimensions(),
        });
    }
    Ok(())
}
