use image::RgbaImage;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Determine format from file extension.
    ///
    /// The match is case-sensitive: `photo.PNG` is not a candidate.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Determine format from the extension of a path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

/// A decoded image taking part in a comparison run.
///
/// Records are shared behind `Arc` between the store, the comparator and
/// the report, so the collaborator-owned duplicate flag uses interior
/// mutability.
#[derive(Debug)]
pub struct ImageRecord {
    path: PathBuf,
    format: ImageFormat,
    pixels: Arc<RgbaImage>,
    size_kb: OnceCell<u64>,
    duplicate: AtomicBool,
}

impl ImageRecord {
    pub fn new(path: PathBuf, format: ImageFormat, pixels: RgbaImage) -> Self {
        Self {
            path,
            format,
            pixels: Arc::new(pixels),
            size_kb: OnceCell::new(),
            duplicate: AtomicBool::new(false),
        }
    }

    /// Absolute path, the record's identity
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Decoded RGBA buffer
    pub fn pixels(&self) -> &Arc<RgbaImage> {
        &self.pixels
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    /// File size in kilobytes, read from the filesystem on first use
    pub fn size_kb(&self) -> Result<u64> {
        self.size_kb
            .get_or_try_init(|| -> Result<u64> {
                Ok(std::fs::metadata(&self.path)?.len() / 1024)
            })
            .copied()
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate.load(Ordering::Relaxed)
    }

    /// Set or clear the duplicate flag. The engine never calls this itself.
    pub fn set_duplicate(&self, duplicate: bool) {
        self.duplicate.store(duplicate, Ordering::Relaxed);
    }
}
