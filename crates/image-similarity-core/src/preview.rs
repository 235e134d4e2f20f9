//! Transformed copies of decoded images for display.
//!
//! Previews are built from a record's buffer and never feed back into a
//! comparison run.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ImageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Left-right mirror
    Mirror,
    /// Top-bottom flip
    Flip,
}

pub fn mirror(record: &ImageRecord) -> RgbaImage {
    imageops::flip_horizontal(record.pixels().as_ref())
}

pub fn flip(record: &ImageRecord) -> RgbaImage {
    imageops::flip_vertical(record.pixels().as_ref())
}

pub fn apply(record: &ImageRecord, transform: Transform) -> RgbaImage {
    match transform {
        Transform::Mirror => mirror(record),
        Transform::Flip => flip(record),
    }
}

/// Write a preview buffer, format chosen by the output extension
pub fn save_preview(buffer: &RgbaImage, output: &Path) -> Result<()> {
    buffer.save(output).map_err(|source| Error::Encode {
        path: output.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageFormat;
    use image::Rgba;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn corner_record() -> ImageRecord {
        let mut pixels = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        pixels.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        ImageRecord::new(PathBuf::from("/images/corner.png"), ImageFormat::Png, pixels)
    }

    #[test]
    fn test_mirror_and_flip() {
        let record = corner_record();

        let mirrored = mirror(&record);
        assert_eq!(mirrored.get_pixel(2, 0), &Rgba([255, 0, 0, 255]));

        let flipped = flip(&record);
        assert_eq!(flipped.get_pixel(0, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_preview_leaves_record_untouched() {
        let record = corner_record();
        let before = Arc::clone(record.pixels());

        let _ = apply(&record, Transform::Mirror);
        assert!(Arc::ptr_eq(&before, record.pixels()));
        assert_eq!(record.pixels().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_save_preview() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("mirrored.png");

        save_preview(&mirror(&corner_record()), &output).unwrap();
        let reloaded = image::open(&output).unwrap().to_rgba8();
        assert_eq!(reloaded.get_pixel(2, 0), &Rgba([255, 0, 0, 255]));
    }
}
