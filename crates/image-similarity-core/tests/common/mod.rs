//! Fixture images written into temporary directories.
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Packs a palette index into a distinct RGB color
pub fn color(index: u32) -> Rgb<u8> {
    let [_, r, g, b] = index.to_be_bytes();
    Rgb([r, g, b])
}

/// Image whose pixels cycle through `palette`, so every palette entry appears
/// as long as the image has at least `palette.len()` pixels
pub fn palette_image(width: u32, height: u32, palette: &[u32]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let index = (y * width + x) as usize % palette.len();
        color(palette[index])
    })
}

/// Save `image` as `dir/name`, format taken from the extension
pub fn save(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// Solid image of one color
pub fn solid(dir: &Path, name: &str, width: u32, height: u32, index: u32) -> PathBuf {
    save(dir, name, &RgbImage::from_pixel(width, height, color(index)))
}

/// Non-image file
pub fn text_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(b"NOT AN IMAGE").unwrap();
    path
}

/// Byte-for-byte copy of `source` under a new name
pub fn copy(source: &Path, name: &str) -> PathBuf {
    let path = source.with_file_name(name);
    fs::copy(source, &path).unwrap();
    path
}
