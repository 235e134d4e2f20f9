use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the image-similarity library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file could not be decoded into a pixel buffer
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A buffer could not be written as an image file
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file decoded, but cannot take part in a comparison
    #[error("Invalid image {}: {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    /// A pixel set with no colors reached the metric
    #[error("Pixel set is empty")]
    EmptyPixelSet,

    /// Two buffers of different size reached the metric
    #[error("Geometry mismatch: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    GeometryMismatch { left: (u32, u32), right: (u32, u32) },

    /// File not found error
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input path exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A path was queried that is not part of the run
    #[error("Image is not part of this run: {}", .0.display())]
    UnknownImage(PathBuf),
}
