use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::ImageFormat;

/// Discover candidate images directly inside `directory`.
///
/// Only the top level is listed. Entries must be regular files (symlinks are
/// followed) whose extension is one of `png`, `jpg`, `jpeg` or `gif`, matched
/// case-sensitively. The order of the returned paths is whatever the
/// filesystem yields.
pub fn discover_images(directory: &Path) -> Result<Vec<PathBuf>> {
    // Check if directory exists
    if !directory.exists() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let mut image_paths = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Log error but continue with other files
                warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_image_path(path) {
            image_paths.push(path.to_path_buf());
        } else {
            debug!("Ignoring non-image file {}", path.display());
        }
    }

    Ok(image_paths)
}

/// Returns if the given path has a supported image extension
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_some()
}

// -- Tests --
