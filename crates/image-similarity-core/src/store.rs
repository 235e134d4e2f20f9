use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::config::Config;
use crate::discovery;
use crate::error::{Error, Result};
use crate::logging::log_decode_error;
use crate::types::{ImageFormat, ImageRecord};

/// A file that was discovered but could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of loading a whole directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully decoded images, ordered by path
    pub images: Vec<Arc<ImageRecord>>,
    /// Files that failed to load, in path order
    pub failures: Vec<LoadFailure>,
}

/// Discovers and decodes images, decoding each path exactly once.
pub struct ImageStore {
    decoded: KeyedCache<PathBuf, ImageRecord>,
    threads: usize,
    strict: bool,
    show_progress: bool,
}

impl ImageStore {
    pub fn new(config: &Config) -> Self {
        Self {
            decoded: KeyedCache::new(),
            threads: config.worker_threads(),
            strict: config.strict,
            show_progress: config.show_progress,
        }
    }

    /// Candidate image paths directly inside `directory`
    pub fn discover(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        discovery::discover_images(directory)
    }

    /// Decode `path`, or return the record decoded by an earlier call
    pub fn load(&self, path: &Path) -> Result<Arc<ImageRecord>> {
        let path = absolute(path)?;
        if !path.is_file() {
            return Err(Error::FileNotFound(path));
        }
        self.decoded.get_or_try_insert_with(&path, || decode(&path))
    }

    /// Previously loaded record for `path`
    pub fn get(&self, path: &Path) -> Option<Arc<ImageRecord>> {
        let path = absolute(path).ok()?;
        self.decoded.get(&path)
    }

    /// Discover and decode every candidate in `directory` on a bounded pool.
    ///
    /// Files that fail are collected into [`LoadReport::failures`] unless the
    /// store is strict, in which case the first failure (in path order) is
    /// returned as the error.
    pub fn load_all(&self, directory: &Path) -> Result<LoadReport> {
        let directory = absolute(directory)?;
        let mut paths = self.discover(&directory)?;
        paths.sort();
        info!(
            "Found {} candidate images in {}",
            paths.len(),
            directory.display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build thread pool: {}", e)))?;

        let progress = self.progress_bar(paths.len());
        let results: Vec<(PathBuf, Result<Arc<ImageRecord>>)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let result = self.load(path);
                    progress.inc(1);
                    (path.clone(), result)
                })
                .collect()
        });
        progress.finish_and_clear();

        let mut report = LoadReport::default();
        for (path, result) in results {
            match result {
                Ok(record) => report.images.push(record),
                Err(error) => {
                    log_decode_error(&path, &error);
                    if self.strict {
                        return Err(error);
                    }
                    report.failures.push(LoadFailure { path, error });
                }
            }
        }

        info!(
            "Loaded {} images ({} failed, {} decodes)",
            report.images.len(),
            report.failures.len(),
            self.decode_count()
        );
        Ok(report)
    }

    /// Number of decodes performed so far
    pub fn decode_count(&self) -> usize {
        self.decoded.computed()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
        {
            progress_bar.set_style(style.progress_chars("##-"));
        }
        progress_bar.set_message("Decoding images...");
        progress_bar
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn decode(path: &Path) -> Result<ImageRecord> {
    let format = ImageFormat::from_path(path).ok_or_else(|| Error::InvalidImage {
        path: path.to_path_buf(),
        reason: "unsupported file extension".to_string(),
    })?;

    debug!("Decoding {}", path.display());
    let decode_error = |source: image::ImageError| Error::Decode {
        path: path.to_path_buf(),
        source,
    };
    let image = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;

    into_record(path.to_path_buf(), format, image)
}

/// Convert a decoded image to RGBA8, rejecting images with no pixels
fn into_record(path: PathBuf, format: ImageFormat, image: DynamicImage) -> Result<ImageRecord> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImage {
            reason: format!("zero-area image ({}x{})", image.width(), image.height()),
            path,
        });
    }

    Ok(ImageRecord::new(path, format, image.to_rgba8()))
}
