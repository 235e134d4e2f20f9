use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::logging::{log_file_error, log_fs_modification};
use crate::report::SimilarityReport;

/// Result of relocating one duplicate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Where the file was
    pub source: PathBuf,

    /// Where the file went, or would go on a dry run
    pub destination: PathBuf,

    /// Whether the file was left in place because of a dry run
    pub dry_run: bool,

    /// Whether the action was successful
    pub success: bool,

    /// Optional error message if action failed
    pub error: Option<String>,
}

/// Move every image flagged as duplicate into `config.duplicates_dir`.
///
/// Name clashes in the target directory get a numeric suffix. Per-file
/// failures are reported in the returned results; only failing to create
/// the target directory aborts.
pub fn relocate_duplicates(report: &SimilarityReport, config: &Config) -> Result<Vec<ActionResult>> {
    let target_dir = &config.duplicates_dir;
    let sources: Vec<&Path> = report.marked_duplicates().map(|entry| entry.path()).collect();

    if sources.is_empty() {
        info!("No images marked as duplicate");
        return Ok(Vec::new());
    }

    if !config.dry_run {
        fs::create_dir_all(target_dir)?;
    }

    let mut results = Vec::with_capacity(sources.len());
    for source in sources {
        let destination = free_destination(target_dir, source);

        if config.dry_run {
            info!(
                "DRY RUN - would move {} to {}",
                source.display(),
                destination.display()
            );
            results.push(ActionResult {
                source: source.to_path_buf(),
                destination,
                dry_run: true,
                success: true,
                error: None,
            });
            continue;
        }

        let outcome = move_file(source, &destination);
        match &outcome {
            Ok(()) => log_fs_modification(
                "move",
                source,
                Some(&format!("to {}", destination.display())),
            ),
            Err(e) => log_file_error(source, "move", e),
        }

        results.push(ActionResult {
            source: source.to_path_buf(),
            destination,
            dry_run: false,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        });
    }

    Ok(results)
}

/// First path in `dir` named after `source` that does not exist yet
fn free_destination(dir: &Path, source: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "image".into());
    let candidate = dir.join(&file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{}-{}{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    fs::copy(source, destination)?;
    fs::remove_file(source)
}
