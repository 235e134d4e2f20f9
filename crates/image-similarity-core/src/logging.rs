//! Log setup and the log lines shared across modules.
//!
//! The CLI logs to stderr unless a log directory is given. In that case
//! everything goes to a size-rotated file, which keeps progress bars on the
//! terminal readable.

use log::{error, info, LevelFilter};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::error::Error;

/// Environment variable that replaces the requested level when it holds a valid filter
pub const LOG_LEVEL_ENV: &str = "IMAGE_SIMILARITY_LOG";

const LOG_FILE: &str = "similarity.log";
const ARCHIVE_PATTERN: &str = "similarity.{}.log";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const ARCHIVES_KEPT: u32 = 5;
const LINE_FORMAT: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

/// Send all log output to `similarity.log` inside `log_dir`.
///
/// The file rolls over at 10 MiB into `similarity.1.log` .. `similarity.5.log`.
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let log_file = log_dir.join(LOG_FILE);
    let appender = rolling_appender(log_dir, &log_file)?;
    let level = effective_level(level, std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let config = Config::builder()
        .appender(Appender::builder().build("rolling", Box::new(appender)))
        .build(Root::builder().appender("rolling").build(level))?;
    log4rs::init_config(config)?;

    info!("Logging at {} to {}", level, log_file.display());
    Ok(())
}

fn rolling_appender(
    log_dir: &Path,
    log_file: &Path,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let archives = log_dir.join(ARCHIVE_PATTERN);
    let roller = FixedWindowRoller::builder()
        .build(&archives.to_string_lossy(), ARCHIVES_KEPT)
        .map_err(|e| format!("Bad archive pattern {}: {}", archives.display(), e))?;
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(ROTATE_AT_BYTES)),
        Box::new(roller),
    );

    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LINE_FORMAT)))
        .build(log_file, Box::new(policy))?;
    Ok(appender)
}

/// `requested`, unless `env_value` parses as a level filter
fn effective_level(requested: LevelFilter, env_value: Option<&str>) -> LevelFilter {
    env_value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(requested)
}

/// A filesystem call on `path` failed
pub fn log_file_error(path: &Path, operation: &str, error: &dyn std::error::Error) {
    error!("{} failed for {}: {}", operation, path.display(), error);
}

/// A discovered file could not be turned into an image record
pub fn log_decode_error(path: &Path, error: &Error) {
    error!("Skipping {}: {}", path.display(), error);
}

/// A file on disk was changed by this process
pub fn log_fs_modification(operation: &str, path: &Path, details: Option<&str>) {
    let details = details.map(|d| format!(" ({})", d)).unwrap_or_default();
    info!("[fs] {} {}{}", operation, path.display(), details);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_env_value_overrides_level() {
        assert_eq!(effective_level(LevelFilter::Info, None), LevelFilter::Info);
        assert_eq!(
            effective_level(LevelFilter::Info, Some("debug")),
            LevelFilter::Debug
        );
        assert_eq!(
            effective_level(LevelFilter::Info, Some(" TRACE ")),
            LevelFilter::Trace
        );
        assert_eq!(
            effective_level(LevelFilter::Warn, Some("loud")),
            LevelFilter::Warn
        );
    }

    #[test]
    fn test_rolling_appender_creates_log_file() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join(LOG_FILE);

        rolling_appender(dir.path(), &log_file).unwrap();
        assert!(log_file.is_file());
    }
}
