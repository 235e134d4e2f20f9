use anyhow::{anyhow, Context};
use clap::{ArgGroup, Args, Parser, Subcommand};
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image_similarity_core::action::relocate_duplicates;
use image_similarity_core::preview::{self, Transform};
use image_similarity_core::{logging, Config, ImageStore, SimilarityEngine, SimilarityReport};

#[derive(Parser)]
#[command(name = "image-similarity")]
#[command(about = "Group images whose pixel colors are nearly the same")]
#[command(version)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to rotating files in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs a comparison
#[derive(Args)]
struct RunArgs {
    /// Directory containing the images to compare
    directory: PathBuf,

    /// Maximum difference score (0.0-1.0) for two images to be similar
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Canonical size for images of different geometry, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Number of decode threads (0 = auto)
    #[arg(long)]
    threads: Option<usize>,

    /// Abort on the first image that fails to load
    #[arg(long)]
    strict: bool,

    /// Record each match on both images
    #[arg(long)]
    symmetric: bool,

    /// Show a progress bar while decoding
    #[arg(long)]
    progress: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every pair of images in a directory and list similar ones
    Scan {
        #[command(flatten)]
        run: RunArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move images similar to an earlier one into a duplicates directory
    Cull {
        #[command(flatten)]
        run: RunArgs,

        /// Where to move duplicates
        #[arg(long)]
        duplicates_dir: Option<PathBuf>,

        /// Actually move files (default is a dry run)
        #[arg(long)]
        execute: bool,
    },

    /// Write a mirrored or flipped copy of an image
    #[command(group(ArgGroup::new("transform").required(true).args(["mirror", "flip"])))]
    Preview {
        /// Image to transform
        file: PathBuf,

        /// Mirror left to right
        #[arg(long)]
        mirror: bool,

        /// Flip top to bottom
        #[arg(long)]
        flip: bool,

        /// Output file, format taken from its extension
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "image-similarity.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Scan { run, json } => {
            let config = build_config(&run)?;
            let report = SimilarityEngine::new(config)?.run(&run.directory)?;

            if json {
                let summary = serde_json::to_string_pretty(&report.summary())?;
                println!("{}", summary);
            } else {
                print_report(&report);
            }
            Ok(())
        }

        Commands::Cull {
            run,
            duplicates_dir,
            execute,
        } => {
            let mut config = build_config(&run)?;
            if let Some(dir) = duplicates_dir {
                config.duplicates_dir = dir;
            }
            config.dry_run = !execute;

            let report = SimilarityEngine::new(config.clone())?.run(&run.directory)?;
            mark_later_duplicates(&report)?;

            let results = relocate_duplicates(&report, &config)?;
            for result in &results {
                match (&result.error, result.dry_run) {
                    (Some(error), _) => {
                        println!("FAILED {}: {}", result.source.display(), error)
                    }
                    (None, true) => println!(
                        "would move {} -> {}",
                        result.source.display(),
                        result.destination.display()
                    ),
                    (None, false) => println!(
                        "moved {} -> {}",
                        result.source.display(),
                        result.destination.display()
                    ),
                }
            }
            if results.is_empty() {
                println!("No duplicates found.");
            } else if config.dry_run {
                println!("Dry run: pass --execute to move {} file(s)", results.len());
            }
            Ok(())
        }

        Commands::Preview {
            file,
            mirror,
            flip: _,
            output,
        } => {
            let transform = if mirror {
                Transform::Mirror
            } else {
                Transform::Flip
            };
            let store = ImageStore::new(&Config::default());
            let record = store.load(&file)?;
            preview::save_preview(&preview::apply(&record, transform), &output)?;
            println!("Preview written to: {}", output.display());
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    match log_dir {
        Some(dir) => logging::init_logger(dir, level)
            .map_err(|e| anyhow!("Failed to initialize logging in {}: {}", dir.display(), e)),
        None => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(level.as_str()),
            )
            .init();
            Ok(())
        }
    }
}

/// Config file (or defaults) overridden by command line arguments
fn build_config(run: &RunArgs) -> anyhow::Result<Config> {
    let mut config = match &run.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(threshold) = run.threshold {
        config.threshold = threshold;
    }
    if let Some((width, height)) = run.resize {
        config.resize_width = width;
        config.resize_height = height;
    }
    if let Some(threads) = run.threads {
        config.threads = threads;
    }
    config.strict |= run.strict;
    config.symmetric_edges |= run.symmetric;
    config.show_progress |= run.progress;

    config.validate()?;
    Ok(config)
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = width.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let height = height.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((width, height))
}

/// Keep the first image of each group and mark everything similar to it.
///
/// Images are visited in report order, so the image that comes first keeps
/// its place even when edges are symmetric.
fn mark_later_duplicates(report: &SimilarityReport) -> anyhow::Result<()> {
    let mut kept: HashSet<&Path> = HashSet::new();

    for entry in report.matched() {
        if entry.is_duplicate() {
            continue;
        }
        kept.insert(entry.path());

        for edge in entry.similar() {
            if !kept.contains(edge.path.as_path()) {
                report.mark_duplicate(&edge.path)?;
            }
        }
    }

    info!("Marked {} duplicates", report.marked_duplicates().count());
    Ok(())
}

fn print_report(report: &SimilarityReport) {
    for failure in report.failures() {
        warn!("Skipped {}: {}", failure.path.display(), failure.error);
    }

    let mut matched = 0;
    for entry in report.matched() {
        matched += 1;
        let size = entry
            .size_kb()
            .map(|kb| format!("{} KB", kb))
            .unwrap_or_else(|_| "? KB".to_string());
        println!(
            "{} ({}, {})",
            entry.path().display(),
            size,
            entry.resolution()
        );
        for edge in entry.similar() {
            println!("   {:.4}  {}", edge.score, edge.path.display());
        }
    }

    let stats = report.stats();
    println!(
        "{} of {} images have similar images ({} pairs compared, {} matches, {} failed to load)",
        matched,
        report.len(),
        stats.pairs_evaluated,
        stats.matches,
        report.failures().len()
    );
}
