use std::path::PathBuf;

use image_similarity_core::{Config, Result, SimilarityEngine};

fn main() -> Result<()> {
    // Directory to scan, first argument or ./images
    let scan_directory = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("images"));
    println!("Scanning directory: {}", scan_directory.display());

    let config = Config {
        threshold: 0.05,
        show_progress: true,
        ..Config::default()
    };
    let report = SimilarityEngine::new(config)?.run(&scan_directory)?;

    println!(
        "Compared {} images in {} pairs",
        report.len(),
        report.stats().pairs_evaluated
    );
    for entry in report.matched() {
        println!("{} ({})", entry.path().display(), entry.resolution());
        for edge in entry.similar() {
            println!("  - {:.4} {}", edge.score, edge.path.display());
        }
    }
    for failure in report.failures() {
        println!("Failed: {} ({})", failure.path.display(), failure.error);
    }

    Ok(())
}
