mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use image_similarity_core::{
    Comparator, Config, Error, GeometryNormalizer, ImageStore, SimilarityEngine,
};
use tempfile::tempdir;

use common::{copy, palette_image, save, solid, text_file};

fn engine(config: Config) -> SimilarityEngine {
    SimilarityEngine::new(config).unwrap()
}

#[test]
fn test_byte_identical_files_score_zero() {
    let dir = tempdir().unwrap();
    let original = save(
        dir.path(),
        "original.png",
        &palette_image(100, 100, &(0..50).collect::<Vec<u32>>()),
    );
    let duplicate = copy(&original, "zcopy.png");

    let report = engine(Config::default()).run(dir.path()).unwrap();

    let entry = report.get(&original).unwrap();
    assert_eq!(entry.similar().len(), 1);
    let edge = entry.similar().best().unwrap();
    assert_eq!(edge.path, duplicate);
    assert_eq!(edge.score, 0.0);
    assert_eq!(report.stats().exact_matches, 1);

    // One-directional: the copy was visited second
    assert!(!report.get(&duplicate).unwrap().has_matches());

    let symmetric = engine(Config {
        symmetric_edges: true,
        ..Config::default()
    })
    .run(dir.path())
    .unwrap();
    let back = symmetric.get(&duplicate).unwrap().similar().best().unwrap();
    assert_eq!(back.path, original);
    assert_eq!(back.score, 0.0);
}

#[test]
fn test_small_palette_difference_depends_on_threshold() {
    let dir = tempdir().unwrap();
    let left: Vec<u32> = (0..200).collect();
    let right: Vec<u32> = (0..195).chain(5000..5005).collect();
    let a = save(dir.path(), "a.png", &palette_image(50, 50, &left));
    let b = save(dir.path(), "b.png", &palette_image(50, 50, &right));

    let strict = engine(Config::default()).run(dir.path()).unwrap();
    assert_eq!(strict.stats().pairs_evaluated, 1);
    assert_eq!(strict.matched().count(), 0);

    let loose = engine(Config {
        threshold: 0.1,
        ..Config::default()
    })
    .run(dir.path())
    .unwrap();
    let edge = loose.get(&a).unwrap().similar().get(&b).unwrap();
    assert!((edge.score - 0.05).abs() < 1e-12);
}

#[test]
fn test_different_geometry_goes_through_resize_cache() {
    let dir = tempdir().unwrap();
    solid(dir.path(), "a.png", 50, 50, 42);
    solid(dir.path(), "b.png", 80, 60, 42);
    solid(dir.path(), "c.png", 30, 20, 42);

    let config = Config::default();
    let store = ImageStore::new(&config);
    let loaded = store.load_all(dir.path()).unwrap();
    let comparison = Comparator::from_config(&config)
        .compare(&loaded.images, config.threshold)
        .unwrap();

    assert_eq!(comparison.stats.pairs_evaluated, 3);
    assert_eq!(comparison.stats.resized_pairs, 3);
    assert_eq!(comparison.stats.matches, 3);
    assert_eq!(comparison.stats.resizes, 3);

    // Cached buffers are served as the same object
    let normalizer = GeometryNormalizer::from_config(&config);
    let first = normalizer.resized(&loaded.images[0]);
    let second = normalizer.resized(&loaded.images[0]);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.dimensions(), (512, 512));
    assert_eq!(normalizer.resize_count(), 1);
}

#[test]
fn test_non_images_are_not_discovered() {
    let dir = tempdir().unwrap();
    let a = solid(dir.path(), "a.png", 10, 10, 1);
    let b = solid(dir.path(), "b.gif", 10, 10, 2);
    text_file(dir.path(), "notes.txt");

    let report = engine(Config::default()).run(dir.path()).unwrap();

    let paths: BTreeSet<PathBuf> = report.all().map(|e| e.path().to_path_buf()).collect();
    assert_eq!(paths, BTreeSet::from([a, b]));
    assert!(report.failures().is_empty());
}

#[test]
fn test_single_image_has_empty_match_set() {
    let dir = tempdir().unwrap();
    let only = solid(dir.path(), "only.jpg", 16, 16, 3);

    let report = engine(Config::default()).run(dir.path()).unwrap();

    assert_eq!(report.len(), 1);
    assert!(report.get(&only).unwrap().similar().is_empty());
    assert_eq!(report.stats().pairs_evaluated, 0);
    assert!(report.as_path_map().is_empty());
}

#[test]
fn test_empty_directory_is_not_an_error() {
    let dir = tempdir().unwrap();
    let report = engine(Config::default()).run(dir.path()).unwrap();
    assert!(report.is_empty());
    assert!(report.as_score_map().is_empty());
}

#[test]
fn test_pair_count_matches_combinations() {
    let dir = tempdir().unwrap();
    let n = 7u32;
    for i in 0..n {
        // Mixed geometry on purpose
        solid(dir.path(), &format!("{}.png", i), 8 + i % 3, 8, i * 11);
    }

    let report = engine(Config::default()).run(dir.path()).unwrap();
    let n = n as usize;
    assert_eq!(report.stats().pairs_evaluated, n * (n - 1) / 2);
}

#[test]
fn test_threshold_monotonicity() {
    let dir = tempdir().unwrap();
    let base: Vec<u32> = (0..100).collect();
    for shift in 0..5u32 {
        let palette: Vec<u32> = base.iter().map(|c| c + shift * 4).collect();
        save(dir.path(), &format!("{}.png", shift), &palette_image(20, 20, &palette));
    }

    let mut previous: BTreeSet<(PathBuf, PathBuf)> = BTreeSet::new();
    for threshold in [0.0, 0.02, 0.05, 0.08, 0.2, 1.0] {
        let report = engine(Config {
            threshold,
            ..Config::default()
        })
        .run(dir.path())
        .unwrap();

        let current: BTreeSet<(PathBuf, PathBuf)> = report
            .as_path_map()
            .into_iter()
            .flat_map(|(from, to)| to.into_iter().map(move |t| (from.clone(), t)))
            .collect();
        assert!(previous.is_subset(&current), "threshold {} dropped a match", threshold);
        previous = current;
    }
    assert_eq!(previous.len(), 10);
}

#[test]
fn test_corrupt_file_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    solid(dir.path(), "a.png", 10, 10, 1);
    solid(dir.path(), "b.png", 10, 10, 1);
    std::fs::write(dir.path().join("broken.jpeg"), b"\xff\xd8 truncated").unwrap();

    let report = engine(Config::default()).run(dir.path()).unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report.failures().len(), 1);
    assert!(matches!(report.failures()[0].error, Error::Decode { .. }));
    assert_eq!(report.matched().count(), 1);

    let strict = engine(Config {
        strict: true,
        ..Config::default()
    })
    .run(dir.path());
    assert!(matches!(strict, Err(Error::Decode { .. })));
}

#[test]
fn test_invalid_threshold_rejected_up_front() {
    let result = SimilarityEngine::new(Config {
        threshold: 1.01,
        ..Config::default()
    });
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_duplicate_flag_does_not_affect_comparison() {
    let dir = tempdir().unwrap();
    let a = solid(dir.path(), "a.png", 10, 10, 5);
    let b = solid(dir.path(), "b.png", 10, 10, 5);

    let engine = engine(Config::default());
    let report = engine.run(dir.path()).unwrap();
    report.mark_duplicate(&b).unwrap();
    assert!(report.get(&b).unwrap().is_duplicate());

    let again = engine.run(dir.path()).unwrap();
    assert!(!again.get(&b).unwrap().is_duplicate());
    assert!(again.get(&a).unwrap().similar().contains(&b));
}
