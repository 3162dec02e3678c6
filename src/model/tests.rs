use crate::model::TSModel;

use color_eyre::eyre::{Report, Result};
use crate::utils;
use tsqc_trees::examples::{self, example_1};
use tsqc_trees::TreeSequence;

#[test]
fn load_trees_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("example_1.trees");
    example_1().dump(&path)?;

    let model = TSModel::load(&path)?;
    assert_eq!(model.name, "example_1.trees");
    assert_eq!(model.file_size, std::fs::metadata(&path)?.len());
    assert_eq!(model.ts.num_trees(), 2);
    Ok(())
}

#[test]
fn load_tskit_layout() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tskit.trees");
    let bytes = examples::tskit_layout(&example_1()).to_bytes();
    std::fs::write(&path, &bytes)?;

    // plain kastore bytes, so only the primary decode can succeed
    assert!(utils::Decompress::detect(&bytes).is_none());
    assert!(TreeSequence::load(&path).is_ok());

    let model = TSModel::load(&path)?;
    assert_eq!(model.ts.tables(), example_1().tables());
    assert_eq!(model.summary().time_units, "generations");
    Ok(())
}

#[test]
fn load_compressed_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("example_1.tsz");
    let compressed = zstd::encode_all(example_1().to_bytes().as_slice(), 3)?;
    std::fs::write(&path, &compressed)?;

    let model = TSModel::load(&path)?;
    assert_eq!(model.name, "example_1.tsz");
    assert_eq!(model.ts.tables(), example_1().tables());

    // the input is read, never rewritten
    assert_eq!(std::fs::read(&path)?, compressed);
    Ok(())
}

#[test]
fn load_unreadable_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not a tree sequence")?;

    let result = TSModel::load(&path);
    assert!(result.is_err());
    assert!(path.exists());
    Ok(())
}

#[test]
fn load_corrupt_kastore_is_not_retried() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("truncated.trees");
    let bytes = example_1().to_bytes();
    std::fs::write(&path, &bytes[..bytes.len() - 8])?;

    let report = TSModel::load(&path).unwrap_err();
    let error = report.downcast_ref::<tsqc_trees::Error>();
    assert!(matches!(error, Some(tsqc_trees::Error::Corrupt(_))));
    Ok(())
}

#[test]
fn summary_counts() {
    let model = TSModel::new(example_1(), "example_1.trees");
    let summary = model.summary();
    assert_eq!(summary.name, "example_1.trees");
    assert_eq!(summary.sequence_length, 10.0);
    assert_eq!(summary.time_units, "generations");
    assert_eq!(summary.num_trees, 2);
    assert_eq!(summary.num_samples, 4);
    assert_eq!(summary.num_nodes, 7);
    assert_eq!(summary.num_edges, 8);
    assert_eq!(summary.num_sites, 4);
    assert_eq!(summary.num_mutations, 5);
}

#[test]
fn summary_json() -> Result<(), Report> {
    let model = TSModel::new(example_1(), "example_1.trees");
    let json = serde_json::to_value(model.summary())?;
    assert_eq!(json["num_mutations"], 5);
    assert_eq!(json["name"], "example_1.trees");
    Ok(())
}

#[test]
fn derived_values_are_cached() {
    let model = TSModel::new(example_1(), "example_1.trees");
    let first = model.mutation_sample_counts().as_ptr();
    let second = model.mutation_sample_counts().as_ptr();
    assert_eq!(first, second);
    assert_eq!(model.mutation_sample_counts(), [2, 1, 3, 1, 1]);
}

#[test]
fn site_stats_use_cached_counts() {
    let model = TSModel::new(example_1(), "example_1.trees");
    assert!(model.mutation_counts.get().is_none());

    let stats = model.site_stats();
    assert!(model.mutation_counts.get().is_some());
    assert_eq!(stats, model.ts.site_stats());
    assert_eq!(stats.allele_frequency_spectrum(), [0, 2, 1, 1, 0]);
}
