use crate::examples::example_1;
use crate::kastore::{Array, Store, MAGIC};
use crate::{Error, TableCollection, TreeSequence, NODE_IS_SAMPLE, NULL};

use byteorder::{ByteOrder, LittleEndian};
use color_eyre::eyre::{Report, Result};

fn assert_close(observed: &[f64], expected: &[f64]) {
    assert_eq!(observed.len(), expected.len(), "{observed:?} != {expected:?}");
    for (o, e) in observed.iter().zip(expected) {
        assert!((o - e).abs() < 1e-9, "{observed:?} != {expected:?}");
    }
}

// ----------------------------------------------------------------------------
// Kastore

#[test]
fn kastore_round_trip_all_types() -> Result<(), Report> {
    let mut store = Store::new();
    store.insert("i8", vec![-1_i8, 2]);
    store.insert("u8", vec![1_u8, 2, 3]);
    store.insert("i16", vec![-300_i16]);
    store.insert("u16", vec![300_u16]);
    store.insert("i32", vec![NULL, 7]);
    store.insert("u32", vec![u32::MAX]);
    store.insert("i64", vec![i64::MIN]);
    store.insert("u64", Vec::<u64>::new());
    store.insert("f32", vec![0.5_f32]);
    store.insert("f64", vec![f64::MAX, -0.0]);

    let bytes = store.to_bytes();
    assert_eq!(&bytes[0..8], MAGIC);
    assert_eq!(LittleEndian::read_u64(&bytes[16..24]), bytes.len() as u64);

    let observed = Store::from_bytes(&bytes)?;
    assert_eq!(observed, store);
    assert_eq!(observed.get("u64"), Some(&Array::UInt64(vec![])));
    Ok(())
}

#[test]
fn kastore_arrays_are_aligned() -> Result<(), Report> {
    let mut store = Store::new();
    store.insert("odd", vec![1_u8, 2, 3]);
    store.insert("wide", vec![1.0_f64]);
    let bytes = store.to_bytes();

    // second descriptor holds the array start of "wide"
    let array_start = LittleEndian::read_u64(&bytes[64 + 64 + 24..64 + 64 + 32]);
    assert_eq!(array_start % 8, 0);
    Ok(())
}

#[test]
fn kastore_rejects_short_input() {
    let error = Store::from_bytes(&MAGIC[..]).unwrap_err();
    assert!(error.is_file_format());
}

#[test]
fn kastore_rejects_other_major_version() {
    let mut bytes = Store::new().to_bytes();
    LittleEndian::write_u16(&mut bytes[8..10], 2);
    let error = Store::from_bytes(&bytes).unwrap_err();
    assert!(matches!(error, Error::Version { major: 2, minor: 0 }));
    assert!(!error.is_file_format());
}

#[test]
fn kastore_rejects_truncated_file() {
    let mut store = Store::new();
    store.insert("a", vec![1_i32, 2, 3]);
    let bytes = store.to_bytes();
    let error = Store::from_bytes(&bytes[..bytes.len() - 4]).unwrap_err();
    assert!(matches!(error, Error::Corrupt(_)));
}

#[test]
fn kastore_rejects_unknown_type() {
    let mut store = Store::new();
    store.insert("a", vec![1_i32]);
    let mut bytes = store.to_bytes();
    bytes[64] = 42;
    let error = Store::from_bytes(&bytes).unwrap_err();
    assert!(matches!(error, Error::Corrupt(_)));
}

#[test]
fn kastore_typed_getters() {
    let mut store = Store::new();
    store.insert("offsets", vec![0_u32, 2, 5]);
    store.insert("values", vec![1_i32]);

    assert_eq!(store.get_offsets("offsets").ok(), Some(vec![0, 2, 5]));
    assert!(matches!(store.get_f64("values"), Err(Error::ColumnType { .. })));
    assert!(matches!(store.get_f64("missing"), Err(Error::MissingColumn(_))));
}

// ----------------------------------------------------------------------------
// Tables

#[test]
fn tables_round_trip() -> Result<(), Report> {
    let ts = example_1();
    let bytes = ts.to_bytes();
    let observed = TreeSequence::from_bytes(&bytes)?;
    assert_eq!(observed.tables(), ts.tables());
    assert_eq!(observed.time_units(), "generations");
    Ok(())
}

#[test]
fn tables_read_int8_text_columns() -> Result<(), Report> {
    let ts = example_1();
    let mut store = ts.tables().to_store();
    store.insert("format/name", b"tskit.trees".iter().map(|b| *b as i8).collect::<Vec<i8>>());
    store.insert("time_units", b"generations".iter().map(|b| *b as i8).collect::<Vec<i8>>());

    let observed = TreeSequence::from_bytes(&store.to_bytes())?;
    assert_eq!(observed.time_units(), "generations");
    assert_eq!(observed.tables(), ts.tables());
    Ok(())
}

#[test]
fn tables_write_tskit_column_types() {
    let store = example_1().tables().to_store();
    let int8 = |text: &str| Array::Int8(text.bytes().map(|b| b as i8).collect());

    assert_eq!(store.get("format/name"), Some(&int8("tskit.trees")));
    assert_eq!(store.get("time_units"), Some(&int8("generations")));
    assert_eq!(store.get("format/version"), Some(&Array::UInt32(vec![12, 7])));
    assert!(matches!(store.get("sites/ancestral_state"), Some(Array::UInt8(_))));
    assert!(matches!(store.get("sites/ancestral_state_offset"), Some(Array::UInt64(_))));
}

#[test]
fn tables_read_tskit_layout() -> Result<(), Report> {
    let ts = example_1();
    let store = crate::examples::tskit_layout(&ts);
    assert!(store.contains_key("uuid"));
    assert!(store.contains_key("indexes/edge_insertion_order"));

    let observed = TreeSequence::from_bytes(&store.to_bytes())?;
    assert_eq!(observed.tables(), ts.tables());
    assert_eq!(observed.num_trees(), 2);
    Ok(())
}

#[test]
fn tables_text_column_type() {
    let mut store = example_1().tables().to_store();
    store.insert("time_units", vec![1.0_f64]);
    let error = TableCollection::from_store(&store).unwrap_err();
    assert!(matches!(error, Error::ColumnType { expected: "int8 or uint8", .. }));
}

#[test]
fn tables_wrong_format_name() {
    let mut store = example_1().tables().to_store();
    store.insert("format/name", b"tszip".to_vec());
    let error = TableCollection::from_store(&store).unwrap_err();
    assert!(error.is_file_format());
}

#[test]
fn tables_missing_column() {
    let mut store = Store::new();
    store.insert("format/name", b"tskit.trees".to_vec());
    store.insert("sequence_length", vec![1.0]);
    let error = TableCollection::from_store(&store).unwrap_err();
    assert!(matches!(error, Error::MissingColumn(key) if key == "nodes/flags"));
}

#[test]
fn tables_without_mutation_time() -> Result<(), Report> {
    let ts = example_1();
    let store = ts.tables().to_store();

    // rebuild the store without the optional mutation times
    let mut older = Store::new();
    for key in store.keys().filter(|k| *k != "mutations/time") {
        if let Some(array) = store.get(key) {
            older.insert(key, array.clone());
        }
    }
    let tables = TableCollection::from_store(&older)?;
    assert!(tables.mutations.time.iter().all(|t| t.is_nan()));
    Ok(())
}

// ----------------------------------------------------------------------------
// Tree Sequence

#[test]
fn tree_sequence_counts() {
    let ts = example_1();
    assert_eq!(ts.num_nodes(), 7);
    assert_eq!(ts.num_edges(), 8);
    assert_eq!(ts.num_sites(), 4);
    assert_eq!(ts.num_mutations(), 5);
    assert_eq!(ts.num_populations(), 1);
    assert_eq!(ts.num_individuals(), 2);
    assert_eq!(ts.num_provenances(), 1);
    assert_eq!(ts.samples(), [0, 1, 2, 3]);
    assert!(ts.is_sample(3));
    assert!(!ts.is_sample(4));
    assert!(!ts.is_sample(NULL));
    assert_eq!(ts.site_mutations(3), 3..5);
}

#[test]
fn tree_sequence_rejects_overlapping_parents() {
    let mut tables = TableCollection::new(10.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.nodes.add_row(0, 1.0, NULL, NULL);
    tables.nodes.add_row(0, 2.0, NULL, NULL);
    tables.edges.add_row(0.0, 6.0, 1, 0);
    tables.edges.add_row(4.0, 10.0, 2, 0);
    let error = TreeSequence::new(tables).unwrap_err();
    assert!(matches!(error, Error::BadTable { table: "edge", .. }));
}

#[test]
fn tree_sequence_rejects_unsorted_sites() {
    let mut tables = TableCollection::new(10.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.sites.add_row(5.0, "A");
    tables.sites.add_row(2.0, "A");
    let error = TreeSequence::new(tables).unwrap_err();
    assert!(matches!(error, Error::BadTable { table: "site", .. }));
}

#[test]
fn tree_sequence_rejects_bad_mutation_parent() {
    let mut tables = TableCollection::new(10.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.sites.add_row(1.0, "A");
    tables.sites.add_row(2.0, "A");
    tables.mutations.add_row(0, 0, NULL, f64::NAN, "C");
    tables.mutations.add_row(1, 0, 0, f64::NAN, "G");
    let error = TreeSequence::new(tables).unwrap_err();
    assert!(matches!(error, Error::BadTable { table: "mutation", .. }));
}

// ----------------------------------------------------------------------------
// Trees

#[test]
fn trees_summaries() {
    let summaries = example_1().tree_summaries();
    assert_eq!(summaries.len(), 2);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.index, i);
        assert_eq!(summary.span(), 5.0);
        assert_eq!(summary.num_edges, 6);
        assert_eq!(summary.num_roots, 1);
        assert_eq!(summary.num_sites, 2);
        assert_eq!(summary.total_branch_length, 9.0);
    }
    assert_eq!(summaries[0].num_mutations, 2);
    assert_eq!(summaries[1].num_mutations, 3);
}

#[test]
fn trees_parents_change_at_breakpoint() {
    let ts = example_1();
    let mut trees = ts.trees();

    let first = trees.next_tree().map(|t| t.parent.clone());
    assert_eq!(first, Some(vec![4, 4, 5, 5, 6, 6, NULL]));
    let second = trees.next_tree().map(|t| t.parent.clone());
    assert_eq!(second, Some(vec![4, 4, 5, 6, 5, 6, NULL]));
    assert!(trees.next_tree().is_none());
}

#[test]
fn trees_without_edges() {
    // every sample is its own root, and the whole genome is one tree
    let mut tables = TableCollection::new(3.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    let ts = TreeSequence::new(tables).unwrap();

    let summaries = ts.tree_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].num_roots, 2);
    assert_eq!(summaries[0].right, 3.0);
    assert_eq!(ts.num_trees(), 1);
}

#[test]
fn trees_gap_in_coverage() {
    // the middle of the genome has no edges, so the samples are unconnected there
    let mut tables = TableCollection::new(30.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.nodes.add_row(0, 1.0, NULL, NULL);
    tables.edges.add_row(0.0, 10.0, 2, 0);
    tables.edges.add_row(0.0, 10.0, 2, 1);
    tables.edges.add_row(20.0, 30.0, 2, 0);
    tables.edges.add_row(20.0, 30.0, 2, 1);
    let ts = TreeSequence::new(tables).unwrap();

    let roots: Vec<_> = ts.tree_summaries().iter().map(|s| s.num_roots).collect();
    assert_eq!(roots, [1, 2, 1]);
    assert_eq!(ts.breakpoints(), [0.0, 10.0, 20.0, 30.0]);
}

// ----------------------------------------------------------------------------
// Stats

#[test]
fn stats_single_window() -> Result<(), Report> {
    let ts = example_1();
    let windows = [0.0, ts.sequence_length()];
    assert_close(&ts.diversity(&windows)?, &[13.0 / 60.0]);
    assert_close(&ts.segregating_sites(&windows)?, &[0.4]);
    assert_close(&ts.tajimas_d(&windows)?, &[-0.06501024948259031]);
    Ok(())
}

#[test]
fn stats_two_windows() -> Result<(), Report> {
    let ts = example_1();
    let windows = ts.equal_windows(2);
    assert_close(&ts.diversity(&windows)?, &[7.0 / 30.0, 0.2]);
    assert_close(&ts.segregating_sites(&windows)?, &[0.4, 0.4]);
    assert_close(&ts.tajimas_d(&windows)?, &[0.591580139899561, -0.709896167879475]);
    Ok(())
}

#[test]
fn stats_site_diversity() {
    let ts = example_1();
    let n = ts.num_samples() as u32;
    let observed: Vec<f64> = ts.site_alleles().iter().map(|a| a.pairwise_diversity(n)).collect();
    assert_close(&observed, &[2.0 / 3.0, 0.5, 0.5, 0.5]);
}

#[test]
fn stats_tajimas_d_without_sites() -> Result<(), Report> {
    let mut tables = TableCollection::new(1.0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    let ts = TreeSequence::new(tables)?;
    let d = ts.tajimas_d(&[0.0, 1.0])?;
    assert!(d[0].is_nan());
    Ok(())
}

#[test]
fn stats_bad_windows() {
    let ts = example_1();
    for windows in [vec![0.0], vec![1.0, 10.0], vec![0.0, 9.0], vec![0.0, 5.0, 5.0, 10.0]] {
        let error = ts.diversity(&windows).unwrap_err();
        assert!(matches!(error, Error::BadWindows(_)), "{windows:?}");
    }
}

#[test]
fn stats_from_precomputed_counts() -> Result<(), Report> {
    let ts = example_1();
    let counts = ts.mutation_sample_counts();
    let stats = ts.site_stats_from(&counts);
    assert_eq!(stats, ts.site_stats());

    let windows = ts.equal_windows(2);
    assert_close(&stats.diversity(&windows)?, &ts.diversity(&windows)?);
    assert_close(&stats.tajimas_d(&windows)?, &ts.tajimas_d(&windows)?);
    assert_eq!(stats.allele_frequency_spectrum(), [0, 2, 1, 1, 0]);
    Ok(())
}

#[test]
fn stats_allele_frequency_spectrum() {
    assert_eq!(example_1().allele_frequency_spectrum(), [0, 2, 1, 1, 0]);
}
