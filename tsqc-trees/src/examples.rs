//! Small tree sequences used in documentation and tests.

use crate::kastore::Store;
use crate::{TableCollection, TreeSequence, NODE_IS_SAMPLE, NULL};

/// Returns the `Example 1` [TreeSequence]: four samples over a genome of length 10, with two trees.
///
/// ```text
///  [0, 5)            [5, 10)
///
///     6                 6
///   ┌─┴─┐             ┌─┴─┐
///   4   5             5   3
///  ┌┴┐ ┌┴┐          ┌─┴─┐
///  0 1 2 3          4   2
///                  ┌┴┐
///                  0 1
/// ```
///
/// Sites sit at positions 1, 4, 6 and 8. The last site carries a mutation above
/// `0` and `1` and a reversion back to the ancestral state on `0`.
///
/// ## Examples
///
/// ```rust
/// let ts = tsqc_trees::examples::example_1();
/// assert_eq!(ts.sequence_length(), 10.0);
/// assert_eq!(ts.num_sites(), 4);
/// ```
pub fn example_1() -> TreeSequence {
    let mut tables = TableCollection::new(10.0);
    tables.time_units = "generations".to_string();

    tables.populations.add_row(b"{\"name\":\"pop_0\"}");
    tables.individuals.add_row(0);
    tables.individuals.add_row(0);

    // samples, two per individual
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, 0, 0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, 0, 0);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, 0, 1);
    tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, 0, 1);
    // ancestors
    tables.nodes.add_row(0, 1.0, 0, NULL);
    tables.nodes.add_row(0, 2.0, 0, NULL);
    tables.nodes.add_row(0, 3.0, 0, NULL);

    tables.edges.add_row(0.0, 10.0, 4, 0);
    tables.edges.add_row(0.0, 10.0, 4, 1);
    tables.edges.add_row(0.0, 10.0, 5, 2);
    tables.edges.add_row(0.0, 5.0, 5, 3);
    tables.edges.add_row(5.0, 10.0, 5, 4);
    tables.edges.add_row(5.0, 10.0, 6, 3);
    tables.edges.add_row(0.0, 5.0, 6, 4);
    tables.edges.add_row(0.0, 10.0, 6, 5);

    tables.sites.add_row(1.0, "A");
    tables.sites.add_row(4.0, "C");
    tables.sites.add_row(6.0, "G");
    tables.sites.add_row(8.0, "T");

    tables.mutations.add_row(0, 4, NULL, 1.5, "T");
    tables.mutations.add_row(1, 2, NULL, 0.5, "G");
    tables.mutations.add_row(2, 5, NULL, 2.5, "A");
    tables.mutations.add_row(3, 4, NULL, 1.5, "C");
    tables.mutations.add_row(3, 0, 3, 0.5, "T");

    tables.provenances.add_row("2024-01-01T00:00:00", r#"{"software":{"name":"tsqc"}}"#);

    // the tables above are valid by construction
    match TreeSequence::new(tables) {
        Ok(ts) => ts,
        Err(e) => panic!("example_1 is not a valid tree sequence: {e}"),
    }
}

/// Returns `ts` laid out the way tskit itself writes a `.trees` file.
///
/// - Short text (`format/name`, `time_units`, `uuid`, schemas) is `int8`.
/// - Ragged columns are `uint8` with `uint64` offsets.
/// - Columns this crate does not read, such as metadata and the edge indexes, are present.
///
/// ## Examples
///
/// ```rust
/// use tsqc_trees::{examples, kastore::Array, TreeSequence};
/// let ts    = examples::example_1();
/// let store = examples::tskit_layout(&ts);
/// assert!(matches!(store.get("format/name"), Some(Array::Int8(_))));
/// assert_eq!(TreeSequence::from_bytes(&store.to_bytes())?.tables(), ts.tables());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn tskit_layout(ts: &TreeSequence) -> Store {
    let tables = ts.tables();
    let int8 = |text: &str| text.bytes().map(|b| b as i8).collect::<Vec<i8>>();
    let mut store = tables.to_store();

    store.insert("format/name", int8("tskit.trees"));
    store.insert("format/version", vec![12_u32, 7]);
    store.insert("time_units", int8(&tables.time_units));
    store.insert("uuid", int8("6f1b0a3c-2d4e-4f5a-8b9c-0d1e2f3a4b5c"));
    store.insert("metadata", Vec::<i8>::new());
    store.insert("metadata_schema", Vec::<i8>::new());

    let rows = [
        ("nodes", tables.nodes.len()),
        ("edges", tables.edges.len()),
        ("sites", tables.sites.len()),
        ("mutations", tables.mutations.len()),
        ("individuals", tables.individuals.len()),
    ];
    for (table, rows) in rows {
        store.insert(format!("{table}/metadata"), Vec::<u8>::new());
        store.insert(format!("{table}/metadata_offset"), vec![0_u64; rows + 1]);
        store.insert(format!("{table}/metadata_schema"), Vec::<i8>::new());
    }

    let edges = &tables.edges;
    let time = |node: i32| tables.nodes.time[node as usize];
    let mut insertion: Vec<i32> = (0..edges.len() as i32).collect();
    insertion.sort_by(|a, b| {
        let (a, b) = (*a as usize, *b as usize);
        edges.left[a]
            .total_cmp(&edges.left[b])
            .then(time(edges.parent[a]).total_cmp(&time(edges.parent[b])))
            .then(edges.parent[a].cmp(&edges.parent[b]))
            .then(edges.child[a].cmp(&edges.child[b]))
    });
    let mut removal: Vec<i32> = (0..edges.len() as i32).collect();
    removal.sort_by(|a, b| {
        let (a, b) = (*a as usize, *b as usize);
        edges.right[a]
            .total_cmp(&edges.right[b])
            .then(time(edges.parent[b]).total_cmp(&time(edges.parent[a])))
            .then(edges.parent[b].cmp(&edges.parent[a]))
            .then(edges.child[b].cmp(&edges.child[a]))
    });
    store.insert("indexes/edge_insertion_order", insertion);
    store.insert("indexes/edge_removal_order", removal);

    store
}
