use crate::kastore::Store;
use crate::{Error, TableCollection, NODE_IS_SAMPLE, NULL};
use itertools::Itertools;
use std::fmt::Debug;
use std::ops::Range;
use std::path::Path;

/// A validated, immutable tree sequence.
///
/// ## Examples
///
/// ```rust
/// let ts = tsqc_trees::examples::example_1();
/// assert_eq!(ts.num_samples(), 4);
/// assert_eq!(ts.num_trees(), 2);
/// assert_eq!(ts.num_mutations(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct TreeSequence {
    tables: TableCollection,
    samples: Vec<i32>,
    /// Mutation ids of each site, mutations being sorted by site.
    site_mutations: Vec<Range<usize>>,
}

impl TreeSequence {
    /// Validates the tables and returns a [`TreeSequence`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::{TableCollection, TreeSequence, NODE_IS_SAMPLE, NULL};
    /// let mut tables = TableCollection::new(10.0);
    /// tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    /// tables.nodes.add_row(NODE_IS_SAMPLE, 0.0, NULL, NULL);
    /// tables.nodes.add_row(0, 1.0, NULL, NULL);
    /// tables.edges.add_row(0.0, 10.0, 2, 0);
    /// tables.edges.add_row(0.0, 10.0, 2, 1);
    /// let ts = TreeSequence::new(tables)?;
    /// assert_eq!(ts.samples(), [0, 1]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A parent younger than its child is rejected.
    ///
    /// ```rust
    /// # use tsqc_trees::{TableCollection, TreeSequence, NODE_IS_SAMPLE, NULL};
    /// let mut tables = TableCollection::new(10.0);
    /// tables.nodes.add_row(NODE_IS_SAMPLE, 2.0, NULL, NULL);
    /// tables.nodes.add_row(0, 1.0, NULL, NULL);
    /// tables.edges.add_row(0.0, 10.0, 1, 0);
    /// assert!(TreeSequence::new(tables).is_err());
    /// ```
    pub fn new(tables: TableCollection) -> Result<Self, Error> {
        tables.check_lengths()?;

        let length = tables.sequence_length;
        if !(length.is_finite() && length > 0.0) {
            return Err(Error::bad_table("sequence", format!("length {length} must be positive")));
        }

        check_nodes(&tables)?;
        check_edges(&tables)?;
        check_sites(&tables)?;
        let site_mutations = check_mutations(&tables)?;

        let samples = tables
            .nodes
            .flags
            .iter()
            .positions(|flags| flags & NODE_IS_SAMPLE != 0)
            .map(|node| node as i32)
            .collect();

        Ok(TreeSequence { tables, samples, site_mutations })
    }

    /// Reads a tskit `.trees` file.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::TreeSequence;
    /// let dir  = tempfile::tempdir()?;
    /// let path = dir.path().join("example.trees");
    ///
    /// let ts = tsqc_trees::examples::example_1();
    /// ts.dump(&path)?;
    /// let loaded = TreeSequence::load(&path)?;
    /// assert_eq!(loaded.tables(), ts.tables());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn load<P>(path: &P) -> Result<Self, Error>
    where
        P: AsRef<Path> + Debug,
    {
        let bytes = std::fs::read(path)?;
        TreeSequence::from_bytes(&bytes)
    }

    /// Decodes a tree sequence from the bytes of a `.trees` file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let store = Store::from_bytes(bytes)?;
        let tables = TableCollection::from_store(&store)?;
        TreeSequence::new(tables)
    }

    /// Encodes the tree sequence as the bytes of a `.trees` file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.tables.to_store().to_bytes()
    }

    /// Writes the tree sequence to a `.trees` file.
    pub fn dump<P>(&self, path: &P) -> Result<(), Error>
    where
        P: AsRef<Path> + Debug,
    {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    pub fn sequence_length(&self) -> f64 {
        self.tables.sequence_length
    }

    pub fn time_units(&self) -> &str {
        &self.tables.time_units
    }

    /// Sample node ids, in increasing order.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_sample(&self, node: i32) -> bool {
        node >= 0
            && self.tables.nodes.flags.get(node as usize).is_some_and(|f| f & NODE_IS_SAMPLE != 0)
    }

    pub fn num_nodes(&self) -> usize {
        self.tables.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.tables.edges.len()
    }

    pub fn num_sites(&self) -> usize {
        self.tables.sites.len()
    }

    pub fn num_mutations(&self) -> usize {
        self.tables.mutations.len()
    }

    pub fn num_populations(&self) -> usize {
        self.tables.populations.len()
    }

    pub fn num_individuals(&self) -> usize {
        self.tables.individuals.len()
    }

    pub fn num_provenances(&self) -> usize {
        self.tables.provenances.len()
    }

    /// Genome coordinates where one tree ends and the next begins, including `0` and the sequence length.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let ts = tsqc_trees::examples::example_1();
    /// assert_eq!(ts.breakpoints(), [0.0, 5.0, 10.0]);
    /// ```
    pub fn breakpoints(&self) -> Vec<f64> {
        let edges = &self.tables.edges;
        [0.0, self.sequence_length()]
            .into_iter()
            .chain(edges.left.iter().copied())
            .chain(edges.right.iter().copied())
            .sorted_by(|a, b| a.total_cmp(b))
            .dedup()
            .collect()
    }

    /// Number of distinct trees along the genome.
    pub fn num_trees(&self) -> usize {
        self.breakpoints().len() - 1
    }

    /// Ids of the mutations at `site`.
    pub fn site_mutations(&self, site: usize) -> Range<usize> {
        self.site_mutations.get(site).cloned().unwrap_or(0..0)
    }
}

// ----------------------------------------------------------------------------
// Validation

fn check_nodes(tables: &TableCollection) -> Result<(), Error> {
    let nodes = &tables.nodes;
    let num_populations = tables.populations.len() as i32;
    let num_individuals = tables.individuals.len() as i32;

    for i in 0..nodes.len() {
        if !nodes.time[i].is_finite() {
            return Err(Error::bad_table("node", format!("node {i} has a non-finite time")));
        }
        let population = nodes.population[i];
        if population != NULL && !(0..num_populations).contains(&population) {
            return Err(Error::bad_table(
                "node",
                format!("node {i} references population {population} out of range"),
            ));
        }
        let individual = nodes.individual[i];
        if individual != NULL && !(0..num_individuals).contains(&individual) {
            return Err(Error::bad_table(
                "node",
                format!("node {i} references individual {individual} out of range"),
            ));
        }
    }
    Ok(())
}

fn check_edges(tables: &TableCollection) -> Result<(), Error> {
    let edges = &tables.edges;
    let time = &tables.nodes.time;

    for i in 0..edges.len() {
        let (left, right) = (edges.left[i], edges.right[i]);
        if !(left >= 0.0 && left < right && right <= tables.sequence_length) {
            return Err(Error::bad_table("edge", format!("edge {i} has bad interval [{left}, {right})")));
        }
        let (parent, child) = (edges.parent[i], edges.child[i]);
        if !tables.is_node(parent, false) || !tables.is_node(child, false) {
            return Err(Error::bad_table("edge", format!("edge {i} references a node out of range")));
        }
        if time[parent as usize] <= time[child as usize] {
            return Err(Error::bad_table(
                "edge",
                format!("edge {i} parent {parent} is not older than child {child}"),
            ));
        }
    }

    // a child has at most one parent at any position
    let by_child = (0..edges.len()).into_group_map_by(|i| edges.child[*i]);
    for (child, ids) in by_child {
        let overlapping = ids
            .into_iter()
            .sorted_by(|a, b| edges.left[*a].total_cmp(&edges.left[*b]))
            .tuple_windows()
            .any(|(a, b)| edges.left[b] < edges.right[a]);
        if overlapping {
            return Err(Error::bad_table(
                "edge",
                format!("node {child} has more than one parent over an interval"),
            ));
        }
    }

    Ok(())
}

fn check_sites(tables: &TableCollection) -> Result<(), Error> {
    let position = &tables.sites.position;
    if let Some(i) = position.iter().position(|p| !(*p >= 0.0 && *p < tables.sequence_length)) {
        return Err(Error::bad_table("site", format!("site {i} is outside the genome")));
    }
    if let Some(i) = position.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::bad_table(
            "site",
            format!("sites must be sorted by unique position, see site {}", i + 1),
        ));
    }
    Ok(())
}

fn check_mutations(tables: &TableCollection) -> Result<Vec<Range<usize>>, Error> {
    let mutations = &tables.mutations;
    let num_sites = tables.sites.len();

    for i in 0..mutations.len() {
        let site = mutations.site[i];
        if !(site >= 0 && (site as usize) < num_sites) {
            return Err(Error::bad_table("mutation", format!("mutation {i} references site {site} out of range")));
        }
        if !tables.is_node(mutations.node[i], false) {
            return Err(Error::bad_table("mutation", format!("mutation {i} references a node out of range")));
        }
        let parent = mutations.parent[i];
        if parent != NULL {
            if !(parent >= 0 && (parent as usize) < i) {
                return Err(Error::bad_table(
                    "mutation",
                    format!("mutation {i} parent {parent} must be an earlier mutation"),
                ));
            }
            if mutations.site[parent as usize] != site {
                return Err(Error::bad_table(
                    "mutation",
                    format!("mutation {i} parent {parent} is at another site"),
                ));
            }
        }
    }

    if let Some(i) = mutations.site.windows(2).position(|w| w[0] > w[1]) {
        return Err(Error::bad_table(
            "mutation",
            format!("mutations must be sorted by site, see mutation {}", i + 1),
        ));
    }

    // mutations are sorted, so each site owns a contiguous range
    let mut ranges = vec![0..0; num_sites];
    let mut start = 0;
    for (site, group) in &mutations.site.iter().group_by(|site| **site) {
        let end = start + group.count();
        ranges[site as usize] = start..end;
        start = end;
    }
    Ok(ranges)
}
