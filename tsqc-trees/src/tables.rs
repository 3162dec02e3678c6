//! Column tables of a tree sequence, laid out the way tskit stores them.

use crate::kastore::Store;
use crate::{Error, NULL};

/// Name written to and expected in the `format/name` key.
pub const FORMAT_NAME: &str = "tskit.trees";
/// File format version written to the `format/version` key.
pub const FORMAT_VERSION: [u32; 2] = [12, 7];
/// Time units used when a file does not record any.
pub const UNKNOWN_TIME_UNITS: &str = "unknown";

// ----------------------------------------------------------------------------
// Ragged

/// A ragged column: variable-length byte strings packed into one buffer.
///
/// Row `i` is `data[offset[i]..offset[i + 1]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ragged {
    pub data: Vec<u8>,
    pub offset: Vec<u64>,
}

impl Default for Ragged {
    fn default() -> Self {
        Self::new()
    }
}

impl Ragged {
    pub fn new() -> Self {
        Ragged { data: Vec::new(), offset: vec![0] }
    }

    /// Packs rows into a ragged column.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::Ragged;
    /// let column = Ragged::from_rows(["A", "", "GT"]);
    /// assert_eq!(column.offset, [0, 1, 1, 3]);
    /// assert_eq!(column.get_str(2), Some("GT".into()));
    /// ```
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let mut column = Ragged::new();
        rows.into_iter().for_each(|row| column.push(row));
        column
    }

    pub fn push<R: AsRef<[u8]>>(&mut self, row: R) {
        self.data.extend_from_slice(row.as_ref());
        self.offset.push(self.data.len() as u64);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.offset.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<&[u8]> {
        let start = *self.offset.get(row)? as usize;
        let end = *self.offset.get(row + 1)? as usize;
        self.data.get(start..end)
    }

    /// Returns a row as text, replacing invalid UTF-8.
    pub fn get_str(&self, row: usize) -> Option<std::borrow::Cow<'_, str>> {
        self.get(row).map(String::from_utf8_lossy)
    }

    fn read(store: &Store, key: &str) -> Result<Self, Error> {
        let data = store.get_u8(key)?.to_vec();
        let offset = store.get_offsets(&format!("{key}_offset"))?;
        let column = Ragged { data, offset };
        column.check(key)?;
        Ok(column)
    }

    fn read_optional(store: &Store, key: &str, rows: usize) -> Result<Self, Error> {
        match store.contains_key(key) {
            true => Ragged::read(store, key),
            false => Ok(Ragged { data: Vec::new(), offset: vec![0; rows + 1] }),
        }
    }

    fn write(&self, store: &mut Store, key: &str) {
        store.insert(key, self.data.clone());
        store.insert(format!("{key}_offset"), self.offset.clone());
    }

    fn check(&self, key: &str) -> Result<(), Error> {
        let monotonic = self.offset.windows(2).all(|w| w[0] <= w[1]);
        let first = self.offset.first().copied();
        let last = self.offset.last().copied();
        if !monotonic || first != Some(0) || last != Some(self.data.len() as u64) {
            return Err(Error::Corrupt(format!("Offsets of ragged column {key:?} are invalid")));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tables

/// Nodes: the genomes of ancestors and samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTable {
    pub flags: Vec<u32>,
    pub time: Vec<f64>,
    pub population: Vec<i32>,
    pub individual: Vec<i32>,
}

impl NodeTable {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn add_row(&mut self, flags: u32, time: f64, population: i32, individual: i32) -> i32 {
        self.flags.push(flags);
        self.time.push(time);
        self.population.push(population);
        self.individual.push(individual);
        (self.len() - 1) as i32
    }
}

/// Edges: a parent passing the genome interval `[left, right)` to a child.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeTable {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub parent: Vec<i32>,
    pub child: Vec<i32>,
}

impl EdgeTable {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn add_row(&mut self, left: f64, right: f64, parent: i32, child: i32) -> i32 {
        self.left.push(left);
        self.right.push(right);
        self.parent.push(parent);
        self.child.push(child);
        (self.len() - 1) as i32
    }

    /// Length of the genome interval covered by edge `i`.
    pub fn span(&self, i: usize) -> f64 {
        self.right[i] - self.left[i]
    }
}

/// Sites: genome positions where mutations occur.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteTable {
    pub position: Vec<f64>,
    pub ancestral_state: Ragged,
}

impl SiteTable {
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn add_row(&mut self, position: f64, ancestral_state: &str) -> i32 {
        self.position.push(position);
        self.ancestral_state.push(ancestral_state);
        (self.len() - 1) as i32
    }
}

/// Mutations: a change of state at a site, above a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationTable {
    pub site: Vec<i32>,
    pub node: Vec<i32>,
    pub parent: Vec<i32>,
    /// Mutation time, NaN when unknown.
    pub time: Vec<f64>,
    pub derived_state: Ragged,
}

impl MutationTable {
    pub fn len(&self) -> usize {
        self.site.len()
    }

    pub fn is_empty(&self) -> bool {
        self.site.is_empty()
    }

    pub fn add_row(&mut self, site: i32, node: i32, parent: i32, time: f64, derived_state: &str) -> i32 {
        self.site.push(site);
        self.node.push(node);
        self.parent.push(parent);
        self.time.push(time);
        self.derived_state.push(derived_state);
        (self.len() - 1) as i32
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopulationTable {
    pub metadata: Ragged,
}

impl PopulationTable {
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn add_row(&mut self, metadata: &[u8]) -> i32 {
        self.metadata.push(metadata);
        (self.len() - 1) as i32
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndividualTable {
    pub flags: Vec<u32>,
}

impl IndividualTable {
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn add_row(&mut self, flags: u32) -> i32 {
        self.flags.push(flags);
        (self.len() - 1) as i32
    }
}

/// Provenance records: which software produced the file, and when.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProvenanceTable {
    pub timestamp: Ragged,
    pub record: Ragged,
}

impl ProvenanceTable {
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    pub fn add_row(&mut self, timestamp: &str, record: &str) -> i32 {
        self.timestamp.push(timestamp);
        self.record.push(record);
        (self.len() - 1) as i32
    }
}

// ----------------------------------------------------------------------------
// Table Collection

/// All tables of a tree sequence, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct TableCollection {
    pub sequence_length: f64,
    pub time_units: String,
    pub nodes: NodeTable,
    pub edges: EdgeTable,
    pub sites: SiteTable,
    pub mutations: MutationTable,
    pub populations: PopulationTable,
    pub individuals: IndividualTable,
    pub provenances: ProvenanceTable,
}

impl TableCollection {
    /// Returns empty tables for a genome of `sequence_length`.
    pub fn new(sequence_length: f64) -> Self {
        TableCollection {
            sequence_length,
            time_units: UNKNOWN_TIME_UNITS.to_string(),
            nodes: NodeTable::default(),
            edges: EdgeTable::default(),
            sites: SiteTable::default(),
            mutations: MutationTable::default(),
            populations: PopulationTable::default(),
            individuals: IndividualTable::default(),
            provenances: ProvenanceTable::default(),
        }
    }

    /// Reads the tables from a kastore [`Store`] holding tskit columns.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::{kastore::Store, TableCollection};
    /// let tables = tsqc_trees::examples::example_1().tables().clone();
    /// let store  = tables.to_store();
    /// assert_eq!(TableCollection::from_store(&store)?, tables);
    ///
    /// // anything that is not a tskit container is a format error
    /// let other = Store::new();
    /// assert!(TableCollection::from_store(&other).unwrap_err().is_file_format());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_store(store: &Store) -> Result<Self, Error> {
        let name = store.get_text("format/name").map_err(|_| {
            Error::FileFormat("Container has no tskit format name".to_string())
        })?;
        if name != FORMAT_NAME {
            return Err(Error::FileFormat(format!("Format name {name:?} is not {FORMAT_NAME:?}")));
        }

        let sequence_length = match store.get_f64("sequence_length")? {
            [length] => *length,
            other => {
                return Err(Error::Corrupt(format!(
                    "sequence_length holds {} values instead of 1",
                    other.len()
                )))
            }
        };
        let time_units = match store.contains_key("time_units") {
            true => store.get_text("time_units")?,
            false => UNKNOWN_TIME_UNITS.to_string(),
        };

        let nodes = NodeTable {
            flags: store.get_u32("nodes/flags")?.to_vec(),
            time: store.get_f64("nodes/time")?.to_vec(),
            population: store.get_i32("nodes/population")?.to_vec(),
            individual: store.get_i32("nodes/individual")?.to_vec(),
        };

        let edges = EdgeTable {
            left: store.get_f64("edges/left")?.to_vec(),
            right: store.get_f64("edges/right")?.to_vec(),
            parent: store.get_i32("edges/parent")?.to_vec(),
            child: store.get_i32("edges/child")?.to_vec(),
        };

        let sites = SiteTable {
            position: store.get_f64("sites/position")?.to_vec(),
            ancestral_state: Ragged::read(store, "sites/ancestral_state")?,
        };

        let site = store.get_i32("mutations/site")?.to_vec();
        // files written before mutation times existed leave them unknown
        let time = match store.contains_key("mutations/time") {
            true => store.get_f64("mutations/time")?.to_vec(),
            false => vec![f64::NAN; site.len()],
        };
        let mutations = MutationTable {
            node: store.get_i32("mutations/node")?.to_vec(),
            parent: store.get_i32("mutations/parent")?.to_vec(),
            derived_state: Ragged::read(store, "mutations/derived_state")?,
            site,
            time,
        };

        let populations = match store.contains_key("populations/metadata") {
            true => PopulationTable { metadata: Ragged::read(store, "populations/metadata")? },
            false => PopulationTable::default(),
        };

        let individuals = match store.contains_key("individuals/flags") {
            true => IndividualTable { flags: store.get_u32("individuals/flags")?.to_vec() },
            false => IndividualTable::default(),
        };

        let provenances = match store.contains_key("provenances/timestamp") {
            true => {
                let timestamp = Ragged::read(store, "provenances/timestamp")?;
                let record = Ragged::read_optional(store, "provenances/record", timestamp.len())?;
                ProvenanceTable { timestamp, record }
            }
            false => ProvenanceTable::default(),
        };

        Ok(TableCollection {
            sequence_length,
            time_units,
            nodes,
            edges,
            sites,
            mutations,
            populations,
            individuals,
            provenances,
        })
    }

    /// Writes the tables as tskit columns into a new kastore [`Store`].
    pub fn to_store(&self) -> Store {
        let mut store = Store::new();
        store.insert("format/name", text(FORMAT_NAME));
        store.insert("format/version", FORMAT_VERSION.to_vec());
        store.insert("sequence_length", vec![self.sequence_length]);
        store.insert("time_units", text(&self.time_units));

        store.insert("nodes/flags", self.nodes.flags.clone());
        store.insert("nodes/time", self.nodes.time.clone());
        store.insert("nodes/population", self.nodes.population.clone());
        store.insert("nodes/individual", self.nodes.individual.clone());

        store.insert("edges/left", self.edges.left.clone());
        store.insert("edges/right", self.edges.right.clone());
        store.insert("edges/parent", self.edges.parent.clone());
        store.insert("edges/child", self.edges.child.clone());

        store.insert("sites/position", self.sites.position.clone());
        self.sites.ancestral_state.write(&mut store, "sites/ancestral_state");

        store.insert("mutations/site", self.mutations.site.clone());
        store.insert("mutations/node", self.mutations.node.clone());
        store.insert("mutations/parent", self.mutations.parent.clone());
        store.insert("mutations/time", self.mutations.time.clone());
        self.mutations.derived_state.write(&mut store, "mutations/derived_state");

        self.populations.metadata.write(&mut store, "populations/metadata");
        store.insert("individuals/flags", self.individuals.flags.clone());
        self.provenances.timestamp.write(&mut store, "provenances/timestamp");
        self.provenances.record.write(&mut store, "provenances/record");

        store
    }

    /// Checks that the columns of every table have matching lengths.
    pub(crate) fn check_lengths(&self) -> Result<(), Error> {
        let n = self.nodes.len();
        if [self.nodes.flags.len(), self.nodes.population.len(), self.nodes.individual.len()]
            .iter()
            .any(|len| *len != n)
        {
            return Err(Error::bad_table("node", "columns have different lengths"));
        }

        let n = self.edges.len();
        if [self.edges.right.len(), self.edges.parent.len(), self.edges.child.len()]
            .iter()
            .any(|len| *len != n)
        {
            return Err(Error::bad_table("edge", "columns have different lengths"));
        }

        if self.sites.ancestral_state.len() != self.sites.len() {
            return Err(Error::bad_table("site", "columns have different lengths"));
        }

        let n = self.mutations.len();
        if [
            self.mutations.node.len(),
            self.mutations.parent.len(),
            self.mutations.time.len(),
            self.mutations.derived_state.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(Error::bad_table("mutation", "columns have different lengths"));
        }

        if self.provenances.record.len() != self.provenances.len() {
            return Err(Error::bad_table("provenance", "columns have different lengths"));
        }

        Ok(())
    }

    /// Returns `true` if `node` is a valid node id, or [`NULL`] when `allow_null`.
    pub(crate) fn is_node(&self, node: i32, allow_null: bool) -> bool {
        (allow_null && node == NULL) || (node >= 0 && (node as usize) < self.nodes.len())
    }
}

/// Short text the way tskit stores it, as `int8`.
fn text(value: &str) -> Vec<i8> {
    value.bytes().map(|b| b as i8).collect()
}
