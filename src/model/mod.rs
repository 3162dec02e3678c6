//! The loaded dataset shared by every session: a [`TreeSequence`] and its display name.

#[cfg(test)]
mod tests;

use crate::content::Table;
use crate::utils::{self, format_float};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::sync::OnceLock;
use tsqc_trees::stats::SiteStats;
use tsqc_trees::{TreeSequence, TreeSummary};

// ----------------------------------------------------------------------------
// TSModel
// ----------------------------------------------------------------------------

/// A tree sequence and the name it is displayed under.
///
/// Immutable after loading. Values derived from the trees are computed the
/// first time a page asks for them and then reused by every session.
#[derive(Debug)]
pub struct TSModel {
    pub ts: TreeSequence,
    /// Base name of the file the tree sequence was loaded from.
    pub name: String,
    /// Size in bytes of the file on disk.
    pub file_size: u64,
    trees: OnceLock<Vec<TreeSummary>>,
    mutation_counts: OnceLock<Vec<u32>>,
}

impl TSModel {
    /// Returns a new [`TSModel`] from a tree sequence already in memory.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::model::TSModel;
    /// let ts    = tsqc_trees::examples::example_1();
    /// let model = TSModel::new(ts, "example.trees");
    /// assert_eq!(model.name, "example.trees");
    /// assert_eq!(model.tree_summaries().len(), 2);
    /// ```
    pub fn new(ts: TreeSequence, name: impl Into<String>) -> Self {
        let file_size = ts.to_bytes().len() as u64;
        TSModel::with_file_size(ts, name.into(), file_size)
    }

    fn with_file_size(ts: TreeSequence, name: String, file_size: u64) -> Self {
        TSModel { ts, name, file_size, trees: OnceLock::new(), mutation_counts: OnceLock::new() }
    }

    /// Load a tree sequence file, falling back to decompressing it.
    ///
    /// A file that is not a tskit `.trees` file at all is decompressed in memory
    /// and decoded again. Any other failure, or a failed fallback, is an error.
    ///
    /// ## Arguments
    ///
    /// - `path` - Path to an existing file.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::model::TSModel;
    /// let dir  = tempfile::tempdir()?;
    /// let path = dir.path().join("example.trees.tsz");
    /// let ts   = tsqc_trees::examples::example_1();
    /// std::fs::write(&path, zstd::encode_all(ts.to_bytes().as_slice(), 0)?)?;
    ///
    /// let model = TSModel::load(&path)?;
    /// assert_eq!(model.name, "example.trees.tsz");
    /// assert_eq!(model.ts.tables(), ts.tables());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn load<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        info!("Loading {path:?}");
        let file_size = std::fs::metadata(path).wrap_err(format!("Failed to read: {path:?}"))?.len();

        let ts = match TreeSequence::load(path) {
            Ok(ts) => ts,
            Err(e) if e.is_file_format() => {
                info!("{path:?} is not a tskit file ({e}), decompressing it.");
                let bytes = utils::decompress_file(path)
                    .wrap_err(format!("Failed to load: {path:?}"))
                    .suggestion("Expected a tskit .trees file or a zstd-compressed one.")?;
                debug!("Decompressed {file_size} bytes to {}", bytes.len());
                TreeSequence::from_bytes(&bytes)
                    .wrap_err(format!("Failed to decode decompressed file: {path:?}"))?
            }
            Err(e) => return Err(e).wrap_err(format!("Failed to load: {path:?}")),
        };

        let name = path
            .as_ref()
            .file_name()
            .ok_or_else(|| eyre!("Path has no file name: {path:?}"))?
            .to_string_lossy()
            .to_string();

        Ok(TSModel::with_file_size(ts, name, file_size))
    }

    /// Summaries of every local tree, computed once.
    pub fn tree_summaries(&self) -> &[TreeSummary] {
        self.trees.get_or_init(|| self.ts.tree_summaries())
    }

    /// Number of samples inheriting each mutation, computed once.
    pub fn mutation_sample_counts(&self) -> &[u32] {
        self.mutation_counts.get_or_init(|| self.ts.mutation_sample_counts())
    }

    /// Allele counts of every site, from the cached mutation sample counts.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::model::TSModel;
    /// let model = TSModel::new(tsqc_trees::examples::example_1(), "example.trees");
    /// let stats = model.site_stats();
    /// assert_eq!(stats.alleles.len(), model.ts.num_sites());
    /// ```
    pub fn site_stats(&self) -> SiteStats {
        self.ts.site_stats_from(self.mutation_sample_counts())
    }

    /// Returns the dataset [`Summary`].
    pub fn summary(&self) -> Summary {
        let ts = &self.ts;
        Summary {
            name: self.name.clone(),
            file_size: self.file_size,
            sequence_length: ts.sequence_length(),
            time_units: ts.time_units().to_string(),
            num_trees: ts.num_trees(),
            num_samples: ts.num_samples(),
            num_nodes: ts.num_nodes(),
            num_edges: ts.num_edges(),
            num_sites: ts.num_sites(),
            num_mutations: ts.num_mutations(),
            num_populations: ts.num_populations(),
            num_individuals: ts.num_individuals(),
            num_provenances: ts.num_provenances(),
        }
    }
}

// ----------------------------------------------------------------------------
// Summary
// ----------------------------------------------------------------------------

/// Headline counts of a dataset, as shown on the overview page.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub file_size: u64,
    pub sequence_length: f64,
    pub time_units: String,
    pub num_trees: usize,
    pub num_samples: usize,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub num_sites: usize,
    pub num_mutations: usize,
    pub num_populations: usize,
    pub num_individuals: usize,
    pub num_provenances: usize,
}

impl Summary {
    /// Returns the summary as a two-column [`Table`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::model::TSModel;
    /// let model = TSModel::new(tsqc_trees::examples::example_1(), "example.trees");
    /// let table = model.summary().to_table();
    /// assert_eq!(table.headers, ["Property", "Value"]);
    /// assert_eq!(table.rows[3], ["Trees", "2"]);
    /// ```
    pub fn to_table(&self) -> Table {
        let mut table = Table::with_headers(["Property", "Value"]);
        table.add_row(["File name".to_string(), self.name.clone()]);
        table.add_row(["Sequence length".to_string(), format_float(self.sequence_length)]);
        table.add_row(["Time units".to_string(), self.time_units.clone()]);
        table.add_row(["Trees".to_string(), self.num_trees.to_string()]);
        table.add_row(["Samples".to_string(), self.num_samples.to_string()]);
        table.add_row(["Nodes".to_string(), self.num_nodes.to_string()]);
        table.add_row(["Edges".to_string(), self.num_edges.to_string()]);
        table.add_row(["Sites".to_string(), self.num_sites.to_string()]);
        table.add_row(["Mutations".to_string(), self.num_mutations.to_string()]);
        table.add_row(["Populations".to_string(), self.num_populations.to_string()]);
        table.add_row(["Individuals".to_string(), self.num_individuals.to_string()]);
        table.add_row(["Provenances".to_string(), self.num_provenances.to_string()]);
        table.add_row(["File size (bytes)".to_string(), self.file_size.to_string()]);
        table
    }
}
