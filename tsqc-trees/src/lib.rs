#![doc = include_str!("../README.md")]

mod error;
pub mod examples;
pub mod kastore;
pub mod stats;
mod tables;
mod tree_sequence;
pub mod trees;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use tables::{
    EdgeTable, IndividualTable, MutationTable, NodeTable, PopulationTable, ProvenanceTable, Ragged,
    SiteTable, TableCollection, FORMAT_NAME, FORMAT_VERSION, UNKNOWN_TIME_UNITS,
};
#[doc(inline)]
pub use tree_sequence::TreeSequence;
#[doc(inline)]
pub use trees::{Tree, TreeSummary, Trees};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Id used for a missing node, population, individual, or mutation.
pub const NULL: i32 = -1;

/// Node flag marking a sample.
pub const NODE_IS_SAMPLE: u32 = 1;
