//! `tsqc` is a **Q**uality-**C**ontrol dashboard for **T**ree **S**equence files.
//!
//! ## Why tsqc?
//!
//! 1. `tsqc` _loads_ a tskit `.trees` file once, or a zstd-compressed one, and
//!    serves a multi-page web dashboard over it.
//!
//! 1. Each page is a different view of the same dataset:
//!
//!     | Page          | Shows                                                        |
//!     |---------------|--------------------------------------------------------------|
//!     | Overview      | headline counts, populations and provenance                  |
//!     | Mutations     | positions, times and inherited samples of mutations          |
//!     | Edges         | edge spans and branch lengths                                |
//!     | Edge Explorer | child edges of the busiest parent nodes along the genome     |
//!     | Trees         | local tree spans, sites and branch lengths                   |
//!     | Nodes         | node counts, times and ancestral spans                       |
//!     | Popgen        | diversity, segregating sites, Tajima's D and the AFS         |
//!
//! 1. **Pages are independent.** A page that fails to render shows an error
//!    panel in place of its content; every other page keeps working.
//!
//! ## Usage
//!
//! ```text
//! tsqc serve simulation.trees --port 8080
//! tsqc info simulation.trees.tsz --format json
//! ```
//!
//! The selected page is kept in the `page` URL parameter, so links such as
//! `http://127.0.0.1:8080/?page=Edge%20Explorer` open a specific page.

pub mod app;
pub mod cli;
pub mod content;
pub mod model;
pub mod pages;
pub mod server;
pub mod utils;

#[doc(inline)]
pub use crate::cli::{Cli, Verbosity};
#[doc(inline)]
pub use crate::model::TSModel;
#[doc(inline)]
pub use crate::pages::{Page, Registry};
