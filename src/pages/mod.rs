//! The dashboard [`Page`]s and the [`Registry`] of functions that render them.

pub mod edge_explorer;
pub mod edges;
pub mod mutations;
pub mod nodes;
pub mod overview;
pub mod popgen;
pub mod trees;

#[cfg(test)]
mod tests;

use crate::content::Content;
use crate::model::TSModel;
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

// ----------------------------------------------------------------------------
// Page
// ----------------------------------------------------------------------------

/// A named view of the dataset, in sidebar order.
///
/// ## Examples
///
/// ```rust
/// use tsqc::pages::Page;
/// use std::str::FromStr;
/// assert_eq!(Page::EdgeExplorer.to_string(), "Edge Explorer");
/// assert_eq!(Page::from_str("Edge Explorer")?, Page::EdgeExplorer);
/// assert_eq!(Page::default(), Page::Overview);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub enum Page {
    #[default]
    Overview,
    Mutations,
    Edges,
    #[serde(rename = "Edge Explorer")]
    #[strum(serialize = "Edge Explorer")]
    EdgeExplorer,
    Trees,
    Nodes,
    Popgen,
}

impl Page {
    /// All pages, in sidebar order.
    pub fn all() -> Vec<Page> {
        Page::iter().collect()
    }
}

// ----------------------------------------------------------------------------
// Registry
// ----------------------------------------------------------------------------

/// A function rendering one page from the shared dataset.
pub type Renderer = fn(&TSModel) -> Result<Content, Report>;

/// Fixed mapping from [`Page`] to its [`Renderer`].
///
/// Built once before the server starts and shared read-only afterwards.
#[derive(Clone)]
pub struct Registry {
    entries: Vec<(Page, Renderer)>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Registry").field("pages", &self.pages()).finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Returns the registry of every page and its renderer.
    pub fn new() -> Self {
        Registry::empty()
            .with(Page::Overview, overview::render)
            .with(Page::Mutations, mutations::render)
            .with(Page::Edges, edges::render)
            .with(Page::EdgeExplorer, edge_explorer::render)
            .with(Page::Trees, trees::render)
            .with(Page::Nodes, nodes::render)
            .with(Page::Popgen, popgen::render)
    }

    /// Returns a registry without any page.
    pub fn empty() -> Self {
        Registry { entries: Vec::new() }
    }

    /// Registers `renderer` for `page`, replacing any previous one.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use color_eyre::eyre::eyre;
    /// use tsqc::pages::{Page, Registry};
    /// use tsqc::model::TSModel;
    ///
    /// let registry = Registry::new().with(Page::Mutations, |_| Err(eyre!("bad site")));
    /// let model    = TSModel::new(tsqc_trees::examples::example_1(), "example.trees");
    /// let (_, renderer) = registry.lookup("Mutations")?;
    /// assert_eq!(renderer(&model).unwrap_err().to_string(), "bad site");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn with(mut self, page: Page, renderer: Renderer) -> Self {
        match self.entries.iter_mut().find(|(p, _)| *p == page) {
            Some(entry) => entry.1 = renderer,
            None => self.entries.push((page, renderer)),
        }
        self
    }

    /// Registered pages, in sidebar order.
    pub fn pages(&self) -> Vec<Page> {
        Page::iter().filter(|page| self.contains(*page)).collect()
    }

    pub fn contains(&self, page: Page) -> bool {
        self.entries.iter().any(|(p, _)| *p == page)
    }

    /// Returns the renderer of `page`.
    pub fn get(&self, page: Page) -> Result<Renderer, Report> {
        self.entries
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, renderer)| *renderer)
            .ok_or_else(|| eyre!("No renderer is registered for page {page:?}"))
            .suggestion(format!("Registered pages: {}", self.pages().iter().join(", ")))
    }

    /// Returns the page named `name` and its renderer.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::pages::{Page, Registry};
    /// let registry = Registry::new();
    /// assert_eq!(registry.lookup("Popgen")?.0, Page::Popgen);
    /// assert!(registry.lookup("Settings").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn lookup(&self, name: &str) -> Result<(Page, Renderer), Report> {
        let page = Page::from_str(name)
            .map_err(|_| eyre!("Unknown page: {name:?}"))
            .suggestion(format!("Pages: {}", self.pages().iter().join(", ")))?;
        Ok((page, self.get(page)?))
    }

    /// Parses a page name, returning [`None`] unless it is registered.
    pub fn parse(&self, name: &str) -> Option<Page> {
        Page::from_str(name).ok().filter(|page| self.contains(*page))
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Maximum number of rows shown in a page table.
pub const MAX_ROWS: usize = 1000;

/// `log10(1 + x)`, used to plot values spanning orders of magnitude.
pub(crate) fn log1p10(x: f64) -> f64 {
    (1.0 + x).log10()
}

/// Mean of the values, NaN if there are none.
pub(crate) fn mean(values: &[f64]) -> f64 {
    match values.is_empty() {
        true => f64::NAN,
        false => values.iter().sum::<f64>() / values.len() as f64,
    }
}
