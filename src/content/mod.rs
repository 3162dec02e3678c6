//! Displayable page [`Content`]: headings, text, tables and plots.

pub mod plot;
pub mod table;

#[doc(inline)]
pub use plot::{Bar, Histogram, Intervals, Line, Plot};
#[doc(inline)]
pub use table::Table;

use crate::utils::escape_html;
use serde::{Deserialize, Serialize};

/// One element of a page, in display order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Table(Table),
    Plot(Plot),
    /// Side-by-side blocks.
    Row(Vec<Block>),
}

impl Block {
    pub fn to_html(&self) -> String {
        match self {
            Block::Heading(text) => format!("<h2>{}</h2>", escape_html(text)),
            Block::Paragraph(text) => format!("<p>{}</p>", escape_html(text)),
            Block::Table(table) => format!("<div class=\"table-wrap\">{}</div>", table.to_html()),
            Block::Plot(plot) => format!("<figure class=\"plot\">{}</figure>", plot.to_svg()),
            Block::Row(blocks) => {
                let inner: String = blocks.iter().map(|b| format!("<div>{}</div>", b.to_html())).collect();
                format!("<div class=\"row\">{inner}</div>")
            }
        }
    }
}

/// The rendered body of a page.
///
/// ## Examples
///
/// ```rust
/// use tsqc::content::{Content, Table};
/// let mut table = Table::with_headers(["trees"]);
/// table.add_row([2]);
///
/// let content = Content::new().heading("Summary").table(table);
/// let html = content.to_html();
/// assert!(html.contains("<h2>Summary</h2>"));
/// assert!(html.contains("<td>2</td>"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Content {
    pub blocks: Vec<Block>,
}

impl Content {
    pub fn new() -> Self {
        Content { blocks: Vec::new() }
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn plot(mut self, plot: impl Into<Plot>) -> Self {
        self.blocks.push(Block::Plot(plot.into()));
        self
    }

    /// Place plots next to each other.
    pub fn plots<I, P>(mut self, plots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Plot>,
    {
        let blocks = plots.into_iter().map(|p| Block::Plot(p.into())).collect();
        self.blocks.push(Block::Row(blocks));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All tables of the page, including those inside rows.
    pub fn tables(&self) -> Vec<&Table> {
        fn collect<'a>(blocks: &'a [Block], tables: &mut Vec<&'a Table>) {
            for block in blocks {
                match block {
                    Block::Table(table) => tables.push(table),
                    Block::Row(inner) => collect(inner, tables),
                    _ => (),
                }
            }
        }
        let mut tables = Vec::new();
        collect(&self.blocks, &mut tables);
        tables
    }

    /// All plots of the page, including those inside rows.
    pub fn figures(&self) -> impl Iterator<Item = &Plot> {
        self.blocks.iter().flat_map(|block| match block {
            Block::Plot(plot) => vec![plot],
            Block::Row(inner) => inner
                .iter()
                .filter_map(|b| match b {
                    Block::Plot(plot) => Some(plot),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Render the page body as an HTML fragment.
    pub fn to_html(&self) -> String {
        self.blocks.iter().map(Block::to_html).collect::<Vec<_>>().join("\n")
    }
}
