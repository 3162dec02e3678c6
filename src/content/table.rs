//! A row-based [`Table`] of display values.

use crate::utils::escape_html;
use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A row-based [`Table`] of text cells.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Table {
    /// Names of the table columns.
    pub headers: Vec<String>,
    /// Rows of table values.
    pub rows: Vec<Vec<String>>,
    /// Optional caption shown above the table.
    pub caption: Option<String>,
}

impl Table {
    /// Returns a new [`Table`] with empty headers and rows.
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), caption: None }
    }

    /// Returns a new [`Table`] with the given headers.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::content::Table;
    /// let mut table = Table::with_headers(["id", "time"]);
    /// table.add_row([0, 1]);
    /// # assert_eq!(table.rows, [["0", "1"]]);
    /// ```
    pub fn with_headers<I, T>(headers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Table { headers: headers.into_iter().map(|h| h.to_string()).collect(), ..Default::default() }
    }

    /// Set the caption of the table.
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Add a new row to the table.
    ///
    /// ## Arguments
    ///
    /// * `row` - A iterable object of values to add as a row.
    pub fn add_row<I, T>(&mut self, row: I)
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.rows.push(row.into_iter().map(|v| v.to_string()).collect());
    }

    /// Returns the values of the column named `header`.
    pub fn get_column(&self, header: &str) -> Result<Vec<&str>, Report> {
        let i = self
            .headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| eyre!("Column '{header}' was not found in table."))?;
        Ok(self.rows.iter().map(|row| row.get(i).map(String::as_str).unwrap_or_default()).collect())
    }

    /// Convert table to markdown format.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::content::Table;
    /// let mut table = Table::with_headers(["Name", "Value"]);
    /// table.add_row(["trees", "2"]);
    ///
    /// let expected = "\
    /// | Name  | Value |
    /// |-------|-------|
    /// | trees |   2   |
    /// ";
    /// assert_eq!(table.to_markdown(), expected);
    /// ```
    pub fn to_markdown(&self) -> String {
        // widest cell of each column, plus a space on either side
        let col_widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(col_i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col_i))
                    .map(|cell| cell.chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or_default()
                    + 2
            })
            .collect_vec();

        let mut markdown = String::from("|");
        let mut header_frame = String::from("|");
        for (header, col_width) in self.headers.iter().zip(&col_widths) {
            markdown.push_str(&format!("{:^width$}|", header, width = col_width));
            header_frame.push_str(&format!("{}|", "-".repeat(*col_width)));
        }
        markdown.push('\n');
        markdown.push_str(&header_frame);
        markdown.push('\n');

        for row in &self.rows {
            markdown.push('|');
            for (col_i, col_width) in col_widths.iter().enumerate() {
                let cell = row.get(col_i).map(String::as_str).unwrap_or_default();
                markdown.push_str(&format!("{:^width$}|", cell, width = col_width));
            }
            markdown.push('\n');
        }

        markdown
    }

    /// Convert table to a sortable HTML table.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::content::Table;
    /// let mut table = Table::with_headers(["state"]);
    /// table.add_row(["<A>"]);
    /// let html = table.to_html();
    /// assert!(html.starts_with("<table class=\"sortable\">"));
    /// assert!(html.contains("<td>&lt;A&gt;</td>"));
    /// ```
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"sortable\">");
        if let Some(caption) = &self.caption {
            html.push_str(&format!("<caption>{}</caption>", escape_html(caption)));
        }
        html.push_str("<thead><tr>");
        self.headers.iter().for_each(|h| html.push_str(&format!("<th>{}</th>", escape_html(h))));
        html.push_str("</tr></thead><tbody>");
        for row in &self.rows {
            html.push_str("<tr>");
            row.iter().for_each(|cell| html.push_str(&format!("<td>{}</td>", escape_html(cell))));
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }
}
