//! Local trees along the genome: spans, sites and branch lengths.

use crate::content::{Content, Histogram, Line, Table};
use crate::model::TSModel;
use crate::pages::MAX_ROWS;
use crate::utils::format_float;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let summaries = model.tree_summaries();

    let multiple_roots = summaries.iter().filter(|t| t.num_roots > 1).count();
    let empty = summaries.iter().filter(|t| t.num_edges == 0).count();

    let mut content = Content::new().heading("Trees").paragraph(format!(
        "{} trees, {} with more than one root and {} without edges.",
        summaries.len(),
        multiple_roots,
        empty
    ));

    let spans = summaries.iter().map(|t| t.span()).collect_vec();
    // each tree contributes a step from its left to its right coordinate
    let steps = |value: fn(&tsqc_trees::TreeSummary) -> f64| {
        summaries.iter().flat_map(|t| [(t.left, value(t)), (t.right, value(t))]).collect_vec()
    };

    content = content
        .plot(Histogram::new("Tree spans", "span", spans))
        .plots([
            Line::new("Sites per tree", "genome position", "sites", steps(|t| t.num_sites as f64)),
            Line::new(
                "Total branch length",
                "genome position",
                format!("branch length ({})", ts.time_units()),
                steps(|t| t.total_branch_length),
            ),
        ]);

    let mut table = Table::with_headers([
        "index",
        "left",
        "right",
        "span",
        "edges",
        "roots",
        "sites",
        "mutations",
        "total branch length",
    ]);
    for t in summaries.iter().take(MAX_ROWS) {
        table.add_row([
            t.index.to_string(),
            format_float(t.left),
            format_float(t.right),
            format_float(t.span()),
            t.num_edges.to_string(),
            t.num_roots.to_string(),
            t.num_sites.to_string(),
            t.num_mutations.to_string(),
            format_float(t.total_branch_length),
        ]);
    }
    if summaries.len() > MAX_ROWS {
        table = table.caption(format!("First {MAX_ROWS} of {} trees", summaries.len()));
    }

    Ok(content.table(table))
}
