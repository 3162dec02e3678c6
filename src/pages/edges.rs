//! Distribution of edge spans and branch lengths.

use crate::content::{Content, Histogram, Table};
use crate::model::TSModel;
use crate::pages::mean;
use crate::utils::format_float;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;

/// Number of longest edges listed.
const LONGEST: usize = 20;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let edges = &ts.tables().edges;
    let time = &ts.tables().nodes.time;

    let content = Content::new().heading("Edges");
    if edges.is_empty() {
        return Ok(content.paragraph("This tree sequence has no edges."));
    }

    let spans = (0..edges.len()).map(|e| edges.span(e)).collect_vec();
    let branch_lengths = (0..edges.len())
        .map(|e| time[edges.parent[e] as usize] - time[edges.child[e] as usize])
        .collect_vec();

    let min = spans.iter().copied().fold(f64::INFINITY, f64::min);
    let max = spans.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut summary = Table::with_headers(["Property", "Value"]);
    summary.add_row(["Edges".to_string(), edges.len().to_string()]);
    summary.add_row(["Minimum span".to_string(), format_float(min)]);
    summary.add_row(["Mean span".to_string(), format_float(mean(&spans))]);
    summary.add_row(["Maximum span".to_string(), format_float(max)]);
    summary.add_row([
        format!("Mean branch length ({})", ts.time_units()),
        format_float(mean(&branch_lengths)),
    ]);

    let mut longest = Table::with_headers(["id", "left", "right", "span", "parent", "child", "branch length"]);
    let order = (0..edges.len()).sorted_by(|a, b| spans[*b].total_cmp(&spans[*a]).then(a.cmp(b)));
    for e in order.take(LONGEST) {
        longest.add_row([
            e.to_string(),
            format_float(edges.left[e]),
            format_float(edges.right[e]),
            format_float(spans[e]),
            edges.parent[e].to_string(),
            edges.child[e].to_string(),
            format_float(branch_lengths[e]),
        ]);
    }

    Ok(content
        .table(summary)
        .plots([
            Histogram::new("Edge spans", "log10(span)", spans.iter().map(|s| s.log10()).collect()),
            Histogram::new(
                "Branch lengths",
                "log10(parent time - child time)",
                branch_lengths.iter().map(|b| b.log10()).collect(),
            ),
        ])
        .heading(format!("{LONGEST} longest edges"))
        .table(longest))
}
