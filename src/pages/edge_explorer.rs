//! Child edges of the busiest parent nodes, drawn along the genome.

use crate::content::{Content, Intervals, Table};
use crate::model::TSModel;
use crate::utils::format_float;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;

/// Number of parents shown.
const PARENTS: usize = 10;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let edges = &ts.tables().edges;

    let content = Content::new().heading("Edge Explorer");
    if edges.is_empty() {
        return Ok(content.paragraph("This tree sequence has no edges."));
    }

    let by_parent = (0..edges.len()).into_group_map_by(|e| edges.parent[*e]);
    let parents = busiest_parents(&by_parent, PARENTS);

    let mut content = content.paragraph(format!(
        "The {} parent nodes with the most child edges, out of {} parents.",
        parents.len(),
        by_parent.len()
    ));

    let mut table = Table::with_headers(["parent", "child", "left", "right", "span"]);
    for parent in parents {
        let ids = &by_parent[&parent];
        let mut plot = Intervals::new(format!("Node {parent}: {} child edges", ids.len()), ts.sequence_length());
        // one track per child, children in id order
        let by_child = ids.iter().copied().into_group_map_by(|e| edges.child[*e]);
        for (child, child_edges) in by_child.into_iter().sorted_by_key(|(child, _)| *child) {
            let intervals = child_edges
                .iter()
                .map(|e| (edges.left[*e], edges.right[*e]))
                .sorted_by(|a, b| a.0.total_cmp(&b.0))
                .collect_vec();
            plot.add_track(format!("child {child}"), intervals);
        }
        content = content.plot(plot);

        for e in ids.iter().sorted_by(|a, b| edges.left[**a].total_cmp(&edges.left[**b]).then(a.cmp(b))) {
            table.add_row([
                parent.to_string(),
                edges.child[*e].to_string(),
                format_float(edges.left[*e]),
                format_float(edges.right[*e]),
                format_float(edges.span(*e)),
            ]);
        }
    }

    Ok(content.heading("Edges of these parents").table(table))
}

/// Parents with the most child edges, ties broken by node id.
fn busiest_parents(by_parent: &std::collections::HashMap<i32, Vec<usize>>, n: usize) -> Vec<i32> {
    by_parent
        .iter()
        .sorted_by(|(a, a_edges), (b, b_edges)| b_edges.len().cmp(&a_edges.len()).then(a.cmp(b)))
        .map(|(parent, _)| *parent)
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn busiest_parents_ties() {
        let by_parent = HashMap::from([(7, vec![0, 1]), (3, vec![2, 3]), (5, vec![4, 5, 6]), (9, vec![7])]);
        assert_eq!(busiest_parents(&by_parent, 3), [5, 3, 7]);
    }
}
