//! Node counts, ages and the genome span each node is an ancestor over.

use crate::content::{Content, Histogram, Table};
use crate::model::TSModel;
use crate::pages::log1p10;
use crate::utils::format_float;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use std::collections::BTreeMap;
use tsqc_trees::{TreeSequence, NULL};

/// Number of nodes listed by ancestral span.
const WIDEST: usize = 50;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let nodes = &ts.tables().nodes;

    let num_samples = ts.num_samples();
    let mut counts = Table::with_headers(["Property", "Value"]);
    counts.add_row(["Nodes".to_string(), ts.num_nodes().to_string()]);
    counts.add_row(["Samples".to_string(), num_samples.to_string()]);
    counts.add_row(["Non-samples".to_string(), (ts.num_nodes() - num_samples).to_string()]);

    // (nodes, samples) per population, NULL last
    let mut by_population: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for (node, population) in nodes.population.iter().enumerate() {
        let entry = by_population.entry(*population).or_default();
        entry.0 += 1;
        entry.1 += ts.is_sample(node as i32) as usize;
    }
    let mut populations = Table::with_headers(["population", "nodes", "samples"]);
    for (population, (n, s)) in by_population.iter().sorted_by_key(|(p, _)| (**p == NULL, **p)) {
        let label = match *population == NULL {
            true => "none".to_string(),
            false => population.to_string(),
        };
        populations.add_row([label, n.to_string(), s.to_string()]);
    }

    let ancestry = ancestral_spans(ts);
    let mut widest = Table::with_headers(["id", "time", "sample", "population", "child edges", "span"]);
    let order = (0..ts.num_nodes())
        .filter(|u| ancestry[*u].1 > 0.0)
        .sorted_by(|a, b| ancestry[*b].1.total_cmp(&ancestry[*a].1).then(a.cmp(b)));
    for u in order.take(WIDEST) {
        widest.add_row([
            u.to_string(),
            format_float(nodes.time[u]),
            ts.is_sample(u as i32).to_string(),
            nodes.population[u].to_string(),
            ancestry[u].0.to_string(),
            format_float(ancestry[u].1),
        ]);
    }

    let content = Content::new()
        .heading("Nodes")
        .table(counts)
        .heading("Nodes by population")
        .table(populations)
        .plot(Histogram::new(
            format!("Node times ({})", ts.time_units()),
            "log10(1 + time)",
            nodes.time.iter().map(|t| log1p10(*t)).collect(),
        ))
        .heading(format!("{WIDEST} nodes with the widest ancestral span"));

    Ok(match widest.rows.is_empty() {
        true => content.paragraph("No node is the parent of an edge."),
        false => content.table(widest),
    })
}

/// Number of child edges of each node and the length of genome over which it is a parent.
///
/// Overlapping child edges cover the genome once.
pub(crate) fn ancestral_spans(ts: &TreeSequence) -> Vec<(usize, f64)> {
    let edges = &ts.tables().edges;
    let mut spans = vec![(0, 0.0); ts.num_nodes()];

    let by_parent = (0..edges.len()).into_group_map_by(|e| edges.parent[*e]);
    for (parent, ids) in by_parent {
        let intervals = ids
            .iter()
            .map(|e| (edges.left[*e], edges.right[*e]))
            .sorted_by(|a, b| a.0.total_cmp(&b.0));

        // merge the sorted intervals, summing the length of their union
        let mut covered = 0.0;
        let mut current: Option<(f64, f64)> = None;
        for (left, right) in intervals {
            current = match current {
                Some((l, r)) if left <= r => Some((l, r.max(right))),
                Some((l, r)) => {
                    covered += r - l;
                    Some((left, right))
                }
                None => Some((left, right)),
            };
        }
        if let Some((l, r)) = current {
            covered += r - l;
        }
        spans[parent as usize] = (ids.len(), covered);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsqc_trees::examples::example_1;

    #[test]
    fn ancestral_spans_merge_children() {
        let spans = ancestral_spans(&example_1());
        // node 5 is the parent of 2 everywhere and of 3 and 4 on either half
        assert_eq!(spans[5], (3, 10.0));
        assert_eq!(spans[4], (2, 10.0));
        assert_eq!(spans[0], (0, 0.0));
    }
}
