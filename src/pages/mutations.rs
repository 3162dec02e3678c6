//! Where and when mutations occur, and how many samples inherit them.

use crate::content::{Content, Histogram, Table};
use crate::model::TSModel;
use crate::pages::{log1p10, MAX_ROWS};
use crate::utils::format_float;
use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let tables = ts.tables();
    let mutations = &tables.mutations;

    let content = Content::new().heading("Mutations");
    if mutations.is_empty() {
        return Ok(content.paragraph("This tree sequence has no mutations."));
    }

    let counts = model.mutation_sample_counts();
    let position = |m: usize| -> Result<f64, Report> {
        let site = mutations.site[m];
        tables
            .sites
            .position
            .get(site as usize)
            .copied()
            .ok_or_else(|| eyre!("Mutation {m} references site {site}, which does not exist"))
    };

    let positions = (0..mutations.len()).map(position).collect::<Result<Vec<f64>, Report>>()?;
    let known_times = mutations.time.iter().copied().filter(|t| !t.is_nan()).collect_vec();
    let unknown = mutations.len() - known_times.len();

    let mut content = content
        .paragraph(format!(
            "{} mutations at {} sites, {} with unknown time.",
            mutations.len(),
            ts.num_sites(),
            unknown
        ))
        .plots([
            Histogram::new("Mutations along the genome", "genome position", positions.clone()),
            Histogram::new(
                format!("Mutation times ({})", ts.time_units()),
                "log10(1 + time)",
                known_times.iter().map(|t| log1p10(*t)).collect(),
            ),
        ])
        .plot(Histogram::new(
            "Samples inheriting each mutation",
            "samples",
            counts.iter().map(|c| *c as f64).collect(),
        ));

    let mut table = Table::with_headers([
        "id",
        "site",
        "position",
        "node",
        "derived state",
        "time",
        "inherited samples",
    ]);
    for m in (0..mutations.len()).take(MAX_ROWS) {
        let time = match mutations.time[m].is_nan() {
            true => "unknown".to_string(),
            false => format_float(mutations.time[m]),
        };
        table.add_row([
            m.to_string(),
            mutations.site[m].to_string(),
            format_float(positions[m]),
            mutations.node[m].to_string(),
            mutations.derived_state.get_str(m).unwrap_or_default().into_owned(),
            time,
            counts[m].to_string(),
        ]);
    }
    if mutations.len() > MAX_ROWS {
        table = table.caption(format!("First {MAX_ROWS} of {} mutations", mutations.len()));
    }
    content = content.table(table);

    Ok(content)
}
