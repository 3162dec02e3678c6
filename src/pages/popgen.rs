//! Site diversity, segregating sites, Tajima's D and the allele frequency spectrum.

use crate::content::{Bar, Content, Line, Table};
use crate::model::TSModel;
use crate::utils::format_float;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;

/// Number of equal windows along the genome.
const WINDOWS: usize = 10;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let n = ts.num_samples();
    if n < 2 {
        return Err(eyre!("Population genetic statistics need at least two samples, found {n}."))
            .suggestion("Mark at least two nodes as samples.");
    }

    let stats = model.site_stats();
    let genome = [0.0, ts.sequence_length()];
    let diversity = stats.diversity(&genome).wrap_err("Failed to compute diversity")?;
    let segregating = stats.segregating_sites(&genome).wrap_err("Failed to compute segregating sites")?;
    let tajimas_d = stats.tajimas_d(&genome).wrap_err("Failed to compute Tajima's D")?;

    let mut summary = Table::with_headers(["Statistic", "Value"]);
    summary.add_row(["Diversity".to_string(), format_float(diversity[0])]);
    summary.add_row(["Segregating sites".to_string(), format_float(segregating[0])]);
    summary.add_row(["Tajima's D".to_string(), format_float(tajimas_d[0])]);

    let windows = ts.equal_windows(WINDOWS);
    let window_diversity = stats.diversity(&windows)?;
    let window_segregating = stats.segregating_sites(&windows)?;
    let window_d = stats.tajimas_d(&windows)?;

    let mut windowed = Table::with_headers(["window", "left", "right", "diversity", "segregating sites", "Tajima's D"]);
    for (i, (left, right)) in windows.iter().tuple_windows().enumerate() {
        windowed.add_row([
            i.to_string(),
            format_float(*left),
            format_float(*right),
            format_float(window_diversity[i]),
            format_float(window_segregating[i]),
            format_float(window_d[i]),
        ]);
    }
    let midpoints = windows.iter().tuple_windows().map(|(l, r)| (l + r) / 2.0).collect_vec();

    let spectrum = stats.allele_frequency_spectrum();
    let bars = spectrum
        .iter()
        .enumerate()
        .filter(|(k, _)| *k > 0 && *k < n)
        .map(|(k, count)| (k.to_string(), *count as f64))
        .collect_vec();

    Ok(Content::new()
        .heading("Population genetics")
        .paragraph(format!("Site statistics over {n} samples, per unit of sequence length."))
        .table(summary)
        .heading(format!("{WINDOWS} windows"))
        .plots([
            Line::new(
                "Diversity along the genome",
                "genome position",
                "diversity",
                midpoints.iter().copied().zip(window_diversity.iter().copied()).collect(),
            ),
            Line::new(
                "Tajima's D along the genome",
                "genome position",
                "Tajima's D",
                midpoints.iter().copied().zip(window_d.iter().copied()).collect(),
            ),
        ])
        .table(windowed)
        .heading("Allele frequency spectrum")
        .plot(Bar::new("Allele frequency spectrum", "derived allele count", "sites", bars)))
}
