//! Headline counts, populations and provenance of the dataset.

use crate::content::{Content, Table};
use crate::model::TSModel;
use chrono::{DateTime, NaiveDateTime};
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;

pub fn render(model: &TSModel) -> Result<Content, Report> {
    let ts = &model.ts;
    let tables = ts.tables();

    // nodes and samples of each population
    let mut nodes = vec![0usize; ts.num_populations()];
    let mut samples = vec![0usize; ts.num_populations()];
    for (node, population) in tables.nodes.population.iter().enumerate() {
        if let Some(i) = usize::try_from(*population).ok().filter(|i| *i < nodes.len()) {
            nodes[i] += 1;
            samples[i] += ts.is_sample(node as i32) as usize;
        }
    }

    let mut populations = Table::with_headers(["id", "name", "nodes", "samples"]);
    for i in 0..ts.num_populations() {
        let metadata = tables.populations.metadata.get(i).unwrap_or_default();
        populations.add_row([i.to_string(), metadata_name(metadata), nodes[i].to_string(), samples[i].to_string()]);
    }

    let mut provenance = Table::with_headers(["id", "timestamp", "software"]);
    for i in 0..ts.num_provenances() {
        let timestamp = tables.provenances.timestamp.get_str(i).unwrap_or_default();
        let record = tables.provenances.record.get(i).unwrap_or_default();
        provenance.add_row([i.to_string(), format_timestamp(&timestamp), software_name(record)]);
    }

    let content = Content::new()
        .heading(format!("Overview of {}", model.name))
        .table(model.summary().to_table())
        .heading("Populations");
    let content = match populations.rows.is_empty() {
        true => content.paragraph("This tree sequence has no populations."),
        false => content.table(populations),
    };
    let content = content.heading("Provenance");
    let content = match provenance.rows.is_empty() {
        true => content.paragraph("This tree sequence has no provenance records."),
        false => content.table(provenance),
    };

    Ok(content)
}

/// The `name` field of JSON metadata, or an empty string.
fn metadata_name(metadata: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(metadata)
        .ok()
        .and_then(|value| value.get("name").and_then(|name| name.as_str()).map(String::from))
        .unwrap_or_default()
}

/// The software that wrote a provenance record, with its version when known.
fn software_name(record: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(record) else {
        return String::new();
    };
    let software = &value["software"];
    [&software["name"], &software["version"]]
        .iter()
        .filter_map(|v| v.as_str())
        .join(" ")
}

/// Timestamps are ISO 8601, with or without a UTC offset.
fn format_timestamp(timestamp: &str) -> String {
    let format = "%Y-%m-%d %H:%M:%S";
    if let Ok(datetime) = DateTime::parse_from_rfc3339(timestamp) {
        return datetime.naive_utc().format(format).to_string();
    }
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(datetime) => datetime.format(format).to_string(),
        Err(_) => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp("2024-01-01T00:00:00"), "2024-01-01 00:00:00");
        assert_eq!(format_timestamp("2024-01-01T12:30:00.123456+02:00"), "2024-01-01 10:30:00");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn provenance_software() {
        let record = br#"{"software": {"name": "msprime", "version": "1.3.0"}}"#;
        assert_eq!(software_name(record), "msprime 1.3.0");
        assert_eq!(software_name(b"not json"), "");
    }

    #[test]
    fn population_names() {
        assert_eq!(metadata_name(br#"{"name": "YRI"}"#), "YRI");
        assert_eq!(metadata_name(b""), "");
    }
}
