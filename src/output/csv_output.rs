//! CSV output
//!
//! One row per processed product URL, success or error, under a fixed
//! header. The writer appends to an existing file without repeating the
//! header, and the URL column can be read back so a follow-up run skips
//! products that are already on disk.

use crate::record::ProductRecord;
use crate::scrape::{trim_product_url, ScrapeOutcome};
use crate::Result;
use std::collections::{BTreeMap, HashSet};
use std::fs::OpenOptions;
use std::path::Path;

/// Fixed header row; columns match [`ProductRecord`] fields
pub const CSV_HEADER: [&str; 9] = [
    "url",
    "name",
    "price",
    "price_text",
    "category",
    "specifications",
    "image_url",
    "availability",
    "error",
];

/// Appends one row per outcome, writing the header first when the file is
/// new or empty. Returns the number of rows written.
pub fn append_records(path: &Path, outcomes: &[ScrapeOutcome]) -> Result<usize> {
    let needs_header = !has_content(path);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(CSV_HEADER)?;
    }

    for outcome in outcomes {
        writer.write_record(outcome_row(outcome))?;
    }
    writer.flush()?;

    Ok(outcomes.len())
}

/// The URLs already present in an output CSV
///
/// Missing or unreadable files simply mean nothing to skip; this is a
/// convenience for re-runs, not a source of truth.
pub fn existing_urls(path: &Path) -> HashSet<String> {
    let mut urls = HashSet::new();

    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!("No readable CSV at {}: {}", path.display(), e);
            return urls;
        }
    };

    let url_column = reader
        .headers()
        .ok()
        .and_then(|headers| headers.iter().position(|h| h == "url"))
        .unwrap_or(0);

    for row in reader.records() {
        if let Ok(row) = row {
            if let Some(url) = row.get(url_column) {
                if !url.is_empty() {
                    urls.insert(url.to_string());
                }
            }
        }
    }

    urls
}

fn has_content(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|content| !content.trim().is_empty())
        .unwrap_or(false)
}

fn outcome_row(outcome: &ScrapeOutcome) -> Vec<String> {
    match &outcome.result {
        Ok(record) => record_row(record),
        Err(e) => {
            let record = ProductRecord::from_error(trim_product_url(&outcome.url), e);
            record_row(&record)
        }
    }
}

fn record_row(record: &ProductRecord) -> Vec<String> {
    vec![
        record.url.clone(),
        record.name.clone().unwrap_or_default(),
        record.price.map(|p| p.to_string()).unwrap_or_default(),
        record.price_text.clone().unwrap_or_default(),
        record.category.clone().unwrap_or_default(),
        flatten_specs(&record.specifications),
        record.image_url.clone().unwrap_or_default(),
        record
            .availability
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        record.error.clone().unwrap_or_default(),
    ]
}

/// Flattens the specification map into one CSV cell
fn flatten_specs(specs: &BTreeMap<String, String>) -> String {
    specs
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("; ")
}
