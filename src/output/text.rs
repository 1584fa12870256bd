//! Text and JSON rendering for the single-product command

use crate::record::ProductRecord;
use crate::Result;
use std::fmt::Write;

const RULE: &str = "============================================================";

/// Renders a record the way a human wants to read it
///
/// Empty fields are omitted; diagnostic notes appear only when `verbose`
/// is set.
pub fn render_text(record: &ProductRecord, verbose: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "Product: {}",
        record.name.as_deref().unwrap_or("Unknown")
    );
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "URL: {}", record.url);

    if let Some(price_text) = &record.price_text {
        match record.price {
            Some(price) => {
                let _ = writeln!(out, "Price: {} ({})", price_text, price);
            }
            None => {
                let _ = writeln!(out, "Price: {}", price_text);
            }
        }
    }
    if let Some(availability) = &record.availability {
        let _ = writeln!(out, "Availability: {}", availability);
    }
    if let Some(category) = &record.category {
        let _ = writeln!(out, "Category: {}", category);
    }
    if let Some(image_url) = &record.image_url {
        let _ = writeln!(out, "Image: {}", image_url);
    }

    if !record.specifications.is_empty() {
        let _ = writeln!(out, "Specifications:");
        for (key, value) in &record.specifications {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }

    if verbose && !record.notes.is_empty() {
        let _ = writeln!(out, "Notes:");
        for note in &record.notes {
            let _ = writeln!(out, "  - {}", note);
        }
    }

    let _ = writeln!(out, "{}", RULE);
    out
}

/// Renders a record as pretty-printed JSON
pub fn render_json(record: &ProductRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}
