//! Output formats: CSV rows for batch runs, text/JSON for single records

mod csv_output;
mod text;

pub use csv_output::{append_records, existing_urls, CSV_HEADER};
pub use text::{render_json, render_text};
