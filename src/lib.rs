//! Robu-Harvest: a batch product scraper for robu.in
//!
//! This crate walks WooCommerce category listings on robu.in, discovers
//! product pages, and extracts structured product records (name, price,
//! availability, specifications) into CSV rows or single-record JSON/text.

pub mod config;
pub mod output;
pub mod record;
pub mod scrape;

use thiserror::Error;

/// Main error type for Robu-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] scrape::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are usage errors: they are reported before any network activity
/// and make the process exit non-zero.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Robu-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::ScrapeConfig;
pub use record::{Availability, ProductRecord};
pub use scrape::{FetchError, RunMode, ScrapeOutcome};
