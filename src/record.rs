//! The flat output schema for one scraped product.
//!
//! A [`ProductRecord`] is produced once per product URL, success or not.
//! Every field except `url` is independently optional: an extraction gap
//! never invalidates the record it belongs to.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Stock availability as shown on a product page
///
/// Robu.in renders a handful of known phrasings; anything else is kept
/// verbatim in `Other` rather than discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    InStock,
    OutOfStock,
    LowStock,
    Other(String),
}

impl Availability {
    /// Normalizes a stock-status phrase from page text
    pub fn from_text(text: &str) -> Availability {
        let lower = text.trim().to_lowercase();
        if lower.contains("out of stock") {
            Availability::OutOfStock
        } else if lower.contains("low") || lower.contains("order now") {
            Availability::LowStock
        } else if lower.contains("in stock") {
            Availability::InStock
        } else {
            Availability::Other(text.trim().to_string())
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::InStock => write!(f, "In Stock"),
            Availability::OutOfStock => write!(f, "Out of Stock"),
            Availability::LowStock => write!(f, "Low Stock"),
            Availability::Other(text) => write!(f, "{}", text),
        }
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One scraped product, success or partial/failed
///
/// `url` is the primary key for CSV rows and is always non-empty. `price`
/// holds the parsed numeric amount while `price_text` keeps whatever the
/// page displayed, so an unparseable price is never dropped silently.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    pub url: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub price_text: Option<String>,
    pub category: Option<String>,
    pub specifications: BTreeMap<String, String>,
    pub image_url: Option<String>,
    pub availability: Option<Availability>,
    pub error: Option<String>,

    /// Extraction diagnostics, surfaced only in verbose mode
    #[serde(skip)]
    pub notes: Vec<String>,
}

impl ProductRecord {
    /// Creates an empty record for the given product URL
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        debug_assert!(!url.is_empty(), "records require a non-empty URL key");
        Self {
            url,
            name: None,
            price: None,
            price_text: None,
            category: None,
            specifications: BTreeMap::new(),
            image_url: None,
            availability: None,
            error: None,
            notes: Vec::new(),
        }
    }

    /// Creates a record representing a failed fetch
    pub fn from_error(url: impl Into<String>, error: impl ToString) -> Self {
        let mut record = Self::new(url);
        record.error = Some(error.to_string());
        record
    }

    /// Attaches an extraction diagnostic
    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_normalization() {
        assert_eq!(Availability::from_text("In stock"), Availability::InStock);
        assert_eq!(
            Availability::from_text("  Out of stock  "),
            Availability::OutOfStock
        );
        assert_eq!(
            Availability::from_text("Low in stock : order now"),
            Availability::LowStock
        );
        assert_eq!(
            Availability::from_text("Available on backorder"),
            Availability::Other("Available on backorder".to_string())
        );
    }

    #[test]
    fn test_availability_display() {
        assert_eq!(Availability::InStock.to_string(), "In Stock");
        assert_eq!(Availability::OutOfStock.to_string(), "Out of Stock");
        assert_eq!(Availability::LowStock.to_string(), "Low Stock");
        assert_eq!(
            Availability::Other("2 left".to_string()).to_string(),
            "2 left"
        );
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = ProductRecord::new("https://robu.in/product/test-motor");
        assert_eq!(record.url, "https://robu.in/product/test-motor");
        assert!(record.name.is_none());
        assert!(record.price.is_none());
        assert!(record.specifications.is_empty());
        assert!(record.error.is_none());
        assert!(record.notes.is_empty());
    }

    #[test]
    fn test_error_record_keeps_url() {
        let record = ProductRecord::from_error("https://robu.in/product/gone", "HTTP 404");
        assert_eq!(record.url, "https://robu.in/product/gone");
        assert_eq!(record.error.as_deref(), Some("HTTP 404"));
        assert!(record.name.is_none());
    }

    #[test]
    fn test_availability_serializes_as_display() {
        let json = serde_json::to_string(&Availability::LowStock).unwrap();
        assert_eq!(json, r#""Low Stock""#);
    }
}
