//! Run parameters built from CLI arguments
//!
//! There is no configuration file: every knob arrives on the command line
//! and is validated here before any network activity happens.

use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Upper bound on the worker pool size; more than this is never polite
const MAX_WORKERS: usize = 100;

/// Parameters governing one scrape run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Number of concurrent workers in parallel mode
    pub workers: usize,

    /// Politeness delay between requests, in seconds
    pub delay: f64,

    /// Fetch one URL at a time in input order instead of fanning out
    pub sequential: bool,

    /// Per-request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            delay: 0.5,
            sequential: false,
            timeout_secs: 30,
        }
    }
}

impl ScrapeConfig {
    /// The politeness delay as a [`Duration`]
    pub fn delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.delay)
    }
}

/// Validates the run parameters
pub fn validate(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if !config.delay.is_finite() || config.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be a non-negative number of seconds, got {}",
            config.delay
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every input URL is a well-formed http(s) URL
///
/// Applies to listing URLs and to the single-product URL alike. Bad URLs
/// are usage errors, caught before the first request is issued.
pub fn validate_input_urls<S: AsRef<str>>(urls: &[S]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one URL is required".to_string(),
        ));
    }

    for url in urls {
        let url = url.as_ref();
        let parsed = Url::parse(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "'{}': only http and https URLs are supported",
                url
            )));
        }

        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "'{}': URL has no host",
                url
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScrapeConfig::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.workers, 5);
        assert_eq!(config.delay, 0.5);
        assert!(!config.sequential);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ScrapeConfig {
            workers: 0,
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_excessive_workers_rejected() {
        let config = ScrapeConfig {
            workers: 500,
            ..ScrapeConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = ScrapeConfig {
            delay: -1.0,
            ..ScrapeConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_nan_delay_rejected() {
        let config = ScrapeConfig {
            delay: f64::NAN,
            ..ScrapeConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_delay_allowed() {
        let config = ScrapeConfig {
            delay: 0.0,
            ..ScrapeConfig::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_input_urls() {
        assert!(validate_input_urls(&["https://robu.in/product-category/motors/"]).is_ok());
        assert!(validate_input_urls(&["http://127.0.0.1:8080/listing"]).is_ok());

        assert!(validate_input_urls::<&str>(&[]).is_err());
        assert!(validate_input_urls(&["not a url"]).is_err());
        assert!(validate_input_urls(&["ftp://robu.in/products"]).is_err());
        assert!(validate_input_urls(&["https://ok.example/", "::bad::"]).is_err());
    }
}
