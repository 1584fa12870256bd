//! Worker pool orchestration
//!
//! Fans fetch+parse work out over product URLs, either strictly in input
//! order (sequential mode) or through a bounded set of concurrent workers.
//! Results funnel through a single channel so no two workers ever touch
//! the same record; a failed fetch becomes an outcome like any other and
//! never aborts the batch.

use crate::record::ProductRecord;
use crate::scrape::fetcher::{fetch_page, FetchError};
use crate::scrape::product::parse_product;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// How the batch is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One URL at a time, input order preserved in the output
    Sequential,
    /// Up to `workers` concurrent fetches; output order is arrival order
    Parallel { workers: usize },
}

/// The result of one fetch+parse, keyed by its input URL
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub url: String,
    pub result: Result<ProductRecord, FetchError>,
}

/// Fetches and parses one product page
pub async fn scrape_one(client: &Client, url: &str) -> Result<ProductRecord, FetchError> {
    let html = fetch_page(client, url).await?;
    Ok(parse_product(&html, url))
}

/// Scrapes a batch of product URLs
///
/// Duplicate input URLs are collapsed before dispatch (first occurrence
/// wins), so every distinct URL is fetched exactly once and appears in
/// the output exactly once. The politeness delay is applied between
/// sequential requests, or per worker before each request in parallel
/// mode; it paces the pool but is not a hard rate limit.
pub async fn scrape_products(
    client: &Client,
    urls: Vec<String>,
    mode: RunMode,
    delay: Duration,
) -> Vec<ScrapeOutcome> {
    let urls = dedup_preserving_order(urls);
    let total = urls.len();

    match mode {
        RunMode::Sequential => scrape_sequential(client, urls, total, delay).await,
        RunMode::Parallel { workers } => {
            scrape_parallel(client, urls, total, workers, delay).await
        }
    }
}

async fn scrape_sequential(
    client: &Client,
    urls: Vec<String>,
    total: usize,
    delay: Duration,
) -> Vec<ScrapeOutcome> {
    let mut outcomes = Vec::with_capacity(total);

    for (index, url) in urls.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::info!("[{}/{}] Processing: {}", index + 1, total, url);
        let result = scrape_one(client, &url).await;
        log_outcome(&url, &result, index + 1, total);
        outcomes.push(ScrapeOutcome { url, result });
    }

    outcomes
}

async fn scrape_parallel(
    client: &Client,
    urls: Vec<String>,
    total: usize,
    workers: usize,
    delay: Duration,
) -> Vec<ScrapeOutcome> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel::<ScrapeOutcome>();

    for url in urls {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            // the semaphore is never closed while tasks are alive
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = scrape_one(&client, &url).await;
            let _ = tx.send(ScrapeOutcome { url, result });
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = rx.recv().await {
        log_outcome(
            &outcome.url,
            &outcome.result,
            outcomes.len() + 1,
            total,
        );
        outcomes.push(outcome);
    }

    outcomes
}

fn log_outcome(
    url: &str,
    result: &Result<ProductRecord, FetchError>,
    done: usize,
    total: usize,
) {
    match result {
        Ok(record) => {
            let name = record.name.as_deref().unwrap_or("(no title)");
            tracing::info!("  ✓ [{}/{}] {}", done, total, name);
        }
        Err(e) => {
            tracing::warn!("  ✗ [{}/{}] {} failed: {}", done, total, url, e);
        }
    }
}

/// Collapses duplicate URLs, keeping the first occurrence's position
fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
