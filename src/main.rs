//! Robu-Harvest main entry point
//!
//! Two subcommands: `scrape` walks category listings end-to-end into a
//! CSV, `product` scrapes one product page for inspection.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use robu_harvest::config::{self, ScrapeConfig};
use robu_harvest::output::{append_records, existing_urls, render_json, render_text};
use robu_harvest::scrape::{build_http_client, scrape_one, scrape_products, walk_listing, RunMode};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Robu-Harvest: a batch product scraper for robu.in
#[derive(Parser, Debug)]
#[command(name = "robu-harvest")]
#[command(version)]
#[command(about = "Scrape robu.in product listings into structured CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk category listings and scrape every discovered product into a CSV
    Scrape {
        /// Listing page URLs to walk
        #[arg(value_name = "LISTING_URL", required = true)]
        listings: Vec<String>,

        /// Output CSV path; appended to when it already has rows
        #[arg(short, long, value_name = "CSV")]
        output: PathBuf,

        /// Number of parallel workers
        #[arg(long, default_value_t = 5)]
        workers: usize,

        /// Delay between requests, in seconds
        #[arg(long, default_value_t = 0.5)]
        delay: f64,

        /// Scrape one product at a time in input order
        #[arg(long)]
        sequential: bool,
    },

    /// Scrape a single product page and print the extracted record
    Product {
        /// Product page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scrape {
            listings,
            output,
            workers,
            delay,
            sequential,
        } => run_scrape(listings, output, workers, delay, sequential).await,
        Command::Product { url, json } => run_product(url, json, cli.verbose > 0).await,
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("robu_harvest=info,warn"),
            1 => EnvFilter::new("robu_harvest=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .init();
}

/// Handles the `scrape` subcommand: listings → product URLs → CSV rows
///
/// Per-URL fetch failures end up as error rows in the CSV and the process
/// still exits 0; only usage errors and a run that discovers nothing at
/// all are fatal.
async fn run_scrape(
    listings: Vec<String>,
    output: PathBuf,
    workers: usize,
    delay: f64,
    sequential: bool,
) -> anyhow::Result<()> {
    let scrape_config = ScrapeConfig {
        workers,
        delay,
        sequential,
        ..ScrapeConfig::default()
    };
    config::validate(&scrape_config)?;
    config::validate_input_urls(&listings)?;

    let client = build_http_client(&scrape_config).context("failed to build HTTP client")?;
    let delay = scrape_config.delay_duration();

    // walk every listing; union the product URLs in first-seen order
    let mut seen = HashSet::new();
    let mut product_urls = Vec::new();
    let mut failed_walks = 0usize;

    for listing in &listings {
        tracing::info!("Fetching listing page: {}", listing);
        match walk_listing(&client, listing, delay).await {
            Ok(urls) => {
                tracing::info!("Found {} product URLs from {}", urls.len(), listing);
                for url in urls {
                    if seen.insert(url.clone()) {
                        product_urls.push(url);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to walk listing {}: {}", listing, e);
                failed_walks += 1;
            }
        }
    }

    if failed_walks == listings.len() {
        bail!("every listing page fetch failed");
    }
    if product_urls.is_empty() {
        bail!("no product URLs found on the listing pages");
    }
    tracing::info!("Total unique product URLs: {}", product_urls.len());

    let already_scraped = existing_urls(&output);
    let discovered = product_urls.len();
    let new_urls: Vec<String> = product_urls
        .into_iter()
        .filter(|url| !already_scraped.contains(url))
        .collect();

    if discovered > new_urls.len() {
        tracing::info!(
            "Skipping {} already scraped products",
            discovered - new_urls.len()
        );
    }
    if new_urls.is_empty() {
        tracing::info!("No new products to scrape");
        return Ok(());
    }

    let mode = if scrape_config.sequential {
        tracing::info!(
            "Scraping {} products sequentially with {}s delay",
            new_urls.len(),
            scrape_config.delay
        );
        RunMode::Sequential
    } else {
        tracing::info!(
            "Scraping {} products with {} workers and {}s delay",
            new_urls.len(),
            scrape_config.workers,
            scrape_config.delay
        );
        RunMode::Parallel {
            workers: scrape_config.workers,
        }
    };

    let outcomes = scrape_products(&client, new_urls, mode, delay).await;
    let failures = outcomes.iter().filter(|o| o.result.is_err()).count();

    let written = append_records(&output, &outcomes)?;
    tracing::info!(
        "Saved {} rows to {} ({} failed fetches recorded)",
        written,
        output.display(),
        failures
    );

    Ok(())
}

/// Handles the `product` subcommand: one page, printed record
async fn run_product(url: String, json: bool, verbose: bool) -> anyhow::Result<()> {
    config::validate_input_urls(&[url.as_str()])?;

    let scrape_config = ScrapeConfig::default();
    let client = build_http_client(&scrape_config).context("failed to build HTTP client")?;

    let record = scrape_one(&client, &url)
        .await
        .with_context(|| format!("failed to fetch {}", url))?;

    if json {
        println!("{}", render_json(&record)?);
    } else {
        print!("{}", render_text(&record, verbose));
    }

    Ok(())
}
