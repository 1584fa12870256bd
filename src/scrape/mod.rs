//! Scraping pipeline: fetching, per-page extraction, listing walks, and
//! the worker pool that ties them together.

mod fetcher;
mod listing;
mod pool;
mod product;

pub use fetcher::{build_http_client, fetch_page, ErrorClass, FetchError};
pub use listing::{extract_product_urls, walk_listing};
pub use pool::{scrape_one, scrape_products, RunMode, ScrapeOutcome};
pub use product::{parse_price_amount, parse_product, trim_product_url};
