//! Listing walker
//!
//! Walks one paginated category page, collecting product URLs page by
//! page. A walk keeps the set of URLs it has already yielded, so a
//! product appearing on two pages comes out once; a page that adds
//! nothing new ends the walk even if a "next" link is still present,
//! which breaks out of broken circular pagination.

use crate::scrape::fetcher::{fetch_page, FetchError};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Product slugs that are services, not products; never worth scraping
const EXCLUDED_SLUGS: [&str; 5] = [
    "metal-laser-cutting",
    "3d-printing-service",
    "online-laser-cutting-service",
    "sla-3d-printing",
    "online-pcb-manufacturing-service",
];

/// Product URLs and the next-page link found on one listing page
struct ListingPage {
    product_urls: Vec<String>,
    next_page: Option<Url>,
}

/// Walks a paginated category listing and returns its product URLs
///
/// Page 1 is the given URL. The walk stops at the last page (no "next"
/// affordance) or as soon as a page contributes zero new product URLs.
/// A fetch failure on the first page is the walk's error; on a later page
/// it ends the walk with what was collected so far.
pub async fn walk_listing(
    client: &reqwest::Client,
    category_url: &str,
    delay: Duration,
) -> Result<Vec<String>, FetchError> {
    let mut current = Url::parse(category_url).map_err(|e| FetchError::InvalidUrl {
        url: category_url.to_string(),
        message: e.to_string(),
    })?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<String> = Vec::new();
    let mut page_number = 1u32;

    loop {
        tracing::debug!("Fetching listing page {}: {}", page_number, current);
        let html = match fetch_page(client, current.as_str()).await {
            Ok(html) => html,
            Err(e) if page_number == 1 => return Err(e),
            Err(e) => {
                tracing::warn!("Listing walk ended early at page {}: {}", page_number, e);
                break;
            }
        };

        // parse in a block so the non-Send document is gone before the next await
        let page = parse_listing_page(&html, &current);

        let mut added = 0usize;
        for url in page.product_urls {
            if seen.insert(url.clone()) {
                collected.push(url);
                added += 1;
            }
        }
        tracing::info!(
            "Listing page {}: {} new product URLs ({} total)",
            page_number,
            added,
            collected.len()
        );

        if added == 0 {
            tracing::debug!("Page {} added nothing new, stopping walk", page_number);
            break;
        }

        match page.next_page {
            Some(next) if next != current => {
                current = next;
                page_number += 1;
                tokio::time::sleep(delay).await;
            }
            _ => break,
        }
    }

    Ok(collected)
}

/// Extracts the product URLs from one listing page's HTML
///
/// Two strategies: anchors inside the product grid (`ul.products`), then
/// a sweep over every anchor on the page as a fallback. Results are in
/// discovery order, deduplicated, with service URLs dropped.
pub fn extract_product_urls(html: &str, base_url: &Url) -> Vec<String> {
    parse_listing_page(html, base_url).product_urls
}

fn parse_listing_page(html: &str, base_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);

    let mut seen: HashSet<String> = HashSet::new();
    let mut product_urls: Vec<String> = Vec::new();

    let mut collect = |href: &str| {
        if let Some(url) = product_url_from_href(href, base_url) {
            if seen.insert(url.clone()) {
                product_urls.push(url);
            }
        }
    };

    if let Ok(selector) = Selector::parse("ul.products a[href]") {
        for anchor in document.select(&selector) {
            if let Some(href) = anchor.value().attr("href") {
                collect(href);
            }
        }
    }

    if let Ok(selector) = Selector::parse("a[href]") {
        for anchor in document.select(&selector) {
            if let Some(href) = anchor.value().attr("href") {
                collect(href);
            }
        }
    }

    ListingPage {
        product_urls,
        next_page: find_next_page(&document, base_url),
    }
}

/// Resolves an anchor href and keeps it only if it is a product page on
/// the same host as the listing
fn product_url_from_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut resolved = base_url.join(href).ok()?;
    if resolved.host_str() != base_url.host_str() {
        return None;
    }

    // cart/query variants of the same product collapse onto one URL
    resolved.set_query(None);
    resolved.set_fragment(None);

    let slug = product_slug(resolved.path())?;
    if EXCLUDED_SLUGS.contains(&slug) {
        return None;
    }

    Some(resolved.to_string().trim_end_matches('/').to_string())
}

/// The slug of a product path (`/product/<slug>/`), or None for anything
/// else (category pages in particular)
fn product_slug(path: &str) -> Option<&str> {
    let re = Regex::new(r"^/product/([^/]+)/?$").ok()?;
    Some(re.captures(path)?.get(1)?.as_str())
}

/// Rules: the numbered-pagination "next" arrow, then a `rel=next` link
fn find_next_page(document: &Html, base_url: &Url) -> Option<Url> {
    if let Ok(selector) = Selector::parse("a.next.page-numbers[href]") {
        if let Some(anchor) = document.select(&selector).next() {
            if let Some(href) = anchor.value().attr("href") {
                if let Ok(url) = base_url.join(href) {
                    return Some(url);
                }
            }
        }
    }

    let selector = Selector::parse(r#"link[rel="next"][href]"#).ok()?;
    let link = document.select(&selector).next()?;
    let href = link.value().attr("href")?;
    base_url.join(href).ok()
}
