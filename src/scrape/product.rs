//! Product page field extraction
//!
//! Extraction is heuristic tree traversal over WooCommerce markup. Each
//! field has a prioritized list of independent rules, tried in order until
//! one yields a value; a field whose anchors are all absent stays `None`
//! and gets a diagnostic note on the record. Nothing in here can fail the
//! record as a whole.
//!
//! Specification key/value pairs are merged from three sources with
//! increasing priority: a regex sweep over the raw page, the description
//! lists, and the specification table.

use crate::record::{Availability, ProductRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Parses one product page into a [`ProductRecord`]
///
/// Never fails: malformed or partial HTML produces a record with empty
/// fields and diagnostic notes instead of an error.
pub fn parse_product(html: &str, source_url: &str) -> ProductRecord {
    let document = Html::parse_document(html);
    let base_url = Url::parse(source_url).ok();
    let mut record = ProductRecord::new(trim_product_url(source_url));

    match extract_name(&document) {
        Some(name) => record.name = Some(name),
        None => record.note("no product title found"),
    }

    match extract_price_text(&document) {
        Some(text) => {
            record.price = parse_price_amount(&text);
            if record.price.is_none() {
                record.note(format!("price text '{}' is not numeric", text));
            }
            record.price_text = Some(text);
        }
        None => record.note("no price element found"),
    }

    match extract_availability(&document) {
        Some(availability) => record.availability = Some(availability),
        None => record.note("no stock status found"),
    }

    match extract_category(&document) {
        Some(category) => record.category = Some(category),
        None => record.note("no breadcrumb category found"),
    }

    match extract_image_url(&document, base_url.as_ref()) {
        Some(image_url) => record.image_url = Some(image_url),
        None => record.note("no product image found"),
    }

    record.specifications = extract_specifications(&document, html);
    if record.specifications.is_empty() {
        record.note("no specifications found");
    }

    record
}

/// Parses a displayed price into a numeric amount
///
/// Strips thousands separators, then takes the first number in the text,
/// so currency symbols and surrounding words are ignored. Returns `None`
/// for non-numeric text like "Out of stock".
pub fn parse_price_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let re = Regex::new(r"\d+(?:\.\d+)?").ok()?;
    re.find(&cleaned)?.as_str().parse().ok()
}

/// Trims the trailing slash so the same product always keys identically
pub fn trim_product_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Collapses an element's text into single-spaced trimmed form
fn text_of(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rules: the product title heading, then the page <title> up to the
/// " - Site Name" suffix
fn extract_name(document: &Html) -> Option<String> {
    if let Ok(selector) = Selector::parse("h1.product_title") {
        if let Some(element) = document.select(&selector).next() {
            let text = text_of(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| {
            text_of(element)
                .split(" - ")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
}

/// Rules: inside `p.price`, the `<ins>` amount (the current sale price)
/// wins over any other `<bdi>` amount (the struck-through original)
fn extract_price_text(document: &Html) -> Option<String> {
    let price = Selector::parse("p.price").ok()?;
    let sale = Selector::parse("ins bdi").ok()?;
    let any = Selector::parse("bdi").ok()?;

    let container = document.select(&price).next()?;
    let amount = container
        .select(&sale)
        .next()
        .or_else(|| container.select(&any).next())?;

    let text = text_of(amount);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Rules: the Electro theme's stock badge, then a whole-page text search
/// for a known phrase
fn extract_availability(document: &Html) -> Option<Availability> {
    if let Ok(selector) =
        Selector::parse("div.availability span.electro-stock-availability p.stock")
    {
        if let Some(element) = document.select(&selector).next() {
            let text = text_of(element);
            if !text.is_empty() {
                return Some(Availability::from_text(&text));
            }
        }
    }

    let body = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    if body.contains("out of stock") {
        Some(Availability::OutOfStock)
    } else if body.contains("low stock") || body.contains("low in stock") {
        Some(Availability::LowStock)
    } else if body.contains("in stock") {
        Some(Availability::InStock)
    } else {
        None
    }
}

/// The leaf category from the breadcrumb trail, skipping "Home"
fn extract_category(document: &Html) -> Option<String> {
    let selector = Selector::parse("nav.woocommerce-breadcrumb a").ok()?;
    document
        .select(&selector)
        .map(text_of)
        .filter(|crumb| !crumb.is_empty() && !crumb.eq_ignore_ascii_case("home"))
        .last()
}

/// Rules: the `og:image` meta tag, then the first gallery image
fn extract_image_url(document: &Html, base_url: Option<&Url>) -> Option<String> {
    if let Ok(selector) = Selector::parse(r#"meta[property="og:image"]"#) {
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                return Some(resolve_href(content, base_url));
            }
        }
    }

    let selector = Selector::parse("div.woocommerce-product-gallery__image img").ok()?;
    let element = document.select(&selector).next()?;
    let src = element.value().attr("src")?;
    Some(resolve_href(src, base_url))
}

fn resolve_href(href: &str, base_url: Option<&Url>) -> String {
    match base_url.and_then(|base| base.join(href).ok()) {
        Some(resolved) => resolved.to_string(),
        None => href.to_string(),
    }
}

/// Merges the three specification sources; later sources override earlier
/// ones on key collisions (table beats description lists beats regex sweep)
fn extract_specifications(document: &Html, raw_html: &str) -> BTreeMap<String, String> {
    let mut specs = extract_regex_specs(raw_html);
    specs.extend(extract_general_info(document));
    specs.extend(extract_spec_table(document));
    specs
}

/// "Key: value" items from the description lists
///
/// Looks at the first of the short-description div, the description tab,
/// and the summary area, then at the shallow lists directly under the
/// entry summary. Going deeper drags in related-product widgets.
fn extract_general_info(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();

    let item_selector = match Selector::parse("ol li, ul li") {
        Ok(selector) => selector,
        Err(_) => return specs,
    };

    for css in [
        "div.woocommerce-product-details__short-description",
        "div#tab-description",
        "div.summary",
    ] {
        if let Ok(selector) = Selector::parse(css) {
            if let Some(container) = document.select(&selector).next() {
                for item in container.select(&item_selector) {
                    insert_spec_item(&mut specs, item);
                }
                break;
            }
        }
    }

    if let Ok(selector) = Selector::parse(
        "div.entry-summary > ol > li, div.entry-summary > ul > li, \
         div.entry-summary > div > ol > li, div.entry-summary > div > ul > li",
    ) {
        for item in document.select(&selector) {
            insert_spec_item(&mut specs, item);
        }
    }

    specs
}

fn insert_spec_item(specs: &mut BTreeMap<String, String>, item: ElementRef) {
    let text = text_of(item);
    if let Some((key, value)) = text.split_once(':') {
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        // over-long keys are sentence fragments, not attribute names
        if !key.is_empty() && key.len() < 50 && !value.is_empty() {
            specs.insert(key, value);
        }
    }
}

/// Label/value rows from the specification table and the WooCommerce
/// product attribute rows (shipping weight, dimensions)
fn extract_spec_table(document: &Html) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();

    let row_selector = match Selector::parse("tr") {
        Ok(selector) => selector,
        Err(_) => return specs,
    };
    let cell_selector = match Selector::parse("td, th") {
        Ok(selector) => selector,
        Err(_) => return specs,
    };

    if let Some(table) = find_spec_table(document, &row_selector) {
        for row in table.select(&row_selector) {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            if cells.len() >= 2 {
                insert_spec_pair(&mut specs, &text_of(cells[0]), &text_of(cells[1]));
            }
        }
    }

    if let (Ok(rows), Ok(labels), Ok(values)) = (
        Selector::parse("tr.woocommerce-product-attributes-item"),
        Selector::parse("th.woocommerce-product-attributes-item__label"),
        Selector::parse("td.woocommerce-product-attributes-item__value"),
    ) {
        for row in document.select(&rows) {
            if let (Some(label), Some(value)) =
                (row.select(&labels).next(), row.select(&values).next())
            {
                insert_spec_pair(&mut specs, &text_of(label), &text_of(value));
            }
        }
    }

    specs
}

fn insert_spec_pair(specs: &mut BTreeMap<String, String>, key: &str, value: &str) {
    let key = key.to_lowercase();
    let key = key.trim_end_matches(':').trim();
    let value = value.trim();
    if !key.is_empty() && !value.is_empty() {
        specs.insert(key.to_string(), value.to_string());
    }
}

/// Rules: a table whose id mentions "specification", then any table inside
/// the specification tab, then the first table with more than 3 rows
fn find_spec_table<'a>(document: &'a Html, row_selector: &Selector) -> Option<ElementRef<'a>> {
    if let Ok(selector) = Selector::parse(r#"table[id*="specification"]"#) {
        if let Some(table) = document.select(&selector).next() {
            return Some(table);
        }
    }

    if let Ok(selector) = Selector::parse("div#tab-specification table") {
        if let Some(table) = document.select(&selector).next() {
            return Some(table);
        }
    }

    let selector = Selector::parse("table").ok()?;
    document
        .select(&selector)
        .find(|table| table.select(row_selector).count() > 3)
}

/// Regex sweep over the raw page for attributes that often live in free
/// text instead of the table
///
/// Voltage, power, and RPM patterns are deliberately absent: related
/// products on the same page cause too many false matches for those, so
/// they are left to the table and list sources.
fn extract_regex_specs(html: &str) -> BTreeMap<String, String> {
    let text = html.to_lowercase();
    let mut specs = BTreeMap::new();

    let patterns: &[(&str, &str)] = &[
        ("weight", r"weight\s*[:\(]?\s*(\d+\.?\d*)\s*kg"),
        ("shipping weight", r"shipping\s*weight\s*[:\s]*(\d+\.?\d*)\s*kg"),
        (
            "shipping dimensions",
            r"shipping\s*dimensions?\s*[:\s]*([\d.]+\s*[×x]\s*[\d.]+\s*[×x]\s*[\d.]+)\s*cm",
        ),
        (
            "rated current",
            r"rated?\s*current\s*[:\(]?\s*[<>]?\s*(\d+\.?\d*)\s*a",
        ),
        (
            "no load current",
            r"no\s*load\s*current\s*[:\(]?\s*[<>]?\s*(\d+\.?\d*)\s*a",
        ),
        (
            "rated torque",
            r"rated?\s*torque\s*[:\(]?\s*(\d+\.?\d*)\s*(?:kg[.-]?cm|n\.?m)",
        ),
        (
            "stall torque",
            r"stall\s*torque\s*[:\(]?\s*(\d+\.?\d*)\s*(?:kg[.-]?cm|n\.?m)",
        ),
        ("efficiency", r"efficiency\s*[:\(]?\s*[>]?\s*(\d+)"),
        (
            "shaft diameter",
            r"shaft\s*diameter\s*[:\(]?\s*(\d+\.?\d*)\s*mm",
        ),
    ];

    for (key, pattern) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(&text) {
                if let Some(matched) = captures.get(1) {
                    specs.insert(key.to_string(), matched.as_str().to_string());
                }
            }
        }
    }

    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_URL: &str = "https://robu.in/product/my6812-100w-dc-motor";

    fn full_product_page() -> String {
        r#"<html>
        <head>
            <title>MY6812 100W DC Motor - Robu.in</title>
            <meta property="og:image" content="https://robu.in/wp-content/uploads/my6812.jpg" />
        </head>
        <body>
            <nav class="woocommerce-breadcrumb">
                <a href="/">Home</a>
                <a href="/product-category/motors/">Motors</a>
                <a href="/product-category/motors/dc-motors/">DC Motors</a>
            </nav>
            <div class="summary entry-summary">
                <h1 class="product_title entry-title">MY6812 100W 2750RPM DC Motor</h1>
                <p class="price">
                    <del><span><bdi>&#8377;1,599.00</bdi></span></del>
                    <ins><span><bdi>&#8377;1,299.00</bdi></span></ins>
                </p>
                <div class="availability">
                    <span class="electro-stock-availability">
                        <p class="stock in-stock">In stock</p>
                    </span>
                </div>
                <div class="woocommerce-product-details__short-description">
                    <ul>
                        <li>Rated Voltage: 24 V DC</li>
                        <li>Rated Speed: 2750 RPM</li>
                        <li>This motor is suitable for e-bike conversions and comes with a chain sprocket</li>
                    </ul>
                </div>
            </div>
            <div class="woocommerce-product-gallery__image">
                <img src="/wp-content/uploads/my6812-gallery.jpg" />
            </div>
            <div id="tab-specification">
                <table id="product-specification-table">
                    <tr><th>Rated Voltage</th><td>24 VDC</td></tr>
                    <tr><th>Rated Power :</th><td>100 W</td></tr>
                    <tr><th>Rated Speed</th><td>2750 RPM</td></tr>
                    <tr><th>Weight</th><td>1.8 kg</td></tr>
                </table>
            </div>
            <table>
                <tr class="woocommerce-product-attributes-item">
                    <th class="woocommerce-product-attributes-item__label">Shipping Weight</th>
                    <td class="woocommerce-product-attributes-item__value">2.1 kg</td>
                </tr>
            </table>
        </body>
        </html>"#
            .to_string()
    }

    #[test]
    fn test_full_page_extraction() {
        let record = parse_product(&full_product_page(), PRODUCT_URL);

        assert_eq!(record.url, PRODUCT_URL);
        assert_eq!(
            record.name.as_deref(),
            Some("MY6812 100W 2750RPM DC Motor")
        );
        assert_eq!(record.price, Some(1299.0));
        assert_eq!(record.price_text.as_deref(), Some("₹1,299.00"));
        assert_eq!(record.availability, Some(Availability::InStock));
        assert_eq!(record.category.as_deref(), Some("DC Motors"));
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://robu.in/wp-content/uploads/my6812.jpg")
        );
        assert!(record.error.is_none());
    }

    #[test]
    fn test_sale_price_beats_original() {
        let record = parse_product(&full_product_page(), PRODUCT_URL);
        // the <ins> amount, not the struck-through <del> one
        assert_eq!(record.price, Some(1299.0));
    }

    #[test]
    fn test_regular_price_without_sale() {
        let html = r#"<html><body>
            <p class="price"><span><bdi>&#8377;450.00</bdi></span></p>
        </body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert_eq!(record.price, Some(450.0));
        assert_eq!(record.price_text.as_deref(), Some("₹450.00"));
    }

    #[test]
    fn test_spec_table_overrides_description_list() {
        let record = parse_product(&full_product_page(), PRODUCT_URL);
        // the list says "24 V DC", the table says "24 VDC"; the table wins
        assert_eq!(
            record.specifications.get("rated voltage").map(String::as_str),
            Some("24 VDC")
        );
        assert_eq!(
            record.specifications.get("rated power").map(String::as_str),
            Some("100 W")
        );
        assert_eq!(
            record.specifications.get("shipping weight").map(String::as_str),
            Some("2.1 kg")
        );
    }

    #[test]
    fn test_list_items_without_colon_skipped() {
        let record = parse_product(&full_product_page(), PRODUCT_URL);
        assert!(!record
            .specifications
            .values()
            .any(|v| v.contains("e-bike conversions")));
    }

    #[test]
    fn test_name_falls_back_to_title_tag() {
        let html = r#"<html><head><title>Orange Pi Zero 3 - Robu.in | Indian Online Store</title></head>
            <body></body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert_eq!(record.name.as_deref(), Some("Orange Pi Zero 3"));
    }

    #[test]
    fn test_empty_page_yields_empty_record() {
        let record = parse_product("", PRODUCT_URL);
        assert_eq!(record.url, PRODUCT_URL);
        assert!(record.name.is_none());
        assert!(record.price.is_none());
        assert!(record.price_text.is_none());
        assert!(record.availability.is_none());
        assert!(record.category.is_none());
        assert!(record.image_url.is_none());
        assert!(record.specifications.is_empty());
        assert!(!record.notes.is_empty());
    }

    #[test]
    fn test_garbage_html_never_panics() {
        let record = parse_product("<div><<p>>&&&<table><tr><td>x", PRODUCT_URL);
        assert_eq!(record.url, PRODUCT_URL);
    }

    #[test]
    fn test_out_of_stock_price_text_retained() {
        let html = r#"<html><body>
            <p class="price"><bdi>Out of stock</bdi></p>
            <div class="availability"><span class="electro-stock-availability">
                <p class="stock">Out of stock</p>
            </span></div>
        </body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert_eq!(record.price, None);
        assert_eq!(record.price_text.as_deref(), Some("Out of stock"));
        assert_eq!(record.availability, Some(Availability::OutOfStock));
        assert!(record
            .notes
            .iter()
            .any(|n| n.contains("not numeric")));
    }

    #[test]
    fn test_availability_page_text_fallback() {
        let html = r#"<html><body><p>Hurry, low in stock!</p></body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert_eq!(record.availability, Some(Availability::LowStock));
    }

    #[test]
    fn test_fallback_table_needs_more_than_three_rows() {
        let html = r#"<html><body>
            <table>
                <tr><td>Related</td><td>Product A</td></tr>
                <tr><td>Related</td><td>Product B</td></tr>
            </table>
        </body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert!(record.specifications.is_empty());
    }

    #[test]
    fn test_regex_sweep_fills_table_gaps() {
        let html = r#"<html><body>
            <p>Shaft Diameter: 8 mm, Stall Torque: 12 kg-cm</p>
        </body></html>"#;
        let record = parse_product(html, PRODUCT_URL);
        assert_eq!(
            record.specifications.get("shaft diameter").map(String::as_str),
            Some("8")
        );
        assert_eq!(
            record.specifications.get("stall torque").map(String::as_str),
            Some("12")
        );
    }

    #[test]
    fn test_parse_price_amount() {
        assert_eq!(parse_price_amount("₹1,299.00"), Some(1299.0));
        assert_eq!(parse_price_amount("₹450"), Some(450.0));
        assert_eq!(parse_price_amount("1,09,999.50"), Some(109999.5));
        assert_eq!(parse_price_amount("Out of stock"), None);
        assert_eq!(parse_price_amount(""), None);
    }

    #[test]
    fn test_trim_product_url() {
        assert_eq!(
            trim_product_url("https://robu.in/product/x/"),
            "https://robu.in/product/x"
        );
        assert_eq!(
            trim_product_url("https://robu.in/product/x"),
            "https://robu.in/product/x"
        );
    }

    #[test]
    fn test_long_list_keys_dropped() {
        let html = format!(
            r#"<html><body><div class="summary"><ul>
                <li>{}: some value</li>
                <li>Gearbox: planetary</li>
            </ul></div></body></html>"#,
            "a".repeat(60)
        );
        let record = parse_product(&html, PRODUCT_URL);
        assert_eq!(record.specifications.len(), 1);
        assert_eq!(
            record.specifications.get("gearbox").map(String::as_str),
            Some("planetary")
        );
    }
}
