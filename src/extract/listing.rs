//! Listing page extraction
//!
//! A listing (search results) page is mined three ways:
//! - [`extract_listing_links`]: candidate detail URLs from several redundant
//!   anchor selections, filtered down to product-shaped URLs
//! - [`extract_listing_items`]: partial items built from data attributes the
//!   shop embeds on its product anchors
//! - [`extract_next_page_link`]: the pagination "next" link

use crate::catalog::{collapse_whitespace, parse_price, Item};
use crate::extract::{is_script_href, resolve_href, selector, AUTHOR_PATH, PUBLISHER_PATH};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Anchor selections tried in order; matches are unioned in this order
///
/// 1. Anchors directly under the product-title heading
/// 2. Anchors carrying a product-title class
/// 3. Anchors anywhere inside a product or offer container
const ANCHOR_STRATEGIES: &[&str] = &[
    "h3 > a",
    "a[class*='product-title']",
    "div[class*='product'] a, div[class*='offer'] a",
];

/// Literal marker separating a product slug from its numeric id
/// (e.g. `tytul-ksiazki-p-12345.html`)
const PRODUCT_URL_MARKER: &str = "-p-";

/// Anchors that carry listing data in `data-*` attributes
const DATALAYER_ANCHOR: &str = "a.ecommerce-datalayer[href]";

/// Pagination selections tried in order
const NEXT_PAGE_STRATEGIES: &[&str] = &["li.next a", "a.next"];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Href filters; an href matching any of them is dropped
const HREF_FILTERS: &[(&str, fn(&str) -> bool)] = &[
    ("blank", is_blank),
    ("script", is_script_href),
    ("contributor listing", is_contributor_listing),
    ("cart action", is_cart_action),
    ("image", is_image),
];

fn is_blank(href: &str) -> bool {
    href.trim().is_empty()
}

fn is_contributor_listing(href: &str) -> bool {
    href.contains(AUTHOR_PATH) || href.contains(PUBLISHER_PATH) || href.contains("/serie/")
}

fn is_cart_action(href: &str) -> bool {
    href.contains("dodaj-do-schowka") || href.contains("koszyk")
}

fn is_image(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Extracts candidate item URLs from a listing page
///
/// # Link Extraction Rules
///
/// **Selection** (union, in order): anchors under `h3` product headings,
/// anchors with a `product-title` class, anchors inside `product`/`offer`
/// containers.
///
/// **Exclude:**
/// - Blank hrefs and `javascript:` links
/// - Author, publisher and series listings
/// - Clipboard and cart actions
/// - Image files
/// - Anything whose absolute URL lacks the `-p-` product marker
///
/// The result is deduplicated by exact string, keeping first-seen order.
///
/// # Example
///
/// ```
/// use shelf_crawler::extract::extract_listing_links;
/// use url::Url;
///
/// let html = r#"<h3><a href="/rust-w-praktyce-p-101.html">Rust</a></h3>"#;
/// let base = Url::parse("https://shop.test/szukaj?q=rust").unwrap();
/// let links = extract_listing_links(html, &base);
/// assert_eq!(links, vec!["https://shop.test/rust-w-praktyce-p-101.html"]);
/// ```
pub fn extract_listing_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for css in ANCHOR_STRATEGIES {
        let Some(anchor_selector) = selector(css) else {
            continue;
        };

        for element in document.select(&anchor_selector) {
            let Some(link) = filter_href(element.value().attr("href").unwrap_or(""), base_url)
            else {
                continue;
            };

            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Runs an href through the filter chain and the product-shape check
fn filter_href(href: &str, base_url: &Url) -> Option<String> {
    if let Some((reason, _)) = HREF_FILTERS.iter().find(|(_, reject)| reject(href)) {
        tracing::trace!("Dropping href '{}' ({})", href, reason);
        return None;
    }

    let absolute = resolve_href(href, base_url)?;
    if absolute.contains(PRODUCT_URL_MARKER) {
        Some(absolute)
    } else {
        tracing::trace!("Dropping '{}' (not a product URL)", absolute);
        None
    }
}

/// Builds partial items from anchors that embed listing data
///
/// For every `a.ecommerce-datalayer` anchor:
/// - `title`: `data-name` if non-empty, else the anchor text
/// - `price`: `data-price`, comma or dot decimal; absent if unparsable
/// - `publisher`: `data-brand` if non-empty
/// - `authors`: always empty; authors are resolved from the detail page only
///
/// Anchors are deduplicated by their raw href within this page.
pub fn extract_listing_items(html: &str, base_url: &Url) -> Vec<Item> {
    let document = Html::parse_document(html);

    let Some(anchor_selector) = selector(DATALAYER_ANCHOR) else {
        return Vec::new();
    };

    let mut seen_hrefs = HashSet::new();
    let mut items = Vec::new();

    for element in document.select(&anchor_selector) {
        let href = element.value().attr("href").unwrap_or("");
        if is_blank(href) || is_script_href(href) {
            continue;
        }

        if !seen_hrefs.insert(href.to_string()) {
            continue;
        }

        let Some(url) = resolve_href(href, base_url) else {
            continue;
        };

        items.push(Item {
            url,
            title: listing_title(&element),
            price: element.value().attr("data-price").and_then(parse_price),
            publisher: non_empty_attr(&element, "data-brand"),
            year: None,
            authors: Vec::new(),
        });
    }

    items
}

fn listing_title(element: &ElementRef<'_>) -> String {
    non_empty_attr(element, "data-name")
        .unwrap_or_else(|| collapse_whitespace(&element.text().collect::<String>()))
}

fn non_empty_attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Returns the candidates of a listing page
///
/// Data-attribute items win when the page has them; otherwise every product
/// link becomes a URL-only partial item to be filled in by enrichment.
pub fn listing_candidates(html: &str, base_url: &Url) -> Vec<Item> {
    let items = extract_listing_items(html, base_url);
    if !items.is_empty() {
        return items;
    }

    extract_listing_links(html, base_url)
        .into_iter()
        .map(Item::from_url)
        .collect()
}

/// Finds the absolute URL of the next results page
///
/// Looks for an anchor inside `li.next` first, then an anchor carrying the
/// `next` class itself. Blank and `javascript:` hrefs are ignored.
pub fn extract_next_page_link(html: &str, base_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    NEXT_PAGE_STRATEGIES.iter().find_map(|css| {
        let next_selector = selector(css)?;
        document
            .select(&next_selector)
            .filter_map(|element| element.value().attr("href"))
            .find_map(|href| resolve_href(href, base_url))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn base_url() -> Url {
        Url::parse("https://site.test/szukaj?q=rust").unwrap()
    }

    #[test]
    fn test_heading_links() {
        let html = r#"<html><body>
            <h3><a href="/rust-p-1.html">Rust</a></h3>
            <h3><a href="https://site.test/go-p-2.html">Go</a></h3>
        </body></html>"#;
        let links = extract_listing_links(html, &base_url());
        assert_eq!(
            links,
            vec![
                "https://site.test/rust-p-1.html".to_string(),
                "https://site.test/go-p-2.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_strategy_order_and_dedup() {
        let html = r#"<html><body>
            <div class="product-box">
                <a href="/c-p-3.html">C</a>
                <a href="/a-p-1.html">A again</a>
            </div>
            <a class="product-title big" href="/b-p-2.html">B</a>
            <h3><a href="/a-p-1.html">A</a></h3>
        </body></html>"#;
        let links = extract_listing_links(html, &base_url());
        assert_eq!(
            links,
            vec![
                "https://site.test/a-p-1.html".to_string(),
                "https://site.test/b-p-2.html".to_string(),
                "https://site.test/c-p-3.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_anchor_yields_single_link() {
        let html = r#"<html><body>
            <h3><a href="/x-p-1.html">X</a></h3>
            <h3><a href="/x-p-1.html">X</a></h3>
            <h3><a href="/y-p-2.html">Y</a></h3>
        </body></html>"#;
        let links = extract_listing_links(html, &base_url());
        assert_eq!(
            links,
            vec![
                "https://site.test/x-p-1.html".to_string(),
                "https://site.test/y-p-2.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_filters_reject_non_products() {
        let html = r#"<html><body><div class="offer-list">
            <a href="">empty</a>
            <a href="javascript:void(0)">js</a>
            <a href="/autor/jan-kowalski-p-9">author</a>
            <a href="/wydawnictwo/helion-p-9">publisher</a>
            <a href="/serie/klasyka-p-9">series</a>
            <a href="/dodaj-do-schowka/x-p-9">clipboard</a>
            <a href="/koszyk/dodaj-p-9">cart</a>
            <a href="/img/cover-p-9.JPG">image</a>
            <a href="/promocje">no marker</a>
            <a href="/ok-p-10.html">ok</a>
        </div></body></html>"#;
        let links = extract_listing_links(html, &base_url());
        assert_eq!(links, vec!["https://site.test/ok-p-10.html".to_string()]);
    }

    #[test]
    fn test_links_without_product_marker_never_returned() {
        let html = r#"<html><body>
            <h3><a href="/ksiazka/rust">Rust</a></h3>
            <a class="product-title" href="/ksiazka/go">Go</a>
        </body></html>"#;
        assert!(extract_listing_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_extract_links_is_idempotent() {
        let html = r#"<html><body>
            <h3><a href="/a-p-1.html">A</a></h3>
            <div class="product"><a href="/b-p-2.html">B</a></div>
        </body></html>"#;
        let first = extract_listing_links(html, &base_url());
        let second = extract_listing_links(html, &base_url());
        assert_eq!(first, second);
    }

    #[test]
    fn test_listing_items_from_data_attributes() {
        let html = r#"<html><body>
          <a class="ecommerce-datalayer" href="/b1" data-name="T1" data-price="12,34" data-brand="Pub1">x</a>
          <a class="ecommerce-datalayer" href="/b1" data-name="T1" data-price="12,34" data-brand="Pub1">x</a>
          <a class="ecommerce-datalayer" href="https://site/b2" data-name="" data-price="9.99" data-brand="">Inner Title</a>
        </body></html>"#;
        let base = Url::parse("https://site").unwrap();
        let items = extract_listing_items(html, &base);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://site/b1");
        assert_eq!(items[0].title, "T1");
        assert_eq!(items[0].price, Some(Decimal::new(1234, 2)));
        assert_eq!(items[0].publisher, Some("Pub1".to_string()));
        assert!(items[0].authors.is_empty());

        assert_eq!(items[1].url, "https://site/b2");
        assert_eq!(items[1].title, "Inner Title");
        assert_eq!(items[1].price, Some(Decimal::new(999, 2)));
        assert_eq!(items[1].publisher, None);
    }

    #[test]
    fn test_listing_items_unparsable_price() {
        let html = r#"<a class="ecommerce-datalayer" href="/b1" data-name="T" data-price="brak">x</a>"#;
        let items = extract_listing_items(html, &base_url());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, None);
    }

    #[test]
    fn test_candidates_fall_back_to_links() {
        let html = r#"<html><body><h3><a href="/a-p-1.html">A</a></h3></body></html>"#;
        let candidates = listing_candidates(html, &base_url());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://site.test/a-p-1.html");
        assert!(!candidates[0].has_title());
    }

    #[test]
    fn test_candidates_prefer_data_attributes() {
        let html = r#"<html><body>
            <h3><a href="/a-p-1.html">A</a></h3>
            <a class="ecommerce-datalayer" href="/b-p-2.html" data-name="B">B</a>
        </body></html>"#;
        let candidates = listing_candidates(html, &base_url());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "B");
    }

    #[test]
    fn test_next_page_link() {
        let html = r#"<html><body><li class="next"><a href="/page2">Next</a></li></body></html>"#;
        let base = Url::parse("https://site").unwrap();
        assert_eq!(
            extract_next_page_link(html, &base),
            Some("https://site/page2".to_string())
        );
    }

    #[test]
    fn test_next_page_link_fallback_class() {
        let html = r#"<html><body><a class="pager next" href="?page=3">&raquo;</a></body></html>"#;
        assert_eq!(
            extract_next_page_link(html, &base_url()),
            Some("https://site.test/szukaj?page=3".to_string())
        );
    }

    #[test]
    fn test_next_page_link_rejects_script_and_missing() {
        let html = r#"<html><body><li class="next"><a href="javascript:void(0)">Next</a></li></body></html>"#;
        assert_eq!(extract_next_page_link(html, &base_url()), None);

        let html = r#"<html><body><li class="prev"><a href="/page1">Prev</a></li></body></html>"#;
        assert_eq!(extract_next_page_link(html, &base_url()), None);
    }
}
