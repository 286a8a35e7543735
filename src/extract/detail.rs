//! Detail page enrichment
//!
//! Refines a partial listing item with what its detail page knows. Fields the
//! listing already supplied are kept; the detail page only fills gaps, except
//! for authors which are resolved here and nowhere else.

use crate::catalog::{collapse_whitespace, parse_price, push_unique, Item};
use crate::extract::{selector, AUTHOR_PATH, PUBLISHER_PATH};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;

/// Author strategies, first non-empty result wins
const AUTHOR_STRATEGIES: &[fn(&Html) -> Vec<String>] = &[authors_from_info_block, authors_from_links];

/// Block holding "Autor: A, B"
const AUTHOR_BLOCK: &str = ".product-info-author";

/// Leading label in the author block
const AUTHOR_LABEL_PATTERN: &str = r"(?i)^(autorzy|autor|authors|author)\s*:\s*";

const PUBLISHER_LABELS: &[&str] = &["wydawnictwo", "wydawca", "publisher"];

static AUTHOR_LABEL: OnceLock<Option<Regex>> = OnceLock::new();
static YEAR_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

const YEAR_LABELS: &[&str] = &[
    "rok wydania",
    "data wydania",
    "year of publication",
    "date of publication",
];

/// Enriches an item from its detail page markup
///
/// # Resolution Rules
///
/// - **Authors**: the `.product-info-author` block ("Autor: A, B; C"), else
///   the text of every `/autor/` link. Empty when neither yields a name.
/// - **Publisher**: the first details-table row labelled as publisher, else
///   the first `/wydawnictwo/` link. Only set when not already known.
/// - **Year**: first four-digit run in a row labelled as publication year or
///   date. Only set when not already known.
/// - **Title**: the first `h1`, only when the listing gave no title.
/// - **Price**: `meta[itemprop=price]`, only when the listing gave no price.
///
/// # Example
///
/// ```
/// use shelf_crawler::catalog::Item;
/// use shelf_crawler::extract::enrich;
///
/// let html = r#"<div class="product-info-author">Autor: Jan Kowalski, Adam Nowak</div>"#;
/// let item = enrich(Item::from_url("https://shop.test/b-p-1.html"), html);
/// assert_eq!(item.authors, vec!["Jan Kowalski", "Adam Nowak"]);
/// ```
pub fn enrich(mut item: Item, detail_html: &str) -> Item {
    let document = Html::parse_document(detail_html);

    item.authors = AUTHOR_STRATEGIES
        .iter()
        .map(|strategy| strategy(&document))
        .find(|authors| !authors.is_empty())
        .unwrap_or_default();

    let details = scan_details_table(&document);

    if item.publisher.is_none() {
        item.publisher = details.publisher.or_else(|| publisher_from_links(&document));
    }

    if item.year.is_none() {
        item.year = details.year;
    }

    if !item.has_title() {
        if let Some(title) = first_text(&document, "h1") {
            item.title = title;
        }
    }

    if item.price.is_none() {
        item.price = meta_price(&document);
    }

    item
}

/// Reads the author info block
fn authors_from_info_block(document: &Html) -> Vec<String> {
    let Some(block_selector) = selector(AUTHOR_BLOCK) else {
        return Vec::new();
    };
    let Some(block) = document.select(&block_selector).next() else {
        return Vec::new();
    };

    let text = collapse_whitespace(&block.text().collect::<String>());
    let text = match author_label() {
        Some(label) => label.replace(&text, "").into_owned(),
        None => text,
    };

    let mut authors = Vec::new();
    for token in text.split([',', ';']) {
        let name = token.trim();
        if name.chars().count() > 1 {
            push_unique(&mut authors, name.to_string());
        }
    }
    authors
}

/// Reads the text of every author link
fn authors_from_links(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();
    for text in link_texts(document, AUTHOR_PATH) {
        push_unique(&mut authors, text);
    }
    authors
}

fn publisher_from_links(document: &Html) -> Option<String> {
    link_texts(document, PUBLISHER_PATH).into_iter().next()
}

/// Non-empty, whitespace-collapsed texts of anchors whose href contains `path`
fn link_texts(document: &Html, path: &str) -> Vec<String> {
    let Some(link_selector) = selector(&format!("a[href*='{}']", path)) else {
        return Vec::new();
    };

    document
        .select(&link_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Values found in the product details table
#[derive(Debug, Default)]
struct DetailsTable {
    publisher: Option<String>,
    year: Option<i32>,
}

/// Scans every row with two or more cells; the first cell is the label
fn scan_details_table(document: &Html) -> DetailsTable {
    let mut details = DetailsTable::default();

    let Some(row_selector) = selector("tr") else {
        return details;
    };
    let year_pattern = year_pattern();

    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();

        if cells.len() < 2 {
            continue;
        }

        let label = cell_text(&cells[0]).to_lowercase();
        let value = cell_text(&cells[1]);

        if details.publisher.is_none()
            && PUBLISHER_LABELS.iter().any(|marker| label.contains(marker))
            && !value.is_empty()
        {
            details.publisher = Some(value.clone());
        }

        if details.year.is_none() && YEAR_LABELS.iter().any(|marker| label.contains(marker)) {
            details.year = year_pattern
                .and_then(|pattern| pattern.find(&value))
                .and_then(|found| found.as_str().parse().ok());
        }
    }

    details
}

fn author_label() -> Option<&'static Regex> {
    AUTHOR_LABEL
        .get_or_init(|| Regex::new(AUTHOR_LABEL_PATTERN).ok())
        .as_ref()
}

fn year_pattern() -> Option<&'static Regex> {
    YEAR_PATTERN.get_or_init(|| Regex::new(r"\d{4}").ok()).as_ref()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let text_selector = selector(css)?;
    document
        .select(&text_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn meta_price(document: &Html) -> Option<rust_decimal::Decimal> {
    let price_selector = selector("meta[itemprop='price']")?;
    document
        .select(&price_selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .and_then(parse_price)
}
