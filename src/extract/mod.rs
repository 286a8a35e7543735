//! HTML extraction for catalog pages
//!
//! This module turns raw catalog markup into items:
//! - Listing pages: candidate detail URLs, partial items and the next-page link
//! - Detail pages: authors, publisher, year, plus title/price when missing
//!
//! Every field is resolved by an ordered chain of strategies where the first
//! non-empty result wins. Markup that lacks the expected structure yields an
//! absent value, never an error.

mod detail;
mod listing;

pub use detail::enrich;
pub use listing::{
    extract_listing_items, extract_listing_links, extract_next_page_link, listing_candidates,
};

use scraper::Selector;
use url::Url;

/// Path fragment of author listing pages
pub(crate) const AUTHOR_PATH: &str = "/autor/";

/// Path fragment of publisher listing pages
pub(crate) const PUBLISHER_PATH: &str = "/wydawnictwo/";

/// Parses a CSS selector, logging instead of failing on a bad one
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Returns true if the href uses the `javascript:` pseudo-protocol
pub(crate) fn is_script_href(href: &str) -> bool {
    href.to_ascii_lowercase().contains("javascript:")
}

/// Resolves an href against the page URL
///
/// Returns None if the href is blank, scripted, unparsable or resolves to a
/// non-HTTP(S) URL.
pub(crate) fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || is_script_href(href) {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
