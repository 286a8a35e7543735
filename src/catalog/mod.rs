//! Catalog records
//!
//! This module defines the item record produced by extraction, plus the
//! small text and price normalizers the extractors share.

mod price;
mod text;

pub use price::{normalize_decimal, parse_price};
pub use text::{collapse_whitespace, push_unique};

use rust_decimal::Decimal;

/// A crawled catalog item (book)
///
/// The canonical absolute URL is the identity. Items harvested from a
/// listing page are partial until enrichment fills in the detail fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    /// Canonical absolute URL of the detail page
    pub url: String,

    /// Title, trimmed
    pub title: String,

    /// Price with two-decimal currency semantics
    pub price: Option<Decimal>,

    /// Publisher name
    pub publisher: Option<String>,

    /// Year of publication
    pub year: Option<i32>,

    /// Ordered, unique, non-blank author names
    pub authors: Vec<String>,
}

impl Item {
    /// Creates a partial item that only knows its URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns true when the title is non-blank
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Authors joined for display, or `None` when there are none
    pub fn authors_display(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        }
    }
}
