//! Author quality filter
//!
//! Items without a real author are usually not books (gadgets, gift cards,
//! calendars), so they are dropped before they reach the results.

use crate::catalog::Item;

/// Author strings that mark a missing author
const UNKNOWN_AUTHOR_MARKERS: &[&str] = &["unknown", "nieznany"];

/// Decides whether an enriched item is acceptable
///
/// Rejects when the author list is empty, when any author is blank, or when
/// any author contains an "unknown" marker (case-insensitive). Missing price,
/// publisher or year never cause a rejection.
pub fn is_acceptable(item: &Item) -> bool {
    !item.authors.is_empty() && item.authors.iter().all(|author| is_real_author(author))
}

fn is_real_author(author: &str) -> bool {
    if author.trim().is_empty() {
        return false;
    }

    let lower = author.to_lowercase();
    !UNKNOWN_AUTHOR_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
