//! Locale-independent price parsing
//!
//! Shop markup writes prices with either a comma or a dot as the decimal
//! separator. Everything goes through [`normalize_decimal`] first and is then
//! parsed with the invariant `rust_decimal` parser.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Largest believable price; anything above is treated as garbage markup
const MAX_PRICE_UNITS: i64 = 1_000_000;

/// Normalizes a decimal string: strips whitespace (including no-break
/// spaces) and turns a comma separator into a dot
///
/// # Example
///
/// ```
/// use shelf_crawler::catalog::normalize_decimal;
///
/// assert_eq!(normalize_decimal(" 1 234,56 "), "1234.56");
/// ```
pub fn normalize_decimal(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Parses a price string into a non-negative, two-decimal amount
///
/// Returns `None` for empty, unparsable, negative or implausibly large input.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use shelf_crawler::catalog::parse_price;
///
/// assert_eq!(parse_price("12,34"), Some(Decimal::new(1234, 2)));
/// assert_eq!(parse_price("n/a"), None);
/// ```
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let normalized = normalize_decimal(raw);
    if normalized.is_empty() {
        return None;
    }

    let value = Decimal::from_str(&normalized).ok()?;
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    if value > Decimal::new(MAX_PRICE_UNITS, 0) {
        return None;
    }

    Some(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
