//! Price text cleanup.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// Parses a displayed price such as `"$1,234.56"` into a [`Decimal`].
///
/// Leading and trailing currency markers (symbols or codes such as `USD`,
/// `CA$`) are trimmed, then thousands separators and whitespace are stripped.
/// A trailing decimal point (`"1,299."`, common when the fractional part is
/// rendered in a separate element) is dropped. Returns `None` when nothing
/// numeric remains.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim_matches(is_currency_marker)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

fn is_currency_marker(c: char) -> bool {
    c.is_whitespace() || c.is_alphabetic() || CURRENCY_SYMBOLS.contains(&c)
}

/// Reads a price out of a JSON value that may be a number or a price string.
#[must_use]
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => normalize_price(s),
        _ => None,
    }
}
