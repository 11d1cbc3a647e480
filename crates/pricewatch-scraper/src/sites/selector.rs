use scraper::{Html, Selector};

use pricewatch_core::{PageFacts, ProductDescriptor, NOT_AVAILABLE};

use crate::normalize::normalize_price;

/// Reads title, price and availability with the descriptor's CSS selectors.
///
/// Never fails: an unmatched or missing selector leaves the field at its
/// sentinel, and an unparseable price is `None`.
pub(crate) fn parse_by_selectors(page: &str, descriptor: &ProductDescriptor) -> PageFacts {
    let document = Html::parse_document(page);
    let field = |name: &str| {
        descriptor
            .selector(name)
            .and_then(|sel| select_text(&document, sel))
    };

    let title = field("title").unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let raw_price = field("price");
    let price = raw_price.as_deref().and_then(normalize_price);
    if price.is_none() {
        tracing::debug!(
            product = %descriptor.name,
            raw_price = raw_price.as_deref().unwrap_or(""),
            "price not determined from selectors"
        );
    }
    let availability = field("availability").unwrap_or_else(|| NOT_AVAILABLE.to_owned());

    PageFacts {
        title,
        price,
        availability,
    }
}

/// Text of the first element matching `selector`, with each text node
/// trimmed and the non-empty ones joined by a space.
pub(crate) fn select_text(document: &Html, selector: &str) -> Option<String> {
    let parsed = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(selector, error = ?e, "invalid CSS selector");
            return None;
        }
    };
    let element = document.select(&parsed).next()?;
    let text = element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
