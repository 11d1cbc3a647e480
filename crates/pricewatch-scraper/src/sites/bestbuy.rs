//! BestBuy product pages.
//!
//! The storefront ships its GraphQL cache to the browser as an argument of
//! `window[Symbol.for("ApolloSSRDataTransport")].push(...)`. The `rehydrate`
//! object inside that call holds one entry per cached query; the one carrying
//! `productBySkuId` with buying and fulfillment options is the product.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use pricewatch_core::{PageFacts, ProductDescriptor, NOT_AVAILABLE};

use crate::debug_sink::DebugSink;
use crate::embedded::{carve_json_object, repair_undefined, REHYDRATE_MARKER};
use crate::error::ParseError;
use crate::normalize::decimal_from_json;
use crate::lookup::lookup;
use crate::sites::selector::select_text;

pub const IN_STORE_PICKUP: &str = "In Stock (Pickup)";
pub const SHIPPING_AVAILABLE: &str = "Available for Shipping";
pub const OUT_OF_STOCK: &str = "Out of Stock or Check Store/Shipping";
pub const FULFILLMENT_UNKNOWN: &str =
    "Out of Stock or Check Store/Shipping (fulfillmentOptions not found or not a dict)";

static TRANSPORT_PUSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)window\[Symbol\.for\("ApolloSSRDataTransport"\)\].*push"#)
        .expect("valid regex")
});

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

/// # Errors
///
/// - [`ParseError::PayloadNotFound`] when no script carries the transport push.
/// - [`ParseError::MalformedPayload`] when the `rehydrate` object cannot be carved.
/// - [`ParseError::Decode`] when the carved object is not valid JSON.
pub(crate) fn parse_embedded_json(
    page: &str,
    descriptor: &ProductDescriptor,
    sink: &dyn DebugSink,
) -> Result<PageFacts, ParseError> {
    let document = Html::parse_document(page);

    let script = document
        .select(&SCRIPT)
        .map(|el| el.text().collect::<String>())
        .find(|text| TRANSPORT_PUSH.is_match(text))
        .ok_or_else(|| {
            ParseError::PayloadNotFound("no ApolloSSRDataTransport push script".to_owned())
        })?;

    let carved = carve_json_object(&script, REHYDRATE_MARKER)?;
    let repaired = repair_undefined(carved);
    let decoded: Value = serde_json::from_str(&repaired)?;
    sink.record_document(&descriptor.site, &decoded);

    let mut facts = match find_product_node(&decoded) {
        Some(node) => PageFacts {
            title: lookup(node, &["name", "short"])
                .str()
                .map_or_else(|| NOT_AVAILABLE.to_owned(), str::to_owned),
            price: extract_new_price(node),
            availability: extract_availability(node),
        },
        None => {
            tracing::warn!(
                product = %descriptor.name,
                "no productBySkuId node with buying and fulfillment options"
            );
            PageFacts::default()
        }
    };

    if facts.title == NOT_AVAILABLE {
        if let Some(title) = descriptor
            .selector("title")
            .and_then(|sel| select_text(&document, sel))
        {
            tracing::debug!(product = %descriptor.name, "title taken from fallback selector");
            facts.title = title;
        }
    }

    Ok(facts)
}

/// First top-level entry whose `data.productBySkuId` object has both
/// `buyingOptions` and `fulfillmentOptions`, in document order.
pub(crate) fn find_product_node(document: &Value) -> Option<&Value> {
    document.as_object()?.values().find_map(|entry| {
        let candidate = lookup(entry, &["data", "productBySkuId"]).value()?;
        let fields = candidate.as_object()?;
        (fields.contains_key("buyingOptions") && fields.contains_key("fulfillmentOptions"))
            .then_some(candidate)
    })
}

/// `customerPrice` of the first `"New"` buying option that carries a
/// parseable one.
pub(crate) fn extract_new_price(node: &Value) -> Option<rust_decimal::Decimal> {
    lookup(node, &["buyingOptions"])
        .array()?
        .iter()
        .filter(|option| lookup(option, &["type"]).str() == Some("New"))
        .find_map(|option| {
            lookup(option, &["product", "price", "customerPrice"])
                .value()
                .and_then(decimal_from_json)
        })
}

pub(crate) fn extract_availability(node: &Value) -> String {
    let Some(fulfillment) = lookup(node, &["fulfillmentOptions"])
        .value()
        .filter(|v| v.is_object())
    else {
        return FULFILLMENT_UNKNOWN.to_owned();
    };

    let mut parts = Vec::with_capacity(2);
    if any_flag(
        fulfillment,
        "ispuDetails",
        "ispuAvailability",
        "instoreInventoryAvailable",
    ) {
        parts.push(IN_STORE_PICKUP);
    }
    if any_flag(
        fulfillment,
        "shippingDetails",
        "shippingAvailability",
        "shippingEligible",
    ) {
        parts.push(SHIPPING_AVAILABLE);
    }

    if parts.is_empty() {
        OUT_OF_STOCK.to_owned()
    } else {
        parts.join(" and ")
    }
}

/// `true` if any `root[outer][*][inner][*][flag]` is boolean `true`.
fn any_flag(root: &Value, outer: &str, inner: &str, flag: &str) -> bool {
    lookup(root, &[outer]).array().is_some_and(|details| {
        details.iter().any(|detail| {
            lookup(detail, &[inner])
                .array()
                .is_some_and(|entries| entries.iter().any(|e| lookup(e, &[flag]).is_true()))
        })
    })
}

#[cfg(test)]
#[path = "bestbuy_test.rs"]
mod tests;
