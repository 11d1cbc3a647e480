use std::collections::HashMap;
use std::sync::Mutex;

use pricewatch_core::SiteId;
use rust_decimal::Decimal;
use serde_json::json;

use super::*;
use crate::debug_sink::NoopSink;

#[derive(Default)]
struct RecordingSink {
    documents: Mutex<Vec<Value>>,
}

impl DebugSink for RecordingSink {
    fn record_document(&self, _site: &SiteId, document: &Value) {
        self.documents.lock().unwrap().push(document.clone());
    }
}

fn descriptor() -> ProductDescriptor {
    ProductDescriptor {
        name: "Apple - AirPods Pro 2".to_owned(),
        url: "https://www.bestbuy.com/site/6447382.p?skuId=6447382".to_owned(),
        site: SiteId::BestBuy,
        selectors: HashMap::from([("title".to_owned(), "h1.heading-3".to_owned())]),
        capture: None,
    }
}

/// Wraps a rehydrate payload in the transport script the storefront emits.
fn page_with(rehydrate: &str) -> String {
    format!(
        r#"<html><head>
<script>window.dataLayer = [];</script>
<script>(window[Symbol.for("ApolloSSRDataTransport")] ??= []).push({{"rehydrate":{rehydrate},"events":[]}});</script>
</head><body><h1 class="heading-3">AirPods Pro 2 (fallback)</h1></body></html>"#
    )
}

fn product_node() -> Value {
    json!({
        "name": {"short": "Apple - AirPods Pro 2"},
        "buyingOptions": [
            {"type": "Used", "product": {"price": {"customerPrice": 50}}},
            {"type": "New", "product": {"price": {"customerPrice": 199.99}}}
        ],
        "fulfillmentOptions": {
            "ispuDetails": [{"ispuAvailability": [{"instoreInventoryAvailable": true}]}],
            "shippingDetails": [{"shippingAvailability": [{"shippingEligible": true}]}]
        }
    })
}

// -----------------------------------------------------------------------
// find_product_node
// -----------------------------------------------------------------------

#[test]
fn selects_first_candidate_with_both_option_sets() {
    let doc = json!({
        ":R1:": {"data": {"productBySkuId": {"name": {"short": "partial"}, "buyingOptions": []}}},
        ":R2:": {"data": {"productBySkuId": {
            "name": {"short": "complete"},
            "buyingOptions": [],
            "fulfillmentOptions": {}
        }}},
        ":R3:": {"data": {"productBySkuId": {
            "name": {"short": "later"},
            "buyingOptions": [],
            "fulfillmentOptions": {}
        }}}
    });
    let node = find_product_node(&doc).expect("candidate");
    assert_eq!(lookup(node, &["name", "short"]).str(), Some("complete"));
}

#[test]
fn skips_entries_with_null_or_non_object_data() {
    let doc = json!({
        "a": {"data": null},
        "b": "string entry",
        "c": {"data": {"productBySkuId": []}}
    });
    assert!(find_product_node(&doc).is_none());
}

// -----------------------------------------------------------------------
// extract_new_price
// -----------------------------------------------------------------------

#[test]
fn price_comes_from_first_new_option() {
    assert_eq!(
        extract_new_price(&product_node()),
        Some(Decimal::new(19_999, 2))
    );
}

#[test]
fn new_option_without_price_falls_through_to_next_new() {
    let node = json!({"buyingOptions": [
        {"type": "New", "product": {"price": {}}},
        {"type": "New", "product": {"price": {"customerPrice": "249.00"}}}
    ]});
    assert_eq!(extract_new_price(&node), Some(Decimal::new(24_900, 2)));
}

#[test]
fn no_new_option_means_no_price() {
    let node = json!({"buyingOptions": [
        {"type": "Used", "product": {"price": {"customerPrice": 50}}}
    ]});
    assert_eq!(extract_new_price(&node), None);
    assert_eq!(extract_new_price(&json!({"buyingOptions": "n/a"})), None);
}

// -----------------------------------------------------------------------
// extract_availability
// -----------------------------------------------------------------------

#[test]
fn both_sources_join_with_and() {
    assert_eq!(
        extract_availability(&product_node()),
        "In Stock (Pickup) and Available for Shipping"
    );
}

#[test]
fn shipping_only() {
    let node = json!({"fulfillmentOptions": {
        "ispuDetails": [{"ispuAvailability": [{"instoreInventoryAvailable": false}]}],
        "shippingDetails": [{"shippingAvailability": [
            {"shippingEligible": false},
            {"shippingEligible": true}
        ]}]
    }});
    assert_eq!(extract_availability(&node), SHIPPING_AVAILABLE);
}

#[test]
fn neither_source_present_is_out_of_stock() {
    let node = json!({"fulfillmentOptions": {}});
    assert_eq!(
        extract_availability(&node),
        "Out of Stock or Check Store/Shipping"
    );
}

#[test]
fn truthy_non_boolean_flags_do_not_count() {
    let node = json!({"fulfillmentOptions": {
        "ispuDetails": [{"ispuAvailability": [{"instoreInventoryAvailable": "true"}]}],
        "shippingDetails": [{"shippingAvailability": {"shippingEligible": true}}]
    }});
    assert_eq!(extract_availability(&node), OUT_OF_STOCK);
}

#[test]
fn missing_or_malformed_fulfillment_has_distinct_sentinel() {
    assert_eq!(extract_availability(&json!({})), FULFILLMENT_UNKNOWN);
    assert_eq!(
        extract_availability(&json!({"fulfillmentOptions": []})),
        FULFILLMENT_UNKNOWN
    );
    assert_ne!(FULFILLMENT_UNKNOWN, OUT_OF_STOCK);
}

// -----------------------------------------------------------------------
// parse_embedded_json
// -----------------------------------------------------------------------

#[test]
fn parses_full_page() {
    let rehydrate = json!({
        ":R0:": {"data": {"shop": {}}},
        ":R1:": {"data": {"productBySkuId": product_node()}}
    })
    .to_string();
    let facts = parse_embedded_json(&page_with(&rehydrate), &descriptor(), &NoopSink).unwrap();
    assert_eq!(facts.title, "Apple - AirPods Pro 2");
    assert_eq!(facts.price, Some(Decimal::new(19_999, 2)));
    assert_eq!(
        facts.availability,
        "In Stock (Pickup) and Available for Shipping"
    );
}

#[test]
fn tolerates_undefined_tokens_and_keeps_undefined_strings() {
    let rehydrate = r#"{":R1:":{"data":{"productBySkuId":{"name":{"short":"undefined"},"badge":undefined,"buyingOptions":[],"fulfillmentOptions":{}}}}}"#;
    let sink = RecordingSink::default();
    let facts = parse_embedded_json(&page_with(rehydrate), &descriptor(), &sink).unwrap();
    assert_eq!(facts.title, "undefined");
    assert!(facts.price.is_none());
    assert_eq!(facts.availability, OUT_OF_STOCK);

    let documents = sink.documents.lock().unwrap();
    assert_eq!(documents.len(), 1);
    assert!(documents[0][":R1:"]["data"]["productBySkuId"]["badge"].is_null());
}

#[test]
fn missing_title_uses_fallback_selector() {
    let rehydrate = r#"{":R1:":{"data":{"productBySkuId":{"buyingOptions":[],"fulfillmentOptions":{}}}}}"#;
    let facts = parse_embedded_json(&page_with(rehydrate), &descriptor(), &NoopSink).unwrap();
    assert_eq!(facts.title, "AirPods Pro 2 (fallback)");
}

#[test]
fn no_product_node_yields_sentinels() {
    let rehydrate = r#"{":R1:":{"data":{"productBySkuId":{"name":{"short":"x"}}}}}"#;
    let facts = parse_embedded_json(&page_with(rehydrate), &descriptor(), &NoopSink).unwrap();
    assert_eq!(facts.title, "AirPods Pro 2 (fallback)");
    assert!(facts.price.is_none());
    assert_eq!(facts.availability, NOT_AVAILABLE);
}

#[test]
fn page_without_transport_script_is_payload_not_found() {
    let err = parse_embedded_json(
        "<html><script>var x = 1;</script></html>",
        &descriptor(),
        &NoopSink,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::PayloadNotFound(_)));
}

#[test]
fn transport_script_without_marker_is_malformed() {
    let page = r#"<script>window[Symbol.for("ApolloSSRDataTransport")].push({"events":[]})</script>"#;
    let err = parse_embedded_json(page, &descriptor(), &NoopSink).unwrap_err();
    assert!(matches!(err, ParseError::MalformedPayload(_)));
}

#[test]
fn undecodable_object_is_decode_error() {
    let err = parse_embedded_json(&page_with("{\"a\":NaN}"), &descriptor(), &NoopSink)
        .unwrap_err();
    assert!(matches!(err, ParseError::Decode(_)));
}
