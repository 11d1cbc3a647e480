//! End-to-end extraction: dispatch, fetch (network or capture) and parse.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricewatch_core::{ProductDescriptor, SiteId};
use pricewatch_scraper::{
    ExtractionCause, ExtractionStage, Extractor, FetchError, Fetcher, ParseError, RetryPolicy,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn test_extractor(max_attempts: u32) -> Extractor {
    let policy = RetryPolicy::new(
        max_attempts,
        Duration::from_millis(1),
        Duration::ZERO,
        Duration::ZERO,
    )
    .expect("valid test policy");
    Extractor::new(Fetcher::new(5, "pricewatch-test/0.1", policy).expect("test fetcher"))
}

fn amazon_descriptor(url: String) -> ProductDescriptor {
    ProductDescriptor {
        name: "Dyson Gen5detect Cordless Vacuum Cleaner".to_owned(),
        url,
        site: SiteId::Amazon,
        selectors: HashMap::from([
            ("title".to_owned(), "#productTitle".to_owned()),
            ("price".to_owned(), ".a-price-whole".to_owned()),
            ("availability".to_owned(), "#availability span".to_owned()),
        ]),
        capture: None,
    }
}

fn bestbuy_capture_descriptor(capture: PathBuf) -> ProductDescriptor {
    ProductDescriptor {
        name: "Apple - AirPods Pro 2".to_owned(),
        url: "https://www.bestbuy.com/site/6447382.p?skuId=6447382".to_owned(),
        site: SiteId::BestBuy,
        selectors: HashMap::from([("title".to_owned(), "h1.heading-3".to_owned())]),
        capture: Some(capture),
    }
}

#[tokio::test]
async fn amazon_page_is_parsed_with_selectors() {
    let server = MockServer::start().await;
    let html = std::fs::read_to_string(fixture("amazon_product.html")).expect("fixture");
    Mock::given(method("GET"))
        .and(path("/dp/B0C2JD5H7D"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let url = format!("{}/dp/B0C2JD5H7D", server.uri());
    let result = test_extractor(1)
        .extract(&amazon_descriptor(url.clone()))
        .await
        .expect("extraction should succeed");

    assert_eq!(result.product_name, "Dyson Gen5detect Cordless Vacuum Cleaner");
    assert_eq!(
        result.title,
        "Dyson Gen5detect Cordless Vacuum Cleaner, Purple/Purple"
    );
    assert_eq!(result.price, Some(Decimal::new(949, 0)));
    assert_eq!(result.availability, "In Stock");
    assert_eq!(result.source_url, url);
}

#[tokio::test]
async fn bestbuy_capture_is_parsed_from_embedded_json_without_network() {
    let descriptor = bestbuy_capture_descriptor(fixture("bestbuy_product.html"));
    let result = test_extractor(1)
        .extract(&descriptor)
        .await
        .expect("extraction should succeed");

    assert_eq!(
        result.title,
        "Apple - AirPods Pro 2, Wireless Active Noise Cancelling Earbuds with Hearing Aid Feature - White"
    );
    assert_eq!(result.price, Some(Decimal::new(19_999, 2)));
    assert_eq!(result.availability, "Available for Shipping");
    assert_eq!(result.source_url, descriptor.url);
}

#[tokio::test]
async fn repeated_extraction_of_same_capture_differs_only_in_timestamp() {
    let descriptor = bestbuy_capture_descriptor(fixture("bestbuy_product.html"));
    let extractor = test_extractor(1);

    let first = extractor.extract(&descriptor).await.expect("first run");
    let second = extractor.extract(&descriptor).await.expect("second run");

    assert!(first.same_facts(&second));
    assert!(second.captured_at >= first.captured_at);
}

#[tokio::test]
async fn unsupported_site_fails_fast_without_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let descriptor = ProductDescriptor {
        name: "Example GPU".to_owned(),
        url: format!("{}/p/N82E16814137632", server.uri()),
        site: SiteId::Unknown("newegg".to_owned()),
        selectors: HashMap::new(),
        capture: None,
    };
    let err = test_extractor(3)
        .extract(&descriptor)
        .await
        .expect_err("unsupported site must fail");

    assert_eq!(err.stage, ExtractionStage::Dispatch);
    assert!(matches!(
        err.cause,
        ExtractionCause::UnsupportedSite { ref site } if site == "newegg"
    ));
}

#[tokio::test]
async fn fetch_failure_is_reported_at_fetch_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_extractor(2)
        .extract(&amazon_descriptor(format!("{}/dp/x", server.uri())))
        .await
        .expect_err("fetch must fail");

    assert!(err.is_fetch_failure());
    assert!(matches!(
        err.cause,
        ExtractionCause::Fetch(FetchError::HttpStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn missing_payload_is_reported_at_parse_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capture = dir.path().join("blocked.html");
    std::fs::write(&capture, "<html><body>Access Denied</body></html>").expect("write");

    let err = test_extractor(1)
        .extract(&bestbuy_capture_descriptor(capture))
        .await
        .expect_err("parse must fail");

    assert!(err.is_parse_failure());
    assert!(matches!(
        err.cause,
        ExtractionCause::Parse(ParseError::PayloadNotFound(_))
    ));
}

#[tokio::test]
async fn batch_continues_past_failures_and_keeps_order() {
    let descriptors = vec![
        ProductDescriptor {
            name: "Example GPU".to_owned(),
            url: "https://www.newegg.com/p/N82E16814137632".to_owned(),
            site: SiteId::Unknown("newegg".to_owned()),
            selectors: HashMap::new(),
            capture: None,
        },
        bestbuy_capture_descriptor(fixture("missing_capture.html")),
        bestbuy_capture_descriptor(fixture("bestbuy_product.html")),
    ];

    let outcomes = test_extractor(1).extract_batch(&descriptors, 2).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].product_name, "Example GPU");
    assert!(outcomes[0].result.is_err());
    assert!(matches!(
        outcomes[1].result,
        Err(ref e) if matches!(e.cause, ExtractionCause::Fetch(FetchError::NotFound { .. }))
    ));
    let last = outcomes[2].result.as_ref().expect("third product succeeds");
    assert_eq!(last.price, Some(Decimal::new(19_999, 2)));
}

#[tokio::test]
async fn batch_runs_on_a_spawned_task() {
    let extractor = test_extractor(1);
    let descriptors = vec![
        bestbuy_capture_descriptor(fixture("bestbuy_product.html")),
        bestbuy_capture_descriptor(fixture("bestbuy_product.html")),
    ];

    let outcomes = tokio::spawn(async move { extractor.extract_batch(&descriptors, 2).await })
        .await
        .expect("batch task should not panic");

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
}
