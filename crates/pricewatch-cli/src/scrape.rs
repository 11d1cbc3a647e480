//! One-shot extraction pass.
//!
//! Per-product failures are reported and skipped; only setup problems
//! (unreadable product list, unknown product filter, client build failure)
//! abort the command.

use pricewatch_core::{format_price, AppConfig, ExtractionResult, ProductDescriptor, ProductsFile};
use pricewatch_scraper::{BatchOutcome, Extractor};

/// Narrows the product list to the one named by `filter` (name or slug).
///
/// # Errors
///
/// Returns an error if `filter` matches no configured product.
pub(crate) fn select_products(
    products: ProductsFile,
    filter: Option<&str>,
) -> anyhow::Result<Vec<ProductDescriptor>> {
    let Some(wanted) = filter else {
        return Ok(products.products);
    };

    let found = products
        .find_by_slug(wanted)
        .or_else(|| products.find_by_name(wanted))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("product '{wanted}' is not in the products file"))?;

    Ok(vec![found])
}

/// Runs one pass and prints every outcome. Results are appended to the
/// database when `pool` is present; `None` is a dry run.
///
/// # Errors
///
/// Returns an error if the product list cannot be loaded, the filter matches
/// nothing, or the HTTP client cannot be built.
pub(crate) async fn run_scrape(
    pool: Option<&sqlx::PgPool>,
    config: &AppConfig,
    product_filter: Option<&str>,
) -> anyhow::Result<()> {
    let products = pricewatch_core::load_products(&config.products_path)?;
    let products = select_products(products, product_filter)?;
    if products.is_empty() {
        println!("no products configured in {}", config.products_path.display());
        return Ok(());
    }

    let extractor = Extractor::from_app_config(config)?;
    let outcomes = extractor
        .extract_batch(&products, config.scraper_max_concurrent)
        .await;

    let mut stored = 0_usize;
    let mut failed = 0_usize;

    for (descriptor, outcome) in products.iter().zip(&outcomes) {
        let BatchOutcome { product_name, result } = outcome;
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                failed += 1;
                println!("FAILED  {product_name}: {e}");
                continue;
            }
        };

        println!("{}", format_result(result));

        let Some(pool) = pool else {
            continue;
        };
        match pricewatch_db::insert_observation(pool, result, &descriptor.site).await {
            Ok(Some(_)) => stored += 1,
            Ok(None) => {
                tracing::warn!(product = %product_name, "duplicate observation ignored");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(product = %product_name, error = %e, "failed to store observation");
            }
        }
    }

    if pool.is_some() {
        println!(
            "done: {} product(s), {stored} stored, {failed} failed",
            products.len()
        );
    } else {
        println!(
            "dry-run: {} product(s), {failed} failed, nothing written",
            products.len()
        );
    }

    Ok(())
}

pub(crate) fn format_result(result: &ExtractionResult) -> String {
    format!(
        "OK      {}: {} | {} | {}",
        result.product_name,
        format_price(result.price),
        result.availability,
        result.title
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use pricewatch_core::{PageFacts, SiteId};

    use super::*;

    fn descriptor(name: &str) -> ProductDescriptor {
        ProductDescriptor {
            name: name.to_string(),
            url: "https://www.bestbuy.com/site/6447382.p".to_string(),
            site: SiteId::BestBuy,
            selectors: HashMap::new(),
            capture: None,
        }
    }

    fn products() -> ProductsFile {
        ProductsFile {
            products: vec![descriptor("Apple - AirPods Pro 2"), descriptor("Sony WH-1000XM5")],
        }
    }

    #[test]
    fn no_filter_keeps_every_product() {
        let selected = select_products(products(), None).expect("all products");
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn filter_matches_slug_or_name() {
        let by_slug = select_products(products(), Some("sony-wh-1000xm5")).expect("by slug");
        assert_eq!(by_slug[0].name, "Sony WH-1000XM5");

        let by_name = select_products(products(), Some("apple - airpods pro 2")).expect("by name");
        assert_eq!(by_name[0].name, "Apple - AirPods Pro 2");
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let err = select_products(products(), Some("nope")).expect_err("unknown product");
        assert!(err.to_string().contains("'nope'"), "got: {err}");
    }

    #[test]
    fn format_result_shows_sentinel_for_missing_price() {
        let result = ExtractionResult::from_facts(
            &descriptor("Apple - AirPods Pro 2"),
            PageFacts::default(),
            Utc::now(),
        );
        assert_eq!(
            format_result(&result),
            "OK      Apple - AirPods Pro 2: N/A | N/A | N/A"
        );
    }
}
