//! Read-only listings of the product configuration and recorded history.

use pricewatch_core::{format_price, AppConfig};

fn capture_label(path: Option<&std::path::Path>) -> String {
    path.map_or_else(|| "live".to_string(), |p| p.display().to_string())
}

/// Print the configured product descriptors.
///
/// # Errors
///
/// Returns an error if the products file cannot be loaded.
pub(crate) fn run_products(config: &AppConfig) -> anyhow::Result<()> {
    let products = pricewatch_core::load_products(&config.products_path)?;

    if products.products.is_empty() {
        println!("no products configured in {}", config.products_path.display());
        return Ok(());
    }

    println!("{:<32}{:<10}{:<12}URL", "SLUG", "SITE", "SOURCE");
    for product in &products.products {
        println!(
            "{:<32}{:<10}{:<12}{}",
            product.slug(),
            product.site.as_str(),
            capture_label(product.capture.as_deref()),
            product.url
        );
    }

    Ok(())
}

/// Print the most recent observations of one product, oldest first.
///
/// # Errors
///
/// Returns an error if the product is not configured or the query fails.
pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    name: &str,
    limit: i64,
) -> anyhow::Result<()> {
    let products = pricewatch_core::load_products(&config.products_path)?;
    let product_name = products
        .find_by_slug(name)
        .or_else(|| products.find_by_name(name))
        .map_or_else(|| name.to_string(), |p| p.name.clone());

    let rows =
        pricewatch_db::list_price_history(pool, &product_name, limit.clamp(1, 1_000), false).await?;

    if rows.is_empty() {
        println!("no observations recorded for '{product_name}'");
        return Ok(());
    }

    println!("{product_name}");
    println!();
    println!("{:<22}{:<12}AVAILABILITY", "CAPTURED (UTC)", "PRICE");
    for row in &rows {
        println!(
            "{:<22}{:<12}{}",
            row.captured_at.format("%Y-%m-%d %H:%M:%S"),
            format_price(row.price),
            row.availability
        );
    }

    Ok(())
}
