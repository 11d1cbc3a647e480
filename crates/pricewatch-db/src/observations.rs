//! Database operations for the `price_observations` time series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pricewatch_core::{ExtractionResult, SiteId};

use crate::DbError;

/// A row from the `price_observations` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ObservationRow {
    pub id: i64,
    pub product_name: String,
    pub site: String,
    pub captured_at: DateTime<Utc>,
    pub title: String,
    /// `NULL` when the price could not be determined for this capture.
    pub price: Option<Decimal>,
    pub availability: String,
    pub source_url: String,
}

const OBSERVATION_COLUMNS: &str =
    "id, product_name, site, captured_at, title, price, availability, source_url";

/// Appends one extraction result to the time series.
///
/// Returns the new row `id`, or `None` when a row for the same product and
/// capture instant already exists. Existing rows are never updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_observation(
    pool: &PgPool,
    result: &ExtractionResult,
    site: &SiteId,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO price_observations \
             (product_name, site, captured_at, title, price, availability, source_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (product_name, captured_at) DO NOTHING \
         RETURNING id",
    )
    .bind(&result.product_name)
    .bind(site.as_str())
    .bind(result.captured_at)
    .bind(&result.title)
    .bind(result.price)
    .bind(&result.availability)
    .bind(&result.source_url)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns the most recent `limit` observations for a product, oldest first.
///
/// With `priced_only`, captures whose price was not determined are skipped
/// before the limit is applied.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_price_history(
    pool: &PgPool,
    product_name: &str,
    limit: i64,
    priced_only: bool,
) -> Result<Vec<ObservationRow>, DbError> {
    let sql = format!(
        "SELECT {OBSERVATION_COLUMNS} FROM ( \
             SELECT {OBSERVATION_COLUMNS} \
             FROM price_observations \
             WHERE product_name = $1 \
               AND ($3 = FALSE OR price IS NOT NULL) \
             ORDER BY captured_at DESC, id DESC \
             LIMIT $2 \
         ) recent \
         ORDER BY captured_at ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, ObservationRow>(&sql)
        .bind(product_name)
        .bind(limit)
        .bind(priced_only)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the newest observation of every product, ordered by product name.
///
/// With `priced_only`, the newest observation *with a price* is returned, so
/// a capture whose price was not determined never hides an earlier price.
/// Products that were never priced are then omitted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_latest_observations(
    pool: &PgPool,
    priced_only: bool,
) -> Result<Vec<ObservationRow>, DbError> {
    let sql = format!(
        "SELECT DISTINCT ON (product_name) {OBSERVATION_COLUMNS} \
         FROM price_observations \
         WHERE ($1 = FALSE OR price IS NOT NULL) \
         ORDER BY product_name ASC, captured_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, ObservationRow>(&sql)
        .bind(priced_only)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
