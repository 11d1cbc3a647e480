use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pricewatch_core::{format_price, slugify};
use pricewatch_db::ObservationRow;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    product_name: String,
    slug: String,
    site: String,
    title: String,
    price: Option<Decimal>,
    price_display: String,
    availability: String,
    source_url: String,
    captured_at: DateTime<Utc>,
}

impl From<ObservationRow> for ProductItem {
    fn from(row: ObservationRow) -> Self {
        Self {
            slug: slugify(&row.product_name),
            price_display: format_price(row.price),
            product_name: row.product_name,
            site: row.site,
            title: row.title,
            price: row.price,
            availability: row.availability,
            source_url: row.source_url,
            captured_at: row.captured_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryPoint {
    captured_at: DateTime<Utc>,
    price: Decimal,
    availability: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductHistory {
    product_name: String,
    slug: String,
    points: Vec<HistoryPoint>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = pricewatch_db::list_latest_observations(&state.pool, true)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(ProductItem::from).collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Chart series for one product. Accepts the product slug or its exact name.
pub(super) async fn product_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<ProductHistory>>, ApiError> {
    let Some(product) = state
        .products
        .find_by_slug(&slug)
        .or_else(|| state.products.find_by_name(&slug))
    else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("product '{slug}' is not configured"),
        ));
    };

    let limit = normalize_limit(query.limit);
    let rows = pricewatch_db::list_price_history(&state.pool, &product.name, limit, true)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let points = rows
        .into_iter()
        .filter_map(|row| {
            row.price.map(|price| HistoryPoint {
                captured_at: row.captured_at,
                price,
                availability: row.availability,
            })
        })
        .collect();

    Ok(Json(ApiResponse {
        data: ProductHistory {
            product_name: product.name.clone(),
            slug: product.slug(),
            points,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
