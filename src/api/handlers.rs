use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::criteria::{MAX_PER_PAGE, RawCriteria};
use crate::data_models::{ProductSummary, SearchResponse};
use crate::errors::ProductError;
use crate::search_engine::SearchEngineClient;
use crate::service::SearchService;
use crate::store::RelationalStore;

use super::models::{
    ApiEnvelope, HealthResponse, LimitQuery, ProductList, ServiceStatus,
};

const DEFAULT_FEATURED_LIMIT: i64 = 12;

type ApiError = (StatusCode, Json<ApiEnvelope<()>>);

pub async fn search_handler<E, S>(
    State(service): State<Arc<SearchService<E, S>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ApiEnvelope<SearchResponse>>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    let raw: RawCriteria = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let response = service.search_products(&raw).await;
    Json(ApiEnvelope::ok("Products retrieved successfully", response))
}

pub async fn featured_handler<E, S>(
    State(service): State<Arc<SearchService<E, S>>>,
    Query(query): Query<LimitQuery>,
) -> Json<ApiEnvelope<ProductList>>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    let limit = featured_limit(query.limit.as_deref());
    let products = service.get_featured_products(limit).await;

    Json(ApiEnvelope::ok(
        "Featured products retrieved successfully",
        ProductList {
            total: products.len(),
            products,
            limit,
        },
    ))
}

pub async fn category_handler<E, S>(
    State(service): State<Arc<SearchService<E, S>>>,
    Path(category_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Json<ApiEnvelope<ProductList>>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    let limit = featured_limit(query.limit.as_deref());
    let products = service.get_category_products(&category_id, limit).await;

    Json(ApiEnvelope::ok(
        "Category products retrieved successfully",
        ProductList {
            total: products.len(),
            products,
            limit,
        },
    ))
}

pub async fn product_handler<E, S>(
    State(service): State<Arc<SearchService<E, S>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiEnvelope<ProductSummary>>, ApiError>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    match service.get_product(&id).await {
        Ok(product) => Ok(Json(ApiEnvelope::ok(
            "Product retrieved successfully",
            product,
        ))),
        Err(e @ ProductError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiEnvelope::failure(e.to_string())),
        )),
        Err(ProductError::Unavailable(e)) => {
            log::error!("Failed to load product {id}: {e}");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiEnvelope::failure(
                    "Product temporarily unavailable".to_string(),
                )),
            ))
        }
    }
}

pub async fn health_handler<E, S>(
    State(service): State<Arc<SearchService<E, S>>>,
) -> Json<HealthResponse>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    let elasticsearch = if service.engine_healthy().await {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceStatus {
            database: "healthy".to_string(),
            elasticsearch: elasticsearch.to_string(),
            cache: "healthy".to_string(),
        },
    })
}

/// Missing means the default; anything unparseable counts as zero and is
/// then clamped like any other value.
fn featured_limit(raw: Option<&str>) -> i64 {
    raw.map(|limit| limit.trim().parse::<i64>().unwrap_or(0))
        .unwrap_or(DEFAULT_FEATURED_LIMIT)
        .clamp(1, MAX_PER_PAGE as i64)
}
