use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::search_engine::SearchEngineClient;
use crate::service::SearchService;
use crate::store::RelationalStore;

pub mod handlers;
pub mod models;

pub fn create_router<E, S>(service: Arc<SearchService<E, S>>) -> Router
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/products/search", get(handlers::search_handler::<E, S>))
        .route(
            "/api/v1/products/featured",
            get(handlers::featured_handler::<E, S>),
        )
        .route("/api/v1/products/:id", get(handlers::product_handler::<E, S>))
        .route(
            "/api/v1/categories/:category_id/products",
            get(handlers::category_handler::<E, S>),
        )
        .route("/api/health", get(handlers::health_handler::<E, S>))
        .with_state(service)
        .layer(cors)
}
