use std::future::Future;
use std::sync::Arc;

use nanoid::nanoid;

use crate::criteria::{SearchCriteria, SortBy};
use crate::data_models::{Product, SearchResult};
use crate::errors::{EngineError, SearchUnavailable, StoreError};
use crate::query_builder::{Query, QueryBuilder};
use crate::search_engine::SearchEngineClient;
use crate::store::{FALLBACK_LIMIT, RelationalStore, StoreFilter};

/// Awaits `primary`; only if it fails is `fallback` invoked with the error.
pub async fn or_fallback<T, E1, E2, P, F, Fut>(primary: P, fallback: F) -> Result<T, E2>
where
    P: Future<Output = Result<T, E1>>,
    F: FnOnce(E1) -> Fut,
    Fut: Future<Output = Result<T, E2>>,
{
    match primary.await {
        Ok(value) => Ok(value),
        Err(cause) => fallback(cause).await,
    }
}

/// Resolves searches against the engine, falling back to the store.
pub struct ResultRepository<E, S> {
    engine: Arc<E>,
    store: Arc<S>,
}

impl<E, S> ResultRepository<E, S>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    pub fn new(engine: Arc<E>, store: Arc<S>) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Engine first; on any engine fault, a capped store scan. Errors only
    /// when both sources fail.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchResult, SearchUnavailable> {
        let query = build_query(criteria);

        or_fallback(self.engine.execute(&query), |cause: EngineError| async move {
            log::warn!("ES search failed, falling back to DB: {cause}");
            self.search_store(criteria).await
        })
        .await
    }

    async fn search_store(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchResult, SearchUnavailable> {
        let filter = StoreFilter::from_criteria(criteria, FALLBACK_LIMIT);
        match self.store.query_by_filter(&filter).await {
            Ok(rows) => Ok(SearchResult {
                total: rows.len() as u64,
                hits: rows,
                took_ms: 0,
            }),
            Err(cause) => {
                log::error!("DB fallback search failed: {cause}");
                Err(SearchUnavailable { cause })
            }
        }
    }

    pub async fn find(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.store.read_by_id(id).await
    }

    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        self.store.featured(limit).await
    }

    pub async fn by_category(
        &self,
        category_id: &str,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError> {
        self.store.by_category(category_id, limit).await
    }

    /// Writes the product to the store, then indexes it in the background.
    /// Returns as soon as the store write is done.
    pub async fn save(&self, mut product: Product) -> Result<Product, StoreError> {
        if product.id.is_empty() {
            product.id = nanoid!();
        }
        self.store.upsert(&product).await?;
        self.index_in_background(product.clone());
        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(id).await
    }

    pub async fn engine_healthy(&self) -> bool {
        self.engine.ping().await
    }

    /// Fire-and-forget: never retried, never awaited by readers.
    fn index_in_background(&self, product: Product) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if !engine.index(&product).await {
                log::error!("Failed to index product: {}", product.id);
            }
        });
    }
}

/// Engine query for the given criteria. A zero minimum price is treated
/// as no lower bound.
pub fn build_query(criteria: &SearchCriteria) -> Query {
    let mut builder = QueryBuilder::new().search(&criteria.search);

    if let Some(category_id) = &criteria.category_id {
        builder = builder.filter_by_category(category_id);
    }

    let min_price = Some(criteria.min_price).filter(|min| *min > 0.0);
    if min_price.is_some() || criteria.max_price.is_some() {
        builder = builder.filter_by_price_range(min_price, criteria.max_price);
    }

    builder = match criteria.sort_by {
        SortBy::Relevance => builder.sort_by_relevance(),
        sort_by => builder.sort_by(sort_by, criteria.sort_direction),
    };

    builder.paginate(criteria.page, criteria.per_page).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::RawCriteria;
    use serde_json::json;

    fn criteria(value: serde_json::Value) -> SearchCriteria {
        let raw: RawCriteria = serde_json::from_value(value).unwrap();
        SearchCriteria::sanitize(&raw)
    }

    #[test]
    fn test_build_query_from_full_criteria() {
        let body = build_query(&criteria(json!({
            "search": "phone",
            "category_id": "electronics",
            "min_price": 100,
            "max_price": 500,
            "sort_by": "price",
            "sort_direction": "asc",
            "page": 2,
            "per_page": 20
        })))
        .body();

        assert_eq!(body["query"]["bool"]["must"].as_array().unwrap().len(), 1);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[1], json!({ "range": { "price": { "gte": 100.0, "lte": 500.0 } } }));
        assert_eq!(body["sort"], json!([{ "price": { "order": "asc" } }]));
        assert_eq!(body["size"], 20);
        assert_eq!(body["from"], 20);
    }

    #[test]
    fn test_build_query_defaults() {
        let body = build_query(&criteria(json!({}))).body();
        assert_eq!(body["query"]["bool"]["must"], json!([]));
        assert_eq!(body["query"]["bool"]["filter"], json!([]));
        assert_eq!(body["sort"], json!([{ "_score": { "order": "desc" } }]));
        assert_eq!(body["size"], 15);
        assert_eq!(body["from"], 0);
    }

    #[test]
    fn test_build_query_zero_min_price_is_omitted() {
        let body = build_query(&criteria(json!({ "max_price": 40 }))).body();
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "range": { "price": { "lte": 40.0 } } })
        );
    }

    #[tokio::test]
    async fn test_or_fallback_skips_fallback_on_success() {
        let result = or_fallback(async { Ok::<u8, String>(1) }, |_: String| async {
            Ok::<u8, String>(99)
        })
        .await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn test_or_fallback_passes_cause() {
        let result: Result<String, String> =
            or_fallback(async { Err::<String, String>("boom".to_string()) }, |cause: String| async move {
                Ok::<String, String>(format!("recovered from {cause}"))
            })
            .await;
        assert_eq!(result, Ok("recovered from boom".to_string()));
    }
}
