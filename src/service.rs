use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::catalog::CatalogSettings;
use crate::criteria::{
    DEFAULT_PER_PAGE, MAX_PER_PAGE, RawCriteria, SearchCriteria, SortBy, SortDirection,
};
use crate::data_models::{
    PaginationLinks, PaginationMeta, Price, Product, ProductSummary, SearchResponse, SearchResult,
    StockStatus,
};
use crate::errors::{ProductError, StoreError};
use crate::repository::ResultRepository;
use crate::search_engine::SearchEngineClient;
use crate::store::RelationalStore;

pub const DEGRADED_MESSAGE: &str = "Search temporarily unavailable";

pub struct SearchServiceOptions {
    /// How long any assembled response, degraded ones included, stays cached.
    pub cache_ttl: Duration,
    /// Path pagination links are rendered against.
    pub search_path: String,
}

impl Default for SearchServiceOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            search_path: "/api/v1/products/search".to_string(),
        }
    }
}

/// Sanitizes criteria, caches shaped responses and turns raw hits into
/// API-facing results.
///
/// Concurrent misses on the same key are not joined: each one resolves
/// against the repository and the last `put` wins. Backend reads have no
/// side effects, so the only cost of a stampede is duplicate load.
pub struct SearchService<E, S> {
    repository: Arc<ResultRepository<E, S>>,
    cache: Arc<dyn Cache<SearchResponse>>,
    catalog: Arc<CatalogSettings>,
    options: SearchServiceOptions,
}

impl<E, S> SearchService<E, S>
where
    E: SearchEngineClient,
    S: RelationalStore,
{
    pub fn new(
        repository: Arc<ResultRepository<E, S>>,
        cache: Arc<dyn Cache<SearchResponse>>,
        catalog: Arc<CatalogSettings>,
        options: SearchServiceOptions,
    ) -> Self {
        Self {
            repository,
            cache,
            catalog,
            options,
        }
    }

    pub fn repository(&self) -> &Arc<ResultRepository<E, S>> {
        &self.repository
    }

    pub fn sanitize_search_criteria(&self, raw: &RawCriteria) -> SearchCriteria {
        SearchCriteria::sanitize(raw)
    }

    /// Never fails: when neither source can answer, the caller gets an
    /// empty response carrying an `error` marker.
    pub async fn search_products(&self, raw: &RawCriteria) -> SearchResponse {
        let criteria = self.sanitize_search_criteria(raw);
        let cache_key = criteria.cache_key();

        if let Some(cached) = self.cache.get(&cache_key) {
            log::debug!("Search cache hit: {cache_key}");
            return cached;
        }

        let response = match self.repository.search(&criteria).await {
            Ok(result) => self.transform_search_results(&criteria, result),
            Err(e) => {
                log::error!("Product search failed for {criteria:?}: {e}");
                self.degraded_response(&criteria)
            }
        };

        self.cache
            .put(cache_key, response.clone(), self.options.cache_ttl);
        response
    }

    /// Best rated in-stock products; `limit` is clamped to `[1, 50]`.
    pub async fn get_featured_products(&self, limit: i64) -> Vec<ProductSummary> {
        let limit = limit.clamp(1, MAX_PER_PAGE as i64);
        match self.repository.featured(limit).await {
            Ok(products) => products
                .iter()
                .map(|product| self.transform_product(product))
                .collect(),
            Err(e) => {
                log::error!("Failed to load featured products: {e}");
                Vec::new()
            }
        }
    }

    /// In-stock products of one category; same clamping and error handling
    /// as [`Self::get_featured_products`].
    pub async fn get_category_products(&self, category_id: &str, limit: i64) -> Vec<ProductSummary> {
        let limit = limit.clamp(1, MAX_PER_PAGE as i64);
        match self.repository.by_category(category_id, limit).await {
            Ok(products) => products
                .iter()
                .map(|product| self.transform_product(product))
                .collect(),
            Err(e) => {
                log::error!("Failed to load products of category {category_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Stores the product and flushes cached searches, which may no longer
    /// reflect the catalog.
    pub async fn save_product(&self, product: Product) -> Result<ProductSummary, StoreError> {
        let saved = self.repository.save(product).await?;
        self.flush_cache();
        Ok(self.transform_product(&saved))
    }

    pub async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.repository.delete(id).await?;
        if removed {
            self.flush_cache();
        }
        Ok(removed)
    }

    pub async fn get_product(&self, id: &str) -> Result<ProductSummary, ProductError> {
        match self.repository.find(id).await? {
            Some(product) => Ok(self.transform_product(&product)),
            None => Err(ProductError::NotFound(id.to_string())),
        }
    }

    pub async fn engine_healthy(&self) -> bool {
        self.repository.engine_healthy().await
    }

    pub fn flush_cache(&self) {
        self.cache.flush();
    }

    fn transform_search_results(
        &self,
        criteria: &SearchCriteria,
        result: SearchResult,
    ) -> SearchResponse {
        SearchResponse {
            products: result
                .hits
                .iter()
                .map(|product| self.transform_product(product))
                .collect(),
            total: result.total,
            took: result.took_ms,
            pagination: self.build_pagination_meta(criteria, result.total),
            filters: self.catalog.facets.clone(),
            error: None,
        }
    }

    fn degraded_response(&self, criteria: &SearchCriteria) -> SearchResponse {
        SearchResponse {
            products: Vec::new(),
            total: 0,
            took: 0,
            pagination: self.build_pagination_meta(criteria, 0),
            filters: self.catalog.facets.clone(),
            error: Some(DEGRADED_MESSAGE.to_string()),
        }
    }

    pub fn transform_product(&self, product: &Product) -> ProductSummary {
        ProductSummary {
            id: product.id.clone(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            price: Price {
                amount: product.price,
                currency: product.currency.clone(),
                formatted: self.catalog.format_price(product.price, &product.currency),
            },
            rating: product.rating,
            stock_status: StockStatus::from_stock(product.stock),
            availability: product.stock > 0,
            popularity: product.popularity,
            category_id: product.category_id.clone(),
            seller_id: product.seller_id.clone(),
            attributes: product.attributes.clone(),
            created_at: product.created_at,
        }
    }

    pub fn build_pagination_meta(&self, criteria: &SearchCriteria, total: u64) -> PaginationMeta {
        build_pagination_meta(&self.options.search_path, criteria, total)
    }
}

pub fn build_pagination_meta(path: &str, criteria: &SearchCriteria, total: u64) -> PaginationMeta {
    let page = (criteria.page as u64).max(1);
    let per_page = (criteria.per_page as u64).max(1);

    let last_page = if total > 0 { total.div_ceil(per_page) } else { 1 };
    let from = (total > 0).then(|| (page - 1) * per_page + 1);
    let to = (total > 0).then(|| (page * per_page).min(total));

    let query_params = canonical_query_params(criteria);
    let page_url = |target: u64| build_page_url(path, &query_params, target);

    PaginationMeta {
        current_page: criteria.page,
        per_page: criteria.per_page,
        total,
        last_page,
        from,
        to,
        has_more_pages: page < last_page,
        links: PaginationLinks {
            first: page_url(1),
            last: page_url(last_page),
            prev: (page > 1).then(|| page_url(page - 1)),
            next: (page < last_page).then(|| page_url(page + 1)),
        },
        path: path.to_string(),
        query_params: query_params.into_iter().collect(),
    }
}

/// Non-default parameters, in a fixed order, so equivalent requests share
/// one canonical URL.
fn canonical_query_params(criteria: &SearchCriteria) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if !criteria.search.is_empty() {
        params.push(("search".to_string(), criteria.search.clone()));
    }
    if let Some(category_id) = &criteria.category_id {
        params.push(("category_id".to_string(), category_id.clone()));
    }
    if criteria.min_price > 0.0 {
        params.push(("min_price".to_string(), criteria.min_price.to_string()));
    }
    if let Some(max_price) = criteria.max_price {
        params.push(("max_price".to_string(), max_price.to_string()));
    }
    if criteria.sort_by != SortBy::Relevance {
        params.push(("sort_by".to_string(), criteria.sort_by.as_str().to_string()));
    }
    if criteria.sort_direction != SortDirection::Desc {
        params.push((
            "sort_direction".to_string(),
            criteria.sort_direction.as_str().to_string(),
        ));
    }
    if criteria.per_page != DEFAULT_PER_PAGE {
        params.push(("per_page".to_string(), criteria.per_page.to_string()));
    }

    params
}

fn build_page_url(path: &str, params: &[(String, String)], page: u64) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .chain(std::iter::once(format!("page={page}")))
        .collect();
    format!("{path}?{}", query.join("&"))
}
