use std::cmp::Ordering;
use std::future::Future;

use dashmap::DashMap;

use crate::criteria::SearchCriteria;
use crate::data_models::Product;
use crate::errors::StoreError;

/// Maximum rows a fallback scan returns.
pub const FALLBACK_LIMIT: i64 = 20;

/// Filter for a scan of the durable store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreFilter {
    /// Case-insensitive substring matched against title or brand.
    pub text: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: i64,
}

impl StoreFilter {
    pub fn from_criteria(criteria: &SearchCriteria, limit: i64) -> Self {
        Self {
            text: Some(criteria.search.clone()).filter(|s| !s.is_empty()),
            category_id: criteria.category_id.clone(),
            min_price: Some(criteria.min_price).filter(|min| *min > 0.0),
            max_price: criteria.max_price,
            limit,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !product.title.to_lowercase().contains(&needle)
                && !product.brand.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(category_id) = &self.category_id {
            if &product.category_id != category_id {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

/// Durable product storage used for id lookups and as the search fallback.
pub trait RelationalStore: Send + Sync + 'static {
    /// Rows matching `filter`, ordered by id, at most `filter.limit`.
    fn query_by_filter(
        &self,
        filter: &StoreFilter,
    ) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    fn read_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Product>, StoreError>> + Send;

    /// In-stock products, best rated first.
    fn featured(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    /// In-stock products of one category, ordered by id.
    fn by_category(
        &self,
        category_id: &str,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    fn upsert(&self, product: &Product) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Orders best rated first, then most popular, then by id.
pub fn featured_order(a: &Product, b: &Product) -> Ordering {
    b.rating
        .partial_cmp(&a.rating)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.popularity.cmp(&a.popularity))
        .then_with(|| a.id.cmp(&b.id))
}

/// Process-local store with the same semantics as the MongoDB one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: DashMap<String, Product>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.products.insert(product.id.clone(), product);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn collect_sorted(
        &self,
        keep: impl Fn(&Product) -> bool,
        order: impl Fn(&Product, &Product) -> Ordering,
        limit: i64,
    ) -> Vec<Product> {
        let mut rows: Vec<Product> = self
            .products
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| order(a, b));
        rows.truncate(limit.max(0) as usize);
        rows
    }
}

impl RelationalStore for MemoryStore {
    async fn query_by_filter(&self, filter: &StoreFilter) -> Result<Vec<Product>, StoreError> {
        Ok(self.collect_sorted(|p| filter.matches(p), |a, b| a.id.cmp(&b.id), filter.limit))
    }

    async fn read_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).map(|entry| entry.value().clone()))
    }

    async fn featured(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        Ok(self.collect_sorted(|p| p.stock > 0, featured_order, limit))
    }

    async fn by_category(&self, category_id: &str, limit: i64) -> Result<Vec<Product>, StoreError> {
        Ok(self.collect_sorted(
            |p| p.stock > 0 && p.category_id == category_id,
            |a, b| a.id.cmp(&b.id),
            limit,
        ))
    }

    async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        self.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.products.remove(id).is_some())
    }
}
