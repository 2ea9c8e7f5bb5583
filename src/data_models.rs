use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::FacetSet;

fn default_currency() -> String {
    "USD".to_string()
}

/// A product as stored in the relational store and indexed in the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category_id: String,
    pub seller_id: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(
        title: String,
        brand: String,
        category_id: String,
        seller_id: String,
        price: f64,
        stock: i64,
    ) -> Product {
        Product {
            id: String::new(), // assigned by the repository on save.
            title,
            brand,
            description: None,
            category_id,
            seller_id,
            price,
            currency: default_currency(),
            stock,
            rating: 0.0,
            popularity: 0,
            attributes: BTreeMap::new(),
            created_at: Some(Utc::now()),
        }
    }
}

/// Raw resolution output, before any business shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub hits: Vec<Product>,
    pub total: u64,
    pub took_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    LimitedStock,
    InStock,
}

impl StockStatus {
    pub fn from_stock(stock: i64) -> StockStatus {
        match stock {
            s if s <= 0 => StockStatus::OutOfStock,
            s if s <= 5 => StockStatus::LowStock,
            s if s <= 20 => StockStatus::LimitedStock,
            _ => StockStatus::InStock,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub formatted: String,
}

/// API-shaped view of a product.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub price: Price,
    pub rating: f64,
    pub stock_status: StockStatus,
    pub availability: bool,
    pub popularity: i64,
    pub category_id: String,
    pub seller_id: String,
    pub attributes: BTreeMap<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub has_more_pages: bool,
    pub links: PaginationLinks,
    pub path: String,
    pub query_params: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub products: Vec<ProductSummary>,
    pub total: u64,
    pub took: u64,
    pub pagination: PaginationMeta,
    pub filters: FacetSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
