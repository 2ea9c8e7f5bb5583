use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Unvalidated request parameters, as handed over by the HTTP layer.
pub type RawCriteria = Map<String, Value>;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 50;

const CACHE_KEY_PREFIX: &str = "product_search";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Price,
    Rating,
    Popularity,
    Date,
}

impl SortBy {
    /// Relevance is never accepted from input: it is what everything else
    /// falls back to.
    fn parse(raw: &str) -> SortBy {
        match raw {
            "price" => SortBy::Price,
            "rating" => SortBy::Rating,
            "popularity" => SortBy::Popularity,
            "date" => SortBy::Date,
            _ => SortBy::Relevance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Price => "price",
            SortBy::Rating => "rating",
            SortBy::Popularity => "popularity",
            SortBy::Date => "date",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn parse(raw: &str) -> SortDirection {
        match raw {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sanitized search parameters. Values from [`SearchCriteria::sanitize`]
/// satisfy the paging and price invariants; hand-built ones may not.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub search: String,
    pub category_id: Option<String>,
    pub min_price: f64,
    pub max_price: Option<f64>,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub per_page: u32,
}

impl SearchCriteria {
    /// Coerces arbitrary input into valid criteria. Never fails; anything
    /// unparseable becomes zero or the field default.
    pub fn sanitize(raw: &RawCriteria) -> SearchCriteria {
        let field = |key: &str| raw.get(key).filter(|v| !v.is_null());

        let search = field("search").map(text).unwrap_or_default();

        let category_id = field("category_id")
            .map(text)
            .filter(|id| !id.is_empty());

        // `+ 0.0` folds -0.0 into 0.0 so equal criteria serialize alike.
        let min_price = field("min_price").map(numeric).unwrap_or(0.0).max(0.0) + 0.0;

        // Zero, negative and unparseable bounds mean no upper bound.
        let max_price = field("max_price")
            .map(numeric)
            .filter(|max| *max > 0.0)
            .map(|max| max.max(min_price));

        let sort_by = field("sort_by")
            .and_then(Value::as_str)
            .map(SortBy::parse)
            .unwrap_or_default();

        let sort_direction = field("sort_direction")
            .and_then(Value::as_str)
            .map(SortDirection::parse)
            .unwrap_or_default();

        let page = field("page")
            .map(integer)
            .unwrap_or(DEFAULT_PAGE as i64)
            .max(1)
            .min(u32::MAX as i64) as u32;

        let per_page = field("per_page")
            .map(integer)
            .unwrap_or(DEFAULT_PER_PAGE as i64)
            .clamp(1, MAX_PER_PAGE as i64) as u32;

        SearchCriteria {
            search,
            category_id,
            min_price,
            max_price,
            sort_by,
            sort_direction,
            page,
            per_page,
        }
    }

    /// Renders the criteria back into raw form; sanitizing the result yields
    /// the same criteria.
    pub fn to_raw(&self) -> RawCriteria {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawCriteria::new(),
        }
    }

    /// Stable key for the response cache. Struct fields serialize in
    /// declaration order, so the key does not depend on the order the raw
    /// parameters arrived in.
    pub fn cache_key(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        format!("{CACHE_KEY_PREFIX}_{}", hex::encode(digest))
    }

    /// Rows skipped before the requested page.
    pub fn offset(&self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.per_page as u64
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn numeric(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn integer(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| truncate(n.as_f64())),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .unwrap_or_else(|_| truncate(s.parse::<f64>().ok()))
        }
        Value::Bool(b) => *b as i64,
        _ => 0,
    }
}

fn truncate(n: Option<f64>) -> i64 {
    n.filter(|n| n.is_finite()).map(|n| n as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawCriteria {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_sanitize_all_parameters() {
        let criteria = SearchCriteria::sanitize(&raw(json!({
            "search": "  test product ",
            "category_id": "electronics",
            "min_price": "10.50",
            "max_price": "100.00",
            "sort_by": "price",
            "sort_direction": "asc",
            "page": "2",
            "per_page": "20"
        })));

        assert_eq!(criteria.search, "test product");
        assert_eq!(criteria.category_id.as_deref(), Some("electronics"));
        assert_eq!(criteria.min_price, 10.5);
        assert_eq!(criteria.max_price, Some(100.0));
        assert_eq!(criteria.sort_by, SortBy::Price);
        assert_eq!(criteria.sort_direction, SortDirection::Asc);
        assert_eq!(criteria.page, 2);
        assert_eq!(criteria.per_page, 20);
    }

    #[test]
    fn test_sanitize_defaults_for_empty_input() {
        let criteria = SearchCriteria::sanitize(&RawCriteria::new());

        assert_eq!(criteria.search, "");
        assert_eq!(criteria.category_id, None);
        assert_eq!(criteria.min_price, 0.0);
        assert_eq!(criteria.max_price, None);
        assert_eq!(criteria.sort_by, SortBy::Relevance);
        assert_eq!(criteria.sort_direction, SortDirection::Desc);
        assert_eq!(criteria.page, 1);
        assert_eq!(criteria.per_page, 15);
    }

    #[test]
    fn test_sanitize_negative_and_garbage_prices() {
        let criteria = SearchCriteria::sanitize(&raw(json!({
            "min_price": "-10",
            "max_price": "-5"
        })));
        assert_eq!(criteria.min_price, 0.0);
        assert_eq!(criteria.max_price, None);

        let criteria = SearchCriteria::sanitize(&raw(json!({
            "min_price": 25,
            "max_price": "0"
        })));
        assert_eq!(criteria.min_price, 25.0);
        assert_eq!(criteria.max_price, None);

        let criteria = SearchCriteria::sanitize(&raw(json!({
            "min_price": "cheap",
            "max_price": ""
        })));
        assert_eq!(criteria.min_price, 0.0);
        assert_eq!(criteria.max_price, None);

        let criteria = SearchCriteria::sanitize(&raw(json!({ "min_price": "NaN" })));
        assert_eq!(criteria.min_price, 0.0);
    }

    #[test]
    fn test_sanitize_raises_max_price_to_min_price() {
        let criteria = SearchCriteria::sanitize(&raw(json!({
            "min_price": 50,
            "max_price": 20
        })));
        assert_eq!(criteria.min_price, 50.0);
        assert_eq!(criteria.max_price, Some(50.0));
    }

    #[test]
    fn test_sanitize_sort_rejects_unknown_values() {
        let criteria = SearchCriteria::sanitize(&raw(json!({
            "sort_by": "cheapest",
            "sort_direction": "sideways"
        })));
        assert_eq!(criteria.sort_by, SortBy::Relevance);
        assert_eq!(criteria.sort_direction, SortDirection::Desc);

        let criteria = SearchCriteria::sanitize(&raw(json!({ "sort_by": 7 })));
        assert_eq!(criteria.sort_by, SortBy::Relevance);
    }

    #[test]
    fn test_sanitize_clamps_paging() {
        let criteria = SearchCriteria::sanitize(&raw(json!({ "page": 0, "per_page": 500 })));
        assert_eq!(criteria.page, 1);
        assert_eq!(criteria.per_page, 50);

        let criteria = SearchCriteria::sanitize(&raw(json!({ "page": "-4", "per_page": "0" })));
        assert_eq!(criteria.page, 1);
        assert_eq!(criteria.per_page, 1);

        let criteria = SearchCriteria::sanitize(&raw(json!({ "page": "3.9", "per_page": 12.7 })));
        assert_eq!(criteria.page, 3);
        assert_eq!(criteria.per_page, 12);

        let criteria = SearchCriteria::sanitize(&raw(json!({ "per_page": "many" })));
        assert_eq!(criteria.per_page, 1);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = vec![
            json!({}),
            json!({ "search": "  shoes  ", "min_price": "-1", "max_price": "abc" }),
            json!({ "min_price": 30, "max_price": 10, "page": "x", "per_page": 99 }),
            json!({ "category_id": 42, "sort_by": "date", "sort_direction": "asc" }),
            json!({ "search": null, "max_price": null, "page": null }),
            json!({ "search": ["nested"], "min_price": { "a": 1 }, "per_page": true }),
        ];

        for input in inputs {
            let once = SearchCriteria::sanitize(&raw(input.clone()));
            let twice = SearchCriteria::sanitize(&once.to_raw());
            assert_eq!(once, twice, "sanitize was not idempotent for {input}");
        }
    }

    #[test]
    fn test_cache_key_ignores_parameter_order() {
        let mut first = RawCriteria::new();
        first.insert("search".into(), json!("laptop"));
        first.insert("per_page".into(), json!("20"));
        first.insert("sort_by".into(), json!("price"));

        let mut second = RawCriteria::new();
        second.insert("sort_by".into(), json!("price"));
        second.insert("search".into(), json!("laptop"));
        second.insert("per_page".into(), json!(20));

        let a = SearchCriteria::sanitize(&first).cache_key();
        let b = SearchCriteria::sanitize(&second).cache_key();
        assert_eq!(a, b);
        assert!(a.starts_with("product_search_"));

        let other = SearchCriteria::sanitize(&raw(json!({ "search": "laptops" }))).cache_key();
        assert_ne!(a, other);
    }

    #[test]
    fn test_cache_key_treats_negative_zero_as_zero() {
        let negative = SearchCriteria::sanitize(&raw(json!({ "min_price": "-0" })));
        let positive = SearchCriteria::sanitize(&raw(json!({ "min_price": "0" })));
        assert!(negative.min_price.is_sign_positive());
        assert_eq!(negative.cache_key(), positive.cache_key());

        let from_float = SearchCriteria::sanitize(&raw(json!({ "min_price": -0.0 })));
        assert_eq!(from_float.cache_key(), positive.cache_key());
    }

    #[test]
    fn test_offset() {
        let criteria = SearchCriteria::sanitize(&raw(json!({ "page": 3, "per_page": 10 })));
        assert_eq!(criteria.offset(), 20);
    }

    #[test]
    fn test_offset_of_unsanitized_page_zero() {
        let criteria = SearchCriteria {
            page: 0,
            ..SearchCriteria::sanitize(&RawCriteria::new())
        };
        assert_eq!(criteria.offset(), 0);
    }
}
