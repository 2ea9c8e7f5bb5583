use serde_json::{Value, json};

use crate::criteria::{SortBy, SortDirection};

/// Fields matched by full-text search, with their boosts.
const SEARCH_FIELDS: [(&str, f32); 3] = [("title", 2.0), ("brand", 1.5), ("description", 1.0)];

const DEFAULT_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
enum SortClause {
    Relevance,
    Field {
        field: &'static str,
        direction: SortDirection,
    },
}

impl SortClause {
    fn to_json(&self) -> Value {
        match self {
            SortClause::Relevance => json!({ "_score": { "order": "desc" } }),
            SortClause::Field { field, direction } => {
                let mut clause = serde_json::Map::new();
                clause.insert(field.to_string(), json!({ "order": direction.as_str() }));
                Value::Object(clause)
            }
        }
    }
}

/// Immutable engine query. Built fresh for every search and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    must: Vec<Value>,
    filter: Vec<Value>,
    sort: Option<SortClause>,
    size: u32,
    from: u64,
}

impl Query {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn from(&self) -> u64 {
        self.from
    }

    /// Request body in the engine's search DSL.
    pub fn body(&self) -> Value {
        let mut body = json!({
            "query": {
                "bool": {
                    "must": self.must,
                    "filter": self.filter,
                    "should": [],
                }
            },
            "size": self.size,
            "from": self.from,
        });
        if let Some(sort) = &self.sort {
            body["sort"] = json!([sort.to_json()]);
        }
        body
    }
}

/// Accumulates clauses for a single [`Query`]. Not meant to be shared
/// between searches.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    must: Vec<Value>,
    filter: Vec<Value>,
    sort: Option<SortClause>,
    size: u32,
    from: u64,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            must: Vec::new(),
            filter: Vec::new(),
            sort: None,
            size: DEFAULT_SIZE,
            from: 0,
        }
    }

    /// Fuzzy multi-field match; an empty term adds nothing.
    pub fn search(mut self, term: &str) -> Self {
        if term.is_empty() {
            return self;
        }
        let fields: Vec<String> = SEARCH_FIELDS
            .iter()
            .map(|(name, boost)| {
                if *boost == 1.0 {
                    name.to_string()
                } else {
                    format!("{name}^{boost}")
                }
            })
            .collect();

        self.must.push(json!({
            "multi_match": {
                "query": term,
                "fields": fields,
                "type": "best_fields",
                "fuzziness": "AUTO",
            }
        }));
        self
    }

    pub fn filter_by_category(mut self, category_id: &str) -> Self {
        self.filter
            .push(json!({ "term": { "category_id": category_id } }));
        self
    }

    /// Inclusive price range. Missing bounds are left out of the clause.
    pub fn filter_by_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        let mut range = serde_json::Map::new();
        if let Some(min) = min {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = max {
            range.insert("lte".to_string(), json!(max));
        }
        if !range.is_empty() {
            self.filter.push(json!({ "range": { "price": range } }));
        }
        self
    }

    pub fn sort_by_price(self, direction: SortDirection) -> Self {
        self.sort_by(SortBy::Price, direction)
    }

    pub fn sort_by_relevance(mut self) -> Self {
        self.sort = Some(SortClause::Relevance);
        self
    }

    /// Replaces any earlier sort.
    pub fn sort_by(mut self, sort_by: SortBy, direction: SortDirection) -> Self {
        let field = match sort_by {
            SortBy::Relevance => return self.sort_by_relevance(),
            SortBy::Price => "price",
            SortBy::Rating => "rating",
            SortBy::Popularity => "popularity",
            SortBy::Date => "created_at",
        };
        self.sort = Some(SortClause::Field { field, direction });
        self
    }

    pub fn paginate(mut self, page: u32, per_page: u32) -> Self {
        self.size = per_page;
        self.from = (page.max(1) as u64 - 1) * per_page as u64;
        self
    }

    pub fn build(&self) -> Query {
        Query {
            must: self.must.clone(),
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            size: self.size,
            from: self.from,
        }
    }
}
