use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryFacet {
    pub id: String,
    pub name: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BrandFacet {
    pub name: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceRangeFacet {
    pub min: f64,
    pub max: Option<f64>,
    pub label: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingFacet {
    pub min: f64,
    pub label: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AvailabilityFacet {
    pub key: String,
    pub label: String,
    pub count: u64,
}

/// Filter options shown next to search results.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FacetSet {
    pub categories: Vec<CategoryFacet>,
    pub brands: Vec<BrandFacet>,
    pub price_ranges: Vec<PriceRangeFacet>,
    pub ratings: Vec<RatingFacet>,
    pub availability: Vec<AvailabilityFacet>,
}

/// Static catalog data the search service renders with: facet counts and
/// currency symbols. Injected so nothing in the service reads globals.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub facets: FacetSet,
    pub currency_symbols: HashMap<String, String>,
}

impl CatalogSettings {
    pub fn new(facets: FacetSet, currency_symbols: HashMap<String, String>) -> Self {
        Self {
            facets,
            currency_symbols,
        }
    }

    /// Currency symbol followed by the amount with two decimals and
    /// thousands separators. Unknown codes are used verbatim as the prefix.
    pub fn format_price(&self, amount: f64, currency: &str) -> String {
        let symbol = self
            .currency_symbols
            .get(currency)
            .map(String::as_str)
            .unwrap_or(currency);
        format!("{symbol}{}", group_thousands(amount))
    }
}

fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" would read oddly, so the sign is only kept for non-zero output.
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

impl Default for CatalogSettings {
    fn default() -> Self {
        let currency_symbols = [("USD", "$"), ("EUR", "€"), ("GBP", "£")]
            .into_iter()
            .map(|(code, symbol)| (code.to_string(), symbol.to_string()))
            .collect();

        let categories = [
            ("electronics", "Electronics", 150),
            ("clothing", "Clothing", 80),
            ("books", "Books", 45),
            ("home", "Home & Garden", 92),
        ]
        .into_iter()
        .map(|(id, name, count)| CategoryFacet {
            id: id.to_string(),
            name: name.to_string(),
            count,
        })
        .collect();

        let brands = [("Apple", 45), ("Samsung", 38), ("Nike", 22), ("Adidas", 18)]
            .into_iter()
            .map(|(name, count)| BrandFacet {
                name: name.to_string(),
                count,
            })
            .collect();

        let price_ranges = [
            (0.0, Some(25.0), "Under $25", 120),
            (25.0, Some(50.0), "$25 - $50", 85),
            (50.0, Some(100.0), "$50 - $100", 65),
            (100.0, Some(200.0), "$100 - $200", 40),
            (200.0, None, "Over $200", 25),
        ]
        .into_iter()
        .map(|(min, max, label, count)| PriceRangeFacet {
            min,
            max,
            label: label.to_string(),
            count,
        })
        .collect();

        let ratings = [(4.0, "4+ Stars", 180), (3.0, "3+ Stars", 250), (2.0, "2+ Stars", 300)]
            .into_iter()
            .map(|(min, label, count)| RatingFacet {
                min,
                label: label.to_string(),
                count,
            })
            .collect();

        let availability = [("in_stock", "In Stock", 285), ("out_of_stock", "Out of Stock", 15)]
            .into_iter()
            .map(|(key, label, count)| AvailabilityFacet {
                key: key.to_string(),
                label: label.to_string(),
                count,
            })
            .collect();

        Self {
            facets: FacetSet {
                categories,
                brands,
                price_ranges,
                ratings,
                availability,
            },
            currency_symbols,
        }
    }
}
