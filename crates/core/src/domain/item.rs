use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::element::Element;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

/// Catalog item as seen by the ranking pipeline. Owned by the catalog; the
/// engine never writes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub colors: Vec<String>,
    pub elements: Vec<Element>,
    pub price: Decimal,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub sold_count: u32,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Item {
    pub fn is_rankable(&self) -> bool {
        self.active && self.stock > 0
    }
}

/// Candidate selection for ranking. Stores always restrict to active,
/// in-stock items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateQuery {
    pub category: Option<String>,
}

impl CandidateQuery {
    pub fn matches(&self, item: &Item) -> bool {
        item.is_rankable()
            && self.category.as_deref().map_or(true, |category| item.category == category)
    }
}
