use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use storefront_core::ValueObject;

/// Column the affiliated products table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    ProductName,
    Revenue,
    SalesCount,
    Commission,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::ProductName => "product_name",
            SortKey::Revenue => "revenue",
            SortKey::SalesCount => "sales_count",
            SortKey::Commission => "commission",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    /// Orient an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Requested ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub direction: Direction,
}

impl ValueObject for Sort {}

impl Sort {
    pub fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }
}

/// Highest-earning products first.
impl Default for Sort {
    fn default() -> Self {
        Self { key: SortKey::Revenue, direction: Direction::Desc }
    }
}
