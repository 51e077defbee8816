//! Catalog records returned by the product and stock endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A product as described by the catalog.
///
/// Fields the cart does not interpret are kept in `attributes` and passed
/// through unchanged into cart items and persisted carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Units of a product currently available.
///
/// Always fetched fresh; a stock record is only valid for the operation
/// that requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: u32,
}

impl StockRecord {
    /// Whether `requested` units can be satisfied.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
