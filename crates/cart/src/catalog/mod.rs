//! Product catalog and stock lookups.
//!
//! # Architecture
//!
//! - [`StockService`] answers "how many units are available" and is queried
//!   on every stock-checked cart operation. Stock is never cached.
//! - [`ProductCatalog`] returns descriptive product data, needed only when a
//!   product enters the cart for the first time.
//! - [`HttpCatalog`] implements both against the storefront REST API
//!   (`GET {base}/stock/{id}` and `GET {base}/products/{id}`), caching
//!   product metadata in memory via `moka`.

mod http;

pub use http::HttpCatalog;

use std::sync::Arc;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, StockRecord};
use thiserror::Error;

/// Errors that can occur when querying the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Product or stock record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Authority for how many units of a product are available.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Fetch the current stock record for a product.
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError>;
}

/// Authority for product descriptive metadata.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product by ID.
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;
}

#[async_trait]
impl<T: StockService + ?Sized> StockService for Arc<T> {
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        (**self).stock(id).await
    }
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        (**self).product(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("stock/7".to_string());
        assert_eq!(err.to_string(), "Not found: stock/7");

        let err = CatalogError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - maintenance");
    }
}
