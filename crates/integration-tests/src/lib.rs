//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests drive [`rocketshoes_cart::CartStore`] end to end against a
//! scripted catalog and real storage backends. No network is required.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rocketshoes_cart::{CatalogError, ProductCatalog, StockService};
use rocketshoes_core::{Price, Product, ProductId, StockRecord};

/// In-memory catalog with per-product stock that tests can change mid-run.
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    stock: Mutex<HashMap<ProductId, u32>>,
    products: HashMap<ProductId, Product>,
    stock_calls: AtomicUsize,
    product_calls: AtomicUsize,
}

impl ScriptedCatalog {
    /// Empty catalog; every lookup is `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with the given price (in cents) and stock.
    #[must_use]
    pub fn with_product(mut self, id: i32, title: &str, cents: i64, stock: u32) -> Self {
        let id = ProductId::new(id);
        self.products.insert(
            id,
            Product {
                id,
                title: title.to_string(),
                price: Price::from_cents(cents),
                image: Some(format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/{id}.jpg")),
                attributes: serde_json::Map::new(),
            },
        );
        self.set_stock(id.as_i32(), stock);
        self
    }

    /// Change the stock of a product.
    ///
    /// # Panics
    ///
    /// Panics if the stock lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn set_stock(&self, id: i32, amount: u32) {
        self.stock.lock().unwrap().insert(ProductId::new(id), amount);
    }

    /// Number of stock lookups served.
    pub fn stock_calls(&self) -> usize {
        self.stock_calls.load(Ordering::SeqCst)
    }

    /// Number of product lookups served.
    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockService for ScriptedCatalog {
    #[allow(clippy::unwrap_used)]
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        self.stock_calls.fetch_add(1, Ordering::SeqCst);
        self.stock
            .lock()
            .unwrap()
            .get(&id)
            .map(|&amount| StockRecord { id, amount })
            .ok_or_else(|| CatalogError::NotFound(format!("/stock/{id}")))
    }
}

#[async_trait]
impl ProductCatalog for ScriptedCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        self.products
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("/products/{id}")))
    }
}

/// A storage file path under a fresh temporary directory.
#[must_use]
pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("rocketshoes-it-{}", uuid::Uuid::new_v4()))
        .join("storage.json")
}
