//! RocketShoes cart library.
//!
//! Client-side shopping cart state: add, remove and re-quantify products,
//! validating quantities against live stock and mirroring the cart to a
//! persistent key-value store after every change.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartStore, FileStore, HttpCatalog, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let store = CartStore::new(
//!     HttpCatalog::new(&config.api)?,
//!     FileStore::new(&config.storage.path),
//!     TracingNotifier,
//!     &config.storage.key,
//! );
//!
//! store.add_one(ProductId::new(1)).await?;
//! store.set_amount(ProductId::new(1), 3).await?;
//! println!("{} items", store.summary().item_count);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{CatalogError, HttpCatalog, ProductCatalog, StockService};
pub use config::{CartConfig, CatalogApiConfig, ConfigError, StorageConfig};
pub use error::{CartError, CartOperation, STOCK_EXCEEDED_MESSAGE};
pub use notify::{BufferedNotifier, Notice, NoopNotifier, Notifier, TracingNotifier};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{AmountUpdate, CartStore};
