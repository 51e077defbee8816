//! The cart store.
//!
//! [`CartStore`] owns the session's cart. It is built once per session and
//! handed to consumers as a cheap clone; there is no global instance.
//!
//! # Operations
//!
//! - [`CartStore::add_one`] - add one unit, checking stock
//! - [`CartStore::remove_one`] - drop a product's line
//! - [`CartStore::set_amount`] - set a line's quantity, checking stock
//! - [`CartStore::cart`] - snapshot of the committed cart
//!
//! Each operation either commits a new cart (persisted, then published) or
//! leaves the committed cart untouched. Edits are built on a working copy, so
//! nothing is visible until commit. Mutations on one store are serialized:
//! an operation holds the store's operation lock across its catalog lookups.
//! Readers never wait on that lock.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rocketshoes_core::{Cart, CartItem, CartSummary, ProductId, StockRecord};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogError, ProductCatalog, StockService};
use crate::error::{CartError, CartOperation, Result, add_breadcrumb};
use crate::notify::Notifier;
use crate::storage::KeyValueStore;

/// Outcome of a successful [`CartStore::set_amount`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountUpdate {
    /// The line quantity was changed and persisted.
    Updated,
    /// The requested amount was zero or negative; nothing happened.
    Ignored,
}

/// Shopping cart state with stock-checked edits and persistence.
///
/// Generic over the catalog (`C`), the key-value store (`S`) and the
/// notifier (`N`) so front ends and tests can plug in their own.
pub struct CartStore<C, S, N> {
    inner: Arc<CartStoreInner<C, S, N>>,
}

struct CartStoreInner<C, S, N> {
    catalog: C,
    storage: S,
    notifier: N,
    key: String,
    cart: ArcSwap<Cart>,
    op_lock: Mutex<()>,
}

impl<C, S, N> Clone for CartStore<C, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, S, N> CartStore<C, S, N>
where
    C: StockService + ProductCatalog,
    S: KeyValueStore,
    N: Notifier,
{
    /// Create a store, hydrating the cart from `storage` under `key`.
    ///
    /// A missing or unreadable persisted cart yields an empty cart. The
    /// discarded value is logged but not reported to the user.
    pub fn new(catalog: C, storage: S, notifier: N, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = hydrate(&storage, &key);

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                storage,
                notifier,
                key,
                cart: ArcSwap::from_pointee(cart),
                op_lock: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the committed cart.
    #[must_use]
    pub fn cart(&self) -> Arc<Cart> {
        self.inner.cart.load_full()
    }

    /// Item count and subtotal of the committed cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.cart.load().summary()
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    /// Add one unit of a product.
    ///
    /// Appends a new line with amount 1 (fetching product data from the
    /// catalog) or increments the existing line.
    ///
    /// # Errors
    ///
    /// - `StockExceeded` if the resulting amount is more than the stock
    /// - `Catalog` if the stock or product lookup fails
    /// - `Storage`/`Encode` if the cart cannot be persisted
    ///
    /// Every error is also sent to the notifier.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn add_one(&self, id: ProductId) -> Result<()> {
        let _guard = self.inner.op_lock.lock().await;
        let result = self.try_add_one(id).await;
        self.finish(result)
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product is not in the cart
    /// - `Storage`/`Encode` if the cart cannot be persisted
    ///
    /// Every error is also sent to the notifier.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn remove_one(&self, id: ProductId) -> Result<()> {
        let _guard = self.inner.op_lock.lock().await;
        let result = self.try_remove_one(id);
        self.finish(result)
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// Amounts of zero or less are ignored without touching the cart, the
    /// store or the notifier.
    ///
    /// # Errors
    ///
    /// - `StockExceeded` if `amount` is more than the stock
    /// - `NotFound` if the product is not in the cart
    /// - `Catalog` if the stock lookup fails
    /// - `Storage`/`Encode` if the cart cannot be persisted
    ///
    /// Every error is also sent to the notifier.
    #[instrument(skip_all, fields(product_id = %id, amount))]
    pub async fn set_amount(&self, id: ProductId, amount: i64) -> Result<AmountUpdate> {
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive amount");
            return Ok(AmountUpdate::Ignored);
        }

        let _guard = self.inner.op_lock.lock().await;
        let result = self
            .try_set_amount(id, amount.unsigned_abs())
            .await
            .map(|()| AmountUpdate::Updated);
        self.finish(result)
    }

    async fn try_add_one(&self, id: ProductId) -> Result<()> {
        const OP: CartOperation = CartOperation::Add;

        let current = self.cart();
        let existing = current.get(id).map(|item| item.amount);

        let stock = self
            .inner
            .catalog
            .stock(id)
            .await
            .map_err(|source| catalog_error(OP, source))?;

        let requested = u64::from(existing.unwrap_or(0)) + 1;
        let desired = checked_amount(OP, requested, stock)?;

        let edited = if existing.is_some() {
            current.with_amount(id, desired)
        } else {
            let product = self
                .inner
                .catalog
                .product(id)
                .await
                .map_err(|source| catalog_error(OP, source))?;
            if product.id != id {
                return Err(catalog_error(
                    OP,
                    CatalogError::Parse(format!(
                        "requested product {id}, catalog returned {}",
                        product.id
                    )),
                ));
            }
            current.with_item(CartItem::from_product(product, 1))
        };
        let next = edited.map_err(|e| CartError::from_edit(OP, e))?;

        self.commit(OP, id, desired, next)
    }

    fn try_remove_one(&self, id: ProductId) -> Result<()> {
        const OP: CartOperation = CartOperation::Remove;

        let next = self
            .cart()
            .without(id)
            .map_err(|e| CartError::from_edit(OP, e))?;

        self.commit(OP, id, 0, next)
    }

    async fn try_set_amount(&self, id: ProductId, requested: u64) -> Result<()> {
        const OP: CartOperation = CartOperation::UpdateAmount;

        let stock = self
            .inner
            .catalog
            .stock(id)
            .await
            .map_err(|source| catalog_error(OP, source))?;
        let amount = checked_amount(OP, requested, stock)?;

        let next = self
            .cart()
            .with_amount(id, amount)
            .map_err(|e| CartError::from_edit(OP, e))?;

        self.commit(OP, id, amount, next)
    }

    /// Persist `next`, then publish it as the committed cart.
    ///
    /// If persisting fails, the committed cart is left as it was.
    fn commit(&self, operation: CartOperation, id: ProductId, amount: u32, next: Cart) -> Result<()> {
        let json = next
            .to_json()
            .map_err(|source| CartError::Encode { operation, source })?;
        self.inner
            .storage
            .set(&self.inner.key, &json)
            .map_err(|source| CartError::Storage { operation, source })?;

        self.inner.cart.store(Arc::new(next));
        add_breadcrumb(operation, id, amount);
        info!(%operation, product_id = %id, amount, "Cart updated");
        Ok(())
    }

    /// Report a failed operation once: log it and notify the user.
    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            err.report();
            self.inner.notifier.error(err.user_message());
        }
        result
    }
}

fn catalog_error(operation: CartOperation, source: CatalogError) -> CartError {
    CartError::Catalog { operation, source }
}

/// Check `requested` against the available stock.
fn checked_amount(operation: CartOperation, requested: u64, stock: StockRecord) -> Result<u32> {
    u32::try_from(requested)
        .ok()
        .filter(|&amount| stock.covers(amount))
        .ok_or(CartError::StockExceeded {
            operation,
            product_id: stock.id,
            requested,
            available: stock.amount,
        })
}

fn hydrate<S: KeyValueStore>(storage: &S, key: &str) -> Cart {
    match storage.get(key) {
        Ok(Some(json)) => match Cart::from_json(&json) {
            Ok(cart) => {
                debug!(key, lines = cart.len(), "Restored persisted cart");
                cart
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable persisted cart");
                Cart::new()
            }
        },
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(key, error = %e, "Could not read persisted cart, starting empty");
            Cart::new()
        }
    }
}
