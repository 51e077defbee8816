//! Cart operation errors with Sentry integration.
//!
//! Every failed cart operation produces a [`CartError`]. The store reports it
//! once to the user through its notifier (see [`CartError::user_message`]),
//! captures transient failures to Sentry, and returns it to the caller so the
//! cause stays inspectable.

use core::fmt;

use rocketshoes_core::{CartEditError, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Shown when the requested quantity is more than the stock on hand.
pub const STOCK_EXCEEDED_MESSAGE: &str = "Requested quantity is out of stock";

/// The mutating cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// Generic user-facing message for a failure of this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add product",
            Self::Remove => "Failed to remove product",
            Self::UpdateAmount => "Failed to update product quantity",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateAmount => "update amount",
        })
    }
}

/// Why a cart operation left the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// Desired quantity is more than the available stock.
    #[error("{operation}: requested {requested} of product {product_id}, {available} in stock")]
    StockExceeded {
        operation: CartOperation,
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product is not in the cart.
    #[error("{operation}: product {product_id} is not in the cart")]
    NotFound {
        operation: CartOperation,
        product_id: ProductId,
    },

    /// Stock or product lookup failed.
    #[error("{operation}: catalog error: {source}")]
    Catalog {
        operation: CartOperation,
        #[source]
        source: CatalogError,
    },

    /// Persisting the cart failed.
    #[error("{operation}: storage error: {source}")]
    Storage {
        operation: CartOperation,
        #[source]
        source: StorageError,
    },

    /// A cart edit broke a cart invariant.
    #[error("{operation}: invalid cart edit: {source}")]
    Edit {
        operation: CartOperation,
        #[source]
        source: CartEditError,
    },

    /// The cart could not be encoded for storage.
    #[error("{operation}: could not encode cart: {source}")]
    Encode {
        operation: CartOperation,
        #[source]
        source: serde_json::Error,
    },
}

impl CartError {
    /// The operation that failed.
    #[must_use]
    pub const fn operation(&self) -> CartOperation {
        match self {
            Self::StockExceeded { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Catalog { operation, .. }
            | Self::Storage { operation, .. }
            | Self::Edit { operation, .. }
            | Self::Encode { operation, .. } => *operation,
        }
    }

    /// Whether the failure came from I/O rather than the cart contents.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Catalog { .. } | Self::Storage { .. } | Self::Edit { .. } | Self::Encode { .. }
        )
    }

    /// Message to show the user.
    ///
    /// Stock shortfalls get their own message; everything else collapses to
    /// the generic failure message of the operation.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::StockExceeded { .. } => STOCK_EXCEEDED_MESSAGE,
            _ => self.operation().failure_message(),
        }
    }

    /// Map a rejected cart edit; a missing item becomes `NotFound`.
    pub(crate) fn from_edit(operation: CartOperation, err: CartEditError) -> Self {
        match err {
            CartEditError::ItemNotFound(product_id) => Self::NotFound {
                operation,
                product_id,
            },
            source => Self::Edit { operation, source },
        }
    }

    /// Log the error, capturing transient failures to Sentry.
    pub(crate) fn report(&self) {
        if self.is_transient() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::info!(error = %self, "Cart operation rejected");
        }
    }
}

/// Add a breadcrumb for a committed cart change.
///
/// Breadcrumbs appear in Sentry error reports to show the cart edits that
/// led up to an error.
pub(crate) fn add_breadcrumb(operation: CartOperation, product_id: ProductId, amount: u32) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some("cart".to_string()),
        message: Some(format!("{operation} product {product_id}")),
        level: sentry::Level::Info,
        ..Default::default()
    };
    breadcrumb
        .data
        .insert("product_id".to_string(), product_id.as_i32().into());
    breadcrumb
        .data
        .insert("amount".to_string(), amount.into());

    sentry::add_breadcrumb(breadcrumb);
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
