//! Cart commands.
//!
//! Builds a [`CartStore`] over the HTTP catalog and the file-backed store,
//! then renders the cart and any queued notices for the terminal.

use std::fmt::Write as _;
use std::sync::Arc;

use rocketshoes_cart::{
    BufferedNotifier, CartConfig, CartError, CartStore, CatalogError, FileStore, HttpCatalog,
};
use rocketshoes_core::Cart;
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The catalog client could not be built.
    #[error("Catalog client error: {0}")]
    Catalog(#[from] CatalogError),

    /// The cart operation failed (already shown to the user).
    #[error("{0}")]
    Cart(#[from] CartError),
}

impl CommandError {
    /// Whether the user already saw this failure as a notice.
    #[must_use]
    pub const fn was_notified(&self) -> bool {
        matches!(self, Self::Cart(_))
    }
}

/// A cart store plus the notices it queued during this run.
pub struct Session {
    pub store: CartStore<HttpCatalog, FileStore, Arc<BufferedNotifier>>,
    notifier: Arc<BufferedNotifier>,
}

impl Session {
    /// Open the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog client cannot be built.
    pub fn open(config: &CartConfig) -> Result<Self, CommandError> {
        let notifier = Arc::new(BufferedNotifier::new());
        let store = CartStore::new(
            HttpCatalog::new(&config.api)?,
            FileStore::new(&config.storage.path),
            Arc::clone(&notifier),
            config.storage.key.as_str(),
        );

        tracing::debug!(
            path = %config.storage.path.display(),
            key = %config.storage.key,
            lines = store.cart().len(),
            "Opened cart"
        );

        Ok(Self { store, notifier })
    }

    /// Print queued notices to stderr.
    #[allow(clippy::print_stderr)]
    pub fn flush_notices(&self) {
        for notice in self.notifier.drain() {
            eprintln!("error: {}", notice.message);
        }
    }

    /// Print the committed cart to stdout.
    #[allow(clippy::print_stdout)]
    pub fn print_cart(&self) {
        print!("{}", render_cart(&self.store.cart()));
    }
}

/// Format a cart as a plain-text table with a totals line.
#[must_use]
pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let title_width = cart
        .iter()
        .map(|item| item.title.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4}  {:<title_width$}  x{:<3}  {:>10}  {:>10}",
            item.id,
            item.title,
            item.amount,
            item.price.to_string(),
            item.subtotal().to_string(),
        );
    }

    let summary = cart.summary();
    let _ = writeln!(
        out,
        "{} item(s), subtotal {}",
        summary.item_count, summary.subtotal
    );
    out
}
