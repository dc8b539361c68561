//! Client-side cart state.
//!
//! The cart is local and advisory: it answers instantly to add/remove taps
//! and survives restarts, but the server re-prices and re-checks everything
//! at checkout. Quantity changes are whole-item events (add is +1, remove is
//! -1, the line disappears at zero) so increment/decrement controls always
//! agree with stored state.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use greenbasket_core::{Price, ProductId};

use crate::api::types::{CartLine, Product};
use crate::session::store::{SessionStore, keys};

/// Errors raised by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Adding one more unit would exceed the last known stock level.
    #[error("{name} has only {stock} in stock")]
    OutOfStock {
        /// Product display name.
        name: String,
        /// Last known stock level.
        stock: u32,
    },
}

/// The local cart, persisted wholesale on every mutation.
///
/// Cheaply cloneable via `Arc`; every clone shares the same cart.
#[derive(Clone)]
pub struct Cart {
    inner: Arc<CartInner>,
}

struct CartInner {
    store: Arc<dyn SessionStore>,
    lines: RwLock<Vec<CartLine>>,
}

impl Cart {
    /// Load the cart persisted in `store`, starting empty when nothing (or
    /// nothing readable) is persisted.
    #[must_use]
    pub fn load(store: Arc<dyn SessionStore>) -> Self {
        let lines = store
            .get(keys::CART)
            .map(|raw| match serde_json::from_str(&raw) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(error = %e, "persisted cart unreadable, starting empty");
                    Vec::new()
                }
            })
            .unwrap_or_default();

        Self {
            inner: Arc::new(CartInner {
                store,
                lines: RwLock::new(lines),
            }),
        }
    }

    /// Add one unit of `product`, creating the line if needed.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when one more unit would exceed the
    /// product's last known stock. The server remains authoritative at
    /// checkout regardless.
    pub fn add(&self, product: &Product) -> Result<u32, CartError> {
        let mut lines = self.write_lines();

        if let Some(line) = lines.iter_mut().find(|l| l.product_id == product.id) {
            if line.qty + 1 > product.stock {
                return Err(CartError::OutOfStock {
                    name: product.name.clone(),
                    stock: product.stock,
                });
            }
            line.qty += 1;
            // Refresh display fields and the advisory stock ceiling
            line.price = product.price;
            line.offer_price = product.offer_price;
            line.known_stock = Some(product.stock);
            let qty = line.qty;
            self.persist(&lines);
            return Ok(qty);
        }

        if product.stock == 0 {
            return Err(CartError::OutOfStock {
                name: product.name.clone(),
                stock: 0,
            });
        }
        lines.push(CartLine::from(product));
        self.persist(&lines);
        Ok(1)
    }

    /// Remove one unit of a product, deleting the line when it hits zero.
    ///
    /// Returns the line's remaining quantity, or `None` when the line is gone
    /// (or was never there).
    pub fn remove(&self, product_id: ProductId) -> Option<u32> {
        let mut lines = self.write_lines();

        let index = lines.iter().position(|l| l.product_id == product_id)?;
        let line = lines.get_mut(index)?;
        line.qty -= 1;
        let remaining = line.qty;

        let result = if remaining == 0 {
            lines.remove(index);
            None
        } else {
            Some(remaining)
        };

        self.persist(&lines);
        result
    }

    /// Replace the whole cart, e.g. with server-reserved line items.
    pub fn set_all(&self, new_lines: Vec<CartLine>) {
        let mut lines = self.write_lines();
        *lines = new_lines;
        self.persist(&lines);
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.set_all(Vec::new());
    }

    /// Snapshot of the current line items.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read_lines().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_lines().is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.read_lines().iter().map(|l| l.qty).sum()
    }

    /// Subtotal at effective (offer) prices.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::sum(
            self.read_lines()
                .iter()
                .map(|l| l.effective_price().line_total(l.qty)),
        )
    }

    fn read_lines(&self) -> std::sync::RwLockReadGuard<'_, Vec<CartLine>> {
        self.inner.lines.read().expect("cart lock poisoned")
    }

    fn write_lines(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CartLine>> {
        self.inner.lines.write().expect("cart lock poisoned")
    }

    fn persist(&self, lines: &[CartLine]) {
        match serde_json::to_string(lines) {
            Ok(json) => self.inner.store.set(keys::CART, &json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize cart"),
        }
    }
}
