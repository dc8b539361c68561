//! Checkout reconciliation.
//!
//! A one-shot exchange: the local cart is sent to the server, which validates
//! it, reserves stock, and answers with the authoritative line items. Those
//! replace the local cart wholesale before payment - a two-phase commit where
//! the local cart is the optimistic phase and the reservation is the commit.
//!
//! State machine per attempt: `Idle -> Reconciling -> {Reconciled, Rejected,
//! Failed}`. Nothing persists across a failed attempt; a fresh reconciliation
//! always starts from `Idle`, and on `Rejected`/`Failed` the cart is left
//! untouched so the user can retry.

use thiserror::Error;
use tracing::instrument;

use greenbasket_core::{OrderId, ProductId};

use crate::api::types::{CheckoutLine, CheckoutRequest, PlaceOrderRequest};
use crate::api::{ApiClient, ApiError};
use crate::cart::Cart;

/// Progress of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Waiting for the server's reservation.
    Reconciling,
    /// Reservation succeeded; the cart now holds reserved items.
    Reconciled,
    /// The server declined the checkout; cart untouched.
    Rejected,
    /// Transport or server error; cart untouched.
    Failed,
}

/// Non-blocking, user-visible warning raised during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutWarning {
    /// The server reserved fewer units than requested.
    QuantityReduced {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        reserved: u32,
    },
    /// The server dropped an item entirely.
    ItemRemoved {
        product_id: ProductId,
        product_name: String,
    },
}

impl std::fmt::Display for CheckoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuantityReduced {
                product_name,
                requested,
                reserved,
                ..
            } => write!(
                f,
                "{product_name}: quantity reduced from {requested} to {reserved}"
            ),
            Self::ItemRemoved { product_name, .. } => {
                write!(f, "{product_name}: no longer available, removed from cart")
            }
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Server-reserved line items (now also the cart contents).
    pub reserved: Vec<crate::api::types::CartLine>,
    /// Informational warnings about adjusted or removed items.
    pub warnings: Vec<CheckoutWarning>,
}

/// Errors that end a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No access token is stored; the caller routes to login. The server was
    /// never contacted.
    #[error("not signed in")]
    NotAuthenticated,

    /// Reconciling an empty cart is meaningless.
    #[error("cart is empty")]
    EmptyCart,

    /// The server declined the checkout (stock, delivery window, ...).
    #[error("checkout rejected: {0}")]
    Rejected(String),

    /// Order placement was attempted without a completed reconciliation.
    #[error("cart is not reconciled")]
    NotReconciled,

    /// The server declined to place the order.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// Transport or server failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives one cart through reconciliation and order placement.
pub struct CheckoutFlow {
    client: ApiClient,
    cart: Cart,
    state: CheckoutState,
}

impl CheckoutFlow {
    /// Create a flow over the given gateway and cart.
    #[must_use]
    pub const fn new(client: ApiClient, cart: Cart) -> Self {
        Self {
            client,
            cart,
            state: CheckoutState::Idle,
        }
    }

    /// Current attempt state.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Send the cart to the server for validation and stock reservation, then
    /// replace the cart with the server's reserved items.
    ///
    /// On any error the cart is left exactly as it was, so the user can retry.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotAuthenticated`] when no access token is stored
    ///   (the server is not contacted)
    /// - [`CheckoutError::EmptyCart`] when there is nothing to reserve
    /// - [`CheckoutError::Rejected`] when the server declines the checkout
    /// - [`CheckoutError::Api`] on transport or server failure
    #[instrument(skip(self))]
    pub async fn reconcile(&mut self) -> Result<Reconciliation, CheckoutError> {
        // Every attempt starts fresh
        self.state = CheckoutState::Idle;

        let session = self.client.session();
        if session.access_token().is_none() {
            return Err(CheckoutError::NotAuthenticated);
        }
        let Some(user) = session.current_user() else {
            return Err(CheckoutError::NotAuthenticated);
        };

        let requested = self.cart.lines();
        if requested.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Reconciling;
        let request = CheckoutRequest {
            user_id: user.id,
            cart: requested
                .iter()
                .map(|line| CheckoutLine {
                    product_id: line.product_id,
                    qty: line.qty,
                })
                .collect(),
        };

        let response = match self.client.initiate_checkout(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = CheckoutState::Failed;
                return Err(e.into());
            }
        };

        if !response.status {
            self.state = CheckoutState::Rejected;
            let message = response
                .message
                .unwrap_or_else(|| "checkout was rejected".to_string());
            tracing::warn!(%message, "checkout rejected by server");
            return Err(CheckoutError::Rejected(message));
        }

        let mut warnings: Vec<CheckoutWarning> = response
            .updated_items
            .iter()
            .map(|item| CheckoutWarning::QuantityReduced {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                requested: item.requested_qty,
                reserved: item.qty,
            })
            .chain(
                response
                    .removed_items
                    .iter()
                    .map(|item| CheckoutWarning::ItemRemoved {
                        product_id: item.product_id,
                        product_name: item.product_name.clone(),
                    }),
            )
            .collect();

        // Some backends only adjust reserved_items without filling the
        // explicit lists; diff against the request so drift is always visible.
        append_derived_warnings(&mut warnings, &requested, &response.reserved_items);

        for warning in &warnings {
            tracing::info!(%warning, "checkout adjustment");
        }

        // Server is now authoritative for price, availability, and quantity
        self.cart.set_all(response.reserved_items.clone());
        self.state = CheckoutState::Reconciled;

        Ok(Reconciliation {
            reserved: response.reserved_items,
            warnings,
        })
    }

    /// Place the order for the reserved items and clear the cart.
    ///
    /// Only reachable after a successful [`Self::reconcile`].
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotReconciled`] when called out of order
    /// - [`CheckoutError::OrderRejected`] when the server declines
    /// - [`CheckoutError::Api`] on transport or server failure
    #[instrument(skip(self))]
    pub async fn place_order(&mut self) -> Result<OrderId, CheckoutError> {
        if self.state != CheckoutState::Reconciled {
            return Err(CheckoutError::NotReconciled);
        }
        let Some(user) = self.client.session().current_user() else {
            return Err(CheckoutError::NotAuthenticated);
        };

        let request = PlaceOrderRequest {
            user_id: user.id,
            items: self.cart.lines(),
        };

        let response = match self.client.place_order(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = CheckoutState::Failed;
                return Err(e.into());
            }
        };

        if !response.status {
            self.state = CheckoutState::Failed;
            return Err(CheckoutError::OrderRejected(
                response
                    .message
                    .unwrap_or_else(|| "order was rejected".to_string()),
            ));
        }

        let Some(order_id) = response.order_id else {
            self.state = CheckoutState::Failed;
            return Err(CheckoutError::OrderRejected(
                "server confirmed the order without an order id".to_string(),
            ));
        };

        self.cart.clear();
        self.state = CheckoutState::Idle;
        tracing::info!(%order_id, "order placed");
        Ok(order_id)
    }
}

/// Derive drift warnings the server did not list explicitly.
fn append_derived_warnings(
    warnings: &mut Vec<CheckoutWarning>,
    requested: &[crate::api::types::CartLine],
    reserved: &[crate::api::types::CartLine],
) {
    let already_flagged = |warnings: &[CheckoutWarning], product_id: ProductId| {
        warnings.iter().any(|w| match w {
            CheckoutWarning::QuantityReduced { product_id: id, .. }
            | CheckoutWarning::ItemRemoved { product_id: id, .. } => *id == product_id,
        })
    };

    for line in requested {
        if already_flagged(warnings, line.product_id) {
            continue;
        }
        match reserved.iter().find(|r| r.product_id == line.product_id) {
            Some(r) if r.qty < line.qty => warnings.push(CheckoutWarning::QuantityReduced {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                requested: line.qty,
                reserved: r.qty,
            }),
            Some(_) => {}
            None => warnings.push(CheckoutWarning::ItemRemoved {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
            }),
        }
    }
}
