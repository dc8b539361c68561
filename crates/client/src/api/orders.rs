//! Checkout and order endpoints.

use tracing::instrument;

use greenbasket_core::{CustomerId, OrderId};

use super::{ApiClient, ApiError, paths};
use super::types::{
    CheckoutRequest, CheckoutResponse, Order, OrderStatusResponse, PlaceOrderRequest,
    PlaceOrderResponse,
};

impl ApiClient {
    /// Ask the server to validate the cart and reserve stock and prices.
    ///
    /// The response's reserved line items supersede the local cart; callers
    /// go through [`crate::checkout::CheckoutFlow`] rather than using this
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(lines = request.cart.len()))]
    pub async fn initiate_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, ApiError> {
        self.post(paths::CHECKOUT_INITIATE, request).await
    }

    /// Place an order for previously reserved items.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_order(
        &self,
        request: &PlaceOrderRequest,
    ) -> Result<PlaceOrderResponse, ApiError> {
        self.post(paths::ORDER_PLACE, request).await
    }

    /// List a customer's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self, customer_id: CustomerId) -> Result<Vec<Order>, ApiError> {
        self.get(&format!("orders/{customer_id}/")).await
    }

    /// Fetch the tracking status of one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self))]
    pub async fn order_status(&self, order_id: OrderId) -> Result<OrderStatusResponse, ApiError> {
        self.get(&format!("order-status/{order_id}/")).await
    }
}
