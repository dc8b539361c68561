//! Wire types for the storefront REST API.
//!
//! Field names match the backend contract exactly; notification fields are
//! camelCase, everything else snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{
    CategoryId, CustomerId, NotificationId, NotificationKind, OrderId, OrderStatus, PaymentStatus,
    Price, ProductId,
};

// =============================================================================
// Auth
// =============================================================================

/// Signed-in identity as issued by the backend.
///
/// The profile is treated as opaque beyond the fields the client needs for
/// addressing requests; everything else rides along in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Customer ID used to address per-customer endpoints.
    pub id: CustomerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Profile fields the client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Credentials issued by a successful login or OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCredentials {
    /// Short-lived bearer token attached to authenticated requests.
    pub access: String,
    /// Longer-lived token exchanged for new access tokens.
    pub refresh: String,
    /// The signed-in user's profile.
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
}

/// Generic acknowledgement returned by mutation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A browsable product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A product as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Units available the last time the catalog answered.
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Cart & Checkout
// =============================================================================

/// One cart line item.
///
/// This is both the locally persisted cart shape and the reserved-item shape
/// the checkout endpoint returns; after reconciliation the server's copy
/// replaces the local one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub qty: u32,
    pub product_name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    /// Stock level last reported by the catalog; advisory ceiling for adds,
    /// never trusted at checkout. Absent on server-reserved lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_stock: Option<u32>,
}

impl CartLine {
    /// The price a unit actually sells for (offer price when present).
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.offer_price.unwrap_or(self.price)
    }
}

impl From<&Product> for CartLine {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            qty: 1,
            product_name: product.name.clone(),
            price: product.price,
            offer_price: product.offer_price,
            product_image: product.image.clone(),
            known_stock: Some(product.stock),
        }
    }
}

/// One requested line in a checkout-initiate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub qty: u32,
}

/// Body of `POST checkout-initiate/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: CustomerId,
    pub cart: Vec<CheckoutLine>,
}

/// An item whose quantity the server reduced while reserving stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested_qty: u32,
    pub qty: u32,
}

/// An item the server dropped entirely while reserving stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedItem {
    pub product_id: ProductId,
    pub product_name: String,
}

/// Response of `POST checkout-initiate/`.
///
/// `reserved_items` supersedes the pre-checkout cart for price, availability,
/// and quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated_items: Vec<AdjustedItem>,
    #[serde(default)]
    pub removed_items: Vec<RemovedItem>,
    #[serde(default)]
    pub reserved_items: Vec<CartLine>,
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST order-place/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: CustomerId,
    pub items: Vec<CartLine>,
}

/// Response of `POST order-place/`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderResponse {
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// An order as listed by the order-history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub total: Price,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

/// Response of `GET order-status/{order_id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Notifications
// =============================================================================

/// A customer notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET customer-notifications/{customer_id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPage {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Notification>,
    /// Unread count as the server sees it.
    #[serde(default)]
    pub total: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_profile_keeps_unknown_fields() {
        let json = r#"{"id":7,"name":"Asha","customer":{"address":"12 Hill Rd"},"loyalty_tier":"gold"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id.as_i32(), 7);
        assert_eq!(profile.name.as_deref(), Some("Asha"));
        assert_eq!(
            profile.extra.get("loyalty_tier"),
            Some(&serde_json::Value::String("gold".to_string()))
        );

        // Round-trips without dropping the opaque fields
        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back.get("customer").unwrap()["address"], "12 Hill Rd");
    }

    #[test]
    fn test_cart_line_effective_price() {
        let product = Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(2),
            name: "Oat milk".to_string(),
            price: Price::from_cents(450),
            offer_price: Some(Price::from_cents(399)),
            image: None,
            stock: 12,
            description: None,
        };
        let line = CartLine::from(&product);
        assert_eq!(line.qty, 1);
        assert_eq!(line.known_stock, Some(12));
        assert_eq!(line.effective_price(), Price::from_cents(399));
    }

    #[test]
    fn test_checkout_response_defaults_optional_lists() {
        let json = r#"{"status":false,"message":"out of delivery window"}"#;
        let response: CheckoutResponse = serde_json::from_str(json).unwrap();
        assert!(!response.status);
        assert!(response.reserved_items.is_empty());
        assert!(response.updated_items.is_empty());
        assert!(response.removed_items.is_empty());
    }

    #[test]
    fn test_notification_wire_shape_is_camel_case() {
        let json = r#"{"id":3,"type":"order-status","message":"Order shipped","isRead":false,"createdAt":"2026-08-01T10:00:00Z"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.kind, NotificationKind::OrderStatus);
        assert!(!notification.is_read);

        let back = serde_json::to_value(&notification).unwrap();
        assert!(back.get("isRead").is_some());
        assert!(back.get("createdAt").is_some());
    }
}
