//! Status enums for orders and notifications.

use serde::{Deserialize, Serialize};

/// Order fulfillment status reported by the order-tracking endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, not yet packed.
    #[default]
    Placed,
    /// Items picked and packed at the store.
    Packed,
    /// Out for delivery.
    Shipped,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Whether the order is still in flight.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Placed | Self::Packed | Self::Shipped)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placed => write!(f, "placed"),
            Self::Packed => write!(f, "packed"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment state attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Notification kind, discriminating the follow-up action the UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// An order changed status; links to order tracking.
    OrderStatus,
    /// The store asks for a product rating; links to the review form.
    RatingRequest,
    /// Anything else; rendered without a follow-up action.
    #[default]
    #[serde(other)]
    General,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serde() {
        let json = serde_json::to_string(&OrderStatus::Packed).unwrap();
        assert_eq!(json, "\"packed\"");

        let parsed: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, OrderStatus::Delivered);
    }

    #[test]
    fn test_order_status_is_open() {
        assert!(OrderStatus::Placed.is_open());
        assert!(OrderStatus::Shipped.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_notification_kind_known_values() {
        let parsed: NotificationKind = serde_json::from_str("\"order-status\"").unwrap();
        assert_eq!(parsed, NotificationKind::OrderStatus);

        let parsed: NotificationKind = serde_json::from_str("\"rating-request\"").unwrap();
        assert_eq!(parsed, NotificationKind::RatingRequest);
    }

    #[test]
    fn test_notification_kind_unknown_falls_back() {
        // Server may introduce new kinds; the client degrades to General
        let parsed: NotificationKind = serde_json::from_str("\"promo-blast\"").unwrap();
        assert_eq!(parsed, NotificationKind::General);
    }
}
