//! Integration tests for the checkout reconciliation flow.
//!
//! The cart must be replaced wholesale by the server's reserved items on
//! success, and left byte-identical on every failure path.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use greenbasket_core::ProductId;
use greenbasket_client::api::types::CartLine;
use greenbasket_client::checkout::{CheckoutError, CheckoutFlow, CheckoutState, CheckoutWarning};
use greenbasket_client::session::store::{SessionStore, keys};
use greenbasket_integration_tests::{CheckoutBehavior, TestHarness};

/// Seed the local cart with one line of product 1, qty 3.
fn seed_cart(harness: &TestHarness) {
    harness.cart.set_all(vec![CartLine {
        product_id: ProductId::new(1),
        qty: 3,
        product_name: "Oat milk".to_string(),
        price: serde_json::from_value(json!("4.50")).unwrap(),
        offer_price: None,
        product_image: None,
        known_stock: Some(10),
    }]);
}

fn reservation_with_reduced_quantity() -> CheckoutBehavior {
    CheckoutBehavior::Respond(json!({
        "status": true,
        "updated_items": [
            { "product_id": 1, "product_name": "Oat milk", "requested_qty": 3, "qty": 2 }
        ],
        "reserved_items": [
            { "product_id": 1, "qty": 2, "product_name": "Oat milk", "price": "4.50" }
        ],
    }))
}

#[tokio::test]
async fn test_reconcile_replaces_cart_with_reserved_items_and_warns() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);
    harness.api.state().checkout_behavior = reservation_with_reduced_quantity();

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let reconciliation = flow.reconcile().await.unwrap();

    assert_eq!(flow.state(), CheckoutState::Reconciled);

    // Exactly one line for product 1 with the server's quantity
    let lines = harness.cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id, ProductId::new(1));
    assert_eq!(lines[0].qty, 2);

    // A quantities-reduced warning was raised
    assert!(reconciliation.warnings.iter().any(|w| matches!(
        w,
        CheckoutWarning::QuantityReduced {
            requested: 3,
            reserved: 2,
            ..
        }
    )));
}

#[tokio::test]
async fn test_reconcile_warns_even_when_server_omits_updated_items() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);
    harness.api.state().checkout_behavior = CheckoutBehavior::Respond(json!({
        "status": true,
        "reserved_items": [
            { "product_id": 1, "qty": 2, "product_name": "Oat milk", "price": "4.50" }
        ],
    }));

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let reconciliation = flow.reconcile().await.unwrap();

    assert_eq!(reconciliation.warnings.len(), 1);
    assert!(matches!(
        reconciliation.warnings[0],
        CheckoutWarning::QuantityReduced { .. }
    ));
}

#[tokio::test]
async fn test_rejected_checkout_leaves_cart_byte_identical() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);
    harness.api.state().checkout_behavior = CheckoutBehavior::Respond(json!({
        "status": false,
        "message": "store is closed for deliveries",
    }));

    let before = harness.store.get(keys::CART).unwrap();

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let result = flow.reconcile().await;

    assert!(matches!(result, Err(CheckoutError::Rejected(ref m)) if m.contains("closed")));
    assert_eq!(flow.state(), CheckoutState::Rejected);
    assert_eq!(harness.store.get(keys::CART).unwrap(), before);
}

#[tokio::test]
async fn test_server_error_leaves_cart_byte_identical() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);
    harness.api.state().checkout_behavior = CheckoutBehavior::ServerError;

    let before = harness.store.get(keys::CART).unwrap();

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let result = flow.reconcile().await;

    assert!(matches!(result, Err(CheckoutError::Api(_))));
    assert_eq!(flow.state(), CheckoutState::Failed);
    assert_eq!(harness.store.get(keys::CART).unwrap(), before);
}

#[tokio::test]
async fn test_reconcile_without_access_token_never_contacts_server() {
    let harness = TestHarness::spawn().await;
    // Not signed in
    seed_cart(&harness);

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let result = flow.reconcile().await;

    assert!(matches!(result, Err(CheckoutError::NotAuthenticated)));
    assert_eq!(harness.api.state().checkout_calls, 0);
}

#[tokio::test]
async fn test_reconcile_rejects_empty_cart_locally() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let result = flow.reconcile().await;

    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    assert_eq!(harness.api.state().checkout_calls, 0);
}

#[tokio::test]
async fn test_place_order_requires_reconciliation_first() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    let result = flow.place_order().await;

    assert!(matches!(result, Err(CheckoutError::NotReconciled)));
    assert_eq!(harness.api.state().place_order_calls, 0);
}

#[tokio::test]
async fn test_place_order_clears_cart() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();
    seed_cart(&harness);
    harness.api.state().checkout_behavior = reservation_with_reduced_quantity();

    let mut flow = CheckoutFlow::new(harness.client.clone(), harness.cart.clone());
    flow.reconcile().await.unwrap();
    let order_id = flow.place_order().await.unwrap();

    assert_eq!(order_id.as_i32(), 501);
    assert!(harness.cart.is_empty());
    assert_eq!(flow.state(), CheckoutState::Idle);
}
