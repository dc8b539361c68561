//! Integration tests for the authenticated request pipeline.
//!
//! Exercises the gateway against the in-process mock backend: bearer attach,
//! the single refresh-and-retry on 401, and the forced-logout failure paths.

#![allow(clippy::unwrap_used)]

use greenbasket_core::CustomerId;
use greenbasket_client::api::ApiError;
use greenbasket_client::session::store::{SessionStore, keys};
use greenbasket_client::session::{LogoutReason, SessionEvent};
use greenbasket_integration_tests::{
    DEFAULT_CUSTOMER, INITIAL_ACCESS, REFRESHED_ACCESS, RefreshBehavior, TestHarness,
};

fn customer() -> CustomerId {
    CustomerId::new(DEFAULT_CUSTOMER)
}

#[tokio::test]
async fn test_authenticated_call_attaches_bearer_token() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    let orders = harness.client.orders(customer()).await.unwrap();
    assert!(orders.is_empty());

    let state = harness.api.state();
    assert_eq!(
        state.auth_headers,
        vec![Some(format!("Bearer {INITIAL_ACCESS}"))]
    );
}

#[tokio::test]
async fn test_token_attach_is_idempotent() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    harness.client.orders(customer()).await.unwrap();
    harness.client.orders(customer()).await.unwrap();

    let state = harness.api.state();
    assert_eq!(state.auth_headers.len(), 2);
    assert_eq!(state.auth_headers[0], state.auth_headers[1]);
    assert_eq!(
        state.auth_headers[0],
        Some(format!("Bearer {INITIAL_ACCESS}"))
    );
}

#[tokio::test]
async fn test_unauthenticated_call_sends_no_authorization_header() {
    let harness = TestHarness::spawn().await;
    // No login: the request goes out bare and the 401 cannot be refreshed

    let result = harness.client.orders(customer()).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));

    let state = harness.api.state();
    assert_eq!(state.auth_headers, vec![None]);
    assert_eq!(state.refresh_calls, 0);
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_retried_transparently() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    // Server stops accepting the original access token
    harness
        .api
        .state()
        .valid_tokens
        .remove(INITIAL_ACCESS);

    // The caller sees a plain success; the refresh happened underneath
    let orders = harness.client.orders(customer()).await.unwrap();
    assert!(orders.is_empty());

    let state = harness.api.state();
    assert_eq!(state.refresh_calls, 1);
    assert_eq!(state.protected_calls, 2);
    drop(state);

    // The new access token is persisted under the `access` key
    assert_eq!(
        harness.store.get(keys::ACCESS),
        Some(REFRESHED_ACCESS.to_string())
    );
    assert!(harness.session.is_logged_in());
}

#[tokio::test]
async fn test_at_most_one_refresh_and_retry_per_request() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    // Refresh "succeeds" but the issued token is never accepted, so the
    // retried request 401s again - that second 401 must propagate
    {
        let mut state = harness.api.state();
        state.valid_tokens.remove(INITIAL_ACCESS);
        state.refresh_behavior = RefreshBehavior::IssueInvalid(REFRESHED_ACCESS.to_string());
    }

    let result = harness.client.orders(customer()).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));

    let state = harness.api.state();
    assert_eq!(state.refresh_calls, 1, "exactly one refresh call");
    assert_eq!(state.protected_calls, 2, "original request plus one retry");
}

#[tokio::test]
async fn test_missing_refresh_token_forces_logout_and_propagates_401() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    // Invalidate the access token and drop the refresh token from the store
    harness.api.state().valid_tokens.remove(INITIAL_ACCESS);
    harness.store.remove(keys::REFRESH);

    let events = harness.session.subscribe();
    let result = harness.client.orders(customer()).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(harness.api.state().refresh_calls, 0);
    assert!(!harness.session.is_logged_in());
    assert!(matches!(
        *events.borrow(),
        SessionEvent::LoggedOut {
            reason: LogoutReason::MissingRefreshToken
        }
    ));
}

#[tokio::test]
async fn test_rejected_refresh_forces_logout_and_clears_store() {
    let harness = TestHarness::spawn().await;
    harness.login_as_default_user();

    {
        let mut state = harness.api.state();
        state.valid_tokens.remove(INITIAL_ACCESS);
        state.refresh_behavior = RefreshBehavior::Reject;
    }

    let events = harness.session.subscribe();
    let result = harness.client.orders(customer()).await;

    assert!(matches!(result, Err(ApiError::RefreshRejected(_))));
    assert!(!harness.session.is_logged_in());
    assert_eq!(harness.store.get(keys::ACCESS), None);
    assert_eq!(harness.store.get(keys::REFRESH), None);
    assert_eq!(harness.store.get(keys::USER), None);
    assert!(matches!(
        *events.borrow(),
        SessionEvent::LoggedOut {
            reason: LogoutReason::RefreshFailed
        }
    ));
}
