//! Integration tests for session restore and the login exchange.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use greenbasket_core::{CustomerId, Email};
use greenbasket_client::session::SessionManager;
use greenbasket_client::session::store::{FileStore, SessionStore, keys};
use greenbasket_integration_tests::{
    DEFAULT_CUSTOMER, TestHarness, jwt_expiring_at, long_lived_refresh_token,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("greenbasket-it-{tag}-{}-{nanos}", std::process::id()))
}

#[tokio::test]
async fn test_login_exchange_then_authenticated_call() {
    let harness = TestHarness::spawn().await;

    let email = Email::parse("asha@example.com").unwrap();
    let password = SecretString::from("a-strong-password".to_string());

    let credentials = harness.client.login(&email, &password).await.unwrap();
    assert_eq!(credentials.user.id, CustomerId::new(DEFAULT_CUSTOMER));

    harness.session.login(credentials).unwrap();
    assert!(harness.session.is_logged_in());

    let orders = harness
        .client
        .orders(CustomerId::new(DEFAULT_CUSTOMER))
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_session_restores_across_restart() {
    let dir = unique_temp_dir("restore");

    // First "run": log in with a file-backed store
    {
        let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(&dir).unwrap());
        let session = SessionManager::new(store);
        session
            .login(serde_json::from_value(serde_json::json!({
                "access": "access-1",
                "refresh": long_lived_refresh_token(),
                "user": { "id": DEFAULT_CUSTOMER, "name": "Asha" },
            })).unwrap())
            .unwrap();
    }

    // Second "run": a fresh manager over the same directory restores
    let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(&dir).unwrap());
    let session = SessionManager::new(store);
    assert!(session.restore_on_startup());
    assert!(session.is_logged_in());
    assert_eq!(
        session.current_user().unwrap().id,
        CustomerId::new(DEFAULT_CUSTOMER)
    );

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_expired_stored_refresh_token_is_not_restored() {
    let dir = unique_temp_dir("expired");

    let store = FileStore::open(&dir).unwrap();
    store.set(keys::ACCESS, "stale-access");
    store.set(keys::REFRESH, &jwt_expiring_at(1_000));
    store.set(keys::USER, r#"{"id":7}"#);

    let session = SessionManager::new(Arc::new(store));
    assert!(!session.restore_on_startup());
    assert!(!session.is_logged_in());
    assert!(session.access_token().is_none());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_undecodable_stored_refresh_token_is_not_restored() {
    let dir = unique_temp_dir("garbage");

    let store = FileStore::open(&dir).unwrap();
    store.set(keys::REFRESH, "not-a-jwt-at-all");
    store.set(keys::USER, r#"{"id":7}"#);

    let session = SessionManager::new(Arc::new(store));
    assert!(!session.restore_on_startup());
    assert!(!session.is_logged_in());

    let _ = std::fs::remove_dir_all(dir);
}
