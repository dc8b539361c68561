//! Integration test support for GreenBasket.
//!
//! Spins up an in-process mock of the storefront backend on an ephemeral port
//! and wires a real client stack (store, session manager, gateway, cart)
//! against it. Every test runs self-contained; no external services.
//!
//! # Example
//!
//! ```rust,ignore
//! let harness = TestHarness::spawn().await;
//! harness.login_as_default_user();
//!
//! let orders = harness.client.orders(CustomerId::new(7)).await?;
//! assert!(orders.is_empty());
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use url::Url;

use greenbasket_client::api::ApiClient;
use greenbasket_client::api::types::IssuedCredentials;
use greenbasket_client::cart::Cart;
use greenbasket_client::config::ClientConfig;
use greenbasket_client::session::SessionManager;
use greenbasket_client::session::store::{MemoryStore, SessionStore};

/// The access token the mock issues at login.
pub const INITIAL_ACCESS: &str = "access-1";

/// The access token the mock issues on refresh.
pub const REFRESHED_ACCESS: &str = "access-2";

/// Customer ID of the default test user.
pub const DEFAULT_CUSTOMER: i32 = 7;

/// Build an unsigned JWT whose payload carries the given expiry.
#[must_use]
pub fn jwt_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({ "exp": exp })).expect("claims serialize"),
    );
    format!("{header}.{body}.sig")
}

/// A refresh token that stays valid for the whole test run.
#[must_use]
pub fn long_lived_refresh_token() -> String {
    jwt_expiring_at(chrono::Utc::now().timestamp() + 3600)
}

// =============================================================================
// Mock backend state
// =============================================================================

/// How the mock answers `POST token/refresh/`.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// Issue this access token (and start accepting it).
    Issue(String),
    /// Issue this access token but keep rejecting it on protected routes.
    IssueInvalid(String),
    /// Answer 401.
    Reject,
}

/// How the mock answers `POST checkout-initiate/`.
#[derive(Debug, Clone)]
pub enum CheckoutBehavior {
    /// Answer 200 with this body.
    Respond(Value),
    /// Answer 500.
    ServerError,
}

/// Mutable mock-backend state, shared with the handlers.
pub struct MockState {
    /// Access tokens accepted on protected routes.
    pub valid_tokens: HashSet<String>,
    pub refresh_behavior: RefreshBehavior,
    pub refresh_calls: u32,
    /// Calls to protected routes (orders list), including rejected ones.
    pub protected_calls: u32,
    /// Authorization header of every protected-route call, in order.
    pub auth_headers: Vec<Option<String>>,
    pub checkout_behavior: CheckoutBehavior,
    pub checkout_calls: u32,
    pub place_order_calls: u32,
    /// Notifications as raw wire objects.
    pub notifications: Vec<Value>,
    pub notification_fetches: u32,
    /// When set, every notification mutation answers 500.
    pub fail_notification_mutations: bool,
}

impl Default for MockState {
    fn default() -> Self {
        let mut valid_tokens = HashSet::new();
        valid_tokens.insert(INITIAL_ACCESS.to_string());
        Self {
            valid_tokens,
            refresh_behavior: RefreshBehavior::Issue(REFRESHED_ACCESS.to_string()),
            refresh_calls: 0,
            protected_calls: 0,
            auth_headers: Vec::new(),
            checkout_behavior: CheckoutBehavior::Respond(
                json!({ "status": true, "reserved_items": [] }),
            ),
            checkout_calls: 0,
            place_order_calls: 0,
            notifications: Vec::new(),
            notification_fetches: 0,
            fail_notification_mutations: false,
        }
    }
}

type Shared = Arc<Mutex<MockState>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    bearer(headers).is_some_and(|token| state.valid_tokens.contains(&token))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "unauthorized" })),
    )
}

fn unread_total(notifications: &[Value]) -> usize {
    notifications
        .iter()
        .filter(|n| n["isRead"] != json!(true))
        .count()
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "access": INITIAL_ACCESS,
            "refresh": long_lived_refresh_token(),
            "user": { "id": DEFAULT_CUSTOMER, "name": "Asha", "email": "asha@example.com" },
        })),
    )
}

async fn refresh(State(api): State<Shared>, Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    state.refresh_calls += 1;
    match state.refresh_behavior.clone() {
        RefreshBehavior::Issue(access) => {
            state.valid_tokens.insert(access.clone());
            (StatusCode::OK, Json(json!({ "access": access })))
        }
        RefreshBehavior::IssueInvalid(access) => {
            (StatusCode::OK, Json(json!({ "access": access })))
        }
        RefreshBehavior::Reject => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "token invalid or expired" })),
        ),
    }
}

async fn revoke(Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn list_orders(
    State(api): State<Shared>,
    Path(_customer_id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    state.protected_calls += 1;
    state
        .auth_headers
        .push(headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_owned));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!([])))
}

async fn checkout_initiate(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    state.checkout_calls += 1;
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    match state.checkout_behavior.clone() {
        CheckoutBehavior::Respond(body) => (StatusCode::OK, Json(body)),
        CheckoutBehavior::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "reservation backend unavailable" })),
        ),
    }
}

async fn place_order(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    state.place_order_calls += 1;
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({ "status": true, "order_id": 501 })),
    )
}

async fn notifications_list(
    State(api): State<Shared>,
    Path(_customer_id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    state.notification_fetches += 1;
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let data = state.notifications.clone();
    let total = unread_total(&data);
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data, "total": total })),
    )
}

async fn notifications_read_all(
    State(api): State<Shared>,
    Path(_customer_id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_notification_mutations {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "unavailable" })),
        );
    }
    for notification in &mut state.notifications {
        notification["isRead"] = json!(true);
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn notifications_read_one(
    State(api): State<Shared>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_notification_mutations {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "unavailable" })),
        );
    }
    for notification in &mut state.notifications {
        if notification["id"] == json!(id) {
            notification["isRead"] = json!(true);
        }
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn notifications_delete_one(
    State(api): State<Shared>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_notification_mutations {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "unavailable" })),
        );
    }
    state.notifications.retain(|n| n["id"] != json!(id));
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn notifications_clear(
    State(api): State<Shared>,
    Path(_customer_id): Path<i32>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = api.lock().expect("mock state lock");
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.fail_notification_mutations {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "unavailable" })),
        );
    }
    state.notifications.clear();
    (StatusCode::OK, Json(json!({ "success": true })))
}

// =============================================================================
// Harness
// =============================================================================

/// A running mock backend.
pub struct MockApi {
    /// Base URL of the mock, with trailing slash.
    pub base_url: String,
    state: Shared,
}

impl MockApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/login/", post(login))
            .route("/token/refresh/", post(refresh))
            .route("/logout/", post(revoke))
            .route("/orders/{customer_id}/", get(list_orders))
            .route("/checkout-initiate/", post(checkout_initiate))
            .route("/order-place/", post(place_order))
            .route("/customer-notifications/{customer_id}/", get(notifications_list))
            .route("/readnotifications/all/{customer_id}/", put(notifications_read_all))
            .route("/readnotifications/{id}/", put(notifications_read_one))
            .route("/notification/{id}/", delete(notifications_delete_one))
            .route("/notifications/clear/{customer_id}/", delete(notifications_clear))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock local addr");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
        }
    }

    /// Lock the mock state for inspection or reconfiguration.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock")
    }
}

/// A real client stack wired against a [`MockApi`].
pub struct TestHarness {
    pub api: MockApi,
    pub store: Arc<dyn SessionStore>,
    pub session: SessionManager,
    pub client: ApiClient,
    pub cart: Cart,
}

impl TestHarness {
    /// Spawn a mock backend and build the client stack over an in-memory
    /// store.
    pub async fn spawn() -> Self {
        let api = MockApi::spawn().await;

        let config = ClientConfig {
            api_base_url: Url::parse(&api.base_url).expect("mock base url"),
            session_dir: std::env::temp_dir(),
            notification_poll_interval: Duration::from_secs(60),
        };

        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let session = SessionManager::new(Arc::clone(&store));
        let client = ApiClient::new(&config, session.clone());
        let cart = Cart::load(Arc::clone(&store));

        Self {
            api,
            store,
            session,
            client,
            cart,
        }
    }

    /// Install the default test user's session locally, as a completed login
    /// exchange would.
    ///
    /// # Panics
    ///
    /// Panics if the credentials cannot be installed.
    pub fn login_as_default_user(&self) {
        let credentials: IssuedCredentials = serde_json::from_value(json!({
            "access": INITIAL_ACCESS,
            "refresh": long_lived_refresh_token(),
            "user": { "id": DEFAULT_CUSTOMER, "name": "Asha" },
        }))
        .expect("test credentials");
        self.session.login(credentials).expect("install session");
    }
}
