//! GreenBasket storefront client SDK.
//!
//! All business logic (stock, pricing, orders, payments, credential issuance)
//! lives in the remote backend; this crate owns the client-side half: session
//! state, the authenticated request pipeline, the local cart, and the checkout
//! reconciliation that hands authority back to the server.
//!
//! # Architecture
//!
//! - [`session`] - persistent session store, lifecycle manager, refresh-expiry
//!   watcher
//! - [`api`] - the single outbound HTTP gateway (bearer attach, one
//!   refresh-and-retry on 401) plus typed endpoint wrappers
//! - [`cart`] - client-side cart, persisted, advisory until checkout
//! - [`checkout`] - one-shot reconciliation replacing the local cart with the
//!   server's reserved line items
//! - [`notifications`] - polled notification feed with optimistic read state
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use greenbasket_client::api::ApiClient;
//! use greenbasket_client::cart::Cart;
//! use greenbasket_client::config::ClientConfig;
//! use greenbasket_client::session::store::{FileStore, SessionStore};
//! use greenbasket_client::session::SessionManager;
//!
//! let config = ClientConfig::from_env()?;
//! let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(&config.session_dir)?);
//! let session = SessionManager::new(Arc::clone(&store));
//! session.restore_on_startup();
//!
//! let client = ApiClient::new(&config, session.clone());
//! let cart = Cart::load(store);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod notifications;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use cart::{Cart, CartError};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutState, CheckoutWarning};
pub use config::{ClientConfig, ConfigError};
pub use notifications::{NotificationFeed, PollerGuard};
pub use session::{LogoutReason, SessionEvent, SessionManager};
