//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notifications;
pub mod orders;

use greenbasket_client::api::ApiClient;
use greenbasket_client::cart::Cart;
use greenbasket_client::session::SessionManager;

/// Shared handles every command works against.
pub struct Context {
    pub client: ApiClient,
    pub session: SessionManager,
    pub cart: Cart,
}

/// Result alias for command functions.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
