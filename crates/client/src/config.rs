//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GREENBASKET_API_BASE_URL` - Base URL of the storefront REST API
//!
//! ## Optional
//! - `GREENBASKET_SESSION_DIR` - Directory for persisted session/cart state
//!   (default: `.greenbasket`)
//! - `GREENBASKET_POLL_SECS` - Notification poll interval in seconds
//!   (default: 60)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_SESSION_DIR: &str = ".greenbasket";
const DEFAULT_POLL_SECS: &str = "60";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront API. Always carries a trailing slash so
    /// relative endpoint paths join underneath it.
    pub api_base_url: Url,
    /// Directory holding the persisted session store.
    pub session_dir: PathBuf,
    /// How often the notification poller asks for unread notifications.
    pub notification_poll_interval: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "GREENBASKET_API_BASE_URL",
            &get_required_env("GREENBASKET_API_BASE_URL")?,
        )?;

        let session_dir =
            PathBuf::from(get_env_or_default("GREENBASKET_SESSION_DIR", DEFAULT_SESSION_DIR));

        let poll_secs = get_env_or_default("GREENBASKET_POLL_SECS", DEFAULT_POLL_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("GREENBASKET_POLL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_base_url,
            session_dir,
            notification_poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

/// Parse and normalize the API base URL.
///
/// The URL must be absolute http(s). A trailing slash is appended when absent
/// so `Url::join` keeps the full base path.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
