//! Storefront API gateway and typed endpoint wrappers.
//!
//! # Architecture
//!
//! Every outbound request to the backend passes through [`ApiClient::send`]:
//! a bearer token is attached when one is stored, and a 401 triggers exactly
//! one refresh-and-retry before the failure is surfaced. The gateway is the
//! only component allowed to force a logout as an error side effect; all
//! other errors stay local to the caller.
//!
//! Endpoint wrappers live in sibling modules:
//!
//! - `auth` - login, OTP, token revocation
//! - `catalog` - categories and products (cached, 5 minute TTL)
//! - `orders` - checkout initiation, order placement and tracking
//! - `notifications` - notification fetch/read/delete calls
//!
//! # Example
//!
//! ```rust,ignore
//! use greenbasket_client::api::ApiClient;
//!
//! let client = ApiClient::new(&config, session.clone());
//!
//! let credentials = client.login(&email, &password).await?;
//! session.login(credentials)?;
//!
//! let categories = client.categories().await?;
//! ```

mod auth;
mod catalog;
mod notifications;
mod orders;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::session::{LogoutReason, SessionManager};
use catalog::CacheValue;
use types::{RefreshRequest, RefreshResponse};

/// Endpoint paths, relative to the configured API base URL.
pub(crate) mod paths {
    pub const LOGIN: &str = "login/";
    pub const OTP_REQUEST: &str = "otp-request/";
    pub const OTP_VERIFY: &str = "otp-verify/";
    pub const TOKEN_REFRESH: &str = "token/refresh/";
    pub const LOGOUT: &str = "logout/";
    pub const CATEGORIES: &str = "categories/";
    pub const CHECKOUT_INITIATE: &str = "checkout-initiate/";
    pub const ORDER_PLACE: &str = "order-place/";
}

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The request was not authorized, even after the refresh-and-retry
    /// policy ran its course.
    #[error("not authorized")]
    Unauthorized,

    /// The refresh endpoint rejected the refresh token.
    #[error("token refresh rejected: {0}")]
    RefreshRejected(String),

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint path did not join onto the base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

// =============================================================================
// ApiClient
// =============================================================================

/// The single outbound gateway to the storefront API.
///
/// Cheaply cloneable via `Arc`. Holds the session manager so the request
/// pipeline can read tokens, persist refreshed ones, and force a logout when
/// a refresh fails.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionManager,
    catalog_cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Catalog cache TTL.
    const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ClientConfig, session: SessionManager) -> Self {
        let catalog_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Self::CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: config.api_base_url.clone(),
                session,
                catalog_cache,
            }),
        }
    }

    /// The session manager this gateway reads tokens from.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Send a request through the authenticated pipeline.
    ///
    /// Attaches the stored access token as a bearer credential when present.
    /// On a 401, performs at most one refresh-and-retry; a second 401
    /// propagates as [`ApiError::Unauthorized`].
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut retried = false;

        loop {
            let mut request = self.inner.http.request(method.clone(), url.clone());
            if let Some(token) = self.inner.session.access_token() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                tracing::debug!(%url, "401 received, attempting token refresh");
                self.refresh_access_token().await?;
                continue;
            }

            if !status.is_success() {
                if status == StatusCode::UNAUTHORIZED {
                    return Err(ApiError::Unauthorized);
                }
                let body_text = response.text().await.unwrap_or_default();
                tracing::error!(
                    %url,
                    status = %status,
                    body = %body_text.chars().take(500).collect::<String>(),
                    "API returned non-success status"
                );
                return Err(ApiError::Status {
                    status,
                    body: body_text.chars().take(200).collect(),
                });
            }

            // Read the body as text first for better error diagnostics
            let response_text = response.text().await?;
            return serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    %url,
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse API response"
                );
                ApiError::Parse(e)
            });
        }
    }

    /// GET `path` and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, None).await
    }

    /// POST `body` to `path` and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(&body)).await
    }

    /// PUT to `path` with no body and decode the JSON response.
    pub(crate) async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::PUT, path, None).await
    }

    /// DELETE `path` and decode the JSON response.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None).await
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Forces a logout and propagates the failure when the refresh token is
    /// absent or the exchange fails. The refresh call itself bypasses the
    /// authenticated pipeline - it must never recurse into retry logic.
    async fn refresh_access_token(&self) -> Result<(), ApiError> {
        let Some(refresh) = self.inner.session.refresh_token() else {
            tracing::warn!("401 with no stored refresh token, forcing logout");
            self.inner.session.logout(LogoutReason::MissingRefreshToken);
            return Err(ApiError::Unauthorized);
        };

        let result = self.exchange_refresh_token(refresh).await;

        match result {
            Ok(response) => {
                self.inner.session.update_access_token(&response.access);
                tracing::debug!("access token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, forcing logout");
                self.inner.session.logout(LogoutReason::RefreshFailed);
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh: String) -> Result<RefreshResponse, ApiError> {
        let url = self.inner.base_url.join(paths::TOKEN_REFRESH)?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RefreshRejected(format!(
                "{status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.json().await?)
    }
}
