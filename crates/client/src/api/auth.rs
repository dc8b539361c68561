//! Authentication exchange endpoints.
//!
//! These calls produce issued credentials; installing them as the active
//! session is the session manager's job, not this module's.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use greenbasket_core::Email;

use super::{ApiClient, ApiError, paths};
use super::types::{Ack, IssuedCredentials};

impl ApiClient {
    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IssuedCredentials, ApiError> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.post(paths::LOGIN, &body).await
    }

    /// Request a one-time passcode for a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn request_otp(&self, phone: &str) -> Result<Ack, ApiError> {
        let body = serde_json::json!({ "phone": phone });
        self.post(paths::OTP_REQUEST, &body).await
    }

    /// Exchange a one-time passcode for credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is rejected or the request fails.
    #[instrument(skip(self, code))]
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<IssuedCredentials, ApiError> {
        let body = serde_json::json!({ "phone": phone, "code": code });
        self.post(paths::OTP_VERIFY, &body).await
    }

    /// Revoke a refresh token server-side.
    ///
    /// Called best-effort on explicit logout; local session teardown never
    /// waits on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, refresh))]
    pub async fn revoke(&self, refresh: &str) -> Result<Ack, ApiError> {
        let body = serde_json::json!({ "refresh": refresh });
        self.post(paths::LOGOUT, &body).await
    }
}
