//! Refresh-token expiry decoding.
//!
//! The backend issues JWTs; the client only needs the embedded `exp` claim to
//! schedule the expiry watcher. The signature is the server's business and is
//! never verified here. A token that cannot be decoded is reported as expired
//! now, so corrupted credentials always fail closed.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when decoding a token's expiry.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is not three dot-separated base64url segments.
    #[error("token is not a well-formed JWT")]
    Malformed,
    /// The payload decoded but carries no usable `exp` claim.
    #[error("token payload has no expiry claim")]
    MissingExpiry,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Decode the expiry instant embedded in a JWT.
///
/// # Errors
///
/// Returns an error if the token is malformed or carries no `exp` claim.
pub fn expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;
    let exp = claims.exp.ok_or(TokenError::MissingExpiry)?;
    DateTime::from_timestamp(exp, 0).ok_or(TokenError::MissingExpiry)
}

/// Whether the token is expired at `now`.
///
/// An undecodable token counts as expired.
#[must_use]
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    expiry(token).map_or(true, |exp| exp <= now)
}

/// Whether the token is expired right now. Undecodable tokens count as expired.
#[must_use]
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}
