//! Authentication session state.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Seconds of slack before a token's expiry at which it is treated as expired.
const EXPIRY_SLACK_SECS: i64 = 30;

/// The outcome of authentication.
///
/// Owned by [`crate::AuthProvider`]; callers receive snapshots.
#[derive(Clone, Default)]
pub struct AuthSession {
    /// Whether a handshake succeeded (or the method needs none).
    pub authenticated: bool,
    token: Option<String>,
    refresh_token: Option<String>,
    /// When the bearer token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.authenticated)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AuthSession {
    /// The bearer token, if one was issued.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The OAuth refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns true if a bearer token is held.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Returns true if the token expires within the next 30 seconds.
    ///
    /// A session without a known expiry never expires.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) >= expires_at,
            None => false,
        }
    }

    pub(crate) fn set_token(
        &mut self,
        token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.token = Some(token);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = expires_at;
        self.authenticated = true;
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// Returns None for opaque tokens or tokens without an expiry. The server
/// remains responsible for validating signatures.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}
