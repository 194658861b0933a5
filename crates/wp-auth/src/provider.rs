//! Per-request authentication headers and the initial handshake.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, Utc};
use tracing::{debug, instrument, warn};

use wp_api_client::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use wp_api_client::{Authorizer, Error, ErrorKind, Result, WpHttpClient};

use crate::config::{AuthConfig, AuthMethod};
use crate::oauth::TokenResponse;
use crate::session::{token_expiry, AuthSession};

const X_WP_NONCE: HeaderName = HeaderName::from_static("x-wp-nonce");
const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
const X_API_SECRET: HeaderName = HeaderName::from_static("x-api-secret");

/// Applies one authentication method to every request.
///
/// Share it with the executor through [`WpHttpClient::with_authorizer`].
#[derive(Debug)]
pub struct AuthProvider {
    config: AuthConfig,
    session: RwLock<AuthSession>,
}

impl AuthProvider {
    /// Create a provider for the given configuration.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            session: RwLock::new(AuthSession::default()),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The active method.
    pub fn method(&self) -> AuthMethod {
        self.config.method()
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> AuthSession {
        self.read_session().clone()
    }

    /// Returns true once a handshake has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.read_session().authenticated
    }

    /// Run the handshake for the configured method.
    ///
    /// - Application password: `GET users/me` must succeed.
    /// - JWT: credentials are exchanged for a token at the JWT plugin.
    /// - Cookie: only checks a nonce is configured; the session stays
    ///   unauthenticated until a real request proves it.
    /// - API key: nothing to do.
    /// - OAuth: succeeds once a token is installed or configured.
    #[instrument(skip(self, http), fields(method = %self.method()))]
    pub async fn authenticate(&self, http: &WpHttpClient) -> Result<AuthSession> {
        match &self.config {
            AuthConfig::ApplicationPassword { .. } => {
                self.config.validate()?;
                http.execute(http.get("users/me"))
                    .await
                    .map_err(|e| handshake_failure("Basic authentication failed", e))?;
                self.write_session().authenticated = true;
                debug!("Basic/Application Password authentication successful");
            }
            AuthConfig::Jwt {
                username, password, ..
            } => {
                self.config.validate()?;
                let url = format!("{}/token", http.config().jwt_root());
                let body = serde_json::json!({
                    "username": username,
                    "password": password,
                });

                // A stale bearer token must not reach the token endpoint.
                let request = http
                    .post(url)
                    .json_value(body)
                    .without_header(AUTHORIZATION.as_str());

                let response = http
                    .execute(request)
                    .await
                    .map_err(|e| handshake_failure("JWT authentication failed", e))?;

                let token = response
                    .as_json()
                    .and_then(|v| v.get("token"))
                    .and_then(|v| v.as_str())
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        Error::authentication("JWT authentication failed: response did not contain a token")
                    })?
                    .to_string();

                let expires_at = token_expiry(&token);
                self.write_session().set_token(token, None, expires_at);
                debug!(expires_at = ?expires_at, "JWT authentication successful");
            }
            AuthConfig::Cookie { .. } => {
                self.config.validate()?;
                debug!("Cookie authentication configured");
            }
            AuthConfig::ApiKey { .. } => {
                self.write_session().authenticated = true;
            }
            AuthConfig::OAuth(oauth) => {
                oauth.validate()?;
                let mut session = self.write_session();
                if !session.has_token() {
                    let Some(token) = oauth.access_token() else {
                        return Err(Error::config(
                            "OAuth authorization has not completed; exchange an authorization code or configure an access token",
                        ));
                    };
                    session.set_token(
                        token.to_string(),
                        oauth.refresh_token().map(str::to_string),
                        token_expiry(token),
                    );
                }
                session.authenticated = true;
                debug!("OAuth authentication successful");
            }
        }

        Ok(self.session())
    }

    /// Store a token obtained through the OAuth flow.
    pub fn install_token(&self, token: &TokenResponse) {
        let expires_at = token
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs))
            .or_else(|| token_expiry(&token.access_token));

        self.write_session().set_token(
            token.access_token.clone(),
            token.refresh_token.clone(),
            expires_at,
        );
        debug!(expires_at = ?expires_at, "Token installed");
    }

    /// Forget the session so the next handshake starts from nothing.
    pub fn reset(&self) {
        *self.write_session() = AuthSession::default();
    }

    fn read_session(&self) -> RwLockReadGuard<'_, AuthSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, AuthSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.read_session().token() {
            return Some(token.to_string());
        }
        match &self.config {
            AuthConfig::OAuth(oauth) => oauth.access_token().map(str::to_string),
            _ => None,
        }
    }
}

impl Authorizer for AuthProvider {
    fn add_headers(&self, headers: &mut HeaderMap) {
        match &self.config {
            AuthConfig::ApplicationPassword {
                username: Some(username),
                password: Some(password),
            } => {
                let credentials = STANDARD.encode(format!("{}:{}", username, password));
                insert_sensitive(headers, AUTHORIZATION, &format!("Basic {}", credentials));
            }
            AuthConfig::ApplicationPassword { .. } => {}
            AuthConfig::Jwt { .. } | AuthConfig::OAuth(_) => {
                if let Some(token) = self.bearer_token() {
                    insert_sensitive(headers, AUTHORIZATION, &format!("Bearer {}", token));
                }
            }
            AuthConfig::Cookie { nonce } => {
                if let Some(nonce) = nonce {
                    insert_sensitive(headers, X_WP_NONCE, nonce);
                }
            }
            AuthConfig::ApiKey { key, secret } => {
                if let Some(key) = key {
                    insert_sensitive(headers, X_API_KEY, key);
                    if let Some(secret) = secret {
                        insert_sensitive(headers, X_API_SECRET, secret);
                    }
                }
            }
        }
    }
}

fn insert_sensitive(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "Skipping credential that is not a valid header value"),
    }
}

/// Wrap a failed handshake request as an authentication error.
fn handshake_failure(context: &str, err: Error) -> Error {
    let kind = ErrorKind::Authentication {
        status: err.status(),
        message: format!("{}: {}", context, err),
    };
    Error::with_source(kind, err)
}
