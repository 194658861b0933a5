//! OAuth 2.0 hooks.
//!
//! The interactive part of the flow (sending the user to the authorize page
//! and receiving the callback) belongs to the application. This module builds
//! the authorize URL with PKCE and performs the token requests against
//! `<base>/oauth/authorize` and `<base>/oauth/token`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use wp_api_client::{sanitize_error_message, ClientConfig, Error, ErrorKind, Result};

/// OAuth 2.0 client registration.
///
/// Sensitive fields are redacted in Debug output to prevent accidental
/// exposure in logs.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Client identifier.
    pub client_id: String,
    client_secret: String,
    /// Redirect URI registered for the client.
    pub redirect_uri: Option<String>,
    /// Scopes to request.
    pub scopes: Vec<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OAuthConfig {
    /// Create a new OAuth config.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
            scopes: Vec::new(),
            access_token: None,
            refresh_token: None,
        }
    }

    /// Set the redirect URI.
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Use an access token obtained elsewhere.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Use a refresh token obtained elsewhere.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub(crate) fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub(crate) fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(Error::config(
                "OAuth client ID and client secret are required for OAuth authentication",
            ));
        }
        Ok(())
    }
}

/// PKCE verifier and challenge (RFC 7636, S256).
#[derive(Clone)]
pub struct PkceChallenge {
    /// Kept by the caller until the code exchange.
    pub code_verifier: String,
    /// SHA-256 of the verifier, sent with the authorize request.
    pub code_challenge: String,
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

impl PkceChallenge {
    /// Generate a verifier from 32 random bytes and derive its challenge.
    pub fn generate() -> Self {
        let code_verifier = random_token();
        let code_challenge = challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }

    /// The challenge method, always `S256`.
    pub fn method(&self) -> &'static str {
        "S256"
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn challenge_for(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Everything the application needs to send the user to the authorize page
/// and to complete the exchange afterwards.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// URL to open in the user's browser.
    pub url: String,
    /// CSRF state; compare with the `state` returned on the callback.
    pub state: String,
    /// PKCE pair; pass `pkce.code_verifier` to [`OAuthFlow::exchange_code`].
    pub pkce: PkceChallenge,
}

/// Authorization-code flow against the site's OAuth server.
#[derive(Clone)]
pub struct OAuthFlow {
    config: OAuthConfig,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OAuthFlow {
    /// Create a flow for the site described by `client`.
    ///
    /// A redirect URI is required.
    pub fn new(client: &ClientConfig, config: OAuthConfig) -> Result<Self> {
        config.validate()?;
        if config.redirect_uri.is_none() {
            return Err(Error::config("redirect_uri is required for the OAuth flow"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(client.timeout)
            .user_agent(client.user_agent.as_str())
            .danger_accept_invalid_certs(!client.verify_tls)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            config,
            base_url: client.base_url().to_string(),
            http_client,
        })
    }

    /// Get the OAuth config.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// `<base>/oauth/authorize`
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth/authorize", self.base_url)
    }

    /// `<base>/oauth/token`
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }

    /// Build the authorize URL. A random state is generated when none is given.
    pub fn authorization_url(&self, state: Option<&str>) -> AuthorizationRequest {
        let state = state.map(str::to_string).unwrap_or_else(random_token);
        let pkce = PkceChallenge::generate();
        let redirect_uri = self.config.redirect_uri.as_deref().unwrap_or_default();

        let mut url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}",
            self.authorize_endpoint(),
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(redirect_uri),
        );

        if !self.config.scopes.is_empty() {
            let scopes = self.config.scopes.join(" ");
            url.push_str(&format!("&scope={}", urlencoding::encode(&scopes)));
        }

        url.push_str(&format!(
            "&state={}&code_challenge={}&code_challenge_method={}",
            urlencoding::encode(&state),
            pkce.code_challenge,
            pkce.method()
        ));

        AuthorizationRequest { url, state, pkce }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// The code and verifier are not logged.
    #[instrument(skip(self, code, code_verifier))]
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenResponse> {
        let redirect_uri = self.config.redirect_uri.as_deref().unwrap_or_default();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret()),
            ("code_verifier", code_verifier),
        ];
        self.token_request(&params).await
    }

    /// Obtain a new access token with a refresh token.
    ///
    /// The refresh token is not logged.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret()),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let body = serde_urlencoded::to_string(params)?;

        let response = self
            .http_client
            .post(self.token_endpoint())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(token_error(status.as_u16(), &text));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        debug!(expires_in = ?token.expires_in, "OAuth token issued");
        Ok(token)
    }
}

/// Token endpoint errors are authentication failures, whatever the status.
fn token_error(status: u16, body: &str) -> Error {
    let message = match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("OAuth error: {} - {}", err.error, description),
            None => format!("OAuth error: {}", err.error),
        },
        Err(_) if body.trim().is_empty() => format!("OAuth token request failed with HTTP {}", status),
        Err(_) => format!("OAuth token request failed: {}", body.trim()),
    };

    Error::new(ErrorKind::Authentication {
        status: Some(status),
        message: sanitize_error_message(&message),
    })
}

/// Token response from the OAuth server.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Refresh token (if issued).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenResponse {
    /// A bearer token with no known lifetime.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
            refresh_token: None,
            scope: None,
        }
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
