//! # wp-api-auth
//!
//! Authentication for the WordPress REST API.
//!
//! ## Supported Authentication Methods
//!
//! - **Application passwords** - HTTP Basic with a per-application password
//! - **JWT** - credentials exchanged for a bearer token at the JWT plugin
//! - **OAuth 2.0** - authorization URL with PKCE, code exchange, and refresh;
//!   the interactive browser step is left to the caller
//! - **Cookie nonce** - `X-WP-Nonce` for requests riding a logged-in session
//! - **API key** - `X-API-Key` with an optional `X-API-Secret`
//!
//! ## Security
//!
//! - Secrets are redacted in Debug output
//! - Header values carrying credentials are marked sensitive
//! - Error messages taken from responses are sanitized
//! - Tokens are kept in memory only
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wp_api_auth::{AuthConfig, AuthProvider};
//! use wp_api_client::{ClientConfig, WpHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wp_api_client::Error> {
//!     let auth = Arc::new(AuthProvider::new(AuthConfig::from_env()));
//!     let http = WpHttpClient::new(ClientConfig::from_env()?)?.with_authorizer(auth.clone());
//!
//!     let session = auth.authenticate(&http).await?;
//!     println!("authenticated: {}", session.authenticated);
//!     Ok(())
//! }
//! ```

mod config;
mod oauth;
mod provider;
mod session;

pub use config::{AuthConfig, AuthMethod};
pub use oauth::{AuthorizationRequest, OAuthConfig, OAuthFlow, PkceChallenge, TokenResponse};
pub use provider::AuthProvider;
pub use session::{token_expiry, AuthSession};
