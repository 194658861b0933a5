//! # wp-api
//!
//! A WordPress REST API client library for Rust.
//!
//! Requests go through a single executor that spaces them with a shared
//! rate limiter, retries transient failures, and classifies every failure
//! into a typed error.
//!
//! ## Security
//!
//! - Credentials are redacted in Debug output
//! - Tracing skips credential parameters and request bodies
//! - Error messages taken from responses are sanitized
//!
//! ## Crates
//!
//! - **wp-api-client** - Request executor, configuration, rate limiting, retry, errors
//! - **wp-api-auth** - Application passwords, JWT, OAuth 2.0 hooks, cookie nonces, API keys
//! - **wp-api-rest** - `WordPressClient` facade and tool dispatch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wp_api::WordPressClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // WORDPRESS_URL, WORDPRESS_USERNAME, WORDPRESS_APP_PASSWORD, ...
//!     let client = WordPressClient::from_env()?;
//!     client.authenticate().await?;
//!
//!     let me = client.get_current_user().await?;
//!     println!("{}", me["name"]);
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use wp_api_auth as auth;
#[cfg(feature = "client")]
pub use wp_api_client as client;
#[cfg(feature = "rest")]
pub use wp_api_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use wp_api_auth::{AuthConfig, AuthMethod, AuthProvider};
#[cfg(feature = "client")]
pub use wp_api_client::{ClientConfig, Error, ErrorKind, Result, WpHttpClient};
#[cfg(feature = "rest")]
pub use wp_api_rest::{ToolRegistry, ToolResult, WordPressClient};
