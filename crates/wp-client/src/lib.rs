//! # wp-api-client
//!
//! Core HTTP client infrastructure for the WordPress REST API.
//!
//! This crate provides the request executor with:
//! - A client-wide rate limiter that spaces requests evenly
//! - Automatic retry with configurable backoff
//! - Classification of every failure into a typed [`Error`]
//! - Pluggable authentication headers through [`Authorizer`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (wp-api-rest: WordPressClient, ToolRegistry)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WpHttpClient                             │
//! │  - Resolves endpoints against <base>/wp-json/wp/v2          │
//! │  - Default, auth, and caller headers                        │
//! │  - RateLimiter → dispatch → classify → retry                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    reqwest::Client                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use wp_api_client::{ClientConfig, WpHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wp_api_client::Error> {
//!     let config = ClientConfig::from_env()?;
//!     let client = WpHttpClient::new(config)?;
//!
//!     let posts = client
//!         .execute(client.get("posts").query("per_page", "5"))
//!         .await?;
//!
//!     println!("{}", posts.into_json());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod rate_limit;
mod request;
mod response;
mod retry;

pub use client::{Authorizer, WpHttpClient};
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT,
    DEFAULT_TIMEOUT_MS,
};
pub use error::{Error, ErrorKind, Result};
pub use rate_limit::RateLimiter;
pub use request::{MultipartForm, RequestBody, RequestBuilder, RequestMethod};
pub use response::{sanitize_error_message, ResponseBody};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};

/// Re-exported so authorizers can name the header types they receive.
pub use reqwest::header;

/// Path of the core REST API below the site base URL.
pub const API_PREFIX: &str = "wp-json/wp/v2";

/// Path of the JWT authentication plugin below the site base URL.
pub const JWT_PREFIX: &str = "wp-json/jwt-auth/v1";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("wp-api/", env!("CARGO_PKG_VERSION"));
