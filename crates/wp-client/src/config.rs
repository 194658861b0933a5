//! Client configuration.
//!
//! A [`ClientConfig`] is immutable once built. It can be assembled with
//! [`ClientConfig::builder`] or read from the process environment with
//! [`ClientConfig::from_env`].

use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};
use crate::retry::RetryConfig;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default number of attempts per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default request budget per minute.
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    /// Timeout applied to every network call.
    pub timeout: Duration,
    /// Total number of attempts per request, including the first one.
    ///
    /// The wait before retry `n` is `retry.initial_delay * n` under the
    /// default linear backoff, capped at `retry.max_delay` (30 s). With the
    /// default 1 s base the cap is reached from the 30th retry on.
    pub max_retries: u32,
    /// Requests permitted per minute. Sets the spacing of the rate limiter.
    pub rate_limit_per_minute: u32,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Delay and backoff between attempts.
    pub retry: RetryConfig,
    /// User-Agent header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read configuration from the process environment.
    ///
    /// | Variable | Meaning | Default |
    /// |---|---|---|
    /// | `WORDPRESS_URL` / `WORDPRESS_SITE_URL` | site base URL | required |
    /// | `WORDPRESS_TIMEOUT` | timeout in milliseconds | 30000 |
    /// | `WORDPRESS_MAX_RETRIES` | attempts per request | 3 |
    /// | `RATE_LIMIT` | requests per minute | 60 |
    /// | `WORDPRESS_TLS_REJECT_UNAUTHORIZED` | `0` disables verification | verify |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Numbers that fail to parse, or are zero, fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("WORDPRESS_URL")
            .or_else(|| lookup("WORDPRESS_SITE_URL"))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::config("WordPress URL is required (set WORDPRESS_URL or WORDPRESS_SITE_URL)")
            })?;

        let timeout_ms = parse_positive(&lookup, "WORDPRESS_TIMEOUT", DEFAULT_TIMEOUT_MS);
        let max_retries = parse_positive(&lookup, "WORDPRESS_MAX_RETRIES", DEFAULT_MAX_RETRIES);
        let rate_limit = parse_positive(&lookup, "RATE_LIMIT", DEFAULT_RATE_LIMIT);
        let verify_tls = lookup("WORDPRESS_TLS_REJECT_UNAUTHORIZED")
            .map(|v| v.trim() != "0")
            .unwrap_or(true);

        Self::builder()
            .with_base_url(base_url)
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_max_retries(max_retries)
            .with_rate_limit(rate_limit)
            .with_verify_tls(verify_tls)
            .build()
    }

    /// The site base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Root of the core REST API: `<base>/wp-json/wp/v2`.
    pub fn api_root(&self) -> String {
        format!("{}/{}", self.base_url, crate::API_PREFIX)
    }

    /// Root of the JWT token plugin: `<base>/wp-json/jwt-auth/v1`.
    pub fn jwt_root(&self) -> String {
        format!("{}/{}", self.base_url, crate::JWT_PREFIX)
    }

    /// Minimum spacing between two requests.
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_secs(60) / self.rate_limit_per_minute.max(1)
    }
}

fn parse_positive<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => value,
            _ => {
                warn!(variable = name, value = %raw, default = %default, "Ignoring invalid value");
                default
            }
        },
    }
}

/// Builder for ClientConfig.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Duration,
    max_retries: u32,
    rate_limit_per_minute: u32,
    verify_tls: bool,
    retry: RetryConfig,
    user_agent: String,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT,
            verify_tls: true,
            retry: RetryConfig::default(),
            user_agent: crate::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfigBuilder {
    /// Set the site base URL, e.g. `https://example.com`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total number of attempts per request.
    ///
    /// Retry delays are capped at [`RetryConfig::max_delay`].
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the number of requests permitted per minute.
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate and build the client configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::config("WordPress URL is required"))?;
        let base_url = normalize_base_url(&raw)?;

        if self.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(Error::config("rate limit must be at least 1 request per minute"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }

        Ok(ClientConfig {
            base_url,
            timeout: self.timeout,
            max_retries: self.max_retries,
            rate_limit_per_minute: self.rate_limit_per_minute,
            verify_tls: self.verify_tls,
            retry: self.retry,
            user_agent: self.user_agent,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::config("WordPress URL is required"));
    }

    let parsed = url::Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "WordPress URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}
