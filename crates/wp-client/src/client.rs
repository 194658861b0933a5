//! Request executor with rate limiting, retry, and error classification.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::rate_limit::RateLimiter;
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::{parse_error_response, parse_retry_after, ResponseBody};
use crate::retry::RetryPolicy;

/// Supplies authentication headers for every outgoing request.
///
/// Implementations must not fail: missing credentials simply leave the
/// headers untouched.
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Add authentication headers for the next attempt.
    fn add_headers(&self, headers: &mut HeaderMap);
}

/// HTTP client for the WordPress REST API with built-in rate limiting,
/// retry, and error classification.
///
/// Cloning is cheap. Clones share the connection pool, the configuration,
/// the rate limiter and the authorizer.
#[derive(Debug, Clone)]
pub struct WpHttpClient {
    inner: reqwest::Client,
    config: Arc<ClientConfig>,
    limiter: Arc<RateLimiter>,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl WpHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        if !config.verify_tls {
            warn!(base_url = %config.base_url(), "TLS certificate verification is disabled");
        }

        let limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute));

        Ok(Self {
            inner,
            config: Arc::new(config),
            limiter,
            authorizer: None,
        })
    }

    /// Attach the source of authentication headers.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The rate limiter shared by all clones of this client.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Root of the core REST API.
    pub fn api_root(&self) -> String {
        self.config.api_root()
    }

    /// Create a GET request builder.
    pub fn get(&self, endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, endpoint)
    }

    /// Create a POST request builder.
    pub fn post(&self, endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, endpoint)
    }

    /// Create a PUT request builder.
    pub fn put(&self, endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, endpoint)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, endpoint)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, endpoint: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, endpoint)
    }

    /// Issue a request with an optional body.
    pub async fn request(
        &self,
        method: RequestMethod,
        endpoint: impl Into<String>,
        body: Option<RequestBody>,
    ) -> Result<ResponseBody> {
        let mut request = RequestBuilder::new(method, endpoint);
        request.body = body;
        self.execute(request).await
    }

    /// Execute a request with rate limiting and automatic retry.
    ///
    /// Authentication failures and other non-retryable errors are returned
    /// as-is after the first attempt. Retryable failures are retried until
    /// the attempt budget is spent, then wrapped in
    /// [`ErrorKind::RetriesExhausted`].
    #[instrument(skip(self, request), fields(method = %request.method, endpoint = %request.endpoint))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<ResponseBody> {
        let url = request.resolve_url(&self.config.api_root())?;
        let mut policy = RetryPolicy::new(self.config.retry.clone(), self.config.max_retries);

        loop {
            self.limiter.acquire().await;

            let err = match self.execute_once(&request, &url, policy.attempt()).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            match policy.next_delay(err.retry_after()) {
                Some(delay) => {
                    warn!(
                        attempt = policy.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    let attempts = policy.attempts_made();
                    warn!(attempts, error = %err, "Request failed, giving up");
                    return Err(Error::exhausted(attempts, err));
                }
            }
        }
    }

    /// Execute a single attempt without retry logic.
    async fn execute_once(
        &self,
        request: &RequestBuilder,
        url: &url::Url,
        attempt: u32,
    ) -> Result<ResponseBody> {
        let headers = self.build_headers(request);
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), url.clone())
            .headers(headers);

        if request.method.attaches_body() {
            if let Some(ref body) = request.body {
                req = match body {
                    RequestBody::Json(value) => req.body(serde_json::to_vec(value)?),
                    RequestBody::Text(text) => req.body(text.clone()),
                    RequestBody::Multipart(form) => req.multipart(form.to_reqwest()?),
                };
            }
        }

        debug!(method = %request.method, url = %url, attempt, "Sending request");

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            info!(status = status.as_u16(), "Non-success response");
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_response(
                status.as_u16(),
                status.canonical_reason(),
                retry_after,
                &body,
            ));
        }

        let text = response.text().await?;
        debug!(status = status.as_u16(), content_length = text.len(), "Response received");

        Ok(ResponseBody::from_text(text))
    }

    /// Defaults, then auth headers, then caller overrides; removals last.
    fn build_headers(&self, request: &RequestBuilder) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match HeaderValue::from_str(&self.config.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(_) => warn!("Skipping User-Agent that is not a valid header value"),
        }

        if let Some(ref authorizer) = self.authorizer {
            authorizer.add_headers(&mut headers);
        }

        for (name, value) in &request.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "Skipping header override that is not valid HTTP"),
            }
        }

        for name in &request.removed_headers {
            headers.remove(name.as_str());
        }

        if matches!(request.body, Some(RequestBody::Multipart(_))) {
            headers.remove(CONTENT_TYPE);
        }

        headers
    }
}
