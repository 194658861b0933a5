//! Error types for wp-client.
//!
//! Every failure that leaves the request executor is classified into one of
//! the [`ErrorKind`] variants. Whether the executor may retry is decided once,
//! when the error is classified, and carried on the error as a flag.

use std::time::Duration;

/// Result type alias for wp-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for wp-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Whether the executor may retry the request that produced this error.
    retryable: bool,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    ///
    /// The retryable flag takes the default for the kind.
    pub fn new(kind: ErrorKind) -> Self {
        let retryable = kind.is_retryable_by_default();
        Self {
            kind,
            retryable,
            source: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let mut err = Self::new(kind);
        err.source = Some(Box::new(source));
        err
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(message.into()))
    }

    /// Create an authentication error that did not come from an HTTP status.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication {
            status: None,
            message: message.into(),
        })
    }

    /// Override the retryable flag set at classification time.
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Wrap the last failure of a request whose attempts ran out.
    pub(crate) fn exhausted(attempts: u32, last: Error) -> Self {
        Self::new(ErrorKind::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Returns true if this is a rate limit error (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Returns true if this is an authentication error (HTTP 401/403 or a failed handshake).
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication { .. })
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    /// Returns true if the transport failed before a response arrived.
    pub fn is_network_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Network(_) | ErrorKind::Timeout)
    }

    /// Returns true if all attempts of a request failed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::RetriesExhausted { .. })
    }

    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// For exhausted retries this is the status of the last attempt.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Authentication { status, .. } => *status,
            ErrorKind::RateLimited { .. } => Some(429),
            ErrorKind::Api { status, .. } => Some(*status),
            ErrorKind::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Returns the retry-after duration if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns the last underlying error if retries were exhausted.
    pub fn last_error(&self) -> Option<&Error> {
        match &self.kind {
            ErrorKind::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Invalid or missing configuration. Raised before any network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication rejected (HTTP 401/403) or the handshake failed.
    #[error("Authentication error: {message}")]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limited: {message}{}", retry_after.map(|d| format!(" (retry after {:?})", d)).unwrap_or_default())]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization error for a request body.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// All attempts failed.
    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable unless classified otherwise.
    ///
    /// Every failed response except 401/403 is retried, so the status code
    /// alone does not decide this.
    pub fn is_retryable_by_default(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited { .. }
                | ErrorKind::Api { .. }
                | ErrorKind::Timeout
                | ErrorKind::Network(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_builder() {
            ErrorKind::InvalidUrl(err.to_string())
        } else {
            ErrorKind::Network(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Other(format!("Form encoding error: {}", err)), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
