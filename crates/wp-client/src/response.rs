//! Response decoding and error classification.

use std::sync::LazyLock;
use std::time::Duration;

use regex_lite::Regex;
use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The body parsed as JSON.
    Json(serde_json::Value),
    /// The body was not JSON and is returned verbatim.
    Text(String),
    /// The body was empty (e.g. 204 No Content).
    Empty,
}

impl ResponseBody {
    /// Decode a response body: empty, then JSON, then raw text.
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// Returns true if the body was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }

    /// Borrow the JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the raw text, if the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert into a JSON value. Text becomes a JSON string and empty becomes null.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => serde_json::Value::String(text),
            ResponseBody::Empty => serde_json::Value::Null,
        }
    }

    /// Deserialize the body into a typed value.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_json())?)
    }
}

/// Parse the Retry-After header as a number of seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Build the classified error for a non-success response.
pub(crate) fn parse_error_response(
    status: u16,
    reason: Option<&str>,
    retry_after: Option<Duration>,
    body: &str,
) -> Error {
    let message = sanitize_error_message(&error_message(status, reason, body));

    let kind = match status {
        401 | 403 => ErrorKind::Authentication {
            status: Some(status),
            message,
        },
        429 => ErrorKind::RateLimited {
            retry_after,
            message,
        },
        _ => ErrorKind::Api { status, message },
    };

    Error::new(kind)
}

/// Pick the human-readable message out of an error body.
///
/// JSON bodies contribute their `message` or `error` string. Other bodies are
/// used verbatim. An empty body falls back to the status line.
fn error_message(status: u16, reason: Option<&str>, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error"]
            .iter()
            .find_map(|field| {
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
    }

    if !body.is_empty() {
        return body.to_string();
    }

    match reason {
        Some(reason) => format!("HTTP {}: {}", status, reason),
        None => format!("HTTP {}", status),
    }
}

// A credential needs an uppercase letter, digit or symbol past its first
// character, so prose such as "basic authentication" is left alone.
static CREDENTIAL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\b((?i:bearer|basic))\s+[A-Za-z0-9\-._~+/][A-Za-z0-9\-._~+/]*[A-Z0-9+/=_~\-][A-Za-z0-9\-._~+/]*=*",
    )
    .ok()
});

static JWT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]*").ok()
});

static NONCE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)((?:_wp)?nonce["']?\s*[=:]\s*["']?)[A-Za-z0-9]{6,}"#).ok()
});

/// Sanitize an error message to prevent exposing sensitive data.
///
/// This function:
/// - Redacts `Bearer`/`Basic` credentials and JWTs
/// - Redacts nonce values
/// - Truncates messages longer than 500 characters
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    if let Some(re) = CREDENTIAL_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "$1 [REDACTED]").into_owned();
    }
    if let Some(re) = JWT_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "[REDACTED_TOKEN]").into_owned();
    }
    if let Some(re) = NONCE_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "${1}[REDACTED]").into_owned();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
