//! Request descriptors for the executor.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Only POST, PUT and PATCH send a body.
    pub fn attaches_body(&self) -> bool {
        matches!(
            self,
            RequestMethod::Post | RequestMethod::Put | RequestMethod::Patch
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "PATCH" => Ok(RequestMethod::Patch),
            "DELETE" => Ok(RequestMethod::Delete),
            other => Err(Error::new(ErrorKind::Other(format!(
                "Unsupported HTTP method: {}",
                other
            )))),
        }
    }
}

/// Request body content.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON.
    Json(serde_json::Value),
    /// Sent verbatim.
    Text(String),
    /// Sent as `multipart/form-data`; the transport sets the boundary.
    Multipart(MultipartForm),
}

/// A multipart form that can be rebuilt for every attempt.
///
/// `reqwest::multipart::Form` is consumed when sent, so the parts are kept
/// here and converted on each dispatch.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    data: Bytes,
    file_name: Option<String>,
    mime: Option<String>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: Bytes::from(value.into()),
            file_name: None,
            mime: None,
        });
        self
    }

    /// Add a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            mime: Some(mime.into()),
        });
        self
    }

    /// Number of fields in the form.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn to_reqwest(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            let mut field = reqwest::multipart::Part::bytes(part.data.to_vec());
            if let Some(ref file_name) = part.file_name {
                field = field.file_name(file_name.clone());
            }
            if let Some(ref mime) = part.mime {
                field = field
                    .mime_str(mime)
                    .map_err(|e| Error::with_source(ErrorKind::Other(format!("Invalid MIME type: {}", mime)), e))?;
            }
            form = form.part(part.name.clone(), field);
        }
        Ok(form)
    }
}

/// Description of a single API call.
///
/// The endpoint is either a path relative to the API root (`posts/12`) or an
/// absolute `http(s)://` URL, which is used unchanged.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) endpoint: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) removed_headers: Vec<String>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: Vec::new(),
            removed_headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
        }
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Override a header. Applied after the default and auth headers.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Remove a header that would otherwise be sent.
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.removed_headers.push(name.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Set raw JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set a body that is sent verbatim.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Set a multipart body.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Set the body directly.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolve the endpoint against the API root.
    pub(crate) fn resolve_url(&self, api_root: &str) -> Result<url::Url> {
        let target = if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else {
            format!(
                "{}/{}",
                api_root.trim_end_matches('/'),
                self.endpoint.trim_start_matches('/')
            )
        };

        let mut url = url::Url::parse(&target)
            .map_err(|e| Error::with_source(ErrorKind::InvalidUrl(target.clone()), e))?;

        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query_params {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}
