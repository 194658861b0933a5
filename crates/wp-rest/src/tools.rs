//! Named tool dispatch over [`WordPressClient`].
//!
//! Every tool takes a JSON object of arguments and produces a
//! [`ToolResult`]. Failures never escape `call`; they become error results.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use wp_api_auth::AuthSession;
use wp_api_client::{Error, ErrorKind, RequestBuilder, RequestMethod, Result};

use crate::client::WordPressClient;

/// Tools that must run without a prior handshake. The OAuth tools are how
/// an OAuth session gets its token in the first place.
const AUTH_EXEMPT: &[&str] = &[
    "wp_test_auth",
    "wp_get_auth_status",
    "wp_start_oauth_flow",
    "wp_complete_oauth_flow",
    "wp_refresh_oauth_token",
];

/// Handler signature shared by all tools.
pub type ToolHandler = for<'a> fn(&'a WordPressClient, Value) -> BoxFuture<'a, Result<Value>>;

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result carrying `value`, pretty-printed.
    pub fn success(value: &Value) -> Self {
        let text = match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }

    /// A failure result. The message is prefixed with `Error: `.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {}", message),
            }],
            is_error: true,
        }
    }

    /// The concatenated text of all content blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A registered tool.
#[derive(Clone)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    handler: ToolHandler,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Maps tool names to handlers.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Tool>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the generic built-in tools.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(
            "wp_test_auth",
            "Run the authentication handshake and report the result",
            test_auth,
        );
        registry.register(
            "wp_get_auth_status",
            "Report the configured authentication method and session state",
            auth_status,
        );
        registry.register(
            "wp_get_current_user",
            "Get the authenticated user",
            current_user,
        );
        registry.register(
            "wp_get_site_info",
            "Get the REST API root document for the site",
            site_info,
        );
        registry.register(
            "wp_request",
            "Send a raw request: method, endpoint, optional body and query",
            raw_request,
        );
        registry.register(
            "wp_start_oauth_flow",
            "Build the OAuth authorize URL with a PKCE challenge; optional state",
            start_oauth_flow,
        );
        registry.register(
            "wp_complete_oauth_flow",
            "Exchange an authorization code and its code_verifier for a token",
            complete_oauth_flow,
        );
        registry.register(
            "wp_refresh_oauth_token",
            "Obtain a new OAuth access token with the stored refresh token",
            refresh_oauth_token,
        );
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, name: &'static str, description: &'static str, handler: ToolHandler) {
        if self
            .tools
            .insert(
                name,
                Tool {
                    name,
                    description,
                    handler,
                },
            )
            .is_some()
        {
            warn!(tool = name, "Replacing previously registered tool");
        }
    }

    /// Registered tools, ordered by name.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// Authenticates first when the client has no session yet, except for
    /// the tools that report on authentication themselves.
    #[instrument(skip(self, client, args))]
    pub async fn call(&self, client: &WordPressClient, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Unknown tool");
            return ToolResult::error(format!("Unknown tool: {}", name));
        };

        if !AUTH_EXEMPT.contains(&name) && !client.is_authenticated() {
            debug!(tool = name, "Authenticating before tool call");
            if let Err(err) = client.authenticate().await {
                info!(tool = name, error = %err, "Authentication before tool call failed");
                return ToolResult::error(err);
            }
        }

        let args = if args.is_null() { json!({}) } else { args };
        match (tool.handler)(client, args).await {
            Ok(value) => ToolResult::success(&value),
            Err(err) => {
                info!(tool = name, error = %err, "Tool call failed");
                ToolResult::error(err)
            }
        }
    }
}

fn test_auth(client: &WordPressClient, _args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let session = client.authenticate().await?;
        Ok(json!({
            "authenticated": session.authenticated,
            "method": client.auth().method().as_str(),
            "site_url": client.base_url(),
            "expires_at": session.expires_at.map(|t| t.to_rfc3339()),
        }))
    }
    .boxed()
}

fn auth_status(client: &WordPressClient, _args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let session = client.auth().session();
        Ok(json!({
            "authenticated": session.authenticated,
            "method": client.auth().method().as_str(),
            "site_url": client.base_url(),
            "has_token": session.has_token(),
            "token_expired": session.has_token() && session.is_expired(),
        }))
    }
    .boxed()
}

fn current_user(client: &WordPressClient, _args: Value) -> BoxFuture<'_, Result<Value>> {
    client.get_current_user().boxed()
}

fn site_info(client: &WordPressClient, _args: Value) -> BoxFuture<'_, Result<Value>> {
    client.get_site_info().boxed()
}

fn raw_request(client: &WordPressClient, args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let request = raw_request_from_args(&args)?;
        Ok(client.execute(request).await?.into_json())
    }
    .boxed()
}

fn start_oauth_flow(client: &WordPressClient, args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let state = match args.get("state") {
            None | Some(Value::Null) => None,
            Some(Value::String(state)) => Some(state.as_str()),
            Some(_) => return Err(invalid_argument("state", "a string")),
        };

        let request = client.oauth_flow()?.authorization_url(state);
        Ok(json!({
            "authorization_url": request.url,
            "state": request.state,
            "code_verifier": request.pkce.code_verifier,
        }))
    }
    .boxed()
}

fn complete_oauth_flow(client: &WordPressClient, args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let code = string_argument(&args, "code")?;
        let verifier = string_argument(&args, "code_verifier")?;
        let session = client.complete_oauth(code, verifier).await?;
        Ok(session_summary(&session))
    }
    .boxed()
}

fn refresh_oauth_token(client: &WordPressClient, _args: Value) -> BoxFuture<'_, Result<Value>> {
    async move {
        let session = client.refresh_oauth_token().await?;
        Ok(session_summary(&session))
    }
    .boxed()
}

fn session_summary(session: &AuthSession) -> Value {
    json!({
        "authenticated": session.authenticated,
        "has_refresh_token": session.refresh_token().is_some(),
        "expires_at": session.expires_at.map(|t| t.to_rfc3339()),
    })
}

fn string_argument<'v>(args: &'v Value, name: &str) -> Result<&'v str> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid_argument(name, "a non-empty string"))
}

/// Build a request from `{method, endpoint, body?, query?}`.
fn raw_request_from_args(args: &Value) -> Result<RequestBuilder> {
    let method = match args.get("method") {
        None | Some(Value::Null) => RequestMethod::Get,
        Some(Value::String(m)) => m.parse()?,
        Some(_) => return Err(invalid_argument("method", "a string")),
    };

    let endpoint = args
        .get("endpoint")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_argument("endpoint", "a string"))?;

    let mut request = RequestBuilder::new(method, endpoint);

    match args.get("query") {
        None | Some(Value::Null) => {}
        Some(Value::Object(params)) => {
            for (name, value) in params {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.query(name.as_str(), value);
            }
        }
        Some(_) => return Err(invalid_argument("query", "an object")),
    }

    if let Some(body) = args.get("body").filter(|b| !b.is_null()) {
        request = request.json_value(body.clone());
    }

    Ok(request)
}

fn invalid_argument(name: &str, expected: &str) -> Error {
    Error::new(ErrorKind::Other(format!(
        "Invalid argument '{}': expected {}",
        name, expected
    )))
}
