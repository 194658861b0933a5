//! WordPress REST API facade.
//!
//! `WordPressClient` owns the request executor and the auth provider and
//! exposes thin methods over the executor's `request` primitive.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use wp_api_auth::{AuthConfig, AuthProvider, AuthSession};
use wp_api_client::{
    ClientConfig, RequestBody, RequestBuilder, RequestMethod, ResponseBody, Result,
    WpHttpClient,
};

mod oauth;
mod site;

/// WordPress REST API client.
///
/// # Example
///
/// ```rust,ignore
/// use wp_api_rest::WordPressClient;
///
/// let client = WordPressClient::from_env()?;
/// client.authenticate().await?;
///
/// let posts = client.get("posts", &[("per_page", "5")]).await?;
/// let draft = client
///     .post("posts", &json!({"title": "Hello", "status": "draft"}))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: WpHttpClient,
    auth: Arc<AuthProvider>,
}

impl WordPressClient {
    /// Create a client from explicit configuration.
    ///
    /// The auth configuration must be complete for its method.
    pub fn new(config: ClientConfig, auth: AuthConfig) -> Result<Self> {
        let auth = AuthConfig::resolve(Some(auth), |_| None)?;
        Self::assemble(config, auth)
    }

    /// Create a client from `WORDPRESS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create a client from an arbitrary variable lookup.
    ///
    /// A missing site URL fails here; incomplete credentials only fail once
    /// [`authenticate`](Self::authenticate) runs.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ClientConfig::from_lookup(&lookup)?;
        let auth = AuthConfig::resolve(None, &lookup)?;
        Self::assemble(config, auth)
    }

    fn assemble(config: ClientConfig, auth: AuthConfig) -> Result<Self> {
        let auth = Arc::new(AuthProvider::new(auth));
        let http = WpHttpClient::new(config)?.with_authorizer(auth.clone());
        Ok(Self { http, auth })
    }

    /// The underlying request executor.
    pub fn http(&self) -> &WpHttpClient {
        &self.http
    }

    /// The authentication provider.
    pub fn auth(&self) -> &AuthProvider {
        &self.auth
    }

    /// Site base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.http.config().base_url()
    }

    /// Root of the core REST API.
    pub fn api_root(&self) -> String {
        self.http.api_root()
    }

    /// Run the authentication handshake for the configured method.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<AuthSession> {
        self.auth.authenticate(&self.http).await
    }

    /// Returns true once authentication has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Execute a prepared request.
    pub async fn execute(&self, request: RequestBuilder) -> Result<ResponseBody> {
        self.http.execute(request).await
    }

    /// Issue a request with an optional body.
    ///
    /// `endpoint` is relative to the API root unless it is an absolute URL.
    pub async fn request(
        &self,
        method: RequestMethod,
        endpoint: &str,
        body: Option<RequestBody>,
    ) -> Result<ResponseBody> {
        self.http.request(method, endpoint, body).await
    }

    /// GET with URL-encoded query parameters.
    #[instrument(skip(self, query))]
    pub async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let request = query
            .iter()
            .fold(self.http.get(endpoint), |request, (name, value)| {
                request.query(*name, *value)
            });
        Ok(self.http.execute(request).await?.into_json())
    }

    /// POST a JSON body.
    #[instrument(skip(self, body))]
    pub async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let request = self.http.post(endpoint).json(body)?;
        Ok(self.http.execute(request).await?.into_json())
    }

    /// PUT a JSON body.
    #[instrument(skip(self, body))]
    pub async fn put<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let request = self.http.put(endpoint).json(body)?;
        Ok(self.http.execute(request).await?.into_json())
    }

    /// PATCH a JSON body.
    #[instrument(skip(self, body))]
    pub async fn patch<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let request = self.http.patch(endpoint).json(body)?;
        Ok(self.http.execute(request).await?.into_json())
    }

    /// DELETE a resource.
    #[instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str) -> Result<Value> {
        Ok(self.http.execute(self.http.delete(endpoint)).await?.into_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wp_api_client::RetryConfig;

    fn test_client(server: &MockServer, auth: AuthConfig) -> WordPressClient {
        let config = ClientConfig::builder()
            .with_base_url(server.uri())
            .with_max_retries(2)
            .with_rate_limit(600_000)
            .with_retry(RetryConfig::default().with_initial_delay(Duration::from_millis(5)))
            .build()
            .unwrap();
        WordPressClient::new(config, auth).unwrap()
    }

    #[test]
    fn test_new_rejects_incomplete_credentials() {
        let config = ClientConfig::builder()
            .with_base_url("https://example.com")
            .build()
            .unwrap();
        let err = WordPressClient::new(
            config,
            AuthConfig::ApplicationPassword {
                username: Some("admin".into()),
                password: None,
            },
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("WORDPRESS_SITE_URL", "https://blog.example.com/"),
            ("WORDPRESS_USERNAME", "admin"),
        ]
        .into_iter()
        .collect();

        let client = WordPressClient::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(client.base_url(), "https://blog.example.com");
        assert_eq!(client.api_root(), "https://blog.example.com/wp-json/wp/v2");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_from_lookup_without_url() {
        let err = WordPressClient::from_lookup(|_| None).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("WORDPRESS_URL"));
    }

    #[tokio::test]
    async fn test_get_encodes_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("search", "hello world"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 7}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, AuthConfig::api_key("k", None));
        let posts = client
            .get("posts", &[("search", "hello world"), ("per_page", "5")])
            .await
            .unwrap();
        assert_eq!(posts[0]["id"], 7);
    }

    #[tokio::test]
    async fn test_post_and_delete() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(header("X-API-Key", "k"))
            .and(body_json(serde_json::json!({"title": "Hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 12})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/wp-json/wp/v2/posts/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"deleted": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, AuthConfig::api_key("k", None));
        let created = client
            .post("posts", &serde_json::json!({"title": "Hello"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 12);

        let deleted = client.delete("posts/12").await.unwrap();
        assert_eq!(deleted["deleted"], true);
    }

    #[tokio::test]
    async fn test_authenticate_through_facade() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/users/me"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, AuthConfig::application_password("user", "pass"));
        assert!(!client.is_authenticated());
        client.authenticate().await.unwrap();
        assert!(client.is_authenticated());

        // Clones share the session.
        assert!(client.clone().is_authenticated());
    }
}
