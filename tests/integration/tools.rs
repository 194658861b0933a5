use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_api::{AuthConfig, ToolRegistry};

use crate::common::{client_from, fast_client, site_env};

#[tokio::test]
async fn test_jwt_handshake_before_first_tool() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "opaque-token"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/"))
        .and(header("Authorization", "Bearer opaque-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "My Blog"})))
        .expect(2)
        .mount(&server)
        .await;

    let env = site_env(
        &server,
        &[
            ("WORDPRESS_JWT_SECRET", "shared"),
            ("WORDPRESS_JWT_USERNAME", "editor"),
            ("WORDPRESS_JWT_PASSWORD", "hunter2"),
        ],
    );
    let client = client_from(&env);
    let tools = ToolRegistry::with_builtin_tools();

    for _ in 0..2 {
        let result = tools.call(&client, "wp_get_site_info", json!({})).await;
        assert!(!result.is_error, "{}", result.text());
        let info: Value = serde_json::from_str(&result.text()).unwrap();
        assert_eq!(info["name"], "My Blog");
    }
}

#[tokio::test]
async fn test_configuration_error_is_a_result() {
    let server = MockServer::start().await;

    let env = site_env(&server, &[("WORDPRESS_APP_PASSWORD", "orphan")]);
    let client = client_from(&env);

    let result = ToolRegistry::with_builtin_tools()
        .call(&client, "wp_get_current_user", json!({}))
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "Error: Configuration error: Username and password are required for basic authentication"
    );
}

#[tokio::test]
async fn test_network_failure_is_a_result() {
    // Nothing listens on the port once the listener is dropped.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let config = wp_api::ClientConfig::builder()
        .with_base_url(uri)
        .with_max_retries(2)
        .with_rate_limit(600_000)
        .with_retry(
            wp_api::client::RetryConfig::default()
                .with_initial_delay(std::time::Duration::from_millis(5)),
        )
        .build()
        .unwrap();
    let client = wp_api::WordPressClient::new(config, AuthConfig::api_key("k", None)).unwrap();

    let result = ToolRegistry::with_builtin_tools()
        .call(&client, "wp_request", json!({"method": "GET", "endpoint": "posts"}))
        .await;

    assert!(result.is_error);
    assert!(
        result.text().starts_with("Error: Request failed after 2 attempts: Network error"),
        "{}",
        result.text()
    );
}

#[tokio::test]
async fn test_test_auth_then_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = fast_client(&server, 1, AuthConfig::application_password("user", "pass"));
    let tools = ToolRegistry::with_builtin_tools();

    let status = tools.call(&client, "wp_get_auth_status", json!({})).await;
    let status: Value = serde_json::from_str(&status.text()).unwrap();
    assert_eq!(status["authenticated"], false);

    let tested = tools.call(&client, "wp_test_auth", json!({})).await;
    assert!(!tested.is_error, "{}", tested.text());

    let status = tools.call(&client, "wp_get_auth_status", json!({})).await;
    let status: Value = serde_json::from_str(&status.text()).unwrap();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["has_token"], false);
}
