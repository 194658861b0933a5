use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_api::{AuthConfig, AuthMethod};

use crate::common::{client_from, jwt_with_exp, site_env};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_jwt_from_environment() {
    let server = MockServer::start().await;
    let exp = now_secs() + 3600;
    let token = jwt_with_exp(exp);

    Mock::given(method("POST"))
        .and(path("/wp-json/jwt-auth/v1/token"))
        .and(body_json(json!({"username": "editor", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
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
    assert_eq!(client.auth().method(), AuthMethod::Jwt);

    let session = client.authenticate().await.unwrap();
    assert!(session.authenticated);
    assert_eq!(session.expires_at.map(|t| t.timestamp()), Some(exp));
    assert!(!session.is_expired());

    client.get("posts", &[]).await.unwrap();
}

#[tokio::test]
async fn test_application_password_wins_over_jwt() {
    let server = MockServer::start().await;

    let env = site_env(
        &server,
        &[
            ("WORDPRESS_USERNAME", "admin"),
            ("WORDPRESS_APP_PASSWORD", "abcd efgh"),
            ("WORDPRESS_JWT_SECRET", "shared"),
            ("WORDPRESS_JWT_USERNAME", "editor"),
            ("WORDPRESS_JWT_PASSWORD", "hunter2"),
        ],
    );
    let client = client_from(&env);
    assert_eq!(client.auth().method(), AuthMethod::ApplicationPassword);
}

#[tokio::test]
async fn test_incomplete_environment_fails_at_authenticate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let env = site_env(&server, &[("WORDPRESS_USERNAME", "admin")]);
    let client = client_from(&env);
    assert_eq!(client.auth().method(), AuthMethod::ApplicationPassword);

    let err = client.authenticate().await.unwrap_err();
    assert!(err.is_config_error());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_cookie_nonce_is_sent_and_session_stays_unproven() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/settings"))
        .and(header("X-WP-Nonce", "0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Site"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(&server, &[("WORDPRESS_COOKIE_NONCE", "0123456789")]);
    let client = client_from(&env);

    let session = client.authenticate().await.unwrap();
    assert!(!session.authenticated);

    let settings = client.get("settings", &[]).await.unwrap();
    assert_eq!(settings["title"], "Site");
}

#[tokio::test]
async fn test_oauth_access_token_from_environment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .and(header("Authorization", "Bearer preissued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4})))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(
        &server,
        &[
            ("WORDPRESS_OAUTH_CLIENT_ID", "client"),
            ("WORDPRESS_OAUTH_CLIENT_SECRET", "secret"),
            ("WORDPRESS_OAUTH_ACCESS_TOKEN", "preissued"),
        ],
    );
    let client = client_from(&env);
    assert_eq!(client.auth().method(), AuthMethod::OAuth);

    client.authenticate().await.unwrap();
    let me = client.get_current_user().await.unwrap();
    assert_eq!(me["id"], 4);
}

#[tokio::test]
async fn test_reset_clears_session_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .and(header("X-API-Key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(&server, &[]);
    let base = client_from(&env);

    let client = wp_api::WordPressClient::new(
        base.http().config().clone(),
        AuthConfig::api_key("key-1", None),
    )
    .unwrap();
    client.authenticate().await.unwrap();
    assert!(client.is_authenticated());
    assert!(!base.is_authenticated());

    client.auth().reset();
    assert!(!client.is_authenticated());

    client.get_current_user().await.unwrap();
}
