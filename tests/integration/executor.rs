use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};
use wp_api::client::{RequestBody, RequestMethod, ResponseBody};

use wp_api::AuthConfig;

use crate::common::{client_from, fast_client, site_env};

#[tokio::test]
async fn test_basic_auth_users_me() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/users/me"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "A"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(
        &server,
        &[("WORDPRESS_USERNAME", "user"), ("WORDPRESS_APP_PASSWORD", "pass")],
    );
    let client = client_from(&env);

    let user = client
        .request(RequestMethod::Get, "users/me", None)
        .await
        .unwrap();
    assert_eq!(user, ResponseBody::Json(json!({"id": 1, "name": "A"})));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].headers.get_all("authorization").iter().count(), 1);
}

#[test]
fn test_missing_base_url_is_fatal() {
    let err = wp_api::WordPressClient::from_lookup(|name| match name {
        "WORDPRESS_USERNAME" => Some("user".to_string()),
        _ => None,
    })
    .unwrap_err();

    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(move |_: &Request| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(500).set_body_string("database unavailable")
            } else {
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1}]))
            }
        })
        .mount(&server)
        .await;

    let client = fast_client(&server, 3, AuthConfig::application_password("u", "p"));

    let posts = client.get("posts", &[]).await.unwrap();
    assert_eq!(posts, json!([{"id": 1}]));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "rest_cannot_create",
            "message": "Sorry, you are not allowed to create posts as this user."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(
        &server,
        &[("WORDPRESS_MAX_RETRIES", "5"), ("WORDPRESS_COOKIE_NONCE", "abc123")],
    );
    let client = client_from(&env);

    let err = client.post("posts", &json!({"title": "x"})).await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(!err.is_exhausted());
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_json_body_round_trips() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/echo"))
        .respond_with(|req: &Request| {
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_bytes(req.body.clone())
        })
        .mount(&server)
        .await;

    let env = site_env(&server, &[]);
    let client = client_from(&env);

    let body = json!({
        "title": "Grüße",
        "meta": {"tags": [1, 2, 3], "draft": true, "ratio": 0.5},
        "content": "<p>Hello &amp; welcome</p>"
    });
    let echoed = client
        .request(RequestMethod::Post, "echo", Some(RequestBody::Json(body.clone())))
        .await
        .unwrap();
    assert_eq!(echoed, ResponseBody::Json(body.clone()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, serde_json::to_vec(&body).unwrap());
}

#[tokio::test]
async fn test_absolute_url_bypasses_api_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/custom/v1/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let env = site_env(&server, &[]);
    let client = client_from(&env);

    let url = format!("{}/wp-json/custom/v1/stats", server.uri());
    let body = client.request(RequestMethod::Get, &url, None).await.unwrap();
    assert_eq!(body, ResponseBody::Text("ok".to_string()));
}

#[tokio::test]
async fn test_empty_and_text_responses() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/wp-json/wp/v2/posts/9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/readme"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  plain text, kept as-is \n"))
        .mount(&server)
        .await;

    let env = site_env(&server, &[]);
    let client = client_from(&env);

    let deleted = client
        .request(RequestMethod::Delete, "posts/9", None)
        .await
        .unwrap();
    assert_eq!(deleted, ResponseBody::Empty);

    let readme = client
        .request(RequestMethod::Get, "readme", None)
        .await
        .unwrap();
    assert_eq!(readme, ResponseBody::Text("  plain text, kept as-is \n".to_string()));
}

#[tokio::test]
async fn test_clones_share_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(4)
        .mount(&server)
        .await;

    // 1200 requests per minute: 50ms apart
    let env = site_env(&server, &[("RATE_LIMIT", "1200")]);
    let client = client_from(&env);

    let start = Instant::now();
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.get(&format!("posts/{i}"), &[]).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(start.elapsed() >= Duration::from_millis(150));
}
