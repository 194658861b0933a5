use std::collections::HashMap;

use std::time::Duration;

use wiremock::MockServer;
use wp_api::client::RetryConfig;
use wp_api::{AuthConfig, ClientConfig, WordPressClient};

/// Environment for a client pointed at `server`, plus `vars`.
///
/// Retries are fast and the rate limit is high unless `vars` says otherwise.
pub fn site_env(server: &MockServer, vars: &[(&str, &str)]) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = [
        ("WORDPRESS_URL", server.uri()),
        ("WORDPRESS_MAX_RETRIES", "2".to_string()),
        ("RATE_LIMIT", "600000".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }
    env
}

/// Build a facade from a variable map, as `from_env` would.
pub fn client_from(env: &HashMap<String, String>) -> WordPressClient {
    WordPressClient::from_lookup(|name| env.get(name).cloned()).expect("client config")
}

/// An explicitly configured client with millisecond retry delays.
pub fn fast_client(server: &MockServer, attempts: u32, auth: AuthConfig) -> WordPressClient {
    let config = ClientConfig::builder()
        .with_base_url(server.uri())
        .with_max_retries(attempts)
        .with_rate_limit(600_000)
        .with_retry(RetryConfig::default().with_initial_delay(Duration::from_millis(5)))
        .build()
        .expect("client config");
    WordPressClient::new(config, auth).expect("client")
}

/// A JWT whose payload carries `exp`.
pub fn jwt_with_exp(exp: i64) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"data":{{"user":{{"id":"1"}}}}}}"#));
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
