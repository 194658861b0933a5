//! Send one request to a WordPress site and print the response.
//!
//! ```sh
//! export WORDPRESS_URL='https://example.com'
//! export WORDPRESS_USERNAME='admin'
//! export WORDPRESS_APP_PASSWORD='abcd efgh ijkl mnop'
//! cargo run --bin wp-request -- GET posts
//! cargo run --bin wp-request -- POST posts '{"title":"Hello","status":"draft"}'
//! ```

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wp_api::client::{RequestBody, RequestMethod};
use wp_api::WordPressClient;

const USAGE: &str = "usage: wp-request METHOD ENDPOINT [BODY]";

#[derive(Debug)]
struct Invocation {
    method: RequestMethod,
    endpoint: String,
    body: Option<RequestBody>,
}

/// Parse `METHOD ENDPOINT [BODY]`. BODY must be JSON.
fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let (method, endpoint, body) = match args {
        [method, endpoint] => (method, endpoint, None),
        [method, endpoint, body] => (method, endpoint, Some(body)),
        _ => return Err(USAGE.to_string()),
    };

    let method = method
        .parse::<RequestMethod>()
        .map_err(|e| format!("{e}\n{USAGE}"))?;

    let body = body
        .map(|b| serde_json::from_str::<serde_json::Value>(b))
        .transpose()
        .map_err(|e| format!("BODY is not valid JSON: {e}"))?
        .map(RequestBody::Json);

    Ok(Invocation {
        method,
        endpoint: endpoint.clone(),
        body,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::from(2);
        }
    };

    // Configuration errors are fatal.
    let client = match WordPressClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(site = %client.base_url(), method = %client.auth().method(), "Client configured");

    if let Err(e) = client.authenticate().await {
        error!(error = %e, "Authentication failed");
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let Invocation {
        method,
        endpoint,
        body,
    } = invocation;

    match client.request(method, &endpoint, body).await {
        Ok(response) => {
            info!(%method, endpoint = %endpoint, empty = response.is_empty(), "Request succeeded");
            let json = response.into_json();
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{json}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%method, endpoint = %endpoint, status = ?e.status(), error = %e, "Request failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_get_without_body() {
        let invocation = parse_args(&args(&["get", "users/me"])).unwrap();
        assert_eq!(invocation.method, RequestMethod::Get);
        assert_eq!(invocation.endpoint, "users/me");
        assert!(invocation.body.is_none());
    }

    #[test]
    fn test_parse_post_with_json_body() {
        let invocation = parse_args(&args(&["POST", "posts", r#"{"title":"Hello"}"#])).unwrap();
        assert_eq!(invocation.method, RequestMethod::Post);
        match invocation.body {
            Some(RequestBody::Json(value)) => assert_eq!(value["title"], "Hello"),
            other => panic!("expected a JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_args(&args(&["GET"])).unwrap_err(), USAGE);
        assert!(parse_args(&args(&["TRACE", "posts"])).unwrap_err().contains(USAGE));
        assert!(parse_args(&args(&["POST", "posts", "{not json"]))
            .unwrap_err()
            .starts_with("BODY is not valid JSON"));
    }
}
