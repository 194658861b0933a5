//! Authentication configuration.
//!
//! Exactly one [`AuthConfig`] variant is active per client. It is chosen once,
//! from explicit options or from the environment, and never changes.
//!
//! All variants implement a custom Debug to redact secrets.

use std::fmt;
use std::str::FromStr;

use wp_api_client::{Error, ErrorKind, Result};

use crate::oauth::OAuthConfig;

/// Authentication method names as accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// Application password sent as HTTP Basic auth. Also accepted as `basic`.
    ApplicationPassword,
    /// Token from the JWT authentication plugin.
    Jwt,
    /// OAuth 2.0 bearer token.
    OAuth,
    /// Logged-in cookie session with a REST nonce.
    Cookie,
    /// Static API key headers.
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::ApplicationPassword => "application_password",
            AuthMethod::Jwt => "jwt",
            AuthMethod::OAuth => "oauth",
            AuthMethod::Cookie => "cookie",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "application_password" | "app_password" | "basic" => Ok(AuthMethod::ApplicationPassword),
            "jwt" => Ok(AuthMethod::Jwt),
            "oauth" | "oauth2" => Ok(AuthMethod::OAuth),
            "cookie" => Ok(AuthMethod::Cookie),
            "api_key" | "apikey" => Ok(AuthMethod::ApiKey),
            other => Err(Error::new(ErrorKind::Config(format!(
                "Unsupported authentication method: {}",
                other
            )))),
        }
    }
}

/// Credentials for one authentication method.
#[derive(Clone)]
pub enum AuthConfig {
    /// Username and application password.
    ApplicationPassword {
        username: Option<String>,
        password: Option<String>,
    },
    /// Credentials exchanged for a token at `<base>/wp-json/jwt-auth/v1/token`.
    Jwt {
        secret: Option<String>,
        username: Option<String>,
        password: Option<String>,
    },
    /// OAuth 2.0 client registration and, once available, its tokens.
    OAuth(OAuthConfig),
    /// REST nonce for cookie sessions.
    Cookie { nonce: Option<String> },
    /// Static key, with an optional secret.
    ApiKey {
        key: Option<String>,
        secret: Option<String>,
    },
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        match self {
            AuthConfig::ApplicationPassword { username, password } => f
                .debug_struct("ApplicationPassword")
                .field("username", username)
                .field("password", &redact(password))
                .finish(),
            AuthConfig::Jwt {
                secret,
                username,
                password,
            } => f
                .debug_struct("Jwt")
                .field("secret", &redact(secret))
                .field("username", username)
                .field("password", &redact(password))
                .finish(),
            AuthConfig::OAuth(config) => f.debug_tuple("OAuth").field(config).finish(),
            AuthConfig::Cookie { nonce } => f
                .debug_struct("Cookie")
                .field("nonce", &redact(nonce))
                .finish(),
            AuthConfig::ApiKey { key, secret } => f
                .debug_struct("ApiKey")
                .field("key", &redact(key))
                .field("secret", &redact(secret))
                .finish(),
        }
    }
}

impl AuthConfig {
    /// Application password (HTTP Basic) credentials.
    pub fn application_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::ApplicationPassword {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// JWT plugin credentials.
    pub fn jwt(
        secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        AuthConfig::Jwt {
            secret: Some(secret.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// OAuth 2.0 client configuration.
    pub fn oauth(config: OAuthConfig) -> Self {
        AuthConfig::OAuth(config)
    }

    /// Cookie session nonce.
    pub fn cookie(nonce: impl Into<String>) -> Self {
        AuthConfig::Cookie {
            nonce: Some(nonce.into()),
        }
    }

    /// API key, with an optional secret.
    pub fn api_key(key: impl Into<String>, secret: Option<String>) -> Self {
        AuthConfig::ApiKey {
            key: Some(key.into()),
            secret,
        }
    }

    /// The method this configuration selects.
    pub fn method(&self) -> AuthMethod {
        match self {
            AuthConfig::ApplicationPassword { .. } => AuthMethod::ApplicationPassword,
            AuthConfig::Jwt { .. } => AuthMethod::Jwt,
            AuthConfig::OAuth(_) => AuthMethod::OAuth,
            AuthConfig::Cookie { .. } => AuthMethod::Cookie,
            AuthConfig::ApiKey { .. } => AuthMethod::ApiKey,
        }
    }

    /// Check that the fields the method needs are present.
    ///
    /// API keys are always accepted.
    pub fn validate(&self) -> Result<()> {
        match self {
            AuthConfig::ApplicationPassword { username, password } => {
                if is_blank(username) || is_blank(password) {
                    return Err(Error::config(
                        "Username and password are required for basic authentication",
                    ));
                }
            }
            AuthConfig::Jwt {
                secret,
                username,
                password,
            } => {
                if is_blank(secret) || is_blank(username) || is_blank(password) {
                    return Err(Error::config(
                        "JWT secret, username, and password are required for JWT authentication",
                    ));
                }
            }
            AuthConfig::OAuth(config) => config.validate()?,
            AuthConfig::Cookie { nonce } => {
                if is_blank(nonce) {
                    return Err(Error::config("Nonce is required for cookie authentication"));
                }
            }
            AuthConfig::ApiKey { .. } => {}
        }
        Ok(())
    }

    /// Pick the configuration to use.
    ///
    /// An explicit configuration wins and must be complete. Otherwise the
    /// environment is scanned with [`AuthConfig::from_lookup`], whose
    /// fallback may be incomplete; that only fails once authentication runs.
    pub fn resolve<F>(explicit: Option<AuthConfig>, lookup: F) -> Result<AuthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        match explicit {
            Some(config) => {
                config.validate()?;
                Ok(config)
            }
            None => Ok(Self::from_lookup(lookup)),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Methods are tried in order: application password, JWT, OAuth, cookie.
    /// The first one whose variables are all set is used. If none is complete
    /// the result is an application password with whatever was found.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let username = get("WORDPRESS_USERNAME");
        let app_password = get("WORDPRESS_APP_PASSWORD");
        if username.is_some() && app_password.is_some() {
            return AuthConfig::ApplicationPassword {
                username,
                password: app_password,
            };
        }

        if let (Some(secret), Some(jwt_user), Some(jwt_pass)) = (
            get("WORDPRESS_JWT_SECRET"),
            get("WORDPRESS_JWT_USERNAME"),
            get("WORDPRESS_JWT_PASSWORD"),
        ) {
            return AuthConfig::jwt(secret, jwt_user, jwt_pass);
        }

        if let (Some(client_id), Some(client_secret)) = (
            get("WORDPRESS_OAUTH_CLIENT_ID"),
            get("WORDPRESS_OAUTH_CLIENT_SECRET"),
        ) {
            let mut config = OAuthConfig::new(client_id, client_secret);
            if let Some(redirect_uri) = get("WORDPRESS_OAUTH_REDIRECT_URI") {
                config = config.with_redirect_uri(redirect_uri);
            }
            if let Some(token) = get("WORDPRESS_OAUTH_ACCESS_TOKEN") {
                config = config.with_access_token(token);
            }
            return AuthConfig::OAuth(config);
        }

        if let Some(nonce) = get("WORDPRESS_COOKIE_NONCE") {
            return AuthConfig::cookie(nonce);
        }

        AuthConfig::ApplicationPassword {
            username,
            password: app_password,
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    !matches!(value.as_deref(), Some(v) if !v.trim().is_empty())
}
