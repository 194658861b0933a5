use tracing::instrument;

use wp_api_auth::{AuthConfig, AuthSession, OAuthFlow};
use wp_api_client::{Error, Result};

impl super::WordPressClient {
    /// The OAuth flow for this site.
    ///
    /// Fails unless OAuth is the configured method.
    pub fn oauth_flow(&self) -> Result<OAuthFlow> {
        match self.auth.config() {
            AuthConfig::OAuth(config) => OAuthFlow::new(self.http.config(), config.clone()),
            other => Err(Error::config(format!(
                "OAuth flow requested but the active authentication method is {}",
                other.method()
            ))),
        }
    }

    /// Exchange an authorization code and install the resulting token.
    #[instrument(skip(self, code, code_verifier))]
    pub async fn complete_oauth(&self, code: &str, code_verifier: &str) -> Result<AuthSession> {
        let token = self.oauth_flow()?.exchange_code(code, code_verifier).await?;
        self.auth.install_token(&token);
        Ok(self.auth.session())
    }

    /// Refresh the OAuth access token with the stored refresh token.
    #[instrument(skip(self))]
    pub async fn refresh_oauth_token(&self) -> Result<AuthSession> {
        let flow = self.oauth_flow()?;
        let refresh_token = self
            .auth
            .session()
            .refresh_token()
            .map(str::to_string)
            .ok_or_else(|| Error::authentication("No refresh token available"))?;

        let token = flow.refresh(&refresh_token).await?;
        self.auth.install_token(&token);
        Ok(self.auth.session())
    }
}
