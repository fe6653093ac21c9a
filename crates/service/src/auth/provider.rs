use async_trait::async_trait;
use configs::OAuthConfig;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::domain::OAuthProfile;
use super::errors::AuthError;

/// Third-party identity provider speaking the OAuth 2.0 authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to; `state` comes back on the callback.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;
    /// Trade the callback `code` for the signed-in user's profile.
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, AuthError>;
}

/// HTTP implementation driven by `[oauth]` configuration.
pub struct OAuthHttpProvider {
    cfg: OAuthConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OAuthHttpProvider {
    pub fn new(cfg: OAuthConfig) -> Self {
        Self { cfg, http: reqwest::Client::new() }
    }
}

#[async_trait]
impl IdentityProvider for OAuthHttpProvider {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let scope = self.cfg.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.cfg.authorize_url,
            &[
                ("client_id", self.cfg.client_id.as_str()),
                ("redirect_uri", self.cfg.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Provider(format!("invalid authorize_url: {e}")))?;
        Ok(url.to_string())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, AuthError> {
        let params = [
            ("code", code),
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.as_str()),
            ("redirect_uri", self.cfg.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self
            .http
            .post(&self.cfg.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, "oauth token exchange rejected");
            return Err(AuthError::Provider(format!("token endpoint returned {status}")));
        }
        let token: TokenResponse = resp.json().await.map_err(|e| AuthError::Provider(e.to_string()))?;

        let profile: OAuthProfile = self
            .http
            .get(&self.cfg.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if profile.email_verified == Some(false) {
            return Err(AuthError::Unauthorized);
        }
        info!(email = %profile.email, "oauth_profile_fetched");
        Ok(profile)
    }
}

/// Simple in-memory provider for tests and local development
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    /// Maps authorization codes to canned profiles.
    #[derive(Default)]
    pub struct StaticProvider {
        profiles: HashMap<String, OAuthProfile>,
    }

    impl StaticProvider {
        pub fn with_profile(mut self, code: &str, profile: OAuthProfile) -> Self {
            self.profiles.insert(code.to_string(), profile);
            self
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
            Ok(format!("https://idp.test/authorize?state={state}"))
        }

        async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, AuthError> {
            self.profiles
                .get(code)
                .cloned()
                .ok_or_else(|| AuthError::Provider("unknown authorization code".into()))
        }
    }
}
