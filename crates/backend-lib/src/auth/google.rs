// ============================
// crates/backend-lib/src/auth/google.rs
// ============================
//! Google OAuth 2.0 / OpenID Connect provider.
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;

use super::provider::{ExchangeError, IdentityProfile, IdentityProvider};
use crate::config::GoogleSettings;

/// Longest provider error body kept for logging
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo claims
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    email: Option<String>,
}

/// Authorization-code flow against Google's endpoints
pub struct GoogleProvider {
    settings: GoogleSettings,
    http: Client,
}

impl GoogleProvider {
    /// Create a provider whose HTTP calls give up after `timeout`
    pub fn new(settings: GoogleSettings, timeout: Duration) -> Result<Self, ExchangeError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { settings, http })
    }

    async fn ensure_success(response: Response) -> Result<Response, ExchangeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let end = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(end);
        }
        Err(ExchangeError::Provider {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn label(&self) -> &str {
        "Google"
    }

    fn begin_exchange(&self, state: &str) -> Result<String, ExchangeError> {
        let scope = self.settings.scopes.join(" ");
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        if let Some(prompt) = self.settings.prompt.as_deref() {
            params.push(("prompt", prompt));
        }

        Url::parse_with_params(&self.settings.auth_url, &params)
            .map(String::from)
            .map_err(|e| ExchangeError::Config(format!("auth_url: {e}")))
    }

    async fn complete_exchange(&self, code: &str) -> Result<IdentityProfile, ExchangeError> {
        if code.trim().is_empty() {
            return Err(ExchangeError::InvalidArtifact("empty code".to_string()));
        }

        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = Self::ensure_success(response).await?.json().await?;

        let response = self
            .http
            .get(&self.settings.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let info: UserInfo = Self::ensure_success(response).await?.json().await?;

        let subject = info
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| ExchangeError::MalformedProfile("missing subject".to_string()))?;

        Ok(IdentityProfile {
            subject,
            given_name: info.given_name,
            family_name: info.family_name,
            full_name: info.name,
            email: info.email,
        })
    }
}
