// ============================
// crates/backend-lib/src/auth/provider.rs
// ============================
//! Identity provider abstraction.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a provider exchange. Never shown to users; the gate turns it
/// into a redirect to the login page.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("invalid authorization artifact: {0}")]
    InvalidArtifact(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed profile: {0}")]
    MalformedProfile(String),

    #[error("provider misconfigured: {0}")]
    Config(String),
}

/// Identity attributes returned by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub subject: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl IdentityProfile {
    /// Given and family name joined by a space, else the full name.
    /// `None` when the provider sent nothing usable.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.given_name, &self.family_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// A delegated login mechanism
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Path segment under `/auth/`
    fn name(&self) -> &str;

    /// Label for the login link
    fn label(&self) -> &str {
        self.name()
    }

    /// Authorization URL to send the browser to
    fn begin_exchange(&self, state: &str) -> Result<String, ExchangeError>;

    /// Trade the authorization code for identity attributes
    async fn complete_exchange(&self, code: &str) -> Result<IdentityProfile, ExchangeError>;
}

/// Providers by name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing any provider with the same name
    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered providers in name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn IdentityProvider>> {
        self.providers.values()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
