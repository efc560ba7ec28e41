// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered: compiled defaults, then a TOML file, then
//! `TASKBOARD_`-prefixed environment variables (`__` separates nested keys),
//! then the conventional provider/secret variables such as `GOOGLE_CLIENT_ID`
//! and `SESSION_SECRET`.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};


/// Default config file looked up by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "taskboard.toml";

/// Prefix for structured environment overrides
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Session secret used when none is configured. Refused when cookies are `Secure`.
pub const DEV_SESSION_SECRET: &str = "taskboard-dev-secret-do-not-deploy";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
    /// Session cookie
    pub session: SessionSettings,
    /// Identity providers
    pub oauth: OAuthSettings,
    /// Task storage
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Secret the cookie sealing key is derived from
    pub secret: String,
    /// Add the `Secure` attribute to the cookie
    pub secure: bool,
    /// Cookie lifetime in seconds
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Upper bound for the server-to-server code exchange
    pub exchange_timeout_secs: u64,
    pub google: GoogleSettings,
}

/// Google OAuth client. Disabled while `client_id` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Root directory for the file backend
    pub path: PathBuf,
    /// Artificial pause before listing tasks
    pub list_delay_ms: u64,
    /// Insert the sample tasks into an empty store on startup
    pub seed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            log_level: "info".to_string(),
            log_json: false,
            session: SessionSettings::default(),
            oauth: OAuthSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            secret: DEV_SESSION_SECRET.to_string(),
            secure: false,
            max_age_secs: 60 * 60 * 24 * 7, // 7 days
        }
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            exchange_timeout_secs: 10,
            google: GoogleSettings::default(),
        }
    }
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            prompt: Some("select_account".to_string()),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data"),
            list_delay_ms: 500,
            seed: true,
        }
    }
}

impl GoogleSettings {
    /// Whether a Google client has been configured at all
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

impl Settings {
    /// Load settings from `taskboard.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file (if present) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(well_known_env())
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session.secret.is_empty() {
            bail!("session secret must not be empty");
        }
        if self.session.secret.len() < 16 {
            bail!("session secret must be at least 16 bytes");
        }
        if self.session.secure && self.session.secret == DEV_SESSION_SECRET {
            bail!("the development session secret cannot be used with secure cookies");
        }
        if self.session.max_age_secs == 0 {
            bail!("session max age must be greater than zero");
        }
        if self.oauth.exchange_timeout_secs == 0 {
            bail!("oauth exchange timeout must be greater than zero");
        }
        let google = &self.oauth.google;
        if google.is_configured() {
            if google.client_secret.is_empty() {
                bail!("google client secret is required when a client id is set");
            }
            if google.callback_url.is_empty() {
                bail!("google callback url is required when a client id is set");
            }
        }
        Ok(())
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }

    /// Upper bound for the provider code exchange
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.oauth.exchange_timeout_secs)
    }

    /// Artificial pause before task listings
    pub fn list_delay(&self) -> Duration {
        Duration::from_millis(self.storage.list_delay_ms)
    }
}

/// Conventional variable names used by OAuth deployments. Variables set to
/// an empty string are treated as unset.
fn well_known_env() -> Env {
    Env::raw()
        .filter(|key| {
            std::env::var_os(key.as_str()).is_some_and(|value| !value.is_empty())
        })
        .filter_map(|key| match key.as_str().to_ascii_uppercase().as_str() {
            "GOOGLE_CLIENT_ID" => Some("oauth.google.client_id".into()),
            "GOOGLE_CLIENT_SECRET" => Some("oauth.google.client_secret".into()),
            "GOOGLE_CALLBACK_URL" => Some("oauth.google.callback_url".into()),
            "SESSION_SECRET" => Some("session.secret".into()),
            _ => None,
        })
}
