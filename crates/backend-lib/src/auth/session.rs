// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Cookie-carried sessions.
//!
//! The server keeps no session table. A [`Session`] is wrapped in a versioned
//! envelope, serialized to JSON and sealed with AES-256-GCM under a key derived
//! from the configured secret. The sealed bytes (`nonce || ciphertext`) travel
//! base64url-encoded in the `__session` cookie. The GCM tag doubles as the
//! signature: a cookie whose bytes were altered fails to open and reads back
//! as an empty session.
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use axum::http::HeaderMap;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use super::cookie::{build_cookie, expired_cookie, find_cookie, SESSION_COOKIE_NAME};
use super::provider::IdentityProfile;
use crate::config::SessionSettings;
use crate::error::AppError;

/// Envelope version written by this build. Other versions are discarded.
pub const SESSION_FORMAT_VERSION: u8 = 1;

const NONCE_LEN: usize = 12;

/// What the server knows about the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Provider-issued subject identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Provider the identity came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Login started but not yet completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingLogin>,
}

/// An outstanding redirect to an identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub provider: String,
    /// Anti-forgery token echoed back by the provider
    pub state: String,
    /// Same-site path to land on after login
    pub return_to: String,
}

impl Session {
    /// Session for a user the provider vouched for
    pub fn authenticated(provider: &str, profile: &IdentityProfile) -> Self {
        Self {
            authenticated: true,
            display_name: profile.display_name(),
            subject: Some(profile.subject.clone()),
            provider: Some(provider.to_string()),
            pending: None,
        }
    }

    /// Session waiting for a provider callback
    pub fn pending(pending: PendingLogin) -> Self {
        Self {
            pending: Some(pending),
            ..Self::default()
        }
    }

    /// True for the logged-out, nothing-pending session
    pub fn is_empty(&self) -> bool {
        *self == Session::default()
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    /// Issued at, unix seconds
    iat: i64,
    /// Expires at, unix seconds
    exp: i64,
    session: Session,
}

/// Why a cookie value was discarded
#[derive(Debug, Error, PartialEq, Eq)]
enum Rejected {
    #[error("cookie is not valid base64")]
    Encoding,
    #[error("cookie is too short")]
    Truncated,
    #[error("cookie failed authentication")]
    Signature,
    #[error("payload is not a session envelope")]
    Payload,
    #[error("unsupported session version {0}")]
    Version(u8),
    #[error("session expired")]
    Expired,
}

/// Reads and writes sealed session cookies. Performs no I/O.
#[derive(Clone)]
pub struct SessionStore {
    cipher: Aes256Gcm,
    max_age_secs: u64,
    secure: bool,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("max_age_secs", &self.max_age_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store sealing with a key derived from `secret`
    pub fn new(secret: &str, max_age_secs: u64, secure: bool) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
            max_age_secs,
            secure,
        }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(&settings.secret, settings.max_age_secs, settings.secure)
    }

    /// Session carried by the request, or an empty one. Never fails.
    pub fn read(&self, headers: &HeaderMap) -> Session {
        match find_cookie(headers, SESSION_COOKIE_NAME) {
            Some(value) if !value.is_empty() => self.decode(value).unwrap_or_default(),
            _ => Session::default(),
        }
    }

    /// `Set-Cookie` value carrying a freshly sealed `session`
    pub fn write(&self, session: &Session) -> Result<String, AppError> {
        let value = self.encode(session)?;
        Ok(build_cookie(
            SESSION_COOKIE_NAME,
            &value,
            self.max_age_secs,
            self.secure,
        ))
    }

    /// `Set-Cookie` value for the logged-out state
    pub fn clear(&self) -> String {
        expired_cookie(SESSION_COOKIE_NAME, self.secure)
    }

    /// Seal a session into a cookie value
    pub fn encode(&self, session: &Session) -> Result<String, AppError> {
        let iat = Utc::now().timestamp();
        let max_age = i64::try_from(self.max_age_secs).unwrap_or(i64::MAX);
        let envelope = Envelope {
            v: SESSION_FORMAT_VERSION,
            iat,
            exp: iat.saturating_add(max_age),
            session: session.clone(),
        };
        self.seal(&envelope)
    }

    /// Open a cookie value. Any defect yields `None`.
    pub fn decode(&self, value: &str) -> Option<Session> {
        match self.open(value) {
            Ok(session) => Some(session),
            Err(reason) => {
                tracing::debug!(%reason, "discarding session cookie");
                ::metrics::counter!(crate::metrics::SESSION_REJECTED).increment(1);
                None
            },
        }
    }

    fn seal(&self, envelope: &Envelope) -> Result<String, AppError> {
        let plaintext = serde_json::to_vec(envelope)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|_| AppError::Internal("failed to seal session".to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    fn open(&self, value: &str) -> Result<Session, Rejected> {
        let combined = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| Rejected::Encoding)?;
        if combined.len() <= NONCE_LEN {
            return Err(Rejected::Truncated);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Rejected::Signature)?;

        let envelope: Envelope =
            serde_json::from_slice(&plaintext).map_err(|_| Rejected::Payload)?;
        if envelope.v != SESSION_FORMAT_VERSION {
            return Err(Rejected::Version(envelope.v));
        }
        if envelope.exp <= Utc::now().timestamp() {
            return Err(Rejected::Expired);
        }
        Ok(envelope.session)
    }
}
