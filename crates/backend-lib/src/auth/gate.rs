// ============================
// crates/backend-lib/src/auth/gate.rs
// ============================
//! Authentication gate.
//!
//! Decides per request whether the caller is authenticated and drives the
//! login redirect flow:
//!
//! - `Anonymous` → `PendingProviderExchange` when the user starts a login
//! - `PendingProviderExchange` → `Authenticated` when the provider callback
//!   carries a matching `state` and the code exchange succeeds
//! - `PendingProviderExchange` → `Denied` on any callback failure
//! - `Authenticated` stays `Authenticated` when a login is started again
//! - `Authenticated` → `Anonymous` on logout
//!
//! All state lives in the session cookie; the gate itself is immutable.
use axum::{
    http::{header::SET_COOKIE, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::time::Duration;

use super::provider::{ExchangeError, ProviderRegistry};
use super::session::{PendingLogin, Session, SessionStore};
use super::token_generator::generate_secure_token;
use crate::error::AppError;
use crate::validation::sanitize_return_to;

/// Login entry point
pub const LOGIN_PATH: &str = "/login";

/// Where the user lands after login or logout by default
pub const HOME_PATH: &str = "/";

/// Authentication state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    PendingProviderExchange,
    Authenticated,
    Denied,
}

/// Query parameters of a provider callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Result of a gate step: the new state, where to send the browser, and the
/// cookie to set on the way (if any)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: AuthState,
    pub location: String,
    pub set_cookie: Option<String>,
}

impl IntoResponse for Transition {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.location).into_response();
        if let Some(cookie) = self.set_cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                },
                Err(e) => {
                    return AppError::Internal(format!("invalid cookie header: {e}")).into_response();
                },
            }
        }
        response
    }
}

/// Why a callback was refused
#[derive(Debug, thiserror::Error)]
enum Denial {
    #[error("provider reported an error: {0}")]
    ProviderError(String),
    #[error("callback is missing the {0} parameter")]
    MissingParam(&'static str),
    #[error("no login is pending")]
    NotPending,
    #[error("callback for {got} while a {expected} login is pending")]
    ProviderMismatch { expected: String, got: String },
    #[error("state parameter does not match")]
    StateMismatch,
    #[error("unknown provider")]
    UnknownProvider,
    #[error("code exchange failed: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("code exchange timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not write session: {0}")]
    Session(#[from] AppError),
}

/// Login state machine
#[derive(Clone)]
pub struct AuthGate {
    sessions: SessionStore,
    providers: ProviderRegistry,
    exchange_timeout: Duration,
}

impl AuthGate {
    pub fn new(
        sessions: SessionStore,
        providers: ProviderRegistry,
        exchange_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            providers,
            exchange_timeout,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// State implied by a session read from a request
    pub fn classify(&self, session: &Session) -> AuthState {
        if session.authenticated {
            AuthState::Authenticated
        } else if session.pending.is_some() {
            AuthState::PendingProviderExchange
        } else {
            AuthState::Anonymous
        }
    }

    /// Start a login with `provider`. A caller who is already signed in is
    /// sent straight to `return_to` and keeps their session.
    pub fn begin(
        &self,
        provider: &str,
        return_to: Option<&str>,
        current: &Session,
    ) -> Result<Transition, AppError> {
        let idp = self
            .providers
            .get(provider)
            .ok_or_else(|| AppError::UnknownProvider(provider.to_string()))?;

        if self.classify(current) == AuthState::Authenticated {
            return Ok(Transition {
                state: AuthState::Authenticated,
                location: sanitize_return_to(return_to),
                set_cookie: None,
            });
        }

        let state = generate_secure_token();
        let location = idp
            .begin_exchange(&state)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let pending = PendingLogin {
            provider: provider.to_string(),
            state,
            return_to: sanitize_return_to(return_to),
        };
        let set_cookie = self.sessions.write(&Session::pending(pending))?;

        tracing::info!(provider, "login started");
        ::metrics::counter!(crate::metrics::AUTH_LOGIN_STARTED).increment(1);

        Ok(Transition {
            state: AuthState::PendingProviderExchange,
            location,
            set_cookie: Some(set_cookie),
        })
    }

    /// Finish a login from the provider callback. Failures never surface as
    /// errors: they redirect to the login page without touching the cookie.
    pub async fn complete(
        &self,
        provider: &str,
        params: &CallbackParams,
        current: &Session,
    ) -> Transition {
        match self.try_complete(provider, params, current).await {
            Ok((session, return_to)) => match self.sessions.write(&session) {
                Ok(set_cookie) => {
                    tracing::info!(provider, subject = ?session.subject, "login succeeded");
                    ::metrics::counter!(crate::metrics::AUTH_LOGIN_SUCCEEDED).increment(1);
                    Transition {
                        state: AuthState::Authenticated,
                        location: return_to,
                        set_cookie: Some(set_cookie),
                    }
                },
                Err(e) => self.deny(provider, &Denial::Session(e)),
            },
            Err(denial) => self.deny(provider, &denial),
        }
    }

    /// End the session. Valid from any state and idempotent.
    pub fn logout(&self) -> Transition {
        tracing::info!("logout");
        ::metrics::counter!(crate::metrics::AUTH_LOGOUT).increment(1);
        Transition {
            state: AuthState::Anonymous,
            location: HOME_PATH.to_string(),
            set_cookie: Some(self.sessions.clear()),
        }
    }

    async fn try_complete(
        &self,
        provider: &str,
        params: &CallbackParams,
        current: &Session,
    ) -> Result<(Session, String), Denial> {
        if let Some(error) = &params.error {
            return Err(Denial::ProviderError(error.clone()));
        }
        let code = params.code.as_deref().ok_or(Denial::MissingParam("code"))?;
        let state = params.state.as_deref().ok_or(Denial::MissingParam("state"))?;

        let pending = current.pending.as_ref().ok_or(Denial::NotPending)?;
        if pending.provider != provider {
            return Err(Denial::ProviderMismatch {
                expected: pending.provider.clone(),
                got: provider.to_string(),
            });
        }
        if pending.state != state {
            return Err(Denial::StateMismatch);
        }

        let idp = self.providers.get(provider).ok_or(Denial::UnknownProvider)?;
        let profile = tokio::time::timeout(self.exchange_timeout, idp.complete_exchange(code))
            .await
            .map_err(|_| Denial::Timeout(self.exchange_timeout))??;

        Ok((
            Session::authenticated(provider, &profile),
            pending.return_to.clone(),
        ))
    }

    fn deny(&self, provider: &str, denial: &Denial) -> Transition {
        tracing::warn!(provider, reason = %denial, "login denied");
        ::metrics::counter!(crate::metrics::AUTH_LOGIN_DENIED).increment(1);
        Transition {
            state: AuthState::Denied,
            location: LOGIN_PATH.to_string(),
            set_cookie: None,
        }
    }
}
