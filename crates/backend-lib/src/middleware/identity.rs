use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{AuthState, Session, LOGIN_PATH};
use crate::{error::AppError, AppState};

/// Identity resolved for the current request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub state: AuthState,
    pub session: Session,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            state: AuthState::Anonymous,
            session: Session::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    fn of(parts: &Parts) -> Self {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_else(AuthContext::anonymous)
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.is_authenticated().then(|| CurrentUser {
            display_name: self.session.display_name.clone(),
            subject: self.session.subject.clone(),
        })
    }
}

/// Read the session cookie once per request and attach an [`AuthContext`]
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = state.gate.sessions().read(request.headers());
    let auth_state = state.gate.classify(&session);
    request.extensions_mut().insert(AuthContext {
        state: auth_state,
        session,
    });
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext::of(parts))
    }
}

/// An authenticated caller of an HTML route. Anonymous callers are sent to
/// the login page and brought back afterwards.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub display_name: Option<String>,
    pub subject: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthContext::of(parts).user().ok_or_else(|| {
            // only a page can be revisited after login
            let return_to = match parts.method {
                Method::GET | Method::HEAD => {
                    parts.uri.path_and_query().map_or("/", |pq| pq.as_str())
                },
                _ => "/",
            };
            let location = format!(
                "{LOGIN_PATH}?return_to={}",
                urlencoding::encode(return_to)
            );
            Redirect::to(&location).into_response()
        })
    }
}

/// An authenticated caller of the JSON API, 401 otherwise
#[derive(Debug, Clone)]
pub struct ApiUser(pub CurrentUser);

impl<S: Send + Sync> FromRequestParts<S> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthContext::of(parts)
            .user()
            .map(ApiUser)
            .ok_or_else(|| AppError::Auth("Login required".to_string()))
    }
}
