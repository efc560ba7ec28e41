// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login, provider redirect, callback and logout.
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{CallbackParams, Transition};
use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::validation::sanitize_return_to;
use crate::views::{Chrome, ProviderLink};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// `GET /login`
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    context: AuthContext,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if context.is_authenticated() {
        let target = sanitize_return_to(query.return_to.as_deref());
        return Ok(Redirect::to(&target).into_response());
    }

    let providers: Vec<ProviderLink> = state
        .gate
        .providers()
        .iter()
        .map(|p| ProviderLink {
            name: p.name().to_string(),
            label: p.label().to_string(),
        })
        .collect();
    let return_to = query
        .return_to
        .as_deref()
        .map(|r| urlencoding::encode(&sanitize_return_to(Some(r))).into_owned());

    let page = state
        .views
        .login(&Chrome::anonymous(), &providers, return_to.as_deref())?;
    Ok(page.into_response())
}

/// `GET /auth/{provider}`
pub async fn begin(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    context: AuthContext,
    Query(query): Query<LoginQuery>,
) -> Result<Transition, AppError> {
    state
        .gate
        .begin(&provider, query.return_to.as_deref(), &context.session)
}

/// `GET /auth/{provider}/callback`
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    context: AuthContext,
    Query(params): Query<CallbackParams>,
) -> Transition {
    state.gate.complete(&provider, &params, &context.session).await
}

/// `POST /logout`
pub async fn logout(State(state): State<Arc<AppState>>) -> Transition {
    state.gate.logout()
}
