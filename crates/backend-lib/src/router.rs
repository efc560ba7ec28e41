// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP routes.
use crate::handlers::{api, auth, tasks};
use crate::middleware::resolve_identity;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/", get(api::list_tasks).post(api::create_task))
        .route(
            "/{id}",
            get(api::get_task)
                .patch(api::update_task)
                .delete(api::delete_task),
        );

    Router::new()
        .route("/", get(tasks::index).post(tasks::create))
        .route("/login", get(auth::login_page))
        .route("/auth/{provider}", get(auth::begin))
        .route("/auth/{provider}/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route("/tasks/{id}", get(tasks::show).post(tasks::toggle_done))
        .route("/tasks/{id}/edit", get(tasks::edit_form).post(tasks::save_edit))
        .route("/tasks/{id}/destroy", post(tasks::destroy))
        .nest("/api/tasks", api)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
