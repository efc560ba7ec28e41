// ============================
// crates/backend-lib/src/handlers/tasks.rs
// ============================
//! HTML task pages.
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use taskboard_common::TaskMutation;

use super::SearchQuery;
use crate::error::AppError;
use crate::middleware::{AuthContext, CurrentUser};
use crate::views::Chrome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DoneForm {
    pub done: String,
}

#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// Sidebar for a signed-in user
async fn chrome(
    state: &AppState,
    user: &CurrentUser,
    query: Option<&str>,
) -> Result<Chrome, AppError> {
    let tasks = state.tasks.get_tasks(query).await?;
    Ok(Chrome::signed_in(user.display_name.clone(), &tasks, query))
}

/// `GET /`. Anonymous visitors get the empty-state page; no tasks are loaded.
pub async fn index(
    State(state): State<Arc<AppState>>,
    context: AuthContext,
    Query(search): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let chrome = match context.user() {
        Some(user) => chrome(&state, &user, search.q.as_deref()).await?,
        None => Chrome::anonymous(),
    };
    state.views.index(&chrome)
}

/// `POST /`: new empty task, then straight to its edit form
pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Redirect, AppError> {
    let task = state.tasks.create_empty_task().await?;
    Ok(Redirect::to(&format!("/tasks/{}/edit", task.id)))
}

/// `GET /tasks/{id}`
pub async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let task = state.tasks.get_task(&id).await?;
    let chrome = chrome(&state, &user, None).await?;
    state.views.task(&chrome, &task)
}

/// `POST /tasks/{id}`: set the done flag
pub async fn toggle_done(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<DoneForm>,
) -> Result<Redirect, AppError> {
    let values = TaskMutation {
        done: Some(form.done == "true"),
        ..Default::default()
    };
    state.tasks.update_task(&id, values).await?;
    Ok(Redirect::to(&format!("/tasks/{id}")))
}

/// `GET /tasks/{id}/edit`
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let task = state.tasks.get_task(&id).await?;
    let chrome = chrome(&state, &user, None).await?;
    state.views.edit(&chrome, &task)
}

/// `POST /tasks/{id}/edit`
pub async fn save_edit(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<EditForm>,
) -> Result<Redirect, AppError> {
    let values = TaskMutation {
        name: form.name,
        notes: form.notes,
        ..Default::default()
    };
    state.tasks.update_task(&id, values).await?;
    Ok(Redirect::to(&format!("/tasks/{id}")))
}

/// `POST /tasks/{id}/destroy`
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.tasks.delete_task(&id).await?;
    Ok(Redirect::to("/"))
}
