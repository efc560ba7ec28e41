// ============================
// crates/backend-lib/src/handlers/api.rs
// ============================
//! JSON task API under `/api/tasks`.
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use taskboard_common::{TaskMutation, TaskRecord};

use super::SearchQuery;
use crate::error::AppError;
use crate::middleware::ApiUser;
use crate::AppState;

/// An empty body means "no fields"
fn parse_mutation(body: &[u8]) -> Result<TaskMutation, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TaskMutation::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidInput(format!("Invalid task body: {e}")))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    _user: ApiUser,
    Query(search): Query<SearchQuery>,
) -> Result<Json<Vec<TaskRecord>>, AppError> {
    Ok(Json(state.tasks.get_tasks(search.q.as_deref()).await?))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    _user: ApiUser,
    body: Bytes,
) -> Result<(StatusCode, Json<TaskRecord>), AppError> {
    let task = state.tasks.create_task(parse_mutation(&body)?).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    _user: ApiUser,
    Path(id): Path<String>,
) -> Result<Json<TaskRecord>, AppError> {
    Ok(Json(state.tasks.get_task(&id).await?))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    _user: ApiUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<TaskRecord>, AppError> {
    let task = state.tasks.update_task(&id, parse_mutation(&body)?).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    _user: ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
