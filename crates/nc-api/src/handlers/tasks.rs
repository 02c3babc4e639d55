//! Task handlers

use axum::{extract::State, http::StatusCode, Json};
use nc_core::result::Outcome;
use nc_core::traits::Id;
use nc_core::types::TaskStatus;
use nc_db::TaskFilter;
use nc_models::{NewTask, Task, TaskNode};
use nc_services::StatusChange;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.services.tasks.list(&user, filter).await?))
}

/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.services.tasks.get(&user, id).await?))
}

/// GET /api/v1/tasks/:id/tree
pub async fn task_tree(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<TaskNode>> {
    Ok(Json(state.services.tasks.tree(&user, id).await?))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(params): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, Json<Outcome<Task>>)> {
    let outcome = state.services.tasks.create(&user, params).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PATCH /api/v1/tasks/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Id>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Outcome<StatusChange>>> {
    Ok(Json(state.services.tasks.update_status(&user, id, body.status).await?))
}

/// DELETE /api/v1/tasks/:id
///
/// Responds with the ids of every removed task.
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Outcome<Vec<Id>>>> {
    Ok(Json(state.services.tasks.delete(&user, id).await?))
}
