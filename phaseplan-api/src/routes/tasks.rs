/// Task endpoints
///
/// # Endpoints
///
/// - `POST /api/phases/:id/tasks` - Add a task to a phase
/// - `PATCH /api/tasks/:id` - Change title, description or completion
/// - `DELETE /api/tasks/:id` - Delete a task
///
/// Task writes lock the parent phase row for the length of the write, which
/// serializes them against a concurrent completion of that phase.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::input::{non_blank, nullable},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use phaseplan_shared::{
    auth::{
        authorization::{require_owner, ResourceKind},
        middleware::AuthContext,
    },
    models::{
        phase::Phase,
        task::{CreateTask, Task, UpdateTask},
    },
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub description: Option<String>,
}

/// Update task request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    /// `null` clears the description
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub is_completed: Option<bool>,
}

impl UpdateTaskRequest {
    fn into_update(self) -> ApiResult<UpdateTask> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(ApiError::invalid_field("title", "Title cannot be empty"));
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };

        let update = UpdateTask {
            title,
            description: self.description.map(non_blank),
            is_completed: self.is_completed,
        };

        if update.is_empty() {
            return Err(ApiError::BadRequest("No update data provided".to_string()));
        }

        Ok(update)
    }
}

/// Add a task to a phase
///
/// Adding a task to a completed phase is allowed and leaves the phase
/// completed.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(phase_id): Path<Uuid>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    require_owner(&state.db, auth.user_id, ResourceKind::Phase, phase_id).await?;

    let Json(req) = payload?;
    req.validate()?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }

    let mut tx = state.db.begin().await?;

    Phase::find_by_id_for_update(&mut *tx, phase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            phase_id,
            title,
            description: non_blank(req.description),
        },
    )
    .await?;

    tx.commit().await?;

    info!(task_id = %task.id, phase_id = %phase_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
///
/// # Errors
///
/// - `400 Bad Request`: Empty update or blank title
/// - `403 Forbidden` / `404 Not Found`: Task not owned / missing
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    require_owner(&state.db, auth.user_id, ResourceKind::Task, id).await?;

    let Json(req) = payload?;
    req.validate()?;
    let update = req.into_update()?;

    let mut tx = state.db.begin().await?;

    let task = Task::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Phase::find_by_id_for_update(&mut *tx, task.phase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    let updated = Task::update(&mut *tx, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tx.commit().await?;

    info!(task_id = %id, is_completed = updated.is_completed, "Task updated");

    Ok(Json(updated))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_owner(&state.db, auth.user_id, ResourceKind::Task, id).await?;

    let mut tx = state.db.begin().await?;

    let task = Task::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Phase::find_by_id_for_update(&mut *tx, task.phase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    // A concurrent delete may have won the phase lock first
    if !Task::delete(&mut *tx, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tx.commit().await?;

    info!(task_id = %id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
