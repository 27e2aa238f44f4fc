/// Phase endpoints
///
/// # Endpoints
///
/// - `POST /api/projects/:id/phases` - Add a phase to a project
/// - `PATCH /api/phases/:id` - Change title, hours or completion
/// - `DELETE /api/phases/:id` - Delete a phase and its tasks
///
/// # Concurrency
///
/// Budget checks run in the same transaction as the write, under a row lock
/// on the parent project. Completion changes additionally lock the phase
/// row, which task writes also lock, so the open-task count cannot change
/// between the check and the update. Locks are always taken project first.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::input::optional_hours,
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
    budget,
    completion::{set_phase_completion, CompletionTransition},
    models::{
        phase::{CreatePhase, Phase, UpdatePhase},
        project::Project,
        task::Task,
    },
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Create phase request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhaseRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    /// Defaults to 0
    #[serde(default, deserialize_with = "optional_hours")]
    pub allocated_hours: Option<Decimal>,
}

/// Update phase request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhaseRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "optional_hours")]
    pub allocated_hours: Option<Decimal>,

    pub is_completed: Option<bool>,
}

impl UpdatePhaseRequest {
    /// Converts to a model update, rejecting empty or blank input
    fn into_update(self) -> ApiResult<UpdatePhase> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(ApiError::invalid_field("title", "Title cannot be empty"));
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };

        let update = UpdatePhase {
            title,
            allocated_hours: self.allocated_hours,
            is_completed: self.is_completed,
        };

        if update.is_empty() {
            return Err(ApiError::BadRequest("No update data provided".to_string()));
        }

        Ok(update)
    }
}

fn invalid_hours() -> ApiError {
    ApiError::invalid_field(
        "allocatedHours",
        "Allocated hours must be a non-negative number",
    )
}

/// Add a phase to a project
///
/// # Endpoint
///
/// ```text
/// POST /api/projects/:id/phases
///
/// { "title": "Phase 6: Handover", "allocatedHours": 10 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank title, invalid hours, or budget exceeded
/// - `403 Forbidden` / `404 Not Found`: Project not owned / missing
pub async fn create_phase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<CreatePhaseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Phase>)> {
    require_owner(&state.db, auth.user_id, ResourceKind::Project, project_id).await?;

    let Json(req) = payload?;
    req.validate()?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }
    let allocated_hours = req.allocated_hours.unwrap_or(Decimal::ZERO);
    budget::validate_hours(allocated_hours).map_err(|_| invalid_hours())?;

    let mut tx = state.db.begin().await?;

    let project = Project::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let allocations = Phase::allocations_for_project(&mut *tx, project_id).await?;
    budget::validate_allocation(
        project.total_billed_hours,
        &allocations,
        allocated_hours,
        None,
    )?;

    let phase = Phase::create(
        &mut *tx,
        CreatePhase {
            project_id,
            title,
            allocated_hours,
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        phase_id = %phase.id,
        project_id = %project_id,
        allocated_hours = %allocated_hours,
        "Phase created"
    );

    Ok((StatusCode::CREATED, Json(phase)))
}

/// Update a phase
///
/// # Endpoint
///
/// ```text
/// PATCH /api/phases/:id
///
/// { "allocatedHours": "20", "isCompleted": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty update, blank title, invalid hours, budget
///   exceeded, or open tasks block completion
/// - `403 Forbidden` / `404 Not Found`: Phase not owned / missing
pub async fn update_phase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePhaseRequest>, JsonRejection>,
) -> ApiResult<Json<Phase>> {
    require_owner(&state.db, auth.user_id, ResourceKind::Phase, id).await?;

    let Json(req) = payload?;
    req.validate()?;
    let update = req.into_update()?;

    if let Some(hours) = update.allocated_hours {
        budget::validate_hours(hours).map_err(|_| invalid_hours())?;
    }

    let mut tx = state.db.begin().await?;

    let project_id = Phase::find_by_id(&mut *tx, id)
        .await?
        .map(|phase| phase.project_id)
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    let project = Project::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let phase = Phase::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    if let Some(hours) = update.allocated_hours {
        let allocations = Phase::allocations_for_project(&mut *tx, project.id).await?;
        budget::validate_allocation(project.total_billed_hours, &allocations, hours, Some(id))?;
    }

    if let Some(target) = update.is_completed {
        let open_tasks = Task::count_open_by_phase(&mut *tx, id).await?;
        let transition = set_phase_completion(phase.status(), target, open_tasks)?;

        match transition {
            CompletionTransition::Completed => info!(phase_id = %id, "Phase completed"),
            CompletionTransition::Reopened => info!(phase_id = %id, "Phase reopened"),
            CompletionTransition::Unchanged => {
                debug!(phase_id = %id, is_completed = target, "Phase completion unchanged")
            }
        }
    }

    let updated = Phase::update(&mut *tx, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Phase not found".to_string()))?;

    tx.commit().await?;

    Ok(Json(updated))
}

/// Delete a phase and its tasks
///
/// The phase's hours become available to the project again.
pub async fn delete_phase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_owner(&state.db, auth.user_id, ResourceKind::Phase, id).await?;

    if !Phase::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Phase not found".to_string()));
    }

    info!(phase_id = %id, "Phase deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_rejected() {
        let err = UpdatePhaseRequest::default().into_update().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "No update data provided"));
    }

    #[test]
    fn test_blank_title_rejected() {
        let req = UpdatePhaseRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.into_update(), Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_update_trims_title() {
        let req: UpdatePhaseRequest =
            serde_json::from_str(r#"{"title": " Design ", "allocatedHours": "12.5"}"#).unwrap();
        let update = req.into_update().unwrap();

        assert_eq!(update.title.as_deref(), Some("Design"));
        assert_eq!(update.allocated_hours, Some(Decimal::new(125, 1)));
        assert_eq!(update.is_completed, None);
    }

    #[test]
    fn test_create_request_defaults_hours() {
        let req: CreatePhaseRequest = serde_json::from_str(r#"{"title": "Extra"}"#).unwrap();
        assert_eq!(req.allocated_hours, None);
    }
}
