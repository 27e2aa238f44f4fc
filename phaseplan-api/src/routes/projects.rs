/// Project endpoints
///
/// # Endpoints
///
/// - `GET /api/projects` - List the caller's projects
/// - `POST /api/projects` - Create a project with its default phases
/// - `GET /api/projects/:id` - Project with phases, tasks and budget summary
/// - `PATCH /api/projects/:id` - Partial update
/// - `DELETE /api/projects/:id` - Delete with all phases and tasks
///
/// Every `:id` route checks ownership before looking at the request body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        input::{non_blank, nullable, nullable_date, optional_date, optional_hours},
        ApiJson,
    },
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use phaseplan_shared::{
    auth::{
        authorization::{require_owner, ResourceKind},
        middleware::AuthContext,
    },
    budget,
    models::{
        phase::Phase,
        project::{CreateProject, Project, ProjectChanges},
        task::Task,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "optional_hours")]
    pub total_billed_hours: Option<Decimal>,

    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,

    /// Create the five standard phases (default: true)
    pub seed_default_phases: Option<bool>,
}

/// Partial project update
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "optional_hours")]
    pub total_billed_hours: Option<Decimal>,

    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "nullable_date")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl UpdateProjectRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.total_billed_hours.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// Project with its phases
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithPhases {
    #[serde(flatten)]
    pub project: Project,

    pub phases: Vec<Phase>,
}

/// Phase with its tasks
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseWithTasks {
    #[serde(flatten)]
    pub phase: Phase,

    pub tasks: Vec<Task>,
}

/// Full project view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,

    pub phases: Vec<PhaseWithTasks>,

    /// Sum of phase allocations
    pub allocated_hours: Decimal,

    /// Budget not yet allocated to any phase
    pub remaining_hours: Decimal,
}

impl ProjectDetail {
    fn assemble(project: Project, phases: Vec<Phase>, tasks: Vec<Task>) -> Self {
        let allocations: Vec<_> = phases.iter().map(Phase::allocation).collect();
        let allocated_hours = budget::allocated_sum(&allocations, None);
        let remaining_hours = budget::remaining_hours(project.total_billed_hours, &allocations);

        let phases = phases
            .into_iter()
            .map(|phase| {
                let tasks = tasks
                    .iter()
                    .filter(|t| t.phase_id == phase.id)
                    .cloned()
                    .collect();
                PhaseWithTasks { phase, tasks }
            })
            .collect();

        Self {
            project,
            phases,
            allocated_hours,
            remaining_hours,
        }
    }
}

/// Checks the merged editable columns of a project
fn validate_changes(changes: &ProjectChanges) -> ApiResult<()> {
    if changes.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }

    budget::validate_hours(changes.total_billed_hours).map_err(|_| {
        ApiError::invalid_field(
            "totalBilledHours",
            "Total billed hours must be a non-negative number",
        )
    })?;

    if let Some(end_date) = changes.end_date {
        if end_date < changes.start_date {
            return Err(ApiError::invalid_field(
                "endDate",
                "End date cannot be before start date",
            ));
        }
    }

    Ok(())
}

/// List the caller's projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_by_consultant(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

/// Create a project
///
/// # Endpoint
///
/// ```text
/// POST /api/projects
///
/// {
///   "title": "Website relaunch",
///   "description": "Optional",
///   "totalBilledHours": "100",
///   "startDate": "2025-01-06",
///   "endDate": "2025-03-31"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing title, hours or start date; invalid hours;
///   end date before start date
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectWithPhases>)> {
    req.validate()?;

    let total_billed_hours = req.total_billed_hours.ok_or_else(|| {
        ApiError::invalid_field("totalBilledHours", "Total billed hours is required")
    })?;
    let start_date = req
        .start_date
        .ok_or_else(|| ApiError::invalid_field("startDate", "Start date is required"))?;

    let changes = ProjectChanges {
        title: req.title.trim().to_string(),
        description: non_blank(req.description),
        total_billed_hours,
        start_date,
        end_date: req.end_date,
    };
    validate_changes(&changes)?;

    let mut tx = state.db.begin().await?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            consultant_id: auth.user_id,
            title: changes.title,
            description: changes.description,
            total_billed_hours: changes.total_billed_hours,
            start_date: changes.start_date,
            end_date: changes.end_date,
        },
    )
    .await?;

    let phases = if req.seed_default_phases.unwrap_or(true) {
        Project::seed_default_phases(&mut *tx, project.id).await?
    } else {
        Vec::new()
    };

    tx.commit().await?;

    info!(
        project_id = %project.id,
        consultant_id = %auth.user_id,
        phases = phases.len(),
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(ProjectWithPhases { project, phases })))
}

/// Project with phases, tasks and budget summary
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    require_owner(&state.db, auth.user_id, ResourceKind::Project, id).await?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    let phases = Phase::list_by_project(&state.db, id).await?;
    let tasks = Task::list_by_project(&state.db, id).await?;

    Ok(Json(ProjectDetail::assemble(project, phases, tasks)))
}

/// Partially update a project
///
/// The merged result must be a valid project, and a new budget may not
/// drop below the hours already allocated to phases.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    require_owner(&state.db, auth.user_id, ResourceKind::Project, id).await?;

    let Json(req) = payload?;
    req.validate()?;
    if req.is_empty() {
        return Err(ApiError::BadRequest("No update data provided".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let project = Project::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let mut changes = ProjectChanges::from(&project);
    if let Some(title) = req.title {
        changes.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        changes.description = non_blank(description);
    }
    if let Some(hours) = req.total_billed_hours {
        changes.total_billed_hours = hours;
    }
    if let Some(start_date) = req.start_date {
        changes.start_date = start_date;
    }
    if let Some(end_date) = req.end_date {
        changes.end_date = end_date;
    }
    validate_changes(&changes)?;

    if changes.total_billed_hours != project.total_billed_hours {
        let allocations = Phase::allocations_for_project(&mut *tx, id).await?;
        budget::validate_total_hours(changes.total_billed_hours, &allocations)?;
    }

    let updated = Project::update(&mut *tx, id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tx.commit().await?;

    info!(project_id = %id, "Project updated");

    Ok(Json(updated))
}

/// Delete a project and everything under it
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_owner(&state.db, auth.user_id, ResourceKind::Project, id).await?;

    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    info!(project_id = %id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn changes() -> ProjectChanges {
        ProjectChanges {
            title: "Audit".to_string(),
            description: None,
            total_billed_hours: Decimal::from(100),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
        }
    }

    #[test]
    fn test_validate_changes() {
        assert!(validate_changes(&changes()).is_ok());

        let blank = ProjectChanges {
            title: "  ".to_string(),
            ..changes()
        };
        assert!(validate_changes(&blank).is_err());

        let negative = ProjectChanges {
            total_billed_hours: Decimal::from(-1),
            ..changes()
        };
        assert!(validate_changes(&negative).is_err());

        let backwards = ProjectChanges {
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..changes()
        };
        assert!(validate_changes(&backwards).is_err());

        let same_day = ProjectChanges {
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..changes()
        };
        assert!(validate_changes(&same_day).is_ok());
    }

    #[test]
    fn test_create_request_accepts_form_strings() {
        let req: CreateProjectRequest = serde_json::from_str(
            r#"{"title":"Site","totalBilledHours":"100","startDate":"2025-01-06","endDate":""}"#,
        )
        .unwrap();

        assert_eq!(req.total_billed_hours, Some(Decimal::from(100)));
        assert_eq!(req.end_date, None);
        assert_eq!(req.seed_default_phases, None);
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateProjectRequest::default().is_empty());

        let req: UpdateProjectRequest = serde_json::from_str(r#"{"endDate": null}"#).unwrap();
        assert!(!req.is_empty());
        assert_eq!(req.end_date, Some(None));
    }

    #[test]
    fn test_detail_groups_tasks_and_sums_hours() {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            consultant_id: Uuid::new_v4(),
            title: "Audit".to_string(),
            description: None,
            total_billed_hours: Decimal::from(100),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: None,
            created_at: now,
            updated_at: now,
        };
        let phase = |hours: i64| Phase {
            id: Uuid::new_v4(),
            project_id: project.id,
            title: "Phase".to_string(),
            allocated_hours: Decimal::from(hours),
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        let phases = vec![phase(60), phase(15)];
        let task = Task {
            id: Uuid::new_v4(),
            phase_id: phases[1].id,
            title: "Review".to_string(),
            description: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };

        let detail = ProjectDetail::assemble(project, phases, vec![task]);

        assert_eq!(detail.allocated_hours, Decimal::from(75));
        assert_eq!(detail.remaining_hours, Decimal::from(25));
        assert!(detail.phases[0].tasks.is_empty());
        assert_eq!(detail.phases[1].tasks.len(), 1);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["totalBilledHours"], 100.0);
        assert_eq!(json["remainingHours"], 25.0);
        assert!(json["phases"][1]["tasks"].is_array());
    }
}
