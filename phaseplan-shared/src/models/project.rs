/// Project model and database operations
///
/// A project is owned by exactly one consultant and carries the hour budget
/// its phases draw from.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     consultant_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     total_billed_hours NUMERIC NOT NULL CHECK (total_billed_hours >= 0),
///     start_date DATE NOT NULL,
///     end_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT projects_end_after_start CHECK (end_date IS NULL OR end_date >= start_date)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::models::project::{CreateProject, Project};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, consultant_id: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
///
/// let project = Project::create(&mut *tx, CreateProject {
///     consultant_id,
///     title: "Website relaunch".to_string(),
///     description: None,
///     total_billed_hours: Decimal::from(100),
///     start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
///     end_date: None,
/// }).await?;
///
/// let phases = Project::seed_default_phases(&mut tx, project.id).await?;
/// assert_eq!(phases.len(), 5);
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::phase::{CreatePhase, Phase};

/// Phases every new project starts with, in display order
pub const DEFAULT_PHASE_TITLES: [&str; 5] = [
    "Phase 1: Discovery & Planning",
    "Phase 2: Design & Prototyping",
    "Phase 3: Development & Implementation",
    "Phase 4: Testing & QA",
    "Phase 5: Deployment & Launch",
];

/// Billable project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    /// Owning user; never changes after creation
    pub consultant_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// Upper bound for the sum of phase allocations
    pub total_billed_hours: Decimal,

    pub start_date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub consultant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub total_billed_hours: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Complete set of editable project columns
///
/// Partial updates are merged onto the stored row first so the merged
/// values can be validated as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectChanges {
    pub title: String,
    pub description: Option<String>,
    pub total_billed_hours: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<&Project> for ProjectChanges {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            total_billed_hours: project.total_billed_hours,
            start_date: project.start_date,
            end_date: project.end_date,
        }
    }
}

impl Project {
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (consultant_id, title, description, total_billed_hours, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, consultant_id, title, description, total_billed_hours,
                      start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(data.consultant_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.total_billed_hours)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(executor)
        .await
    }

    /// Inserts the zero-hour default phases for a freshly created project
    ///
    /// Rows are inserted one at a time so their creation timestamps follow
    /// [`DEFAULT_PHASE_TITLES`] order.
    pub async fn seed_default_phases(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Phase>, sqlx::Error> {
        let mut phases = Vec::with_capacity(DEFAULT_PHASE_TITLES.len());

        for title in DEFAULT_PHASE_TITLES {
            let phase = Phase::create(
                &mut *conn,
                CreatePhase {
                    project_id,
                    title: title.to_string(),
                    allocated_hours: Decimal::ZERO,
                },
            )
            .await?;
            phases.push(phase);
        }

        Ok(phases)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, consultant_id, title, description, total_billed_hours,
                   start_date, end_date, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Same as `find_by_id` but takes a row lock until the transaction ends
    ///
    /// Budget checks hold this lock while they read phase allocations, so
    /// concurrent phase writes on one project are serialized.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, consultant_id, title, description, total_billed_hours,
                   start_date, end_date, created_at, updated_at
            FROM projects
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a consultant's projects, newest first
    pub async fn list_by_consultant<'e, E>(
        executor: E,
        consultant_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, consultant_id, title, description, total_billed_hours,
                   start_date, end_date, created_at, updated_at
            FROM projects
            WHERE consultant_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(consultant_id)
        .fetch_all(executor)
        .await
    }

    /// Writes every editable column
    ///
    /// Returns None if the project no longer exists.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = $2,
                description = $3,
                total_billed_hours = $4,
                start_date = $5,
                end_date = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, consultant_id, title, description, total_billed_hours,
                      start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.total_billed_hours)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a project together with its phases and tasks
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
