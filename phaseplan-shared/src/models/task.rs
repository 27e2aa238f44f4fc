/// Task model and database operations
///
/// Tasks are the work items of a phase. A task is either open or done and
/// may flip between the two at any time; the number of open tasks is what
/// gates completion of the owning phase.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     phase_id UUID NOT NULL REFERENCES phases(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE INDEX idx_tasks_open ON tasks(phase_id) WHERE is_completed = FALSE;
/// ```
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::models::task::{CreateTask, Task, UpdateTask};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, phase_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     phase_id,
///     title: "Write test plan".to_string(),
///     description: None,
/// }).await?;
///
/// Task::update(&pool, task.id, UpdateTask {
///     is_completed: Some(true),
///     ..Default::default()
/// }).await?;
///
/// assert_eq!(Task::count_open_by_phase(&pool, phase_id).await?, 0);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::completion::TaskStatus;

/// Work item within a phase
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub phase_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub is_completed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_completed(self.is_completed)
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub phase_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Input for updating a task
///
/// `description` is doubly optional: `Some(None)` clears it, `None` leaves
/// it unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }
}

impl Task {
    /// Creates an open task
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (phase_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, phase_id, title, description, is_completed, created_at, updated_at
            "#,
        )
        .bind(data.phase_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, phase_id, title, description, is_completed, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a phase's tasks in creation order
    pub async fn list_by_phase<'e, E>(
        executor: E,
        phase_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, phase_id, title, description, is_completed, created_at, updated_at
            FROM tasks
            WHERE phase_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(phase_id)
        .fetch_all(executor)
        .await
    }

    /// Lists every task of every phase in a project
    ///
    /// Ordered by phase then creation time, so callers can group rows by
    /// `phase_id` without re-sorting.
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.phase_id, t.title, t.description, t.is_completed,
                   t.created_at, t.updated_at
            FROM tasks t
            JOIN phases p ON p.id = t.phase_id
            WHERE p.project_id = $1
            ORDER BY p.created_at, p.id, t.created_at, t.id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Number of incomplete tasks in a phase
    pub async fn count_open_by_phase<'e, E>(executor: E, phase_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks WHERE phase_id = $1 AND is_completed = FALSE",
        )
        .bind(phase_id)
        .fetch_one(executor)
        .await
    }

    /// Applies the set fields of `data`
    ///
    /// Returns None if the task does not exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.is_completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, phase_id, title, description, is_completed, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }

        q.fetch_optional(executor).await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
