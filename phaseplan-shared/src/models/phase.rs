/// Phase model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE phases (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     allocated_hours NUMERIC NOT NULL DEFAULT 0 CHECK (allocated_hours >= 0),
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `created_at` uses `clock_timestamp()` so phases inserted in one
/// transaction still list in insertion order.
///
/// The model writes whatever it is given. Budget and completion rules are
/// enforced by callers through [`crate::budget`] and [`crate::completion`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::budget::PhaseAllocation;
use crate::completion::PhaseStatus;

/// Budgeted sub-unit of a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: Uuid,

    pub project_id: Uuid,

    pub title: String,

    /// Hours drawn from the project's budget
    pub allocated_hours: Decimal,

    pub is_completed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Phase {
    pub fn status(&self) -> PhaseStatus {
        PhaseStatus::from_completed(self.is_completed)
    }

    pub fn allocation(&self) -> PhaseAllocation {
        PhaseAllocation::new(self.id, self.allocated_hours)
    }
}

/// Input for creating a phase
#[derive(Debug, Clone)]
pub struct CreatePhase {
    pub project_id: Uuid,
    pub title: String,
    pub allocated_hours: Decimal,
}

/// Input for updating a phase; None leaves a column unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePhase {
    pub title: Option<String>,
    pub allocated_hours: Option<Decimal>,
    pub is_completed: Option<bool>,
}

impl UpdatePhase {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.allocated_hours.is_none() && self.is_completed.is_none()
    }
}

impl Phase {
    pub async fn create<'e, E>(executor: E, data: CreatePhase) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Phase>(
            r#"
            INSERT INTO phases (project_id, title, allocated_hours)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, title, allocated_hours, is_completed, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.allocated_hours)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Phase>(
            r#"
            SELECT id, project_id, title, allocated_hours, is_completed, created_at, updated_at
            FROM phases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Locks the phase row until the transaction ends
    ///
    /// Task writes take this lock so the open-task count a completion check
    /// reads cannot change underneath it.
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Phase>(
            r#"
            SELECT id, project_id, title, allocated_hours, is_completed, created_at, updated_at
            FROM phases
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a project's phases in creation order
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Phase>(
            r#"
            SELECT id, project_id, title, allocated_hours, is_completed, created_at, updated_at
            FROM phases
            WHERE project_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Hours currently allocated by each of a project's phases
    pub async fn allocations_for_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<PhaseAllocation>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(
            "SELECT id, allocated_hours FROM phases WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, hours)| PhaseAllocation::new(id, hours))
            .collect())
    }

    /// Applies the non-None fields of `data`
    ///
    /// Returns None if the phase does not exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdatePhase,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE phases SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.allocated_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", allocated_hours = ${}", bind_count));
        }
        if data.is_completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, project_id, title, allocated_hours, is_completed, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Phase>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(hours) = data.allocated_hours {
            q = q.bind(hours);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }

        q.fetch_optional(executor).await
    }

    /// Deletes a phase and its tasks; the freed hours return to the project
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM phases WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
