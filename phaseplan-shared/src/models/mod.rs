/// Database models for Phaseplan
///
/// # Models
///
/// - `user`: Consultant accounts, credentials and password-reset state
/// - `project`: Billable projects owned by a user
/// - `phase`: Budgeted sub-units of a project
/// - `task`: Work items whose completion gates their phase
///
/// Ownership runs task → phase → project → user. Deleting a project
/// cascades to its phases and tasks.
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::models::project::Project;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// for project in Project::list_by_consultant(&pool, user_id).await? {
///     println!("{} ({} h)", project.title, project.total_billed_hours);
/// }
/// # Ok(())
/// # }
/// ```

pub mod phase;
pub mod project;
pub mod task;
pub mod user;
