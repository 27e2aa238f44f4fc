/// Ownership guard
///
/// Every project, phase and task belongs, through its parents, to exactly
/// one user. A caller may read or change a resource only if they are that
/// user.
///
/// The decision is split in two:
///
/// - [`authorize`] is a pure tri-state decision over a resolved owner.
/// - [`check_ownership`] resolves the owner of a resource in one query and
///   feeds it to [`authorize`].
///
/// A resource that does not exist yields `NotFound`; a resource owned by
/// someone else yields `Forbidden`.
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::auth::authorization::{require_owner, ResourceKind};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_owner(&pool, user_id, ResourceKind::Task, task_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgExecutor;
use uuid::Uuid;

/// Authorization errors
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Kinds of owned resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Phase,
    Task,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "Project",
            ResourceKind::Phase => "Phase",
            ResourceKind::Task => "Task",
        }
    }

    /// Query resolving the owning user of a resource of this kind
    fn owner_query(&self) -> &'static str {
        match self {
            ResourceKind::Project => "SELECT consultant_id FROM projects WHERE id = $1",
            ResourceKind::Phase => {
                "SELECT p.consultant_id
                 FROM phases ph
                 JOIN projects p ON p.id = ph.project_id
                 WHERE ph.id = $1"
            }
            ResourceKind::Task => {
                "SELECT p.consultant_id
                 FROM tasks t
                 JOIN phases ph ON ph.id = t.phase_id
                 JOIN projects p ON p.id = ph.project_id
                 WHERE t.id = $1"
            }
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an ownership decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Forbidden,
    NotFound,
}

/// Decides access given the resolved owner of a resource
///
/// `resolved_owner_id` is None when the resource does not exist.
pub fn authorize(user_id: Uuid, resolved_owner_id: Option<Uuid>) -> Authorization {
    match resolved_owner_id {
        None => Authorization::NotFound,
        Some(owner) if owner == user_id => Authorization::Authorized,
        Some(_) => Authorization::Forbidden,
    }
}

/// Looks up the user owning a resource
pub async fn resolve_owner<'e, E>(
    executor: E,
    kind: ResourceKind,
    resource_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Uuid>(kind.owner_query())
        .bind(resource_id)
        .fetch_optional(executor)
        .await
}

/// Resolves the owner of a resource and decides access for `user_id`
pub async fn check_ownership<'e, E>(
    executor: E,
    user_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
) -> Result<Authorization, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let owner = resolve_owner(executor, kind, resource_id).await?;
    let decision = authorize(user_id, owner);

    if decision != Authorization::Authorized {
        tracing::debug!(
            user_id = %user_id,
            resource = kind.as_str(),
            resource_id = %resource_id,
            decision = ?decision,
            "Ownership check denied"
        );
    }

    Ok(decision)
}

/// [`check_ownership`] as a `Result`, for use with `?`
pub async fn require_owner<'e, E>(
    executor: E,
    user_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
) -> Result<(), AuthzError>
where
    E: PgExecutor<'e>,
{
    match check_ownership(executor, user_id, kind, resource_id).await? {
        Authorization::Authorized => Ok(()),
        Authorization::Forbidden => Err(AuthzError::Forbidden),
        Authorization::NotFound => Err(AuthzError::NotFound(kind)),
    }
}
