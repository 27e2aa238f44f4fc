/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('USER', 'ADMIN');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255),
///     password_hash VARCHAR(255),
///     role user_role NOT NULL DEFAULT 'USER',
///     password_reset_token VARCHAR(64) UNIQUE,
///     password_reset_token_expiry TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are compared exactly as stored. `password_hash` is NULL for
/// accounts that only ever signed in through an external provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Account role
///
/// Carried in session tokens; authorization currently relies on ownership
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// User account
///
/// Credential and reset-token columns are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Unique, case-sensitive
    pub email: String,

    pub name: Option<String>,

    /// Bcrypt hash; None for accounts without a password
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    pub role: UserRole,

    /// SHA-256 hex of the outstanding reset token
    #[serde(skip_serializing, default)]
    pub password_reset_token: Option<String>,

    #[serde(skip_serializing, default)]
    pub password_reset_token_expiry: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account can sign in with a password
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
    /// Bcrypt hash, never the plaintext password
    pub password_hash: Option<String>,
    pub role: UserRole,
}

impl User {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// already registered.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, password_hash, role, password_reset_token,
                      password_reset_token_expiry, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, role, password_reset_token,
                   password_reset_token_expiry, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Exact-match lookup by email
    pub async fn find_by_email<'e, E>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, role, password_reset_token,
                   password_reset_token_expiry, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Stores a reset token hash and its expiry, replacing any earlier one
    ///
    /// Returns false when the user does not exist.
    pub async fn set_password_reset_token<'e, E>(
        executor: E,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2,
                password_reset_token_expiry = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `token_hash` belongs to an unexpired reset request
    pub async fn has_live_reset_token<'e, E>(
        executor: E,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE password_reset_token = $1
                  AND password_reset_token_expiry > NOW()
            )
            "#,
        )
        .bind(token_hash)
        .fetch_one(executor)
        .await
    }

    /// Consumes an unexpired reset token and sets a new password hash
    ///
    /// Lookup, expiry check, password change and clearing of both reset
    /// columns happen in one statement, so a token can succeed at most once
    /// even under concurrent use. Returns the user id on success.
    pub async fn consume_password_reset_token<'e, E>(
        executor: E,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token = NULL,
                password_reset_token_expiry = NULL,
                updated_at = NOW()
            WHERE password_reset_token = $1
              AND password_reset_token_expiry IS NOT NULL
              AND password_reset_token_expiry > NOW()
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .bind(new_password_hash)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a user and, by cascade, all of their projects
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
