/// Credential authentication, registration and password reset
///
/// # Flows
///
/// - **Sign in**: exact email lookup, bcrypt comparison, 30 minute session
///   token. Unknown email, password-less account and wrong password all
///   fail with the same [`CredentialError::InvalidCredentials`].
/// - **Register**: rejects a taken email, stores a bcrypt hash with role
///   `USER`.
/// - **Request reset**: silently does nothing for unknown emails. Otherwise
///   stores the SHA-256 of a fresh token, valid for one hour, and mails a
///   link carrying the raw token.
/// - **Reset**: checks the token is live before hashing the new password,
///   then consumes the token and sets the password in a single statement;
///   a token works at most once.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::jwt::{create_token, Claims, JwtError};
use super::password::{
    hash_password_blocking, verify_password_blocking, verify_placeholder_blocking, PasswordError,
};
use super::reset_token::{generate_reset_token, hash_reset_token, is_well_formed, reset_token_lifetime};
use crate::mailer::{reset_link, Mailer};
use crate::models::user::{CreateUser, User, UserRole};

/// Credential errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with this email already exists")]
    EmailTaken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A signed-in user and their session token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
    pub user: User,
}

/// Checks an email/password pair
///
/// Every failing path runs one bcrypt verification, so response time does
/// not tell an unknown email from a wrong password.
pub async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<User, CredentialError> {
    let user = match User::find_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            verify_placeholder_blocking(password.to_string()).await?;
            return Err(CredentialError::InvalidCredentials);
        }
    };

    let hash = match &user.password_hash {
        Some(hash) => hash.clone(),
        None => {
            debug!(user_id = %user.id, "Password sign-in attempted on account without password");
            verify_placeholder_blocking(password.to_string()).await?;
            return Err(CredentialError::InvalidCredentials);
        }
    };

    if !verify_password_blocking(password.to_string(), hash).await? {
        return Err(CredentialError::InvalidCredentials);
    }

    Ok(user)
}

/// Issues a session token for a user
pub fn issue_session(user: User, secret: &str) -> Result<Session, JwtError> {
    let claims = Claims::new(user.id, user.role);
    let token = create_token(&claims, secret)?;

    Ok(Session {
        token,
        claims,
        user,
    })
}

/// [`authenticate`] followed by [`issue_session`]
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
    secret: &str,
) -> Result<Session, CredentialError> {
    let user = authenticate(pool, email, password).await?;
    let session = issue_session(user, secret)?;

    info!(user_id = %session.user.id, "User signed in");
    Ok(session)
}

/// Creates a password account
pub async fn register(
    pool: &PgPool,
    email: &str,
    name: &str,
    password: &str,
) -> Result<User, CredentialError> {
    if User::find_by_email(pool, email).await?.is_some() {
        return Err(CredentialError::EmailTaken);
    }

    let password_hash = hash_password_blocking(password.to_string()).await?;

    let user = User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            name: Some(name.to_string()),
            password_hash: Some(password_hash),
            role: UserRole::User,
        },
    )
    .await
    .map_err(|e| match &e {
        // Lost a race against a concurrent registration
        sqlx::Error::Database(db) if db.is_unique_violation() => CredentialError::EmailTaken,
        _ => CredentialError::Database(e),
    })?;

    info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Starts a password reset for `email`
///
/// Succeeds whether or not the account exists. A failed delivery is
/// logged, not returned.
pub async fn request_reset(
    pool: &PgPool,
    mailer: &dyn Mailer,
    app_base_url: &str,
    email: &str,
) -> Result<(), CredentialError> {
    let user = match User::find_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            debug!("Password reset requested for unknown email");
            return Ok(());
        }
    };

    let (token, token_hash) = generate_reset_token();
    let expires_at = Utc::now() + reset_token_lifetime();

    User::set_password_reset_token(pool, user.id, &token_hash, expires_at).await?;

    let link = reset_link(app_base_url, &token);
    if let Err(e) = mailer.send_password_reset(&user.email, &link).await {
        warn!(user_id = %user.id, error = %e, "Failed to send password reset email");
    } else {
        info!(user_id = %user.id, "Password reset email dispatched");
    }

    Ok(())
}

/// Sets a new password using a reset token
///
/// Returns the id of the user whose password changed.
pub async fn reset_password(
    pool: &PgPool,
    token: &str,
    new_password: &str,
) -> Result<Uuid, CredentialError> {
    if !is_well_formed(token) {
        return Err(CredentialError::InvalidOrExpiredToken);
    }

    let token_hash = hash_reset_token(token);

    // Hash the new password only for a live token
    if !User::has_live_reset_token(pool, &token_hash).await? {
        return Err(CredentialError::InvalidOrExpiredToken);
    }

    let password_hash = hash_password_blocking(new_password.to_string()).await?;

    let user_id = User::consume_password_reset_token(pool, &token_hash, &password_hash)
        .await?
        .ok_or(CredentialError::InvalidOrExpiredToken)?;

    info!(user_id = %user_id, "Password reset completed");
    Ok(user_id)
}
