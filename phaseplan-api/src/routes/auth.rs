/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/register` - Create a password account
/// - `POST /api/auth/login` - Sign in and receive a 30 minute session token
/// - `GET /api/auth/session` - Describe the current session
/// - `POST /api/auth/forgot-password` - Start a password reset
/// - `POST /api/auth/reset-password` - Finish a password reset
///
/// Login and forgot-password answer identically whether or not the email
/// belongs to an account. Emails are matched exactly as sent, with no
/// trimming or case folding, on every endpoint.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::ApiJson,
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use phaseplan_shared::{
    auth::{credentials, middleware::AuthContext},
    models::user::{User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Response message for every forgot-password request
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If a user with that email exists, a password reset link has been sent.";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer session token
    pub token: String,

    pub expires_at: Option<DateTime<Utc>>,

    pub user: User,
}

/// Current session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,

    pub role: UserRole,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// Content-Type: application/json
///
/// { "email": "ann@example.com", "name": "Ann", "password": "pw" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Json<User>> {
    let req = RegisterRequest {
        name: req.name.trim().to_string(),
        ..req
    };
    req.validate()?;

    let user = credentials::register(&state.db, &req.email, &req.name, &req.password).await?;

    Ok(Json(user))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Email or password missing
/// - `401 Unauthorized`: Unknown email, no password set, or wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let session =
        credentials::login(&state.db, &req.email, &req.password, state.jwt_secret()).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.claims.expires_at(),
        user: session.user,
    }))
}

/// Describe the caller's session
pub async fn session(Extension(auth): Extension<AuthContext>) -> Json<SessionResponse> {
    Json(SessionResponse {
        id: auth.user_id,
        role: auth.role,
        expires_at: auth.expires_at,
    })
}

/// Start a password reset
///
/// Always answers 200 with [`FORGOT_PASSWORD_MESSAGE`] once the request is
/// well formed.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    credentials::request_reset(
        &state.db,
        state.mailer.as_ref(),
        &state.config.app.base_url,
        &req.email,
    )
    .await?;

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

/// Finish a password reset
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields, or token unknown, expired or used
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    credentials::reset_password(&state.db, req.token.trim(), &req.password).await?;

    Ok(Json(MessageResponse::new("Password has been reset successfully.")))
}
