/// Session authentication for Axum
///
/// Reads `Authorization: Bearer <jwt>` and validates the session token into
/// an [`AuthContext`]. The API server runs [`authenticate_request`] in a
/// route layer and stores the context in the request extensions, where
/// handlers pick it up with `Extension<AuthContext>`.
///
/// Requests without a valid session are answered with 401 before any
/// handler or database code runs.
///
/// # Example
///
/// ```no_run
/// use axum::{
///     extract::Request, middleware::{self, Next}, response::Response, routing::get, Extension,
///     Router,
/// };
/// use phaseplan_shared::auth::middleware::{authenticate_request, AuthContext, AuthError};
///
/// async fn require_session(mut req: Request, next: Next) -> Result<Response, AuthError> {
///     let auth = authenticate_request(req.headers(), "a-secret-of-at-least-32-bytes!!")?;
///     req.extensions_mut().insert(auth);
///     Ok(next.run(req).await)
/// }
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.user_id.to_string()
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .route_layer(middleware::from_fn(require_session));
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::UserRole;

/// Authenticated caller, attached to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    pub role: UserRole,

    /// When the session token stops being accepted
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            expires_at: claims.expires_at(),
        }
    }
}

/// Session authentication failures
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not a Bearer token
    InvalidFormat(String),

    /// Token rejected (bad signature, expired, wrong issuer)
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Unauthorized".to_string(),
            AuthError::InvalidFormat(msg) => msg,
            AuthError::InvalidToken(msg) => msg,
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates the session and resolves the caller
pub fn authenticate_request(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Session expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid session".to_string()),
    })?;

    Ok(AuthContext::from_claims(&claims))
}
