/// Session tokens
///
/// Sessions are HS256-signed JWTs with a fixed 30 minute lifetime. They are
/// not renewed on activity; a client signs in again once `exp` passes.
///
/// # Claims
///
/// - `sub`: user id
/// - `role`: account role at sign-in
/// - `iss`: always `phaseplan`
/// - `iat` / `nbf`: issue time
/// - `exp`: `iat` + 30 minutes
///
/// # Example
///
/// ```
/// use phaseplan_shared::auth::jwt::{create_token, validate_token, Claims};
/// use phaseplan_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let secret = "an-example-secret-of-at-least-32-bytes";
/// let claims = Claims::new(Uuid::new_v4(), UserRole::User);
///
/// let token = create_token(&claims, secret).unwrap();
/// let decoded = validate_token(&token, secret).unwrap();
/// assert_eq!(decoded.sub, claims.sub);
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Issuer written into and required from every session token
pub const ISSUER: &str = "phaseplan";

/// Session lifetime in minutes
pub const SESSION_LIFETIME_MINUTES: i64 = 30;

/// Session lifetime
pub fn session_lifetime() -> Duration {
    Duration::minutes(SESSION_LIFETIME_MINUTES)
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Session claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,

    pub role: UserRole,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    /// Claims for a session starting now
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self::issued_at(user_id, role, Utc::now())
    }

    /// Claims for a session that started at `issued_at`
    pub fn issued_at(user_id: Uuid, role: UserRole, issued_at: DateTime<Utc>) -> Self {
        let expiration = issued_at + session_lifetime();

        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `exp` and `nbf`
///
/// No leeway is applied, so a token is rejected as soon as its 30 minutes
/// are up.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
