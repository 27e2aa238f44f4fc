/// Password hashing with bcrypt
///
/// # Security
///
/// - **Algorithm**: bcrypt (`$2b$` variant)
/// - **Cost**: 12 (4096 rounds)
/// - **Salt**: random per hash, embedded in the output
///
/// Both functions are CPU-bound and take on the order of 250ms at cost 12.
/// Async callers should run them on the blocking pool, see
/// [`hash_password_blocking`] and [`verify_password_blocking`].
///
/// # Example
///
/// ```no_run
/// use phaseplan_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
/// assert!(verify_password("correct horse battery staple", &hash)?);
/// assert!(!verify_password("Tr0ub4dor&3", &hash)?);
/// # Ok(())
/// # }
/// ```

use std::sync::OnceLock;

/// bcrypt work factor for new hashes
pub const BCRYPT_COST: u32 = 12;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Password hashing task failed: {0}")]
    TaskError(String),
}

/// Hashes a password with a fresh salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored bcrypt hash
///
/// A malformed stored hash is an error rather than a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::VerifyError(e.to_string()))
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskError(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::TaskError(e.to_string()))?
}

/// Cost-[`BCRYPT_COST`] hash of a password nobody knows, made on first use
fn placeholder_hash() -> Result<&'static str, PasswordError> {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();

    if let Some(hash) = PLACEHOLDER.get() {
        return Ok(hash);
    }

    let hash = hash_password(&hex::encode(rand::random::<[u8; 16]>()))?;
    Ok(PLACEHOLDER.get_or_init(|| hash))
}

/// Runs a full bcrypt verification whose result is discarded
///
/// Sign-in calls this when there is no stored hash to check (unknown email,
/// password-less account) so those failures cost the same as a wrong
/// password.
pub async fn verify_placeholder_blocking(password: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || {
        let hash = placeholder_hash()?;
        verify_password(&password, hash).map(|_| ())
    })
    .await
    .map_err(|e| PasswordError::TaskError(e.to_string()))?
}
