/// Password reset tokens
///
/// A raw token is 32 random bytes, hex encoded (64 characters). Only the
/// SHA-256 hex digest of it is stored, so a leaked database row cannot be
/// turned into a working reset link.
///
/// # Example
///
/// ```
/// use phaseplan_shared::auth::reset_token::{generate_reset_token, hash_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 64);
/// assert_eq!(hash_reset_token(&token), hash);
/// ```

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes in a raw token
const TOKEN_BYTES: usize = 32;

/// Length of a raw token in hex characters
pub const RESET_TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// How long a reset token stays valid
pub fn reset_token_lifetime() -> Duration {
    Duration::hours(1)
}

/// Generates a new reset token
///
/// Returns `(raw_token, token_hash)`. The raw token goes to the user and the
/// hash goes to the database.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// SHA-256 of the raw token as lowercase hex
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether `token` has the shape of a raw reset token
pub fn is_well_formed(token: &str) -> bool {
    token.len() == RESET_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token() {
        let (token1, hash1) = generate_reset_token();
        let (token2, hash2) = generate_reset_token();

        assert_eq!(token1.len(), RESET_TOKEN_LENGTH);
        assert!(is_well_formed(&token1));
        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_only_hash_is_returned_for_storage() {
        let (token, hash) = generate_reset_token();

        assert_eq!(hash.len(), 64);
        assert_ne!(token, hash);
        assert_eq!(hash_reset_token(&token), hash);
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&"a1".repeat(32)));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"zz".repeat(32)));
    }

    #[test]
    fn test_lifetime_is_one_hour() {
        assert_eq!(reset_token_lifetime(), Duration::minutes(60));
    }
}
