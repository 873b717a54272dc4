/// Password Hashing and Verification
///
/// bcrypt wrapper. The hash comparison is resistant to timing attacks
/// on the plaintext; the hashing internals are bcrypt's concern.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against its stored hash
///
/// A malformed stored hash counts as a mismatch: fail closed rather
/// than surface a distinguishable error to the caller.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match verify(password, password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!("password verification failed on stored hash: {}", e);
            false
        }
    }
}
