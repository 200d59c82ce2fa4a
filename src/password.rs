use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// Credential Hasher
///
/// Wraps the salted, cost-tunable argon2 primitive behind a two-function
/// contract: `hash` produces an opaque digest, `verify` accepts exactly the
/// original plaintext against it. The salt is generated per call and embedded
/// in the PHC-format digest, so verification needs no separate salt storage
/// and two hashes of the same password never match.

/// hash_password
///
/// Derives a salted argon2 digest for the given plaintext.
///
/// Fails with `InvalidInput` when the plaintext is empty; the Repository calls
/// this before anything touches the database, so an empty password never
/// produces a row. The computation is deliberately slow (memory-hard KDF) —
/// that CPU cost is the only side effect.
pub fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    if plaintext.is_empty() {
        return Err(ApiError::InvalidInput(
            "a password must be provided".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("argon2 hashing failed: {:?}", e);
            ApiError::Hashing
        })?;

    Ok(digest.to_string())
}

/// verify_password
///
/// Checks a plaintext candidate against a stored digest. A malformed or
/// corrupted digest verifies as `false` — untrusted input on this path must
/// never be able to raise a fault.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
