use postboard::error::ApiError;
use postboard::password::{hash_password, verify_password};

#[test]
fn hash_then_verify_accepts_the_original_password() {
    let digest = hash_password("correct horse battery staple").expect("hashing must succeed");
    assert!(verify_password("correct horse battery staple", &digest));
}

#[test]
fn verify_rejects_a_different_password() {
    let digest = hash_password("correct horse battery staple").expect("hashing must succeed");
    assert!(!verify_password("incorrect horse battery staple", &digest));
}

#[test]
fn empty_password_is_invalid_input() {
    let err = hash_password("").expect_err("empty password must be rejected");
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn hashing_is_salted() {
    // Two digests of the same password must differ, otherwise digests would
    // leak password equality across users.
    let first = hash_password("same-password").expect("hashing must succeed");
    let second = hash_password("same-password").expect("hashing must succeed");
    assert_ne!(first, second);

    // Both still verify.
    assert!(verify_password("same-password", &first));
    assert!(verify_password("same-password", &second));
}

#[test]
fn digest_is_a_phc_string() {
    let digest = hash_password("whatever").expect("hashing must succeed");
    assert!(digest.starts_with("$argon2"));
    assert!(!digest.contains("whatever"));
}

#[test]
fn malformed_digest_fails_closed() {
    // A corrupted row in the users table must read as "wrong password",
    // never as a panic or an accept.
    for bad in ["", "not-a-digest", "$argon2id$garbage", "plaintext-password"] {
        assert!(!verify_password("anything", bad));
    }
}
