use jsonwebtoken::{EncodingKey, Header, encode};
use postboard::token::{self, TokenError};
use serde::Serialize;

const TEST_SECRET: &str = "test-secret-value-1234567890";

#[test]
fn issue_then_verify_round_trips_the_user_id() {
    let token = token::issue(42, TEST_SECRET, 30).expect("issuing must succeed");
    let user_id = token::verify(&token, TEST_SECRET).expect("fresh token must verify");
    assert_eq!(user_id, 42);
}

#[test]
fn expired_token_is_rejected_despite_valid_signature() {
    // Negative TTL puts the embedded expiry in the past; the signature is
    // still correct, so only the timestamp comparison can reject it.
    let token = token::issue(42, TEST_SECRET, -5).expect("issuing must succeed");
    assert_eq!(
        token::verify(&token, TEST_SECRET),
        Err(TokenError::InvalidToken)
    );
}

#[test]
fn token_signed_with_a_different_secret_is_rejected() {
    let token = token::issue(42, "some-other-secret-entirely", 30).expect("issuing must succeed");
    assert_eq!(
        token::verify(&token, TEST_SECRET),
        Err(TokenError::InvalidToken)
    );
}

#[test]
fn malformed_input_never_panics() {
    for garbage in ["", "not-a-jwt", "a.b.c", "....", "🦀🦀🦀"] {
        assert_eq!(
            token::verify(garbage, TEST_SECRET),
            Err(TokenError::InvalidToken),
            "input {garbage:?} must fail as a typed error"
        );
    }
}

#[test]
fn correctly_signed_token_without_user_id_claim_is_missing_claim() {
    // A token our own service would never issue, but a confused or malicious
    // client could: valid signature and expiry, no subject.
    #[derive(Serialize)]
    struct BareClaims {
        exp: usize,
        iat: usize,
    }

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = BareClaims {
        exp: now + 3600,
        iat: now,
    };
    let key = EncodingKey::from_secret(TEST_SECRET.as_bytes());
    let token = encode(&Header::default(), &claims, &key).expect("encoding must succeed");

    assert_eq!(
        token::verify(&token, TEST_SECRET),
        Err(TokenError::MissingClaim)
    );
}
