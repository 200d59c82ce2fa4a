use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// Token Service
///
/// Issues and verifies the signed, time-limited bearer tokens that assert a
/// user identity. Tokens are stateless: expiry is enforced purely by the
/// embedded timestamp, and there is no revocation list. The signing secret is
/// process-wide and read-only after startup.

/// Claims
///
/// The payload structure carried inside every issued JWT, signed with the
/// server secret and validated on each authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the id of the user the token asserts. Optional at the
    /// decoding layer so a token that omits it yields `MissingClaim` rather
    /// than an opaque deserialization failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<i64>,
    /// Expiration Time (exp): timestamp after which the token must not be
    /// accepted. Prevents replay of old tokens.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
}

/// TokenError
///
/// Typed verification failures. Every malformed-input path through `verify`
/// lands on one of these — attacker-controlled token strings can never raise
/// an unrecoverable fault.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    /// Bad signature, malformed structure, or expired `exp`.
    #[error("token is invalid or expired")]
    InvalidToken,
    /// Structurally valid and correctly signed, but no user id claim.
    #[error("token is missing the user id claim")]
    MissingClaim,
    /// The signing primitive itself failed while issuing. Not reachable from
    /// untrusted input.
    #[error("failed to sign token")]
    Signing,
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken | TokenError::MissingClaim => ApiError::Unauthorized,
            TokenError::Signing => ApiError::Hashing,
        }
    }
}

/// issue
///
/// Encodes and signs a token asserting `user_id`, valid for `ttl_minutes`
/// from now. HMAC-SHA256 with the process-wide secret; the only side effect
/// is reading the current time.
pub fn issue(user_id: i64, secret: &str, ttl_minutes: i64) -> Result<String, TokenError> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(ttl_minutes);

    let claims = Claims {
        sub: Some(user_id),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| {
        tracing::error!("token signing failed: {:?}", e);
        TokenError::Signing
    })
}

/// verify
///
/// Decodes a presented token, checks the signature and expiry, and returns
/// the asserted user id. Signature errors, malformed input, and expired
/// tokens all collapse into `InvalidToken`; a signed token without a user id
/// claim is `MissingClaim`.
pub fn verify(token: &str, secret: &str) -> Result<i64, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|_| TokenError::InvalidToken)?;

    data.claims.sub.ok_or(TokenError::MissingClaim)
}
