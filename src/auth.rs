use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::User,
    repository::{RepositoryState, UserLookup},
    token,
};

/// AuthUser
///
/// The resolved identity of an authenticated request: the current database
/// record of the user the presented bearer token asserts. Handlers take this
/// as an argument to receive a verified identity; the password digest is
/// deliberately not carried.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler and keeping authentication
/// (extractor) separate from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Local Bypass: development-time access via the 'x-user-id' header.
/// 3. Token Validation: Bearer extraction and signature/expiry verification.
/// 4. DB Lookup: the asserted user must still exist *now*.
///
/// Step 4 is the load-bearing invariant: a token issued before its user was
/// deleted is structurally valid but must never resolve to a live identity,
/// so both a failed verification and a failed lookup reject with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the Repository from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the signing secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // In Env::Local only, a known user id in the 'x-user-id' header
        // authenticates directly. The id must still map to a real row, so
        // the guard semantics stay intact even on this path.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = id_str.parse::<i64>() {
                        if let Ok(user) = repo.find_user(UserLookup::Id(user_id)).await {
                            return Ok(AuthUser::from(user));
                        }
                    }
                }
            }
        }
        // In Production, or when the bypass did not resolve, execution falls
        // through to the standard bearer token flow.

        // 3. Token Extraction
        // The Authorization header must be present and prefixed with "Bearer ".
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let raw_token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        // 4. Verify signature, expiry and the user id claim. Every malformed
        // or expired input collapses into Unauthorized here.
        let user_id = token::verify(raw_token, &config.jwt_secret)?;

        // 5. Database Lookup (Final Verification)
        // If the user was deleted after the token was issued, the lookup
        // misses and the request is rejected despite the valid signature.
        let user = repo
            .find_user(UserLookup::Id(user_id))
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser::from(user))
    }
}
