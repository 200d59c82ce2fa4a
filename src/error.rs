use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The closed failure taxonomy shared by the Repository, the Access Guard and
/// the route handlers. Every fallible operation in the core returns one of
/// these kinds; the HTTP layer maps each kind to a stable status category via
/// the `IntoResponse` implementation below. Callers branch on the variant,
/// never on message text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The lookup target does not exist (or no longer exists).
    #[error("resource not found")]
    NotFound,

    /// A uniqueness rule was violated at creation time. `field` names the
    /// colliding column ("username" or "email") so callers can report which
    /// identifier is taken.
    #[error("{field} already exists")]
    AlreadyExists { field: &'static str },

    /// The caller supplied malformed or missing data (empty required field,
    /// out-of-range vote direction). Surfaced verbatim, never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An update payload referenced a field outside the allowed mutable set.
    /// Rejected before any database work, so no partial mutation can occur.
    #[error("field '{0}' is not updatable")]
    InvalidField(String),

    /// Token missing, invalid, expired, or bound to a deleted user.
    /// Terminal for the request.
    #[error("could not validate credentials")]
    Unauthorized,

    /// Authenticated, but not permitted to mutate this resource.
    #[error("not allowed to modify this resource")]
    Forbidden,

    /// A race on a uniqueness constraint was detected at the storage layer
    /// and could not be re-derived into the intended effect.
    #[error("conflicting concurrent modification")]
    Conflict,

    /// A failure inside the password-hashing primitive. Does not happen with
    /// well-formed parameters; surfaced as a generic 500 rather than leaking
    /// primitive internals.
    #[error("password hashing failed")]
    Hashing,

    /// An unexpected storage fault. Logged with full detail server-side;
    /// clients only see a generic 500.
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists { .. } => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Storage faults carry connection strings and SQL fragments; keep the
        // detail in the server log and off the wire.
        if let ApiError::Database(e) = &self {
            tracing::error!("database error: {:?}", e);
        }

        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
