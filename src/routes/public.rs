use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints that are **unauthenticated** and accessible to any
/// client: the identity gateway (registration and login) and the health
/// probe. Nothing here returns user content — everything content-bearing sits
/// behind the authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        // Registration. Uniqueness of username and email is enforced by the
        // database constraints; collisions come back as 409 naming the field.
        .route("/users", post(handlers::register_user))
        // POST /auth/login
        // Credential verification and bearer token issuance. Unknown user and
        // wrong password are indistinguishable in the response.
        .route("/auth/login", post(handlers::login))
}
