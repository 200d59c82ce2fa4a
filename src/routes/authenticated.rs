use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has passed the
/// authentication layer: profile access, posts, comments, and votes.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above. Mutations of owned resources
/// (posts, comments) additionally consult the Ownership Policy inside the
/// handler before touching the Repository.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        // GET /users
        // Lists registered users (bounded page).
        .route("/users", get(handlers::get_users))
        // GET /users/me
        // The requesting user's profile plus all their posts, drafts included.
        // DELETE /users/me
        // Deletes the account; posts, comments and votes cascade away with it.
        .route(
            "/users/me",
            get(handlers::get_me).delete(handlers::delete_me),
        )
        // POST /users/me/password
        // Replaces the caller's password digest.
        .route("/users/me/password", post(handlers::update_my_password))
        // GET /users/{id}
        // A single user's public profile.
        .route("/users/{id}", get(handlers::get_user))
        // --- Posts ---
        // GET /posts?skip=..&limit=..&search=..
        // Paged listing in insertion order; 0 means unbounded for both knobs.
        // POST /posts
        // Submits a new post owned by the authenticated user.
        .route(
            "/posts",
            get(handlers::get_posts).post(handlers::create_post),
        )
        // GET/PUT/DELETE /posts/{id}
        // Retrieval is open to any authenticated user; update and delete are
        // owner-only via the Ownership Policy.
        .route(
            "/posts/{id}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        // --- Comments ---
        // POST /comments
        // Adds a comment; the referenced post must exist.
        .route("/comments", post(handlers::create_comment))
        // GET /comments/{id}
        // All comments on the given post, oldest first. Note the id is a
        // post id on GET but a comment id on PUT/DELETE.
        // PUT/DELETE /comments/{id}
        // Owner-only edits and deletion.
        .route(
            "/comments/{id}",
            get(handlers::get_comments_for_post)
                .put(handlers::update_comment)
                .delete(handlers::delete_comment),
        )
        // --- Votes ---
        // POST /votes
        // Casts or re-casts a vote; one row per (user, post), toggled in place.
        .route("/votes", post(handlers::cast_vote))
}
