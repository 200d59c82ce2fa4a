use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Comment, CreateCommentRequest, CreatePostRequest, CreateUserRequest, CreateVoteRequest,
        LoginRequest, PasswordUpdateRequest, Post, PostUpdate, TokenResponse, UpdateCommentRequest,
        UserResponse, UserWithPosts, Vote, VoteDirection,
    },
    password, policy,
    repository::UserLookup,
    token,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// --- Filter Structs ---

/// PostFilter
///
/// Accepted query parameters for the post listing endpoint (GET /posts).
/// `skip` and `limit` keep the zero-means-unbounded convention of the
/// Repository; the limit defaults to 10 so an unqualified listing stays
/// bounded.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PostFilter {
    /// Number of posts to skip (0 = no offset).
    pub skip: Option<i64>,
    /// Number of posts to fetch (0 = no limit).
    pub limit: Option<i64>,
    /// Case-insensitive substring filter on title or content.
    pub search: Option<String>,
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates a new account. The Repository hashes the password
/// before anything is persisted and reports which identity field collided if
/// the username or email is already taken.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 409, description = "Username or email already exists"),
        (status = 400, description = "Missing required field")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .repo
        .create_user(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// login
///
/// [Public Route] Verifies a username/password pair and issues a bearer token.
///
/// An unknown username and a wrong password both surface as the same 401 —
/// the response must not reveal which half of the credential failed.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .repo
        .find_user(UserLookup::Username(credentials.username))
        .await
        .map_err(|_| ApiError::Unauthorized)?;

    if !password::verify_password(&credentials.password, &user.hashed_password) {
        return Err(ApiError::Unauthorized);
    }

    let access_token = token::issue(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expire_minutes,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

// --- User Handlers ---

/// get_users
///
/// [Authenticated Route] Lists registered users. Capped at 10 rows; password
/// digests never leave the Repository boundary.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "Users", body = [UserResponse]))
)]
pub async fn get_users(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.repo.get_users(10).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// get_me
///
/// [Authenticated Route] The requesting user's profile plus everything they
/// have written, including unpublished drafts.
#[utoipa::path(
    get,
    path = "/users/me",
    responses((status = 200, description = "Profile with posts", body = UserWithPosts))
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserWithPosts>, ApiError> {
    let posts = state.repo.get_posts_by_owner(auth.id).await?;

    Ok(Json(UserWithPosts {
        user: UserResponse {
            id: auth.id,
            username: auth.username,
            email: auth.email,
            created_at: auth.created_at,
        },
        posts,
    }))
}

/// get_user
///
/// [Authenticated Route] Retrieves a single user's public profile by id.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.repo.find_user(UserLookup::Id(id)).await?;
    Ok(Json(UserResponse::from(user)))
}

/// update_my_password
///
/// [Authenticated Route] Replaces the requesting user's password digest.
/// Only their own credential is reachable from this endpoint, so no
/// ownership check is needed beyond authentication itself.
#[utoipa::path(
    post,
    path = "/users/me/password",
    request_body = PasswordUpdateRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Empty password")
    )
)]
pub async fn update_my_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PasswordUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .repo
        .update_user_password(auth.id, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// delete_me
///
/// [Authenticated Route] Deletes the requesting user's account. The cascade
/// removes every post, comment and vote they own; any still-circulating
/// token for this account stops resolving immediately (the Access Guard
/// re-checks existence on every request).
#[utoipa::path(
    delete,
    path = "/users/me",
    responses((status = 204, description = "Account deleted"))
)]
pub async fn delete_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.repo.delete_user(auth.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Post Handlers ---

/// get_posts
///
/// [Authenticated Route] Pages through posts in stable insertion order, with
/// optional case-insensitive search over title and content.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostFilter),
    responses((status = 200, description = "List filtered posts", body = [Post]))
)]
pub async fn get_posts(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state
        .repo
        .get_posts(
            filter.skip.unwrap_or(0),
            filter.limit.unwrap_or(10),
            filter.search.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(posts))
}

/// get_post
///
/// [Authenticated Route] Retrieves a single post by id.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = state.repo.find_post(id).await?;
    Ok(Json(post))
}

/// create_post
///
/// [Authenticated Route] Submits a new post. The owner is always the
/// authenticated identity — it cannot be supplied in the payload.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Empty title or content")
    )
)]
pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state
        .repo
        .create_post(&payload.title, &payload.content, auth.id, payload.published)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Partially updates a post the requester owns.
///
/// *Authorization*: the Ownership Policy runs before any mutation.
/// *Field validation*: the raw payload's keys are checked against the closed
/// updatable set before deserialization, so a payload naming any other field
/// fails with 422 and the post is untouched — no partial application can
/// survive.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostUpdate,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found"),
        (status = 422, description = "Unknown field in payload")
    )
)]
pub async fn update_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<Post>, ApiError> {
    let post = state.repo.find_post(id).await?;
    policy::ensure_owner(auth.id, post.owner_id)?;

    if let Some(fields) = payload.as_object() {
        for key in fields.keys() {
            if !PostUpdate::UPDATABLE_FIELDS.contains(&key.as_str()) {
                return Err(ApiError::InvalidField(key.clone()));
            }
        }
    }

    let update: PostUpdate = serde_json::from_value(payload)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let updated = state.repo.update_post(id, update).await?;
    Ok(Json(updated))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post the requester owns, cascading its
/// comments and votes.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let post = state.repo.find_post(id).await?;
    policy::ensure_owner(auth.id, post.owner_id)?;

    state.repo.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Comment Handlers ---

/// create_comment
///
/// [Authenticated Route] Posts a new comment. A comment against a missing
/// post is 404 — the Repository translates the foreign-key failure rather
/// than pre-reading the post.
#[utoipa::path(
    post,
    path = "/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .repo
        .create_comment(payload.post_id, &payload.content, auth.id)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// get_comments_for_post
///
/// [Authenticated Route] Lists all comments on a post, oldest first.
#[utoipa::path(
    get,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_comments_for_post(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state.repo.get_comments(post_id).await?;
    Ok(Json(comments))
}

/// update_comment
///
/// [Authenticated Route] Edits a comment the requester owns. Only the content
/// is mutable.
#[utoipa::path(
    put,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn update_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state.repo.find_comment(id).await?;
    policy::ensure_owner(auth.id, comment.owner_id)?;

    let updated = state.repo.update_comment(id, &payload.content).await?;
    Ok(Json(updated))
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment the requester owns.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = state.repo.find_comment(id).await?;
    policy::ensure_owner(auth.id, comment.owner_id)?;

    state.repo.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Vote Handlers ---

/// cast_vote
///
/// [Authenticated Route] Casts or re-casts the requester's vote on a post.
/// `dir` must be 0 or 1; anything else is 400. Voting on an already-voted
/// post overwrites the direction in place (toggle, never a second row).
#[utoipa::path(
    post,
    path = "/votes",
    request_body = CreateVoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = Vote),
        (status = 400, description = "Invalid direction"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn cast_vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateVoteRequest>,
) -> Result<(StatusCode, Json<Vote>), ApiError> {
    let direction = VoteDirection::try_from(payload.dir)?;

    let vote = state
        .repo
        .cast_vote(auth.id, payload.post_id, direction)
        .await?;
    Ok((StatusCode::CREATED, Json(vote)))
}
