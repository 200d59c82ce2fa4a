use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record stored in the `users` table. The password
/// digest is carried for credential verification but is never serialized into
/// a response; the API surface exposes `UserResponse` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Globally unique, enforced by the `users_username_key` constraint.
    pub username: String,
    // Globally unique, enforced by the `users_email_key` constraint.
    pub email: String,
    // Opaque argon2 PHC string (salt embedded). Never the plaintext.
    pub hashed_password: String,
    // Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
}

/// UserResponse
///
/// The outward-facing projection of a `User`, stripped of the password digest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Post
///
/// A content record from the `posts` table. `owner_id` references the creating
/// user with cascade-on-delete; `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    // Defaults to false at creation; toggled via update.
    pub published: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A comment record from the `comments` table, referencing both its post and
/// its author with cascade-on-delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vote
///
/// A single row of the `votes` table. The composite primary key
/// (user_id, post_id) makes this a toggle: at most one row per pair, ever.
/// Voting again overwrites `direction` in place.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Vote {
    pub user_id: i64,
    pub post_id: i64,
    // 1 = upvote, 0 = no vote / downvote.
    pub direction: i16,
    pub created_at: DateTime<Utc>,
}

/// VoteDirection
///
/// The closed set of legal vote directions. Transport-level integers are
/// converted through `try_from`, so the Repository only ever sees a valid
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Down,
    Up,
}

impl VoteDirection {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteDirection::Down => 0,
            VoteDirection::Up => 1,
        }
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = ApiError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteDirection::Down),
            1 => Ok(VoteDirection::Up),
            other => Err(ApiError::InvalidInput(format!(
                "invalid vote direction {other}; use 0 to remove a vote and 1 to upvote"
            ))),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateUserRequest
///
/// Input payload for registration (POST /users). The password is hashed by the
/// Repository before anything is persisted and never appears in logs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Credential payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// The bearer token handed back by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// PasswordUpdateRequest
///
/// Input payload for replacing the authenticated user's password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PasswordUpdateRequest {
    pub password: String,
}

/// CreatePostRequest
///
/// Input payload for submitting a new post. `published` defaults to false so
/// drafts are the default state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

/// PostUpdate
///
/// Partial update payload for PUT /posts/{id}. This struct *is* the allowed
/// mutable set: exactly {title, content, published, owner_id}, each optional.
/// Any other field name in a payload is rejected as `InvalidField` before
/// deserialization (see `PostUpdate::UPDATABLE_FIELDS`), so the Repository
/// never sees an open-ended field map.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
}

impl PostUpdate {
    /// The closed set of updatable column names, used by the transport layer
    /// to reject unknown fields with a typed error naming the offender.
    pub const UPDATABLE_FIELDS: [&'static str; 4] = ["title", "content", "published", "owner_id"];
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub content: String,
}

/// UpdateCommentRequest
///
/// Input payload for editing an existing comment. Only the content is mutable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// CreateVoteRequest
///
/// Input payload for POST /votes. `dir` is validated into `VoteDirection`
/// before the Repository is consulted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateVoteRequest {
    pub post_id: i64,
    /// 1 = upvote, 0 = remove/clear the vote.
    pub dir: i16,
}

// --- Response Schemas (Output) ---

/// UserWithPosts
///
/// Output schema for GET /users/me: the profile plus everything the user has
/// written, including unpublished drafts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: UserResponse,
    pub posts: Vec<Post>,
}
