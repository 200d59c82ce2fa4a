use crate::{
    error::ApiError,
    models::{Comment, Post, PostUpdate, User, Vote, VoteDirection},
    password,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// UserLookup
///
/// The closed set of keys a user can be found by. Exactly one key is honored
/// per call; callers pick the variant instead of passing an open-ended
/// keyword map.
#[derive(Debug, Clone)]
pub enum UserLookup {
    Id(i64),
    Username(String),
    Email(String),
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations — the sole
/// reader and mutator of Users, Posts, Comments and Votes. Each logical
/// operation is atomic: fully applied or fully rolled back, with every
/// failure surfaced as a typed `ApiError` the caller must handle.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries, and to substitute a mock implementation in tests.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Finds a user by exactly one lookup key. `NotFound` if no row matches.
    async fn find_user(&self, lookup: UserLookup) -> Result<User, ApiError>;
    /// Lists users in insertion order, capped at `limit` rows.
    async fn get_users(&self, limit: i64) -> Result<Vec<User>, ApiError>;
    /// Registers a user. Stores the salted password digest, never the
    /// plaintext. `InvalidInput` if any field is empty; `AlreadyExists`
    /// (naming the colliding field) if the username or email is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError>;
    /// Replaces the password digest in place; no other field changes.
    async fn update_user_password(&self, user_id: i64, new_password: &str)
    -> Result<(), ApiError>;
    /// Deletes a user and cascades their posts, comments and votes.
    /// A repeated delete fails with `NotFound`.
    async fn delete_user(&self, user_id: i64) -> Result<(), ApiError>;

    // --- Posts ---
    /// Pages through posts in stable insertion order. `skip` of 0 means no
    /// offset, `limit` of 0 means no limit; a non-empty `search` filters to
    /// posts whose title or content contains it case-insensitively.
    async fn get_posts(&self, skip: i64, limit: i64, search: &str) -> Result<Vec<Post>, ApiError>;
    /// All posts owned by one user, drafts included.
    async fn get_posts_by_owner(&self, owner_id: i64) -> Result<Vec<Post>, ApiError>;
    async fn find_post(&self, id: i64) -> Result<Post, ApiError>;
    /// Creates a post. `InvalidInput` if title or content is empty.
    async fn create_post(
        &self,
        title: &str,
        content: &str,
        owner_id: i64,
        published: bool,
    ) -> Result<Post, ApiError>;
    /// Applies a partial update from the closed `PostUpdate` field set in a
    /// single atomic statement and refreshes `updated_at`.
    async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Post, ApiError>;
    /// Deletes a post and cascades its comments and votes.
    async fn delete_post(&self, id: i64) -> Result<(), ApiError>;

    // --- Comments ---
    /// Creates a comment. `NotFound` if the referenced post does not exist.
    async fn create_comment(
        &self,
        post_id: i64,
        content: &str,
        owner_id: i64,
    ) -> Result<Comment, ApiError>;
    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError>;
    async fn find_comment(&self, id: i64) -> Result<Comment, ApiError>;
    async fn update_comment(&self, comment_id: i64, content: &str) -> Result<Comment, ApiError>;
    async fn delete_comment(&self, id: i64) -> Result<(), ApiError>;

    // --- Votes ---
    /// Upserts the vote for (user, post): inserts on first cast, overwrites
    /// the direction in place on every subsequent cast. One row per pair,
    /// ever. `NotFound` if the post (or user) does not exist.
    async fn cast_vote(
        &self,
        user_id: i64,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<Vote, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by a
/// PostgreSQL connection pool. All mutual exclusion is delegated to the
/// store's transaction isolation; the unique and foreign-key constraints in
/// the schema are the authoritative guarantee behind every check below, and
/// constraint violations are translated into the typed taxonomy rather than
/// bubbling up as raw driver errors.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// translate_constraint
///
/// Converts a storage-layer constraint violation into the typed taxonomy.
/// Unique violations on the user identity columns become `AlreadyExists`
/// naming the colliding field; any other unique violation is a `Conflict`
/// (a race the caller may re-derive); foreign-key violations mean the
/// referenced parent row is gone, i.e. `NotFound`. Everything else is an
/// opaque storage fault.
fn translate_constraint(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_username_key") => ApiError::AlreadyExists { field: "username" },
                Some("users_email_key") => ApiError::AlreadyExists { field: "email" },
                _ => ApiError::Conflict,
            };
        }
        if db_err.is_foreign_key_violation() {
            return ApiError::NotFound;
        }
    }
    ApiError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    /// find_user
    ///
    /// Single-key lookup. The three variants map to the three indexed
    /// columns; an empty result is `NotFound` rather than exception-style
    /// control flow.
    async fn find_user(&self, lookup: UserLookup) -> Result<User, ApiError> {
        let user = match lookup {
            UserLookup::Id(id) => {
                sqlx::query_as::<_, User>(
                    "SELECT id, username, email, hashed_password, created_at \
                     FROM users WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            UserLookup::Username(username) => {
                sqlx::query_as::<_, User>(
                    "SELECT id, username, email, hashed_password, created_at \
                     FROM users WHERE username = $1",
                )
                .bind(username)
                .fetch_optional(&self.pool)
                .await?
            }
            UserLookup::Email(email) => {
                sqlx::query_as::<_, User>(
                    "SELECT id, username, email, hashed_password, created_at \
                     FROM users WHERE email = $1",
                )
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        user.ok_or(ApiError::NotFound)
    }

    async fn get_users(&self, limit: i64) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, hashed_password, created_at \
             FROM users ORDER BY id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// create_user
    ///
    /// Insert-first uniqueness: no check-then-act window. The unique
    /// constraints on username and email are the real guarantee; a violation
    /// is translated into `AlreadyExists` naming the colliding field so
    /// callers can distinguish the two.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        if username.is_empty() || email.is_empty() {
            return Err(ApiError::InvalidInput(
                "username and email must be provided".to_string(),
            ));
        }
        // Rejects the empty password before anything is persisted.
        let digest = password::hash_password(password)?;

        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, hashed_password) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, email, hashed_password, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(&digest)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_constraint)
    }

    async fn update_user_password(
        &self,
        user_id: i64,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let digest = password::hash_password(new_password)?;

        let result = sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&digest)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// delete_user
    ///
    /// The ON DELETE CASCADE clauses on posts, comments and votes remove
    /// every dependent row in the same transaction as the parent delete.
    async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// get_posts
    ///
    /// Flexible listing via QueryBuilder for safe parameterization. Ordering
    /// is by id, i.e. stable insertion order. The zero-means-unbounded
    /// convention is load-bearing: `limit = 0` emits no LIMIT clause and
    /// `skip = 0` no OFFSET clause.
    async fn get_posts(&self, skip: i64, limit: i64, search: &str) -> Result<Vec<Post>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, title, content, published, owner_id, created_at, updated_at FROM posts",
        );

        if !search.is_empty() {
            // Case-insensitive substring match across title and content.
            let pattern = format!("%{}%", search);
            builder.push(" WHERE (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR content ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY id ASC");

        if limit > 0 {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        if skip > 0 {
            builder.push(" OFFSET ");
            builder.push_bind(skip);
        }

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn get_posts_by_owner(&self, owner_id: i64) -> Result<Vec<Post>, ApiError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, title, content, published, owner_id, created_at, updated_at \
             FROM posts WHERE owner_id = $1 ORDER BY id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>(
            "SELECT id, title, content, published, owner_id, created_at, updated_at \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    /// create_post
    ///
    /// Timestamps come from the schema defaults so created_at and updated_at
    /// start identical; a dangling owner id surfaces as `NotFound` via the
    /// foreign-key translation.
    async fn create_post(
        &self,
        title: &str,
        content: &str,
        owner_id: i64,
        published: bool,
    ) -> Result<Post, ApiError> {
        if title.is_empty() || content.is_empty() {
            return Err(ApiError::InvalidInput(
                "title and content must be provided".to_string(),
            ));
        }

        sqlx::query_as::<_, Post>(
            "INSERT INTO posts (title, content, owner_id, published) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, content, published, owner_id, created_at, updated_at",
        )
        .bind(title)
        .bind(content)
        .bind(owner_id)
        .bind(published)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_constraint)
    }

    /// update_post
    ///
    /// One UPDATE statement covers the whole closed field set, using COALESCE
    /// so only the supplied fields change. Single-statement means atomic: the
    /// update either applies completely or not at all, and `updated_at` is
    /// recomputed in the same statement.
    async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>(
            "UPDATE posts \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 published = COALESCE($4, published), \
                 owner_id = COALESCE($5, owner_id), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, title, content, published, owner_id, created_at, updated_at",
        )
        .bind(post_id)
        .bind(update.title)
        .bind(update.content)
        .bind(update.published)
        .bind(update.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_constraint)?
        .ok_or(ApiError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// create_comment
    ///
    /// Post existence is enforced by the foreign key, not a pre-read: an
    /// insert against a deleted post fails the constraint and is surfaced as
    /// `NotFound` with no race window.
    async fn create_comment(
        &self,
        post_id: i64,
        content: &str,
        owner_id: i64,
    ) -> Result<Comment, ApiError> {
        if content.is_empty() {
            return Err(ApiError::InvalidInput(
                "comment content must be provided".to_string(),
            ));
        }

        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (post_id, content, owner_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, content, post_id, owner_id, created_at, updated_at",
        )
        .bind(post_id)
        .bind(content)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_constraint)
    }

    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, content, post_id, owner_id, created_at, updated_at \
             FROM comments WHERE post_id = $1 ORDER BY id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn find_comment(&self, id: i64) -> Result<Comment, ApiError> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, content, post_id, owner_id, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    async fn update_comment(&self, comment_id: i64, content: &str) -> Result<Comment, ApiError> {
        if content.is_empty() {
            return Err(ApiError::InvalidInput(
                "comment content must be provided".to_string(),
            ));
        }

        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, content, post_id, owner_id, created_at, updated_at",
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    async fn delete_comment(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// cast_vote
    ///
    /// Toggle semantics in one statement: the composite primary key on
    /// (user_id, post_id) is the authoritative de-duplication mechanism, and
    /// ON CONFLICT turns a concurrent duplicate insert into the intended
    /// overwrite instead of a surfaced error. A vote against a missing post
    /// or user fails the foreign key and becomes `NotFound`.
    async fn cast_vote(
        &self,
        user_id: i64,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<Vote, ApiError> {
        sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (user_id, post_id, direction) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, post_id) \
             DO UPDATE SET direction = EXCLUDED.direction \
             RETURNING user_id, post_id, direction, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(direction.as_i16())
        .fetch_one(&self.pool)
        .await
        .map_err(translate_constraint)
    }
}
