//! Repository integration tests against a real Postgres instance.
//!
//! These run only when DATABASE_URL is set (e.g. a local docker Postgres);
//! without it every test returns early as a no-op. They run serially because
//! each one starts by truncating the shared schema.

use serial_test::serial;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use postboard::error::ApiError;
use postboard::models::{PostUpdate, VoteDirection};
use postboard::repository::{PostgresRepository, Repository, UserLookup};

/// Connects, migrates, and wipes the schema. `None` when no database is
/// configured, which skips the calling test.
async fn try_setup() -> Option<PostgresRepository> {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;

    let pool: PgPool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("DATABASE_URL is set but unreachable");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations must apply cleanly");

    sqlx::query("TRUNCATE users, posts, comments, votes RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("schema wipe must succeed");

    Some(PostgresRepository::new(pool))
}

async fn seed_user(repo: &PostgresRepository, username: &str) -> i64 {
    repo.create_user(username, &format!("{username}@example.com"), "hunter2!")
        .await
        .expect("seed user must insert")
        .id
}

async fn seed_post(repo: &PostgresRepository, owner_id: i64, title: &str) -> i64 {
    repo.create_post(title, "some content", owner_id, true)
        .await
        .expect("seed post must insert")
        .id
}

#[tokio::test]
#[serial]
async fn created_user_is_findable_by_every_key() {
    let Some(repo) = try_setup().await else { return };

    let created = repo
        .create_user("alice", "alice@example.com", "hunter2!")
        .await
        .expect("creation must succeed");
    assert!(created.hashed_password.starts_with("$argon2"));

    for lookup in [
        UserLookup::Id(created.id),
        UserLookup::Username("alice".to_string()),
        UserLookup::Email("alice@example.com".to_string()),
    ] {
        let found = repo.find_user(lookup.clone()).await.expect("must resolve");
        assert_eq!(found.id, created.id, "lookup {lookup:?}");
    }

    let err = repo
        .find_user(UserLookup::Username("nobody".to_string()))
        .await
        .expect_err("unknown username");
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
#[serial]
async fn duplicate_identity_names_the_colliding_field() {
    let Some(repo) = try_setup().await else { return };
    seed_user(&repo, "alice").await;

    let err = repo
        .create_user("alice", "other@example.com", "hunter2!")
        .await
        .expect_err("duplicate username");
    assert!(matches!(err, ApiError::AlreadyExists { field: "username" }));

    let err = repo
        .create_user("someone-else", "alice@example.com", "hunter2!")
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, ApiError::AlreadyExists { field: "email" }));

    // The failed inserts must not have left partial rows behind.
    let users = repo.get_users(10).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
#[serial]
async fn empty_registration_fields_are_invalid_input() {
    let Some(repo) = try_setup().await else { return };

    for (username, email, password) in [
        ("", "a@example.com", "pw"),
        ("a", "", "pw"),
        ("a", "a@example.com", ""),
    ] {
        let err = repo
            .create_user(username, email, password)
            .await
            .expect_err("empty field");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
    assert!(repo.get_users(10).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn password_update_replaces_only_the_digest() {
    let Some(repo) = try_setup().await else { return };
    let user_id = seed_user(&repo, "alice").await;
    let before = repo.find_user(UserLookup::Id(user_id)).await.unwrap();

    repo.update_user_password(user_id, "new-password!")
        .await
        .expect("update must succeed");

    let after = repo.find_user(UserLookup::Id(user_id)).await.unwrap();
    assert_ne!(before.hashed_password, after.hashed_password);
    assert_eq!(before.username, after.username);
    assert_eq!(before.email, after.email);

    let err = repo
        .update_user_password(9999, "whatever")
        .await
        .expect_err("unknown user");
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
#[serial]
async fn deleting_a_user_cascades_their_content_and_votes() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;
    let bob = seed_user(&repo, "bob").await;

    let alice_post = seed_post(&repo, alice, "alice writes").await;
    let bob_post = seed_post(&repo, bob, "bob writes").await;
    repo.create_comment(bob_post, "nice post", alice)
        .await
        .unwrap();
    repo.cast_vote(alice, bob_post, VoteDirection::Up)
        .await
        .unwrap();
    repo.cast_vote(bob, alice_post, VoteDirection::Up)
        .await
        .unwrap();

    repo.delete_user(alice).await.expect("delete must succeed");

    // Alice's post is gone, and with it bob's vote on it.
    assert!(matches!(
        repo.find_post(alice_post).await,
        Err(ApiError::NotFound)
    ));
    // Alice's comment on bob's post is gone; the post itself survives.
    assert!(repo.get_comments(bob_post).await.unwrap().is_empty());
    assert!(repo.find_post(bob_post).await.is_ok());

    // A second delete finds nothing.
    assert!(matches!(
        repo.delete_user(alice).await,
        Err(ApiError::NotFound)
    ));
}

#[tokio::test]
#[serial]
async fn post_paging_uses_zero_as_unbounded() {
    let Some(repo) = try_setup().await else { return };
    let owner = seed_user(&repo, "alice").await;
    for n in 1..=5 {
        seed_post(&repo, owner, &format!("post number {n}")).await;
    }

    // Unbounded listing returns everything in insertion order.
    let all = repo.get_posts(0, 0, "").await.unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));

    // Page of two, skipping the first two.
    let page = repo.get_posts(2, 2, "").await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, all[2].id);

    // Skip past the end yields an empty page, not an error.
    assert!(repo.get_posts(50, 10, "").await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn post_search_is_case_insensitive_over_title_and_content() {
    let Some(repo) = try_setup().await else { return };
    let owner = seed_user(&repo, "alice").await;
    repo.create_post("Rust ownership", "moves and borrows", owner, true)
        .await
        .unwrap();
    repo.create_post("Gardening", "growing RUST-colored tomatoes", owner, true)
        .await
        .unwrap();
    repo.create_post("Cooking", "a soup recipe", owner, true)
        .await
        .unwrap();

    let hits = repo.get_posts(0, 0, "rust").await.unwrap();
    assert_eq!(hits.len(), 2);

    assert!(repo.get_posts(0, 0, "haskell").await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn partial_post_update_touches_only_supplied_fields() {
    let Some(repo) = try_setup().await else { return };
    let owner = seed_user(&repo, "alice").await;
    let post_id = seed_post(&repo, owner, "original title").await;
    let original = repo.find_post(post_id).await.unwrap();

    let updated = repo
        .update_post(
            post_id,
            PostUpdate {
                title: Some("revised title".to_string()),
                ..PostUpdate::default()
            },
        )
        .await
        .expect("update must succeed");

    assert_eq!(updated.title, "revised title");
    assert_eq!(updated.content, original.content);
    assert_eq!(updated.published, original.published);
    assert_eq!(updated.owner_id, original.owner_id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);

    let err = repo
        .update_post(9999, PostUpdate::default())
        .await
        .expect_err("unknown post");
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
#[serial]
async fn deleting_a_post_cascades_comments_and_votes() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;
    let bob = seed_user(&repo, "bob").await;
    let post_id = seed_post(&repo, alice, "short-lived").await;
    let comment = repo.create_comment(post_id, "hello", bob).await.unwrap();
    repo.cast_vote(bob, post_id, VoteDirection::Up)
        .await
        .unwrap();

    repo.delete_post(post_id).await.expect("delete must succeed");

    assert!(matches!(
        repo.find_comment(comment.id).await,
        Err(ApiError::NotFound)
    ));
    assert!(matches!(
        repo.find_post(post_id).await,
        Err(ApiError::NotFound)
    ));
    assert!(matches!(
        repo.delete_post(post_id).await,
        Err(ApiError::NotFound)
    ));
}

#[tokio::test]
#[serial]
async fn commenting_on_a_missing_post_is_not_found() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;

    let err = repo
        .create_comment(9999, "into the void", alice)
        .await
        .expect_err("missing post");
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
#[serial]
async fn comment_update_refreshes_content_and_timestamp() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;
    let post_id = seed_post(&repo, alice, "a post").await;
    let comment = repo.create_comment(post_id, "frist", alice).await.unwrap();

    let updated = repo
        .update_comment(comment.id, "first")
        .await
        .expect("update must succeed");
    assert_eq!(updated.content, "first");
    assert!(updated.updated_at >= comment.updated_at);

    let listed = repo.get_comments(post_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, "first");
}

#[tokio::test]
#[serial]
async fn casting_a_vote_twice_leaves_a_single_toggled_row() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;
    let bob = seed_user(&repo, "bob").await;
    let post_id = seed_post(&repo, alice, "votable").await;

    let first = repo
        .cast_vote(bob, post_id, VoteDirection::Up)
        .await
        .unwrap();
    assert_eq!(first.direction, 1);

    // Re-casting overwrites in place instead of inserting a second row.
    let second = repo
        .cast_vote(bob, post_id, VoteDirection::Down)
        .await
        .unwrap();
    assert_eq!(second.direction, 0);
    assert_eq!(second.user_id, first.user_id);
    assert_eq!(second.post_id, first.post_id);

    // A vote against a post that does not exist is a typed miss.
    let err = repo
        .cast_vote(bob, 9999, VoteDirection::Up)
        .await
        .expect_err("missing post");
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
#[serial]
async fn owner_listing_includes_drafts() {
    let Some(repo) = try_setup().await else { return };
    let alice = seed_user(&repo, "alice").await;
    repo.create_post("published", "content", alice, true)
        .await
        .unwrap();
    repo.create_post("draft", "content", alice, false)
        .await
        .unwrap();

    let posts = repo.get_posts_by_owner(alice).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().any(|p| !p.published));
}
