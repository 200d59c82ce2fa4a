//! Serialization-shape tests for the request and response schemas.
//!
//! The wire contract lives in serde attributes (defaults, unknown-field
//! rejection, flattening), so it gets pinned here rather than trusted.

use postboard::error::ApiError;
use postboard::models::{
    CreatePostRequest, Post, PostUpdate, User, UserResponse, UserWithPosts, VoteDirection,
};
use serde_json::json;

#[test]
fn user_response_never_carries_the_password_digest() {
    let user = User {
        id: 1,
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        hashed_password: "$argon2id$secret-digest".to_string(),
        ..User::default()
    };

    let body = serde_json::to_string(&UserResponse::from(user)).unwrap();
    assert!(body.contains("alice@example.com"));
    assert!(!body.contains("hashed_password"));
    assert!(!body.contains("secret-digest"));
}

#[test]
fn create_post_defaults_to_draft() {
    let request: CreatePostRequest =
        serde_json::from_value(json!({"title": "t", "content": "c"})).unwrap();
    assert!(!request.published);

    let request: CreatePostRequest =
        serde_json::from_value(json!({"title": "t", "content": "c", "published": true})).unwrap();
    assert!(request.published);
}

#[test]
fn post_update_accepts_any_subset_of_its_fields() {
    let update: PostUpdate = serde_json::from_value(json!({"title": "new title"})).unwrap();
    assert_eq!(update.title.as_deref(), Some("new title"));
    assert!(update.content.is_none());
    assert!(update.published.is_none());
    assert!(update.owner_id.is_none());

    let update: PostUpdate = serde_json::from_value(json!({})).unwrap();
    assert!(update.title.is_none());

    let update: PostUpdate =
        serde_json::from_value(json!({"published": true, "owner_id": 3})).unwrap();
    assert_eq!(update.published, Some(true));
    assert_eq!(update.owner_id, Some(3));
}

#[test]
fn post_update_rejects_unknown_fields() {
    let result: Result<PostUpdate, _> =
        serde_json::from_value(json!({"title": "t", "votes": 9000}));
    assert!(result.is_err());
}

#[test]
fn updatable_fields_match_the_struct() {
    // The handler-side key scan and the struct must agree on the mutable set.
    for field in PostUpdate::UPDATABLE_FIELDS {
        let payload = json!({ field: null });
        let parsed: Result<PostUpdate, _> = serde_json::from_value(payload);
        assert!(parsed.is_ok(), "field {field:?} must be accepted");
    }
}

#[test]
fn vote_direction_conversions_are_closed() {
    assert_eq!(VoteDirection::try_from(0).unwrap(), VoteDirection::Down);
    assert_eq!(VoteDirection::try_from(1).unwrap(), VoteDirection::Up);
    assert_eq!(VoteDirection::Down.as_i16(), 0);
    assert_eq!(VoteDirection::Up.as_i16(), 1);

    for bad in [-1i16, 2, 42] {
        let err = VoteDirection::try_from(bad).expect_err("out-of-range direction");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}

#[test]
fn user_with_posts_flattens_the_profile() {
    let combined = UserWithPosts {
        user: UserResponse {
            id: 5,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            ..UserResponse::default()
        },
        posts: vec![Post {
            id: 10,
            title: "hello".to_string(),
            ..Post::default()
        }],
    };

    let value = serde_json::to_value(&combined).unwrap();
    // The profile fields sit at the top level next to `posts`, not nested
    // under a `user` key.
    assert_eq!(value["username"], "bob");
    assert_eq!(value["posts"][0]["id"], 10);
    assert!(value.get("user").is_none());
}
