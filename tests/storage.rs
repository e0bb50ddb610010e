//! Storage-level tests. These need a disposable Postgres database;
//! when `DATABASE_URL` is not set they pass as no-ops so the rest of
//! the suite can run anywhere.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use inkpost::schema::{InsertPost, InsertUser, Post, PostView, UpdatePost, User};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("DATABASE_URL is set but the database is unreachable");
    MIGRATOR.run(&pool).await.expect("failed to apply migrations");
    Some(pool)
}

fn unique_tag(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

async fn insert_user(conn: &mut PgConnection, prefix: &str) -> User {
    User::insert(
        conn,
        InsertUser {
            first_name: "Alice",
            last_name: "Park",
            email: &format!("{}@example.com", unique_tag(prefix)),
            password_hash: "$2b$12$not-a-real-hash",
        },
    )
    .await
    .unwrap()
}

async fn insert_post(conn: &mut PgConnection, user: &User) -> Post {
    Post::insert(
        conn,
        InsertPost {
            author_id: user.id,
            title: "Hello",
            content: "World",
            tags: &[],
            category: "General",
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn toggling_a_like_twice_restores_the_like_set() {
    let Some(pool) = test_pool().await else { return };
    let mut conn = pool.acquire().await.unwrap();

    let user = insert_user(&mut conn, "liker").await;
    let post = insert_post(&mut conn, &user).await;

    assert!(Post::toggle_like(&mut conn, post.id, user.id).await.unwrap());
    let view = PostView::find(&mut conn, post.id).await.unwrap().unwrap();
    assert_eq!(view.likes, vec![user.id]);

    assert!(!Post::toggle_like(&mut conn, post.id, user.id).await.unwrap());
    let view = PostView::find(&mut conn, post.id).await.unwrap().unwrap();
    assert!(view.likes.is_empty());
}

#[tokio::test]
async fn reset_token_is_consumed_by_the_password_change() {
    let Some(pool) = test_pool().await else { return };
    let mut conn = pool.acquire().await.unwrap();

    let user = insert_user(&mut conn, "reset").await;
    let token_hash = unique_tag("digest");
    let expires = (Utc::now() + Duration::hours(1)).naive_utc();
    User::set_reset_token(&mut conn, user.id, &token_hash, expires)
        .await
        .unwrap();

    let found = User::by_reset_token(&mut conn, &token_hash).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    User::set_password(&mut conn, user.id, "$2b$12$replacement-hash")
        .await
        .unwrap();
    assert!(User::by_reset_token(&mut conn, &token_hash)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn expired_reset_token_is_unusable() {
    let Some(pool) = test_pool().await else { return };
    let mut conn = pool.acquire().await.unwrap();

    let user = insert_user(&mut conn, "expired").await;
    let token_hash = unique_tag("stale");
    let expires = (Utc::now() - Duration::hours(2)).naive_utc();
    User::set_reset_token(&mut conn, user.id, &token_hash, expires)
        .await
        .unwrap();

    assert!(User::by_reset_token(&mut conn, &token_hash)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn stale_version_does_not_overwrite_the_post() {
    let Some(pool) = test_pool().await else { return };
    let mut conn = pool.acquire().await.unwrap();

    let user = insert_user(&mut conn, "editor").await;
    let post = insert_post(&mut conn, &user).await;

    let stale = Post::update(
        &mut conn,
        UpdatePost {
            id: post.id,
            title: "Stale",
            content: "Stale",
            tags: &[],
            category: "General",
            expected_version: Some(post.version + 1),
        },
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let fresh = Post::update(
        &mut conn,
        UpdatePost {
            id: post.id,
            title: "Fresh",
            content: "Fresh",
            tags: &[],
            category: "General",
            expected_version: Some(post.version),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(fresh.version, post.version + 1);
    assert_eq!(fresh.title, "Fresh");
}
