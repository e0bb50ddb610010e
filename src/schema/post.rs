use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
    database::{Connection, ErrorExt, Result},
    schema::user::AuthorView,
    types::id::{
        marker::{PostMarker, UserMarker},
        Id,
    },
};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub author_id: Id<UserMarker>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: String,
    pub version: i64,
}

pub struct InsertPost<'a> {
    pub author_id: Id<UserMarker>,
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub category: &'a str,
}

/// Full overwrite of the caller-owned fields; callers resend
/// everything they intend to keep. `expected_version` (when given)
/// turns the write into a compare-and-swap.
pub struct UpdatePost<'a> {
    pub id: Id<PostMarker>,
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub category: &'a str,
    pub expected_version: Option<i64>,
}

/// Aggregate counters for the dashboard cards.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub total_posts: i64,
    pub total_likes: i64,
}

impl Post {
    #[tracing::instrument(skip_all, name = "db.posts.find")]
    pub async fn find(conn: &mut Connection, id: Id<PostMarker>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "posts" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.posts.insert")]
    pub async fn insert(conn: &mut Connection, post: InsertPost<'_>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO "posts" (author_id, title, content, tags, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(post.author_id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.tags)
        .bind(post.category)
        .fetch_one(conn)
        .await
        .into_db_error()
    }

    /// Returns `None` when `expected_version` no longer matches; the
    /// caller decides whether that is a version conflict or a missing
    /// post.
    #[tracing::instrument(skip_all, name = "db.posts.update")]
    pub async fn update(conn: &mut Connection, post: UpdatePost<'_>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "posts" SET
                title = $2,
                content = $3,
                tags = $4,
                category = $5,
                version = version + 1,
                updated_at = now()
            WHERE id = $1 AND ($6::bigint IS NULL OR version = $6)
            RETURNING *"#,
        )
        .bind(post.id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.tags)
        .bind(post.category)
        .bind(post.expected_version)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Hard delete. Comments and likes go with it (`ON DELETE CASCADE`).
    #[tracing::instrument(skip_all, name = "db.posts.delete")]
    pub async fn delete(conn: &mut Connection, id: Id<PostMarker>) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM "posts" WHERE id = $1"#)
            .bind(id)
            .execute(conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected())
    }

    /// Flips the acting user's membership in the post's like set.
    /// Returns `true` when the call ended up liking the post.
    #[tracing::instrument(skip_all, name = "db.posts.toggle_like")]
    pub async fn toggle_like(
        conn: &mut Connection,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<bool> {
        let removed = sqlx::query(
            r#"DELETE FROM "post_likes" WHERE post_id = $1 AND user_id = $2"#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .into_db_error()?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"INSERT INTO "post_likes" (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING"#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(conn)
        .await
        .into_db_error()?;
        Ok(true)
    }

    #[tracing::instrument(skip_all, name = "db.posts.stats")]
    pub async fn stats(conn: &mut Connection) -> Result<PostStats> {
        sqlx::query_as::<_, PostStats>(
            r#"SELECT
                (SELECT count(*) FROM "posts") AS total_posts,
                (SELECT count(*) FROM "post_likes") AS total_likes"#,
        )
        .fetch_one(conn)
        .await
        .into_db_error()
    }
}

const VIEW_SELECT: &str = r#"
    SELECT p.id, p.created_at, p.updated_at, p.title, p.content, p.tags, p.category, p.version,
           u.id AS author_id, u.first_name AS author_first_name,
           u.last_name AS author_last_name, u.profile_photo AS author_profile_photo,
           coalesce(
               array_agg(l.user_id ORDER BY l.created_at)
                   FILTER (WHERE l.user_id IS NOT NULL),
               '{}'
           ) AS likes
    FROM "posts" p
    JOIN "users" u ON u.id = p.author_id
    LEFT JOIN "post_likes" l ON l.post_id = p.id
"#;

#[derive(Debug, FromRow)]
struct PostViewRow {
    id: Id<PostMarker>,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
    title: String,
    content: String,
    tags: Vec<String>,
    category: String,
    version: i64,
    author_id: Id<UserMarker>,
    author_first_name: String,
    author_last_name: String,
    author_profile_photo: Option<String>,
    likes: Vec<i64>,
}

/// A post with its author inlined and the like set resolved,
/// as returned by every read endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Id<PostMarker>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: String,
    pub version: i64,
    pub author: AuthorView,
    pub likes: Vec<Id<UserMarker>>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            category: row.category,
            version: row.version,
            author: AuthorView::new(
                row.author_id,
                row.author_first_name,
                row.author_last_name,
                row.author_profile_photo,
            ),
            likes: row
                .likes
                .into_iter()
                .filter_map(|raw| u64::try_from(raw).ok())
                .filter_map(Id::new_checked)
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostView {
    #[tracing::instrument(skip_all, name = "db.posts.find_view")]
    pub async fn find(conn: &mut Connection, id: Id<PostMarker>) -> Result<Option<Self>> {
        let query = format!("{VIEW_SELECT} WHERE p.id = $1 GROUP BY p.id, u.id");
        let row = sqlx::query_as::<_, PostViewRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
            .into_db_error()?;
        Ok(row.map(Self::from))
    }

    /// All posts in storage order. Ordering is not part of the API
    /// contract; clients sort on their side.
    #[tracing::instrument(skip_all, name = "db.posts.list")]
    pub async fn list(conn: &mut Connection) -> Result<Vec<Self>> {
        let query = format!("{VIEW_SELECT} GROUP BY p.id, u.id ORDER BY p.id");
        let rows = sqlx::query_as::<_, PostViewRow>(&query)
            .fetch_all(conn)
            .await
            .into_db_error()?;
        Ok(rows.into_iter().map(Self::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_serializes_camel_case_with_string_ids() {
        let view = PostView::from(PostViewRow {
            id: Id::new(3),
            created_at: chrono::NaiveDateTime::UNIX_EPOCH,
            updated_at: None,
            title: "Hello".into(),
            content: "World".into(),
            tags: vec!["intro".into()],
            category: "General".into(),
            version: 1,
            author_id: Id::new(7),
            author_first_name: "Alice".into(),
            author_last_name: "Park".into(),
            author_profile_photo: None,
            likes: vec![7, 9],
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["author"]["id"], "7");
        assert_eq!(json["author"]["firstName"], "Alice");
        assert_eq!(json["likes"], serde_json::json!(["7", "9"]));
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00");
    }

    #[test]
    fn malformed_like_ids_are_dropped_not_propagated() {
        let view = PostView::from(PostViewRow {
            id: Id::new(3),
            created_at: chrono::NaiveDateTime::UNIX_EPOCH,
            updated_at: None,
            title: "Hello".into(),
            content: "World".into(),
            tags: vec![],
            category: "General".into(),
            version: 1,
            author_id: Id::new(7),
            author_first_name: "Alice".into(),
            author_last_name: "Park".into(),
            author_profile_photo: None,
            likes: vec![0, -4, 11],
        });
        assert_eq!(view.likes, vec![Id::new(11)]);
    }
}
