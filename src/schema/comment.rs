use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::{
    database::{Connection, ErrorExt, Result},
    schema::user::AuthorView,
    types::id::{
        marker::{CommentMarker, PostMarker, UserMarker},
        Id,
    },
};

/// A single comment record. Replies are ordinary comments with a
/// non-null `parent_id`; reply lists are always derived by query and
/// never stored, so a reply can never exist half-linked.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub post_id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub parent_id: Option<Id<CommentMarker>>,
    pub content: String,
    pub version: i64,
}

pub struct InsertComment<'a> {
    pub post_id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub parent_id: Option<Id<CommentMarker>>,
    pub content: &'a str,
}

impl Comment {
    #[tracing::instrument(skip_all, name = "db.comments.find")]
    pub async fn find(conn: &mut Connection, id: Id<CommentMarker>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "comments" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.comments.insert")]
    pub async fn insert(conn: &mut Connection, comment: InsertComment<'_>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO "comments" (post_id, author_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *"#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(comment.content)
        .fetch_one(conn)
        .await
        .into_db_error()
    }

    /// Returns `None` when `expected_version` no longer matches.
    #[tracing::instrument(skip_all, name = "db.comments.update")]
    pub async fn update_content(
        conn: &mut Connection,
        id: Id<CommentMarker>,
        content: &str,
        expected_version: Option<i64>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "comments" SET
                content = $2,
                version = version + 1,
                updated_at = now()
            WHERE id = $1 AND ($3::bigint IS NULL OR version = $3)
            RETURNING *"#,
        )
        .bind(id)
        .bind(content)
        .bind(expected_version)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    /// Hard delete; replies cascade with their parent.
    #[tracing::instrument(skip_all, name = "db.comments.delete")]
    pub async fn delete(conn: &mut Connection, id: Id<CommentMarker>) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM "comments" WHERE id = $1"#)
            .bind(id)
            .execute(conn)
            .await
            .into_db_error()?;
        Ok(result.rows_affected())
    }
}

const VIEW_SELECT: &str = r#"
    SELECT c.id, c.created_at, c.updated_at, c.post_id, c.parent_id, c.content, c.version,
           u.id AS author_id, u.first_name AS author_first_name,
           u.last_name AS author_last_name, u.profile_photo AS author_profile_photo
    FROM "comments" c
    JOIN "users" u ON u.id = c.author_id
"#;

#[derive(Debug, FromRow)]
struct CommentViewRow {
    id: Id<CommentMarker>,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
    post_id: Id<PostMarker>,
    parent_id: Option<Id<CommentMarker>>,
    content: String,
    version: i64,
    author_id: Id<UserMarker>,
    author_first_name: String,
    author_last_name: String,
    author_profile_photo: Option<String>,
}

/// A comment with its author inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Id<CommentMarker>,
    pub post_id: Id<PostMarker>,
    pub parent_id: Option<Id<CommentMarker>>,
    pub content: String,
    pub version: i64,
    pub author: AuthorView,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorView) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            content: comment.content,
            version: comment.version,
            author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }

    /// Every comment on the post, top-level and replies alike,
    /// in insertion order.
    #[tracing::instrument(skip_all, name = "db.comments.list_for_post")]
    pub async fn list_for_post(
        conn: &mut Connection,
        post_id: Id<PostMarker>,
    ) -> Result<Vec<Self>> {
        let query = format!("{VIEW_SELECT} WHERE c.post_id = $1 ORDER BY c.id");
        let rows = sqlx::query_as::<_, CommentViewRow>(&query)
            .bind(post_id)
            .fetch_all(conn)
            .await
            .into_db_error()?;
        Ok(rows.into_iter().map(Self::from).collect())
    }

    #[tracing::instrument(skip_all, name = "db.comments.list_replies")]
    pub async fn list_replies(
        conn: &mut Connection,
        parent_id: Id<CommentMarker>,
    ) -> Result<Vec<Self>> {
        let query = format!("{VIEW_SELECT} WHERE c.parent_id = $1 ORDER BY c.id");
        let rows = sqlx::query_as::<_, CommentViewRow>(&query)
            .bind(parent_id)
            .fetch_all(conn)
            .await
            .into_db_error()?;
        Ok(rows.into_iter().map(Self::from).collect())
    }
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            content: row.content,
            version: row.version,
            author: AuthorView::new(
                row.author_id,
                row.author_first_name,
                row.author_last_name,
                row.author_profile_photo,
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One top-level comment with its replies attached, as served by
/// `GET /api/posts/:id/comments`.
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// Groups a flat, insertion-ordered comment list into top-level
/// threads. A reply lands under its parent exactly once; replies
/// whose parent is missing from `rows` are dropped (they belong to
/// another post's listing or were raced away by a delete).
pub fn build_threads(rows: Vec<CommentView>) -> Vec<CommentThread> {
    let mut replies_by_parent: HashMap<Id<CommentMarker>, Vec<CommentView>> = HashMap::new();
    let mut top_level = Vec::new();

    for row in rows {
        match row.parent_id {
            Some(parent) => replies_by_parent.entry(parent).or_default().push(row),
            None => top_level.push(row),
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = replies_by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64, parent: Option<u64>) -> CommentView {
        CommentView {
            id: Id::new(id),
            post_id: Id::new(1),
            parent_id: parent.map(Id::new),
            content: format!("comment {id}"),
            version: 1,
            author: AuthorView::new(Id::new(42), "Alice".into(), "Park".into(), None),
            created_at: chrono::NaiveDateTime::UNIX_EPOCH,
            updated_at: None,
        }
    }

    #[test]
    fn reply_lands_under_its_parent_exactly_once() {
        let threads = build_threads(vec![view(1, None), view(2, Some(1)), view(3, None)]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, Id::new(1));
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(threads[0].replies[0].id, Id::new(2));
        assert!(threads[1].replies.is_empty());

        // 2 threads + 1 reply, nothing duplicated
        let total = threads.len() + threads.iter().map(|t| t.replies.len()).sum::<usize>();
        assert_eq!(total, 3);
    }

    #[test]
    fn replies_keep_insertion_order() {
        let threads = build_threads(vec![
            view(1, None),
            view(2, Some(1)),
            view(3, Some(1)),
            view(4, Some(1)),
        ]);

        assert_eq!(threads.len(), 1);
        let ids: Vec<_> = threads[0].replies.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn orphaned_replies_are_dropped() {
        let threads = build_threads(vec![view(1, None), view(2, Some(99))]);
        assert_eq!(threads.len(), 1);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn empty_input_builds_empty_listing() {
        assert!(build_threads(Vec::new()).is_empty());
    }

    #[test]
    fn thread_serializes_flattened_with_replies() {
        let threads = build_threads(vec![view(1, None), view(2, Some(1))]);
        let json = serde_json::to_value(&threads).unwrap();

        assert_eq!(json[0]["id"], "1");
        assert_eq!(json[0]["content"], "comment 1");
        assert_eq!(json[0]["replies"][0]["id"], "2");
        assert_eq!(json[0]["replies"][0]["parentId"], "1");
        assert_eq!(json[0]["author"]["firstName"], "Alice");
    }
}
