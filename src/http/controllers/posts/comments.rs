use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    http::{Actor, Error},
    schema::{build_threads, AuthorView, Comment, CommentView, InsertComment, Post},
    types::{
        form::{comments, field_error},
        id::{
            marker::{CommentMarker, PostMarker},
            Id,
        },
    },
    App,
};

#[tracing::instrument(skip_all, name = "controllers.comments.list")]
pub async fn list(
    app: web::Data<App>,
    id: web::Path<Id<PostMarker>>,
) -> Result<HttpResponse, Error> {
    let mut conn = app.db_read().await?;
    let rows = CommentView::list_for_post(&mut conn, *id).await?;
    Ok(HttpResponse::Ok().json(build_threads(rows)))
}

#[tracing::instrument(skip_all, name = "controllers.comments.create")]
pub async fn create(
    app: web::Data<App>,
    actor: Actor,
    id: web::Path<Id<PostMarker>>,
    form: web::Json<comments::create::Request>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    form.validate()?;

    let post_id = *id;
    let mut conn = app.db_write().await?;
    if Post::find(&mut conn, post_id).await?.is_none() {
        return Err(Error::not_found());
    }

    if let Some(parent_id) = form.parent_comment_id {
        let Some(parent) = Comment::find(&mut conn, parent_id).await? else {
            return Err(Error::not_found());
        };
        ensure_valid_parent(&parent, post_id)?;
    }

    let comment = Comment::insert(
        &mut conn,
        InsertComment {
            post_id,
            author_id: user.id,
            parent_id: form.parent_comment_id,
            content: form.content.trim(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(CommentView::new(comment, AuthorView::from(&user))))
}

#[tracing::instrument(skip_all, name = "controllers.comments.update")]
pub async fn update(
    app: web::Data<App>,
    actor: Actor,
    path: web::Path<(Id<PostMarker>, Id<CommentMarker>)>,
    form: web::Json<comments::update::Request>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    form.validate()?;

    let (post_id, comment_id) = path.into_inner();
    let mut conn = app.db_write().await?;
    let Some(comment) = Comment::find(&mut conn, comment_id).await? else {
        return Err(Error::not_found());
    };
    if comment.post_id != post_id {
        return Err(Error::not_found());
    }
    super::ensure_author(comment.author_id, user.id)?;

    let Some(updated) =
        Comment::update_content(&mut conn, comment_id, form.content.trim(), form.version).await?
    else {
        return Err(Error::version_conflict());
    };

    Ok(HttpResponse::Ok().json(CommentView::new(updated, AuthorView::from(&user))))
}

#[tracing::instrument(skip_all, name = "controllers.comments.delete")]
pub async fn delete(
    app: web::Data<App>,
    actor: Actor,
    path: web::Path<(Id<PostMarker>, Id<CommentMarker>)>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let (post_id, comment_id) = path.into_inner();
    let mut conn = app.db_write().await?;
    let Some(comment) = Comment::find(&mut conn, comment_id).await? else {
        return Err(Error::not_found());
    };
    if comment.post_id != post_id {
        return Err(Error::not_found());
    }
    super::ensure_author(comment.author_id, user.id)?;

    // Replies go with their parent via ON DELETE CASCADE.
    Comment::delete(&mut conn, comment_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Comment removed" })))
}

#[tracing::instrument(skip_all, name = "controllers.comments.list_replies")]
pub async fn list_replies(
    app: web::Data<App>,
    path: web::Path<(Id<PostMarker>, Id<CommentMarker>)>,
) -> Result<HttpResponse, Error> {
    let (post_id, comment_id) = path.into_inner();

    let mut conn = app.db_read().await?;
    let Some(comment) = Comment::find(&mut conn, comment_id).await? else {
        return Err(Error::not_found());
    };
    if comment.post_id != post_id {
        return Err(Error::not_found());
    }

    let replies = CommentView::list_replies(&mut conn, comment_id).await?;
    Ok(HttpResponse::Ok().json(replies))
}

#[tracing::instrument(skip_all, name = "controllers.comments.add_reply")]
pub async fn add_reply(
    app: web::Data<App>,
    actor: Actor,
    path: web::Path<(Id<PostMarker>, Id<CommentMarker>)>,
    form: web::Json<comments::reply::Request>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    form.validate()?;

    let (post_id, parent_id) = path.into_inner();
    let mut conn = app.db_write().await?;
    let Some(parent) = Comment::find(&mut conn, parent_id).await? else {
        return Err(Error::not_found());
    };
    ensure_valid_parent(&parent, post_id)?;

    let comment = Comment::insert(
        &mut conn,
        InsertComment {
            post_id,
            author_id: user.id,
            parent_id: Some(parent_id),
            content: form.content.trim(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(CommentView::new(comment, AuthorView::from(&user))))
}

/// A reply must target a top-level comment on the same post. Threads
/// never nest past one level.
fn ensure_valid_parent(parent: &Comment, post_id: Id<PostMarker>) -> Result<(), Error> {
    if parent.post_id != post_id {
        return Err(Error::not_found());
    }
    if parent.parent_id.is_some() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "parentCommentId",
            field_error("nesting", "Replies cannot be nested more than one level"),
        );
        return Err(Error::from(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Error as ErrorType;

    fn comment(post: u64, parent: Option<u64>) -> Comment {
        Comment {
            id: Id::new(1),
            created_at: chrono::NaiveDateTime::UNIX_EPOCH,
            updated_at: None,
            post_id: Id::new(post),
            author_id: Id::new(9),
            parent_id: parent.map(Id::new),
            content: "hi".into(),
            version: 1,
        }
    }

    #[test]
    fn parent_must_belong_to_the_same_post() {
        let error = ensure_valid_parent(&comment(2, None), Id::new(1)).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::NotFound));
    }

    #[test]
    fn replies_to_replies_are_rejected() {
        let error = ensure_valid_parent(&comment(1, Some(5)), Id::new(1)).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::InvalidFormBody(_)));
    }

    #[test]
    fn top_level_comment_is_a_valid_parent() {
        assert!(ensure_valid_parent(&comment(1, None), Id::new(1)).is_ok());
    }
}
