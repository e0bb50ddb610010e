use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    http::{Actor, Error},
    schema::{InsertPost, Post, PostView, UpdatePost},
    types::{
        form::posts,
        id::{marker::PostMarker, Id},
    },
    App,
};

#[tracing::instrument(skip_all, name = "controllers.posts.create")]
pub async fn create(
    app: web::Data<App>,
    actor: Actor,
    form: web::Json<posts::create::Request>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    form.validate()?;

    let mut conn = app.db_write().await?;
    let post = Post::insert(
        &mut conn,
        InsertPost {
            author_id: user.id,
            title: form.title.trim(),
            content: &form.content,
            tags: &form.tags,
            category: form.category(),
        },
    )
    .await?;

    let view = PostView::find(&mut conn, post.id)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok(HttpResponse::Created().json(view))
}

#[tracing::instrument(skip_all, name = "controllers.posts.list")]
pub async fn list(app: web::Data<App>) -> Result<HttpResponse, Error> {
    let mut conn = app.db_read().await?;
    let views = PostView::list(&mut conn).await?;
    Ok(HttpResponse::Ok().json(views))
}

#[tracing::instrument(skip_all, name = "controllers.posts.get")]
pub async fn get(
    app: web::Data<App>,
    id: web::Path<Id<PostMarker>>,
) -> Result<HttpResponse, Error> {
    let mut conn = app.db_read().await?;
    let view = PostView::find(&mut conn, *id)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok(HttpResponse::Ok().json(view))
}

#[tracing::instrument(skip_all, name = "controllers.posts.stats")]
pub async fn stats(app: web::Data<App>) -> Result<HttpResponse, Error> {
    let mut conn = app.db_read().await?;
    let stats = Post::stats(&mut conn).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[tracing::instrument(skip_all, name = "controllers.posts.update")]
pub async fn update(
    app: web::Data<App>,
    actor: Actor,
    id: web::Path<Id<PostMarker>>,
    form: web::Json<posts::update::Request>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    form.validate()?;

    let mut conn = app.db_write().await?;
    let Some(post) = Post::find(&mut conn, *id).await? else {
        return Err(Error::not_found());
    };
    super::ensure_author(post.author_id, user.id)?;

    let updated = Post::update(
        &mut conn,
        UpdatePost {
            id: post.id,
            title: form.title.trim(),
            content: &form.content,
            tags: &form.tags,
            category: form.category(),
            expected_version: form.version,
        },
    )
    .await?;
    if updated.is_none() {
        return Err(Error::version_conflict());
    }

    let view = PostView::find(&mut conn, post.id)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok(HttpResponse::Ok().json(view))
}

#[tracing::instrument(skip_all, name = "controllers.posts.delete")]
pub async fn delete(
    app: web::Data<App>,
    actor: Actor,
    id: web::Path<Id<PostMarker>>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let mut conn = app.db_write().await?;
    let Some(post) = Post::find(&mut conn, *id).await? else {
        return Err(Error::not_found());
    };
    super::ensure_author(post.author_id, user.id)?;

    // Comments and likes go with the post via ON DELETE CASCADE.
    Post::delete(&mut conn, post.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Post removed" })))
}
