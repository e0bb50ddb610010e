use actix_web::{web, HttpResponse};

use crate::{
    http::{Actor, Error},
    schema::{Post, PostView},
    types::id::{marker::PostMarker, Id},
    App,
};

/// Toggles the acting user's like on a post and returns the fresh
/// view so clients can render the new like set without a follow-up
/// request.
#[tracing::instrument(skip_all, name = "controllers.posts.react")]
pub async fn post(
    app: web::Data<App>,
    actor: Actor,
    id: web::Path<Id<PostMarker>>,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let mut conn = app.db_write().await?;
    let Some(post) = Post::find(&mut conn, *id).await? else {
        return Err(Error::not_found());
    };

    Post::toggle_like(&mut conn, post.id, user.id).await?;

    let view = PostView::find(&mut conn, post.id)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok(HttpResponse::Ok().json(view))
}
