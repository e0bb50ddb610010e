use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::{
    http::{Error, Jwt},
    schema::User,
    types::form::users::login,
    App,
};

#[tracing::instrument(skip_all, name = "controllers.users.login")]
pub async fn post(
    app: web::Data<App>,
    form: web::Json<login::Request>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    let email = form.email.as_str().trim().to_lowercase();

    let mut conn = app.db_read_prefer_primary().await?;
    let Some(user) = User::by_email(&mut conn, &email).await? else {
        return Err(super::invalid_credentials());
    };
    drop(conn);

    let matched =
        super::verify_password(form.password.as_str().to_string(), user.password_hash.clone())
            .await?;
    if !matched {
        return Err(super::invalid_credentials());
    }

    let token = Jwt::encode(user.id, app.config.auth.jwt_secret.as_str()).await?;
    Ok(HttpResponse::Ok().json(login::Response {
        token: token.into(),
    }))
}
