use actix_web::{web, HttpResponse};
use thiserror::Error as ThisError;
use validator::Validate;

use crate::{
    http::{Error, Jwt},
    schema::{InsertUser, User},
    types::{form::users::register, Error as ErrorType},
    App,
};

#[tracing::instrument(skip_all, name = "controllers.users.signup")]
pub async fn post(
    app: web::Data<App>,
    form: web::Json<register::Request>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    let email = form.email.as_str().trim().to_lowercase();

    let mut conn = app.db_write().await?;
    if User::by_email(&mut conn, &email).await?.is_some() {
        #[derive(Debug, ThisError)]
        #[error("Email is already registered")]
        struct DuplicateEmail;
        return Err(Error::from_context(ErrorType::Conflict, DuplicateEmail));
    }

    let password_hash = super::hash_password(form.password.as_str().to_string()).await?;

    let user = User::insert(
        &mut conn,
        InsertUser {
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            email: &email,
            password_hash: &password_hash,
        },
    )
    .await?;
    drop(conn);

    let token = Jwt::encode(user.id, app.config.auth.jwt_secret.as_str()).await?;
    Ok(HttpResponse::Created().json(register::Response {
        token: token.into(),
    }))
}
