use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error as ThisError;
use validator::Validate;

use crate::{
    http::Error,
    schema::User,
    types::{form::users::password, Error as ErrorType},
    App,
};

/// Reset tokens travel by mail in plain text but only their SHA-256
/// digest is ever stored.
const RESET_TOKEN_LEN: usize = 64;
const RESET_TOKEN_CHARSET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const RESET_TOKEN_TTL_HOURS: i64 = 1;

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[tracing::instrument(skip_all, name = "controllers.users.forgot_password")]
pub async fn forgot(
    app: web::Data<App>,
    form: web::Json<password::ForgotRequest>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    let email = form.email.as_str().trim().to_lowercase();

    let mut conn = app.db_write().await?;
    let Some(user) = User::by_email(&mut conn, &email).await? else {
        return Err(Error::not_found());
    };

    let token = random_string::generate(RESET_TOKEN_LEN, RESET_TOKEN_CHARSET);
    let expires = (Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS)).naive_utc();
    User::set_reset_token(&mut conn, user.id, &hash_reset_token(&token), expires).await?;
    drop(conn);

    let reset_url = format!(
        "{}/reset-password/{token}",
        app.config.public_url.as_str().trim_end_matches('/')
    );

    if let Some(mailer) = app.mailer.as_ref() {
        mailer
            .send_password_reset(&user.email, &reset_url)
            .await
            .map_err(|report| Error::from_report(ErrorType::Internal, report))?;
    } else {
        // No SMTP configured. Surface the link in the logs so local
        // setups can still complete the flow.
        tracing::warn!(email = %user.email, %reset_url, "SMTP is disabled, reset link not mailed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "An email has been sent with further instructions"
    })))
}

#[tracing::instrument(skip_all, name = "controllers.users.reset_password")]
pub async fn reset(
    app: web::Data<App>,
    token: web::Path<String>,
    form: web::Json<password::ResetRequest>,
) -> Result<HttpResponse, Error> {
    form.validate()?;

    let mut conn = app.db_write().await?;
    let Some(user) = User::by_reset_token(&mut conn, &hash_reset_token(&token)).await? else {
        #[derive(Debug, ThisError)]
        #[error("Reset token is unknown or expired")]
        struct StaleToken;
        return Err(Error::from_context(ErrorType::InvalidResetToken, StaleToken));
    };

    let password_hash = super::hash_password(form.password.as_str().to_string()).await?;
    User::set_password(&mut conn, user.id, &password_hash).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password has been reset successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_and_distinct() {
        let a = hash_reset_token("token-a");
        assert_eq!(a, hash_reset_token("token-a"));
        assert_ne!(a, hash_reset_token("token-b"));
        // SHA-256 hex digest
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn generated_tokens_stay_in_charset() {
        let token = random_string::generate(RESET_TOKEN_LEN, RESET_TOKEN_CHARSET);
        assert_eq!(token.len(), RESET_TOKEN_LEN);
        assert!(token.chars().all(|c| RESET_TOKEN_CHARSET.contains(c)));
    }
}
