use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use error_stack::Report;
use futures::TryStreamExt;
use thiserror::Error as ThisError;
use validator::Validate;

use crate::{
    http::{uploads, Actor, Error},
    schema::{UpdateUserProfile, User, UserView},
    types::{
        form::{field_error, users::profile},
        Error as ErrorType,
    },
    App,
};

/// Text parts larger than this are certainly not profile fields.
const MAX_TEXT_PART_LEN: usize = 64 * 1024;

#[tracing::instrument(skip_all, name = "controllers.users.profile.get")]
pub async fn get(actor: Actor) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;
    Ok(HttpResponse::Ok().json(UserView::from(user)))
}

#[tracing::instrument(skip_all, name = "controllers.users.profile.update")]
pub async fn put(
    app: web::Data<App>,
    actor: Actor,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let user = actor.get_user()?;

    let mut fields = profile::Fields::default();
    let mut photo: Option<String> = None;
    let mut dob_raw: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().to_string();
        match name.as_str() {
            "firstName" => fields.first_name = Some(read_text(&mut field).await?),
            "lastName" => fields.last_name = Some(read_text(&mut field).await?),
            "email" => {
                fields.email = Some(read_text(&mut field).await?.trim().to_lowercase());
            }
            "phone" => fields.phone = Some(read_text(&mut field).await?),
            "dob" => dob_raw = Some(read_text(&mut field).await?),
            "address" => fields.address = Some(read_text(&mut field).await?),
            "profilePhoto" => {
                photo =
                    Some(uploads::save_profile_photo(&app.config.uploads_dir, &mut field).await?);
            }
            // Unknown parts are drained so the stream can move on.
            _ => while field.try_next().await.map_err(multipart_error)?.is_some() {},
        }
    }

    // Parts arrive in client order, so the photo may already be on
    // disk by the time a text field turns out to be invalid. All
    // validation runs after the loop; failed updates must not leave
    // orphan files behind.
    if let Some(raw) = dob_raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        match parse_dob(raw) {
            Ok(dob) => fields.dob = Some(dob),
            Err(error) => {
                discard_photo(&app.config.uploads_dir, photo.as_deref()).await;
                return Err(error);
            }
        }
    }

    if let Err(errors) = fields.validate() {
        discard_photo(&app.config.uploads_dir, photo.as_deref()).await;
        return Err(Error::from(errors));
    }

    let mut conn = app.db_write().await?;

    if let Some(email) = fields.email.as_deref() {
        if email != user.email && User::by_email(&mut conn, email).await?.is_some() {
            #[derive(Debug, ThisError)]
            #[error("Email is already registered")]
            struct DuplicateEmail;
            discard_photo(&app.config.uploads_dir, photo.as_deref()).await;
            return Err(Error::from_context(ErrorType::Conflict, DuplicateEmail));
        }
    }

    let updated = User::update_profile(
        &mut conn,
        user.id,
        UpdateUserProfile {
            first_name: fields.first_name.as_deref().map(str::trim),
            last_name: fields.last_name.as_deref().map(str::trim),
            email: fields.email.as_deref(),
            phone: fields.phone.as_deref().map(str::trim),
            dob: fields.dob,
            address: fields.address.as_deref(),
            profile_photo: photo.as_deref(),
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserView::from(updated)))
}

async fn discard_photo(dir: &std::path::Path, photo: Option<&str>) {
    if let Some(name) = photo {
        if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
            tracing::warn!(%name, "could not remove discarded upload: {e}");
        }
    }
}

// actix's multipart error is not Send + Sync, same workaround as in
// the upload path.
fn multipart_error(e: impl std::fmt::Display) -> Error {
    #[derive(Debug, ThisError)]
    #[error("Failed to read multipart body")]
    struct BodyError;
    Error::from_report(
        ErrorType::Internal,
        Report::new(BodyError).attach_printable(e.to_string()),
    )
}

async fn read_text(field: &mut Field) -> Result<String, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if buffer.len() + chunk.len() > MAX_TEXT_PART_LEN {
            return Err(Error::from(oversized_part(field.name())));
        }
        buffer.extend_from_slice(&chunk);
    }

    String::from_utf8(buffer).map_err(|_| Error::from(invalid_utf8(field.name())))
}

fn parse_dob(raw: &str) -> Result<NaiveDate, Error> {
    // Browsers post `<input type="date">` values as YYYY-MM-DD.
    raw.parse::<NaiveDate>().map_err(|_| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("dob", field_error("date", "Date of birth must be YYYY-MM-DD"));
        Error::from(errors)
    })
}

fn oversized_part(name: &str) -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    errors.add(
        leak_field_name(name),
        field_error("length", "Field value is too large"),
    );
    errors
}

fn invalid_utf8(name: &str) -> validator::ValidationErrors {
    let mut errors = validator::ValidationErrors::new();
    errors.add(
        leak_field_name(name),
        field_error("encoding", "Field value must be valid UTF-8"),
    );
    errors
}

// `ValidationErrors::add` wants a 'static field name; the known form
// field set is tiny so interning through a match avoids a real leak.
fn leak_field_name(name: &str) -> &'static str {
    match name {
        "firstName" => "firstName",
        "lastName" => "lastName",
        "email" => "email",
        "phone" => "phone",
        "dob" => "dob",
        "address" => "address",
        _ => "field",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dob_parses_browser_date_format() {
        assert_eq!(
            parse_dob("1990-04-17").unwrap(),
            NaiveDate::from_ymd_opt(1990, 4, 17).unwrap()
        );
        assert!(parse_dob("17/04/1990").is_err());
    }

    #[test]
    fn unknown_field_names_fall_back() {
        assert_eq!(leak_field_name("profilePhoto"), "field");
        assert_eq!(leak_field_name("email"), "email");
    }

    #[tokio::test]
    async fn rejected_updates_leave_no_orphan_photo() {
        let dir = std::env::temp_dir().join(format!("inkpost-uploads-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("123.png");
        std::fs::write(&path, b"not really a png").unwrap();

        discard_photo(&dir, Some("123.png")).await;
        assert!(!path.exists());

        // already-gone files and absent photos are a no-op
        discard_photo(&dir, Some("123.png")).await;
        discard_photo(&dir, None).await;
    }
}
