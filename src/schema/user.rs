use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::FromRow;

use crate::{
    database::{Connection, ErrorExt, Result},
    types::id::{marker::UserMarker, Id},
};

/// Shown for users who never uploaded a profile photo.
pub const DEFAULT_AVATAR: &str = "https://cdn-icons-png.flaticon.com/512/149/149071.png";

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: Id<UserMarker>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub profile_photo: Option<String>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires: Option<NaiveDateTime>,
}

pub struct InsertUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    /// Must already be lowercased by the caller.
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Default)]
pub struct UpdateUserProfile<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub dob: Option<NaiveDate>,
    pub address: Option<&'a str>,
    pub profile_photo: Option<&'a str>,
}

impl User {
    #[tracing::instrument(skip(id), fields(id = "<hidden>"))]
    pub async fn by_id(conn: &mut Connection, id: Id<UserMarker>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    #[tracing::instrument(skip(condition), fields(condition = "<hidden>"))]
    pub async fn by_email(conn: &mut Connection, condition: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE email = $1"#)
            .bind(condition)
            .fetch_optional(conn)
            .await
            .into_db_error()
    }

    /// Looks up the single user holding a live (non-expired) reset token.
    #[tracing::instrument(skip(token_hash), fields(token_hash = "<hidden>"))]
    pub async fn by_reset_token(conn: &mut Connection, token_hash: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "users"
            WHERE reset_token_hash = $1 AND reset_token_expires > now()"#,
        )
        .bind(token_hash)
        .fetch_optional(conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.users.insert")]
    pub async fn insert(conn: &mut Connection, user: InsertUser<'_>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO "users" (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *"#,
        )
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip_all, name = "db.users.update_profile")]
    pub async fn update_profile(
        conn: &mut Connection,
        id: Id<UserMarker>,
        fields: UpdateUserProfile<'_>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE "users" SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                dob = COALESCE($6, dob),
                address = COALESCE($7, address),
                profile_photo = COALESCE($8, profile_photo),
                updated_at = now()
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(id)
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.dob)
        .bind(fields.address)
        .bind(fields.profile_photo)
        .fetch_one(conn)
        .await
        .into_db_error()
    }

    /// Replaces the credential hash and consumes any pending
    /// reset token in the same statement.
    #[tracing::instrument(skip_all, name = "db.users.set_password")]
    pub async fn set_password(
        conn: &mut Connection,
        id: Id<UserMarker>,
        password_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE "users" SET
                password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires = NULL,
                updated_at = now()
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(conn)
        .await
        .into_db_error()?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db.users.set_reset_token")]
    pub async fn set_reset_token(
        conn: &mut Connection,
        id: Id<UserMarker>,
        token_hash: &str,
        expires: NaiveDateTime,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE "users" SET
                reset_token_hash = $2,
                reset_token_expires = $3,
                updated_at = now()
            WHERE id = $1"#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires)
        .execute(conn)
        .await
        .into_db_error()?;
        Ok(())
    }
}

/// Denormalized author fields inlined into posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Id<UserMarker>,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo: String,
}

impl AuthorView {
    pub fn new(
        id: Id<UserMarker>,
        first_name: String,
        last_name: String,
        profile_photo: Option<String>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            profile_photo: profile_photo.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        }
    }
}

impl From<&User> for AuthorView {
    fn from(user: &User) -> Self {
        Self::new(
            user.id,
            user.first_name.clone(),
            user.last_name.clone(),
            user.profile_photo.clone(),
        )
    }
}

/// Full profile as returned by `GET /api/users/profile`. Credential
/// and reset token fields never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Id<UserMarker>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub profile_photo: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            dob: user.dob,
            address: user.address,
            profile_photo: user
                .profile_photo
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Id::new(7),
            created_at: chrono::NaiveDateTime::UNIX_EPOCH,
            updated_at: None,
            first_name: "Alice".into(),
            last_name: "Park".into(),
            email: "alice@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            phone: None,
            dob: None,
            address: None,
            profile_photo: None,
            reset_token_hash: Some("deadbeef".into()),
            reset_token_expires: None,
        }
    }

    #[test]
    fn user_view_never_exposes_credentials() {
        let view = UserView::from(sample_user());
        let json = serde_json::to_value(&view).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("resetTokenHash"));
        assert_eq!(object["email"], "alice@example.com");
    }

    #[test]
    fn missing_photo_falls_back_to_default_avatar() {
        let author = AuthorView::from(&sample_user());
        assert_eq!(author.profile_photo, DEFAULT_AVATAR);

        let mut user = sample_user();
        user.profile_photo = Some("17000000.png".into());
        let author = AuthorView::from(&user);
        assert_eq!(author.profile_photo, "17000000.png");
    }
}
