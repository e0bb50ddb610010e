use actix_web::{http::header, web, FromRequest};
use futures::future::{ready, LocalBoxFuture};
use thiserror::Error as ThisError;

use crate::{schema::User, App};

use super::{Error, Jwt};

/// The acting identity behind a request. Resolved from the bearer
/// token on every call; carries the user's current record so
/// handlers never trust stale claims.
#[derive(Debug)]
pub enum Actor {
    Anonymous,
    User(User),
}

impl Actor {
    pub fn get_user(self) -> Result<User, Error> {
        match self {
            Self::User(n) => Ok(n),
            Self::Anonymous => Err(Error::unauthorized()),
        }
    }
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if let Some(token) = token {
            let Some(app) = req.app_data::<web::Data<App>>() else {
                #[derive(Debug, ThisError)]
                #[error("The web app has no available configuration")]
                struct NoConfig;
                return Box::pin(ready(Err(Error::internal(NoConfig))));
            };

            let app = app.clone();
            let jwt = match Jwt::decode(token, app.config.auth.jwt_secret.as_str()) {
                Ok(jwt) => jwt,
                Err(e) => return Box::pin(ready(Err(e))),
            };

            Box::pin(async move {
                let mut conn = app.db_read_prefer_primary().await?;
                if let Some(user) = User::by_id(&mut conn, jwt.user_id).await? {
                    Ok(Actor::User(user))
                } else {
                    // Token signed for a user that no longer exists.
                    Err(Error::unauthorized())
                }
            })
        } else {
            Box::pin(ready(Ok(Actor::Anonymous)))
        }
    }
}
