use chrono::Utc;
use error_stack::Report;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{
    types::id::{marker::UserMarker, Id},
    types::Error as ErrorType,
};

use super::Error;

/// Session tokens are valid for one hour.
pub const TOKEN_TTL_SECS: i64 = 3600;

const ISSUER: &str = "inkpost";

/// Claims carried by a signed bearer token.
#[derive(Debug, Deserialize, Serialize)]
pub struct Jwt {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub user_id: Id<UserMarker>,
}

impl Jwt {
    /// Tokens signed by anyone else, expired, or issued under a
    /// foreign `iss` are all rejected as unauthorized.
    #[tracing::instrument(skip_all)]
    pub fn decode(token: &str, secret: &str) -> Result<Self, Error> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[ISSUER]);

        jsonwebtoken::decode::<Self>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::from_report(ErrorType::Unauthorized, Report::new(e)))
    }

    #[tracing::instrument(skip_all)]
    pub async fn encode(user_id: Id<UserMarker>, secret: &str) -> Result<String, Error> {
        #[derive(Debug, ThisError)]
        #[error("Failed to sign session token")]
        struct SignError;

        let secret = secret.to_string();
        let result = tokio::task::spawn_blocking(move || {
            let header = Header {
                alg: Algorithm::HS512,
                ..Default::default()
            };
            let now = Utc::now().timestamp();
            let claims = Self {
                iss: ISSUER.into(),
                iat: now,
                exp: now + TOKEN_TTL_SECS,
                user_id,
            };
            let key = EncodingKey::from_secret(secret.as_bytes());
            jsonwebtoken::encode(&header, &claims, &key)
        })
        .await;

        match result {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(e)) => Err(Error::from_report(
                ErrorType::Internal,
                Report::new(e).change_context(SignError),
            )),
            Err(e) => Err(Error::from_report(
                ErrorType::Internal,
                Report::new(e).change_context(SignError),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-signing-key";

    fn sign(claims: &Jwt, secret: &str) -> String {
        let header = Header {
            alg: Algorithm::HS512,
            ..Default::default()
        };
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
            .unwrap()
    }

    #[tokio::test]
    async fn encode_then_decode_roundtrip() {
        let token = Jwt::encode(Id::new(42), SECRET).await.unwrap();
        let claims = Jwt::decode(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, Id::new(42));
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[tokio::test]
    async fn rejects_token_signed_with_another_secret() {
        let token = Jwt::encode(Id::new(42), "some-other-secret").await.unwrap();
        let error = Jwt::decode(&token, SECRET).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::Unauthorized));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let now = Utc::now().timestamp();
        let token = sign(
            &Jwt {
                iss: "someone-else".into(),
                iat: now,
                exp: now + 600,
                user_id: Id::new(1),
            },
            SECRET,
        );

        let error = Jwt::decode(&token, SECRET).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::Unauthorized));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now().timestamp();
        let token = sign(
            &Jwt {
                iss: ISSUER.into(),
                iat: now - 7200,
                // past the decoder's default leeway
                exp: now - 3600,
                user_id: Id::new(1),
            },
            SECRET,
        );

        let error = Jwt::decode(&token, SECRET).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::Unauthorized));
    }
}
