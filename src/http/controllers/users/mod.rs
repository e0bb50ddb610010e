use error_stack::Report;
use thiserror::Error as ThisError;

use crate::{http::Error, types::Error as ErrorType};

pub mod login;
pub mod password;
pub mod profile;
pub mod register;

/// Adaptive cost factor for the credential hash.
const BCRYPT_COST: u32 = 12;

#[derive(Debug, ThisError)]
#[error("Failed to run bcrypt")]
struct BcryptError;

pub(super) async fn hash_password(password: String) -> Result<String, Error> {
    let result = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await;
    match result {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(e)) => Err(Error::from_report(
            ErrorType::Internal,
            Report::new(e).change_context(BcryptError),
        )),
        Err(e) => Err(Error::from_report(
            ErrorType::Internal,
            Report::new(e).change_context(BcryptError),
        )),
    }
}

pub(super) async fn verify_password(password: String, hash: String) -> Result<bool, Error> {
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await;
    match result {
        Ok(Ok(matched)) => Ok(matched),
        Ok(Err(e)) => Err(Error::from_report(
            ErrorType::Internal,
            Report::new(e).change_context(BcryptError),
        )),
        Err(e) => Err(Error::from_report(
            ErrorType::Internal,
            Report::new(e).change_context(BcryptError),
        )),
    }
}

pub(super) fn invalid_credentials() -> Error {
    #[derive(Debug, ThisError)]
    #[error("Unknown email or mismatched password")]
    struct InvalidCredentials;
    Error::from_context(ErrorType::InvalidCredentials, InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_roundtrip() {
        let hash = hash_password("correct horse battery".into()).await.unwrap();
        assert_ne!(hash, "correct horse battery");
        assert!(verify_password("correct horse battery".into(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong password".into(), hash).await.unwrap());
    }
}
