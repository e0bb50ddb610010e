use serde::Serialize;
use std::fmt::Display;

/// Client-visible error taxonomy. Serialized as the response body
/// of every failing endpoint, tagged with a `type` field.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
    Internal,
    InvalidFormBody(validator::ValidationErrors),
    /// Login with an unknown e-mail or a wrong password.
    InvalidCredentials,
    /// Password reset attempted with an unknown, consumed or
    /// expired token.
    InvalidResetToken,
    /// Signing up (or changing the profile e-mail) with an e-mail
    /// address that is already registered.
    Conflict,
    Unauthorized,
    /// The acting user is not the author of the entity it tries
    /// to mutate.
    Forbidden,
    NotFound,
    /// An update carried an expected `version` that no longer
    /// matches the stored record.
    VersionConflict,
    ReadonlyMode,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal => f.write_str("Failed to perform request"),
            Error::InvalidFormBody(..) => f.write_str("User performed request with invalid body"),
            Error::InvalidCredentials => f.write_str("Invalid credentials"),
            Error::InvalidResetToken => f.write_str("Reset token is invalid or has expired"),
            Error::Conflict => f.write_str("User with this email already exists"),
            Error::Unauthorized => f.write_str("Authentication required"),
            Error::Forbidden => f.write_str("Not authorized"),
            Error::NotFound => f.write_str("Resource not found"),
            Error::VersionConflict => f.write_str("Record was modified by someone else"),
            Error::ReadonlyMode => f.write_str("Attempt to write read-only database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::Token;

    #[track_caller]
    fn assert_unit_variant(value: Error, variant: &'static str) {
        serde_test::assert_ser_tokens(
            &value,
            &[
                Token::Struct {
                    name: "Error",
                    len: 1,
                },
                Token::Str("type"),
                Token::Str(variant),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_serde_impl() {
        assert_unit_variant(Error::Internal, "internal");
        assert_unit_variant(Error::InvalidCredentials, "invalid_credentials");
        assert_unit_variant(Error::InvalidResetToken, "invalid_reset_token");
        assert_unit_variant(Error::Conflict, "conflict");
        assert_unit_variant(Error::Unauthorized, "unauthorized");
        assert_unit_variant(Error::Forbidden, "forbidden");
        assert_unit_variant(Error::NotFound, "not_found");
        assert_unit_variant(Error::VersionConflict, "version_conflict");
        assert_unit_variant(Error::ReadonlyMode, "readonly_mode");
    }
}
