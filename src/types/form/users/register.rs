use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    types::form::field_error,
    util::{validation, Sensitive},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub first_name: String,
    pub last_name: String,
    pub email: Sensitive<String>,
    pub password: Sensitive<String>,
}

impl Validate for Request {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.first_name.trim().is_empty() {
            errors.add("firstName", field_error("required", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            errors.add("lastName", field_error("required", "Last name is required"));
        }
        if !validation::is_valid_email(self.email.as_str()) {
            errors.add("email", field_error("email", "Please enter a valid email address"));
        }
        if !validation::is_valid_password(self.password.as_str()) {
            errors.add(
                "password",
                field_error("length", "Password must be between 8 and 128 characters"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub token: Sensitive<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first: &str, last: &str, email: &str, password: &str) -> Request {
        Request {
            first_name: first.into(),
            last_name: last.into(),
            email: email.to_string().into(),
            password: password.to_string().into(),
        }
    }

    #[test]
    fn rejects_missing_required_fields() {
        assert!(request("", "Park", "alice@example.com", "longenough").validate().is_err());
        assert!(request("Alice", "  ", "alice@example.com", "longenough").validate().is_err());
        assert!(request("Alice", "Park", "not-an-email", "longenough").validate().is_err());
        assert!(request("Alice", "Park", "alice@example.com", "short").validate().is_err());
    }

    #[test]
    fn accepts_complete_signup() {
        assert!(request("Alice", "Park", "alice@example.com", "longenough")
            .validate()
            .is_ok());
    }
}
