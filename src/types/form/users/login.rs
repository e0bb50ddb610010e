use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{types::form::field_error, util::Sensitive};

#[derive(Debug, Deserialize)]
pub struct Request {
    pub email: Sensitive<String>,
    pub password: Sensitive<String>,
}

impl Validate for Request {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.email.as_str().is_empty() {
            errors.add("email", field_error("required", "Please provide both email and password"));
        }
        if self.password.as_str().is_empty() {
            errors.add(
                "password",
                field_error("required", "Please provide both email and password"),
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
