use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::{
    types::form::field_error,
    util::{validation, Sensitive},
};

#[derive(Debug, Deserialize)]
pub struct ForgotRequest {
    pub email: Sensitive<String>,
}

impl Validate for ForgotRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.as_str().is_empty() {
            errors.add("email", field_error("required", "Email is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub password: Sensitive<String>,
}

impl Validate for ResetRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
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
