use chrono::NaiveDate;
use validator::{Validate, ValidationErrors};

use crate::types::form::field_error;
use crate::util::validation;

/// Profile fields assembled from the multipart `PUT /api/users/profile`
/// body. Every field is optional; absent fields keep their stored
/// value. The photo itself is handled separately by the controller.
#[derive(Debug, Default)]
pub struct Fields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
}

impl Validate for Fields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.first_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.add("firstName", field_error("required", "First name is required"));
        }
        if self.last_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.add("lastName", field_error("required", "Last name is required"));
        }
        if self
            .email
            .as_deref()
            .is_some_and(|v| !validation::is_valid_email(v))
        {
            errors.add("email", field_error("email", "Please enter a valid email address"));
        }
        if self
            .phone
            .as_deref()
            .is_some_and(|v| !validation::is_valid_phone(v))
        {
            errors.add(
                "phone",
                field_error("phone", "Please enter a valid 10-digit phone number"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
