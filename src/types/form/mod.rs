use validator::ValidationError;

pub mod comments;
pub mod posts;
pub mod users;

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}
