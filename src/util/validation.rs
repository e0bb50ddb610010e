use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .expect("compile email regex")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("compile phone regex"));

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email) && email.len() <= 254
}

pub fn is_valid_password(pass: &str) -> bool {
    let len = pass.len();
    (PASSWORD_MIN..=PASSWORD_MAX).contains(&len)
}

/// Phone numbers are plain 10 digit strings, no separators.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}
