use serde::Deserialize;

use crate::util::Sensitive;

/// Outbound SMTP transport used for password reset mail.
///
/// **Environment variables**:
/// - `INKPOST_SMTP_HOST`
/// - `INKPOST_SMTP_PORT`
/// - `INKPOST_SMTP_USERNAME`
/// - `INKPOST_SMTP_PASSWORD`
/// - `INKPOST_SMTP_FROM`
#[derive(Debug, Deserialize)]
pub struct Smtp {
    pub host: String,
    #[serde(default = "Smtp::default_port")]
    pub port: u16,
    pub username: Sensitive<String>,
    pub password: Sensitive<String>,
    /// Mailbox shown as the sender, e.g. `Inkpost <no-reply@example.com>`.
    pub from: String,
}

impl Smtp {
    const fn default_port() -> u16 {
        587
    }
}
