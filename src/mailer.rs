use error_stack::{Result, ResultExt};
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
#[error("Failed to set up SMTP mailer")]
pub struct MailerError;

#[derive(Debug, Error)]
#[error("Failed to send mail")]
pub struct SendMailError;

/// Outbound mail. Only password reset messages go through here.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer").field("from", &self.from).finish()
    }
}

impl Mailer {
    pub fn new(cfg: &config::Smtp) -> Result<Self, MailerError> {
        let credentials = Credentials::new(
            cfg.username.as_str().to_string(),
            cfg.password.as_str().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .change_context(MailerError)?
            .port(cfg.port)
            .credentials(credentials)
            .build();

        let from = cfg
            .from
            .parse::<Mailbox>()
            .change_context(MailerError)
            .attach_printable("smtp.from is not a valid mailbox")?;

        Ok(Self { transport, from })
    }

    #[tracing::instrument(skip_all)]
    pub async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), SendMailError> {
        let body = format!(
            "You are receiving this because you (or someone else) have requested \
             the reset of the password for your account.\n\n\
             Please click on the following link, or paste this into your browser \
             to complete the process:\n\n\
             {reset_url}\n\n\
             If you did not request this, please ignore this email and your \
             password will remain unchanged.\n"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>().change_context(SendMailError)?)
            .subject("Password Reset")
            .body(body)
            .change_context(SendMailError)?;

        self.transport
            .send(message)
            .await
            .change_context(SendMailError)?;

        Ok(())
    }
}
