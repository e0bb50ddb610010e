use error_stack::{Report, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use url::Url;

use super::ParseError;
use crate::util::{figment::FigmentErrorAttachable, Sensitive};

#[derive(Debug, Deserialize)]
pub struct Server {
    pub db: super::Database,
    pub auth: Auth,
    pub smtp: Option<super::Smtp>,
    /// Address the HTTP server binds to.
    #[serde(default = "Server::default_ip")]
    pub ip: IpAddr,
    #[serde(default = "Server::default_port")]
    pub port: u16,
    /// Base URL the server is reachable at from the outside. Password
    /// reset links are built against it.
    #[serde(default = "Server::default_public_url")]
    pub public_url: Url,
    /// Directory where uploaded profile photos are stored. Served
    /// back under `/api/uploads`.
    #[serde(default = "Server::default_uploads_dir")]
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Secret key used to sign session tokens.
    ///
    /// **Environment variables**:
    /// - `INKPOST_AUTH_JWT_SECRET`
    pub jwt_secret: Sensitive<String>,
}

impl Server {
    const MIN_JWT_SECRET_LEN: usize = 12;

    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();

        let config = Self::figment()
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

        if config.auth.jwt_secret.as_str().len() < Self::MIN_JWT_SECRET_LEN {
            return Err(Report::new(ParseError).attach_printable(format!(
                "auth.jwt_secret must be at least {} characters long",
                Self::MIN_JWT_SECRET_LEN
            )));
        }

        Ok(config)
    }

    const fn default_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    const fn default_port() -> u16 {
        8080
    }

    fn default_public_url() -> Url {
        Url::parse("http://localhost:8080").expect("default public_url must parse")
    }

    fn default_uploads_dir() -> PathBuf {
        PathBuf::from("uploads")
    }
}

impl Server {
    const DEFAULT_CONFIG_FILE: &'static str = "inkpost.toml";

    /// Creates a default [`figment::Figment`] object to load server
    /// configuration. This function is there for [`Server::load`]
    /// and testing.
    pub(crate) fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Toml},
            Figment,
        };

        Figment::new()
            .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
            // One big con about figment (env provider to be specific) especially
            // these fields with underscore in it.
            .merge(Env::prefixed("INKPOST_").map(|v| match v.as_str() {
                "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
                "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

                "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
                "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

                "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
                "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

                "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),

                "SMTP_HOST" => "smtp.host".into(),
                "SMTP_PORT" => "smtp.port".into(),
                "SMTP_USERNAME" => "smtp.username".into(),
                "SMTP_PASSWORD" => "smtp.password".into(),
                "SMTP_FROM" => "smtp.from".into(),

                "PUBLIC_URL" => "public_url".into(),
                "UPLOADS_DIR" => "uploads_dir".into(),

                _ => v.as_str().replace('_', ".").into(),
            }))
            // Environment variable aliases
            .merge(Env::raw().map(|v| match v.as_str() {
                "DATABASE_URL" => "db.primary.url".into(),
                _ => v.into(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::num::{NonZeroU32, NonZeroU64};

    #[test]
    fn env_aliases() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "hello world!");

            jail.set_env("INKPOST_DB_PRIMARY_MIN_IDLE", "100");
            jail.set_env("INKPOST_DB_PRIMARY_POOL_SIZE", "100");

            jail.set_env("INKPOST_DB_REPLICA_URL", "required");
            jail.set_env("INKPOST_DB_REPLICA_MIN_IDLE", "589");
            jail.set_env("INKPOST_DB_REPLICA_POOL_SIZE", "589");

            jail.set_env("INKPOST_DB_ENFORCE_TLS", "false");
            jail.set_env("INKPOST_DB_TIMEOUT_SECS", "3030");

            jail.set_env("INKPOST_AUTH_JWT_SECRET", "super-secret-signing-key");

            let config: Server = Server::figment().extract()?;
            assert_eq!(config.db.primary.url.as_str(), "hello world!");
            assert_eq!(
                config.db.primary.min_idle.unwrap(),
                NonZeroU32::new(100).unwrap()
            );
            assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());
            assert_eq!(
                config.db.replica.as_ref().unwrap().min_idle.unwrap(),
                NonZeroU32::new(589).unwrap()
            );
            assert_eq!(
                config.db.replica.as_ref().unwrap().pool_size,
                NonZeroU32::new(589).unwrap()
            );

            assert_eq!(config.db.enforce_tls, false);
            assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());

            assert_eq!(config.auth.jwt_secret.as_str(), "super-secret-signing-key");
            Ok(())
        });
    }

    #[test]
    fn defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/inkpost");
            jail.set_env("INKPOST_AUTH_JWT_SECRET", "super-secret-signing-key");

            let config: Server = Server::figment().extract()?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.public_url.as_str(), "http://localhost:8080/");
            assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
            assert!(config.smtp.is_none());
            assert!(config.db.replica.is_none());
            Ok(())
        });
    }

    #[test]
    fn smtp_section() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/inkpost");
            jail.set_env("INKPOST_AUTH_JWT_SECRET", "super-secret-signing-key");
            jail.set_env("INKPOST_SMTP_HOST", "smtp.example.com");
            jail.set_env("INKPOST_SMTP_USERNAME", "mailer");
            jail.set_env("INKPOST_SMTP_PASSWORD", "hunter2hunter2");
            jail.set_env("INKPOST_SMTP_FROM", "no-reply@example.com");

            let config: Server = Server::figment().extract()?;
            let smtp = config.smtp.expect("smtp section should be present");
            assert_eq!(smtp.host, "smtp.example.com");
            assert_eq!(smtp.port, 587);
            assert_eq!(smtp.from, "no-reply@example.com");
            Ok(())
        });
    }
}
