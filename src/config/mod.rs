use thiserror::Error;

mod database;
mod server;
mod smtp;

pub use database::{Database, DbPoolConfig};
pub use server::{Auth, Server};
pub use smtp::Smtp;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
