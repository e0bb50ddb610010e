pub mod actor;
pub mod controllers;
pub mod error;
pub mod jwt;
pub mod uploads;

pub use actor::Actor;
pub use error::Error;
pub use jwt::Jwt;
