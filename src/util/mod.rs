pub mod figment;
pub mod validation;

mod sensitive;
pub use sensitive::Sensitive;
