//! Hosted backend access.

pub mod error;
pub mod rest;

pub use error::BackendError;
pub use rest::RestBackend;
