//! Endpoint business logic over any [`crate::storage::Storage`].

pub mod errors;
pub mod service;

pub use errors::{BankError, ErrorKind};
pub use service::{BankService, Body};
