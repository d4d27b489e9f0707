//! Service layer: storage adapters for the bank collections and the business operations
//! behind each endpoint.
//! - `storage` hides which backend is in use behind one trait.
//! - `bank` holds the per-endpoint rules and error taxonomy.

pub mod bank;
pub mod errors;
pub mod runtime;
pub mod storage;
