//! Domain records for the bank API and their relational mapping.

pub mod errors;
pub mod db;
pub mod lenient;
pub mod user;
pub mod ledger;
pub mod entities;

pub use ledger::{CheckDeposit, LedgerEntry, MoneyFlow};
pub use user::{Transaction, User};
