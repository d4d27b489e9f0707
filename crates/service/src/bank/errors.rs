use serde::Serialize;
use thiserror::Error;

use crate::errors::{StorageError, UniqueField};

/// Stable machine-readable category carried next to the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    BadRequest,
    MethodNotAllowed,
    Unroutable,
    Backend,
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Invalid admin credentials")]
    InvalidAdminCredentials,
    #[error("{0} required")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Storage(StorageError),
}

impl BankError {
    pub fn user_not_found() -> Self {
        Self::NotFound("User")
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::NotFound(_) => ErrorKind::NotFound,
            BankError::UsernameTaken | BankError::EmailTaken => ErrorKind::Conflict,
            BankError::InvalidCredentials | BankError::InvalidAdminCredentials => ErrorKind::Unauthorized,
            BankError::MissingParameter(_) => ErrorKind::BadRequest,
            BankError::Storage(_) => ErrorKind::Backend,
        }
    }

    /// Text safe to hand to a client; backend detail stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            BankError::Storage(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StorageError> for BankError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict(UniqueField::Username) => BankError::UsernameTaken,
            StorageError::Conflict(UniqueField::Email) => BankError::EmailTaken,
            other => BankError::Storage(other),
        }
    }
}

impl From<models::errors::ModelError> for BankError {
    fn from(e: models::errors::ModelError) -> Self {
        BankError::Storage(StorageError::Model(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_business_messages() {
        let e: BankError = StorageError::Conflict(UniqueField::Email).into();
        assert_eq!(e.to_string(), "Email already exists");
        assert_eq!(e.kind(), ErrorKind::Conflict);
        assert_eq!(BankError::user_not_found().to_string(), "User not found");
        assert_eq!(BankError::MissingParameter("Username").to_string(), "Username required");
    }

    #[test]
    fn backend_detail_is_not_exposed() {
        let e: BankError = StorageError::Db("connection refused at 10.0.0.3".into()).into();
        assert_eq!(e.kind(), ErrorKind::Backend);
        assert_eq!(e.client_message(), "Internal server error");
        assert_eq!(serde_json::to_value(e.kind()).unwrap(), "backend");
    }
}
