use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use service::bank::{BankError, ErrorKind};
use thiserror::Error;
use tracing::{error, warn};

/// Uniform `{success, data, error}` body; `kind` is only present on failures.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None, kind: None }
    }

    pub fn fail(message: String, kind: ErrorKind) -> Self {
        Self { success: false, data: None, error: Some(message), kind: Some(kind) }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Endpoint not found")]
    Unroutable,
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// The body could not be buffered, usually because it exceeds the configured limit.
    #[error("{0}")]
    UnreadableBody(String),
    #[error(transparent)]
    Bank(#[from] BankError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unroutable => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnreadableBody(_) => StatusCode::OK,
            ApiError::Bank(e) if e.kind() == ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Bank(_) => StatusCode::OK,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unroutable => ErrorKind::Unroutable,
            ApiError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            ApiError::UnreadableBody(_) => ErrorKind::BadRequest,
            ApiError::Bank(e) => e.kind(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Bank(e) => e.client_message(),
            other => other.to_string(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        warn!(%rejection, "request body rejected");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::UnreadableBody("Request body too large".into())
        } else {
            ApiError::UnreadableBody("Request body could not be read".into())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "storage failure");
        } else if status != StatusCode::OK {
            warn!(status = status.as_u16(), error = %self, "request not routed");
        }
        let envelope = Envelope::fail(self.client_message(), self.kind());
        (status, Json(envelope)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::errors::StorageError;

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(ApiError::Unroutable.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::from(BankError::user_not_found()).status(), StatusCode::OK);
        let backend = ApiError::from(BankError::from(StorageError::Kv("down".into())));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend.client_message(), "Internal server error");

        let body = ApiError::UnreadableBody("Request body too large".into());
        assert_eq!(body.status(), StatusCode::OK);
        assert_eq!(body.kind(), ErrorKind::BadRequest);
        assert_eq!(body.client_message(), "Request body too large");
    }

    #[test]
    fn success_envelope_omits_kind() {
        let body = serde_json::to_value(Envelope::ok(serde_json::json!({"x": 1}))).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": {"x": 1}, "error": null}));
        let body = serde_json::to_value(Envelope::fail("User not found".into(), ErrorKind::NotFound)).unwrap();
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["data"], Value::Null);
    }
}
