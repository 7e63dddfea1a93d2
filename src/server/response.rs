//! JSON bodies returned by the HTTP API and the mapping from protocol errors to
//! status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::ledger::MessageRecord;
use crate::protocol::ProtocolError;

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub success: bool,
    pub image_base64: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub success: bool,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub success: bool,
    pub blocks: Vec<MessageRecord>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// An error on its way out as `{success: false, message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// HTTP status for each protocol failure.
pub fn status_for(err: &ProtocolError) -> StatusCode {
    match err {
        ProtocolError::NotAuthorized => StatusCode::FORBIDDEN,
        ProtocolError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use std::time::Duration;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&ProtocolError::NotAuthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&ProtocolError::TamperedMessage), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&ProtocolError::UnknownHash), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ProtocolError::MissingInput("image")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ProtocolError::EmbeddingCapacityExceeded {
                required_bits: 10,
                available_bits: 1
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ProtocolError::LedgerWriteFailure(LedgerError::DuplicateHash(
                "h".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ProtocolError::Timeout {
                operation: "ledger insert",
                after: Duration::from_secs(5)
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
