use std::time::Duration;

use thiserror::Error;

use super::payload::PayloadError;
use crate::ledger::LedgerError;
use crate::processing::EmbedError;

/// Every way an issuance, decode or listing can fail.
///
/// The `Display` text of each variant is what callers see, so it stays short and
/// never mentions anything the requester is not entitled to know.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Missing {0}")]
    MissingInput(&'static str),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid hidden data format")]
    MalformedPayload(String),

    #[error("No hidden data found in the image")]
    NoHiddenData,

    #[error("No hash found in the hidden message")]
    MissingHash,

    #[error("Hash not found in database. Message may be invalid.")]
    UnknownHash,

    #[error("This device is not authorized to decode this message")]
    NotAuthorized,

    #[error("Message has been altered")]
    TamperedMessage,

    #[error("Image too small for this message: need {required_bits} bits but only {available_bits} available")]
    EmbeddingCapacityExceeded {
        required_bits: usize,
        available_bits: usize,
    },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Ledger write failed: {0}")]
    LedgerWriteFailure(#[source] LedgerError),

    #[error("Ledger read failed: {0}")]
    LedgerReadFailure(#[source] LedgerError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Failures caused by what the caller sent, as opposed to server-side faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::InvalidImage(_)
                | Self::MalformedPayload(_)
                | Self::NoHiddenData
                | Self::MissingHash
                | Self::UnknownHash
                | Self::NotAuthorized
                | Self::TamperedMessage
        )
    }

    /// Whether the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<EmbedError> for ProtocolError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::CapacityExceeded {
                required_bits,
                available_bits,
            } => Self::EmbeddingCapacityExceeded {
                required_bits,
                available_bits,
            },
            EmbedError::Decode(reason) => Self::InvalidImage(reason),
            EmbedError::Encode(reason) => Self::Embedding(reason),
        }
    }
}

impl From<PayloadError> for ProtocolError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Malformed(reason) => Self::MalformedPayload(reason),
            PayloadError::MissingHash => Self::MissingHash,
            PayloadError::Serialization(e) => Self::Internal(e.to_string()),
        }
    }
}
