//! # Payload-Integrity and Authorization Protocol
//!
//! The trust protocol layered on top of the bit-embedding primitive:
//!
//! - [`payload`]: canonical payload, integrity hash, parsing
//! - [`issuance`]: embed a hashed payload and record it in the ledger
//! - [`verification`]: recipient-only decoding with tamper detection
//! - [`listing`]: read-only view of the ledger
//!
//! Every operation takes a [`ProtocolContext`] and returns a [`ProtocolError`] on failure.

pub mod context;
pub mod error;
pub mod issuance;
pub mod listing;
pub mod payload;
pub mod verification;

pub use context::ProtocolContext;
pub use error::ProtocolError;
pub use issuance::{issue, issue_at, IssuedMessage};
pub use listing::list_records;
pub use payload::{build_payload, compute_hash, parse_payload, EmbeddedPayload, MessageFields};
pub use verification::decode;
