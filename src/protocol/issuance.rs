//! # Issuance Protocol
//!
//! Hash → payload → embed → ledger insert. The hash is computed once, up front,
//! and the very same string is both embedded and written to the ledger.
//!
//! Issuance commits only when both the embed and the ledger write succeed: a
//! failed embed never reaches the ledger, and a failed ledger write never
//! returns an image. A ledger `Timeout` is only reported for an insert that
//! never started, so a timed-out issuance has recorded nothing.

use chrono::{DateTime, Utc};
use log::{error, info};

use super::context::ProtocolContext;
use super::payload::{build_payload, compute_hash, format_timestamp, MessageFields};
use super::ProtocolError;
use crate::ledger::MessageRecord;

/// Result of a committed issuance.
#[derive(Debug, Clone)]
pub struct IssuedMessage {
    /// Encoded image (PNG).
    pub image: Vec<u8>,
    /// The record that was appended to the ledger.
    pub record: MessageRecord,
}

/// Issue a message stamped with the current time.
pub async fn issue(
    ctx: &ProtocolContext,
    cover_image: Vec<u8>,
    recipient: &str,
    device_id: &str,
    secret: &str,
) -> Result<IssuedMessage, ProtocolError> {
    issue_at(ctx, cover_image, recipient, device_id, secret, Utc::now()).await
}

/// Issue a message stamped with `issued_at`.
pub async fn issue_at(
    ctx: &ProtocolContext,
    cover_image: Vec<u8>,
    recipient: &str,
    device_id: &str,
    secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<IssuedMessage, ProtocolError> {
    let fields = MessageFields {
        recipient: recipient.to_owned(),
        device_id: device_id.to_owned(),
        secret: secret.to_owned(),
        timestamp: format_timestamp(issued_at),
    };

    let hash = compute_hash(&fields)?;
    let payload = build_payload(&fields, &hash)?;

    info!(
        "🔏 Issuing message {} from '{}' to '{}' ({} byte payload)",
        hash,
        fields.device_id,
        fields.recipient,
        payload.len()
    );

    let image = ctx
        .run_embedder("embedding", move |embedder| {
            embedder.embed(&cover_image, &payload)
        })
        .await
        .map_err(|e| {
            error!("❌ Embedding failed for {}: {}", hash, e);
            e
        })?;

    let record = MessageRecord {
        device_id: fields.device_id,
        recipient: fields.recipient,
        hash,
        timestamp: fields.timestamp,
    };

    ctx.insert_record(record.clone())
        .await?
        .map_err(|e| {
            error!("❌ Ledger write failed for {}: {}", record.hash, e);
            ProtocolError::LedgerWriteFailure(e)
        })?;

    info!("✅ Issued message {} at {}", record.hash, record.timestamp);

    Ok(IssuedMessage { image, record })
}
