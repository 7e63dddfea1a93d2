//! # Authorization & Verification Protocol
//!
//! Decides whether a requesting device may read the secret hidden in an image.
//!
//! ```text
//! extract → parse → hash present? → ledger lookup → recipient check → hash recheck → secret
//! ```
//!
//! The ledger record, not anything inside the image, decides who the recipient is.
//! The recipient check runs before the integrity check so that an unauthorized
//! device learns nothing about whether the image is internally consistent.

use log::{info, warn};

use super::context::ProtocolContext;
use super::payload::{compute_hash, parse_payload};
use super::ProtocolError;

/// Decode the secret in `image` on behalf of `requesting_device_id`.
///
/// # Errors
/// In check order: `MissingInput`, `InvalidImage`, `NoHiddenData`,
/// `MalformedPayload`, `MissingHash`, `UnknownHash`, `NotAuthorized`,
/// `TamperedMessage`; plus `LedgerReadFailure`/`Timeout` for store faults.
pub async fn decode(
    ctx: &ProtocolContext,
    image: Vec<u8>,
    requesting_device_id: &str,
) -> Result<String, ProtocolError> {
    if image.is_empty() || requesting_device_id.is_empty() {
        return Err(ProtocolError::MissingInput("image or device ID"));
    }

    let hidden = ctx
        .run_embedder("extraction", move |embedder| embedder.extract(&image))
        .await?
        .ok_or(ProtocolError::NoHiddenData)?;

    let payload = parse_payload(&hidden)?;

    let record = ctx
        .run_ledger("ledger lookup", ctx.ledger().find_by_hash(&payload.hash))
        .await?
        .map_err(ProtocolError::LedgerReadFailure)?
        .ok_or_else(|| {
            warn!("⚠️ Decode attempt with unknown hash {}", payload.hash);
            ProtocolError::UnknownHash
        })?;

    if record.recipient != requesting_device_id {
        warn!(
            "🚫 Device '{}' is not the recipient of {}",
            requesting_device_id, record.hash
        );
        return Err(ProtocolError::NotAuthorized);
    }

    // Recompute from what the image carries, not from the ledger.
    let calculated = compute_hash(&payload.fields)?;
    if calculated != payload.hash {
        warn!("⚠️ Message {} has been altered since issuance", payload.hash);
        return Err(ProtocolError::TamperedMessage);
    }

    info!(
        "🔓 Message {} decoded by recipient '{}'",
        record.hash, requesting_device_id
    );

    Ok(payload.fields.secret)
}
