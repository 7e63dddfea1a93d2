use super::context::ProtocolContext;
use super::ProtocolError;
use crate::ledger::MessageRecord;

/// All issued records, newest first. Records never carry the secret.
pub async fn list_records(ctx: &ProtocolContext) -> Result<Vec<MessageRecord>, ProtocolError> {
    ctx.run_ledger("ledger listing", ctx.ledger().list())
        .await?
        .map_err(ProtocolError::LedgerReadFailure)
}
