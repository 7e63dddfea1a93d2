use thiserror::Error;

/// Errors produced by ledger stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("a record with hash {0} already exists")]
    DuplicateHash(String),

    #[error("insert abandoned before it was written")]
    Abandoned,

    #[error("corrupt ledger entry at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}
