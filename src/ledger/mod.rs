//! # Ledger Store
//!
//! Append-only record store keyed by integrity hash. The protocol only talks to
//! the [`LedgerStore`] trait; two stores ship with the crate:
//!
//! - [`MemoryLedger`]: process-local, lost on restart (tests, demos)
//! - [`FileLedger`]: one JSON record per line, replayed into memory on open

pub mod error;
pub mod file;
pub mod memory;
pub mod record;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

pub use error::LedgerError;
pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use record::MessageRecord;

const PENDING: u8 = 0;
const STARTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, exactly once, whether an insert gets written or abandoned.
///
/// The store calls [`InsertTicket::begin`] right before its first durable side
/// effect; a caller that gives up waiting calls [`InsertTicket::abandon`].
/// Only one of the two can succeed.
#[derive(Debug, Clone)]
pub struct InsertTicket {
    state: Arc<AtomicU8>,
}

impl InsertTicket {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    /// Claim the ticket for writing. `false` means the caller already gave up.
    pub fn begin(&self) -> bool {
        self.state
            .compare_exchange(PENDING, STARTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Give up on the insert. `false` means the write has already started and
    /// its outcome must be awaited.
    pub fn abandon(&self) -> bool {
        self.state
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for InsertTicket {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage boundary for issued message records.
///
/// Records are never updated or deleted. `insert` must reject a hash that is
/// already present.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append `record`.
    ///
    /// Implementations call `ticket.begin()` before writing anything and
    /// return [`LedgerError::Abandoned`] when it is refused. Once begun, the
    /// write must complete (or fail) as a whole even if the returned future is
    /// dropped.
    async fn insert(&self, record: MessageRecord, ticket: InsertTicket) -> Result<(), LedgerError>;

    /// Exact-match lookup by hash.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<MessageRecord>, LedgerError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<MessageRecord>, LedgerError>;

    async fn len(&self) -> Result<usize, LedgerError>;
}
