//! # Protocol Context
//!
//! Everything a protocol operation needs, built once at startup and handed to each
//! call. There is no ambient global state: the server keeps one context in its
//! axum state, the CLI builds one per invocation, tests build as many as they like.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use super::ProtocolError;
use crate::ledger::{InsertTicket, LedgerError, LedgerStore, MessageRecord};
use crate::processing::{EmbedError, Embedder};

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ProtocolContext {
    embedder: Arc<dyn Embedder>,
    ledger: Arc<dyn LedgerStore>,
    embed_timeout: Duration,
    ledger_timeout: Duration,
}

impl ProtocolContext {
    pub fn new(embedder: Arc<dyn Embedder>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            embedder,
            ledger,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, embed_timeout: Duration, ledger_timeout: Duration) -> Self {
        self.embed_timeout = embed_timeout;
        self.ledger_timeout = ledger_timeout;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerStore> {
        &self.ledger
    }

    pub fn embed_timeout(&self) -> Duration {
        self.embed_timeout
    }

    pub fn ledger_timeout(&self) -> Duration {
        self.ledger_timeout
    }

    /// Run a CPU-bound embedder call on the blocking pool, bounded by the embed timeout.
    pub(crate) async fn run_embedder<T, F>(
        &self,
        operation: &'static str,
        f: F,
    ) -> Result<T, ProtocolError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Embedder) -> Result<T, EmbedError> + Send + 'static,
    {
        let embedder = Arc::clone(&self.embedder);
        let task = tokio::task::spawn_blocking(move || f(embedder.as_ref()));

        match tokio::time::timeout(self.embed_timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_err)) => Err(ProtocolError::Internal(format!(
                "{operation} task panicked: {join_err}"
            ))),
            Err(_) => Err(ProtocolError::Timeout {
                operation,
                after: self.embed_timeout,
            }),
        }
    }

    /// Await a read-only ledger call, bounded by the ledger timeout. Dropping a
    /// read on timeout leaves nothing behind.
    ///
    /// The inner `Result` is left to the caller, which decides whether a store
    /// failure is a read or a write failure.
    pub(crate) async fn run_ledger<T, Fut>(
        &self,
        operation: &'static str,
        fut: Fut,
    ) -> Result<Result<T, LedgerError>, ProtocolError>
    where
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        tokio::time::timeout(self.ledger_timeout, fut)
            .await
            .map_err(|_| ProtocolError::Timeout {
                operation,
                after: self.ledger_timeout,
            })
    }

    /// Insert `record`, giving up after the ledger timeout only if the write
    /// has not started yet.
    ///
    /// A write the store has already begun is awaited to its end, so a
    /// `Timeout` always means nothing was recorded.
    pub(crate) async fn insert_record(
        &self,
        record: MessageRecord,
    ) -> Result<Result<(), LedgerError>, ProtocolError> {
        let ticket = InsertTicket::new();
        let insert = self.ledger.insert(record, ticket.clone());
        tokio::pin!(insert);

        match tokio::time::timeout(self.ledger_timeout, &mut insert).await {
            Ok(result) => Ok(result),
            Err(_) if ticket.abandon() => Err(ProtocolError::Timeout {
                operation: "ledger insert",
                after: self.ledger_timeout,
            }),
            Err(_) => {
                warn!(
                    "⏳ Ledger insert still running after {:?}, waiting for it to finish",
                    self.ledger_timeout
                );
                Ok(insert.await)
            }
        }
    }
}
