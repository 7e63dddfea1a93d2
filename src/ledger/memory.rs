use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::record::sort_newest_first;
use super::{InsertTicket, LedgerError, LedgerStore, MessageRecord};

/// In-memory ledger backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<String, MessageRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn insert(&self, record: MessageRecord, ticket: InsertTicket) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.hash) {
            return Err(LedgerError::DuplicateHash(record.hash));
        }
        if !ticket.begin() {
            return Err(LedgerError::Abandoned);
        }
        records.insert(record.hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<MessageRecord>, LedgerError> {
        Ok(self.records.read().await.get(hash).cloned())
    }

    async fn list(&self) -> Result<Vec<MessageRecord>, LedgerError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, timestamp: &str) -> MessageRecord {
        MessageRecord {
            device_id: "deviceA".into(),
            recipient: "deviceB".into(),
            hash: hash.into(),
            timestamp: timestamp.into(),
        }
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let ledger = MemoryLedger::new();
        ledger.insert(record("abc", "2024-01-01T00:00:00.000000Z"), InsertTicket::new()).await.unwrap();

        let found = ledger.find_by_hash("abc").await.unwrap().unwrap();
        assert_eq!(found.recipient, "deviceB");
        assert!(ledger.find_by_hash("abd").await.unwrap().is_none());
        assert_eq!(ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_hash_is_rejected() {
        let ledger = MemoryLedger::new();
        ledger.insert(record("abc", "2024-01-01T00:00:00.000000Z"), InsertTicket::new()).await.unwrap();
        let err = ledger
            .insert(record("abc", "2024-02-01T00:00:00.000000Z"), InsertTicket::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateHash(h) if h == "abc"));
        assert_eq!(ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_ledger_lists_nothing() {
        assert!(MemoryLedger::new().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let ledger = MemoryLedger::new();
        ledger.insert(record("t1", "2024-01-01T00:00:00.000000Z"), InsertTicket::new()).await.unwrap();
        ledger.insert(record("t3", "2024-01-03T00:00:00.000000Z"), InsertTicket::new()).await.unwrap();
        ledger.insert(record("t2", "2024-01-02T00:00:00.000000Z"), InsertTicket::new()).await.unwrap();

        let hashes: Vec<_> = ledger
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.hash)
            .collect();
        assert_eq!(hashes, ["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn abandoned_insert_writes_nothing() {
        let ledger = MemoryLedger::new();
        let ticket = InsertTicket::new();
        assert!(ticket.abandon());

        let err = ledger
            .insert(record("late", "2024-01-01T00:00:00.000000Z"), ticket)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Abandoned));
        assert_eq!(ledger.len().await.unwrap(), 0);
    }
}
