use serde::{Deserialize, Serialize};

/// One issued message as kept in the ledger.
///
/// The secret is never part of a record; only routing metadata and the
/// integrity hash that identifies the embedded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub device_id: String,
    pub recipient: String,
    pub hash: String,
    pub timestamp: String,
}

/// Sort records newest first. Timestamps are fixed-width ISO-8601 strings, so
/// string order is chronological; ties fall back to the hash.
pub fn sort_newest_first(records: &mut [MessageRecord]) {
    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.hash.cmp(&b.hash))
    });
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

    #[test]
    fn newest_first_with_stable_ties() {
        let mut records = vec![
            record("b", "2024-01-01T00:00:00.000000Z"),
            record("c", "2024-03-01T00:00:00.000000Z"),
            record("a", "2024-01-01T00:00:00.000000Z"),
        ];
        sort_newest_first(&mut records);
        let hashes: Vec<_> = records.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, ["c", "a", "b"]);
    }

    #[test]
    fn record_json_has_no_secret() {
        let json = serde_json::to_value(record("h", "t")).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(json["recipient"], "deviceB");
    }
}
