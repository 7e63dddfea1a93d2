//! # File Ledger
//!
//! Persists records as JSON lines in an append-only file. On open the whole file
//! is replayed into an in-memory index; lookups and listings never touch disk.
//!
//! Appends are serialized through a mutex around the file handle and run in
//! their own task, so the file and the index are always updated together even
//! when the caller stops waiting. A partial trailing line left by a crash is
//! cut off on the next open.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use super::record::sort_newest_first;
use super::{InsertTicket, LedgerError, LedgerStore, MessageRecord};

pub struct FileLedger {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    file: Mutex<File>,
    index: RwLock<HashMap<String, MessageRecord>>,
}

/// What replaying the file found.
struct Replay {
    index: HashMap<String, MessageRecord>,
    /// Length of the prefix holding complete records.
    valid_len: usize,
    /// The last complete record is missing its newline.
    needs_newline: bool,
}

fn replay(content: &[u8]) -> Result<Replay, LedgerError> {
    let mut index = HashMap::new();
    let mut offset = 0;
    let mut valid_len = content.len();

    for (line_no, segment) in content.split_inclusive(|b| *b == b'\n').enumerate() {
        let start = offset;
        offset += segment.len();

        if segment.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<MessageRecord>(segment) {
            Ok(record) => {
                if index.contains_key(&record.hash) {
                    return Err(LedgerError::DuplicateHash(record.hash));
                }
                index.insert(record.hash.clone(), record);
            }
            // Only the final segment can lack its newline: an append cut short.
            Err(e) if !segment.ends_with(b"\n") => {
                warn!(
                    "⚠️ Dropping torn ledger entry at line {} ({} bytes): {}",
                    line_no + 1,
                    segment.len(),
                    e
                );
                valid_len = start;
            }
            Err(e) => {
                return Err(LedgerError::Corrupt {
                    line: line_no + 1,
                    reason: e.to_string(),
                })
            }
        }
    }

    let needs_newline = valid_len > 0 && !content[..valid_len].ends_with(b"\n");
    Ok(Replay {
        index,
        valid_len,
        needs_newline,
    })
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_data().await
}

impl FileLedger {
    /// Open (or create) the ledger file at `path`, replaying existing records.
    ///
    /// # Errors
    /// - `LedgerError::Io`: the file or its parent directory cannot be created or read
    /// - `LedgerError::Corrupt`: a complete line is not a valid record
    /// - `LedgerError::DuplicateHash`: the same hash appears on two lines
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let replay = replay(&content)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        if replay.valid_len < content.len() {
            file.set_len(replay.valid_len as u64).await?;
            file.sync_data().await?;
            warn!(
                "⚠️ Truncated {} from {} to {} bytes",
                path.display(),
                content.len(),
                replay.valid_len
            );
        }
        if replay.needs_newline {
            write_line(&mut file, b"\n").await?;
        }

        info!(
            "📒 Opened ledger {} ({} records)",
            path.display(),
            replay.index.len()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                file: Mutex::new(file),
                index: RwLock::new(replay.index),
            }),
        })
    }
}

impl Inner {
    async fn append(&self, record: MessageRecord, ticket: InsertTicket) -> Result<(), LedgerError> {
        let mut file = self.file.lock().await;

        if self.index.read().await.contains_key(&record.hash) {
            return Err(LedgerError::DuplicateHash(record.hash));
        }

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        let committed_len = file.metadata().await?.len();

        if !ticket.begin() {
            debug!("Insert of {} abandoned before writing", record.hash);
            return Err(LedgerError::Abandoned);
        }

        if let Err(e) = write_line(&mut file, &line).await {
            error!("❌ Append of {} to {} failed: {}", record.hash, self.path.display(), e);
            if let Err(undo) = file.set_len(committed_len).await {
                error!("❌ Could not roll back {}: {}", self.path.display(), undo);
            }
            return Err(e.into());
        }

        debug!("Appended record {} to {}", record.hash, self.path.display());
        self.index.write().await.insert(record.hash.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FileLedger {
    async fn insert(&self, record: MessageRecord, ticket: InsertTicket) -> Result<(), LedgerError> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.append(record, ticket).await })
            .await
            .map_err(|e| LedgerError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<MessageRecord>, LedgerError> {
        Ok(self.inner.index.read().await.get(hash).cloned())
    }

    async fn list(&self) -> Result<Vec<MessageRecord>, LedgerError> {
        let mut records: Vec<_> = self.inner.index.read().await.values().cloned().collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.inner.index.read().await.len())
    }
}
