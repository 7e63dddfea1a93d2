//! # Configuration Utilities
//!
//! TOML configuration shared by the binaries. Every field has a default, so an
//! empty file (or no file at all) yields a working in-memory setup.
//!
//! ```toml
//! [server]
//! address = "0.0.0.0:5000"
//! max_upload_bytes = 10485760
//! static_dir = "frontend/build"
//!
//! [ledger]
//! backend = "file"
//! path = "data/ledger.jsonl"
//!
//! [timeouts]
//! embed_secs = 30
//! ledger_secs = 5
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::ledger::{FileLedger, LedgerStore, MemoryLedger};
use crate::processing::LsbEmbedder;
use crate::protocol::ProtocolContext;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: AppConfig = load_config("config/server.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub ledger: LedgerSection,
    pub timeouts: TimeoutSection,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind (e.g., "0.0.0.0:5000")
    pub address: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Optional directory of static files served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:5000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub backend: LedgerBackend,
    /// JSON-lines file used by the `file` backend
    pub path: PathBuf,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Memory,
            path: PathBuf::from("data/ledger.jsonl"),
        }
    }
}

/// Upper bounds on the two suspension points of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub embed_secs: u64,
    pub ledger_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            embed_secs: 30,
            ledger_secs: 5,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    /// Open the configured ledger store.
    pub async fn open_ledger(&self) -> Result<Arc<dyn LedgerStore>> {
        Ok(match self.ledger.backend {
            LedgerBackend::Memory => Arc::new(MemoryLedger::new()),
            LedgerBackend::File => Arc::new(FileLedger::open(&self.ledger.path).await?),
        })
    }

    /// Build the protocol context: LSB embedder, configured ledger, configured timeouts.
    pub async fn build_context(&self) -> Result<ProtocolContext> {
        let ledger = self.open_ledger().await?;
        Ok(
            ProtocolContext::new(Arc::new(LsbEmbedder::new()), ledger).with_timeouts(
                Duration::from_secs(self.timeouts.embed_secs),
                Duration::from_secs(self.timeouts.ledger_secs),
            ),
        )
    }
}
