pub mod common;
pub mod ledger;
pub mod processing;
pub mod protocol;
pub mod server;

pub use ledger::{LedgerStore, MessageRecord};
pub use processing::{Embedder, LsbEmbedder};
pub use protocol::{ProtocolContext, ProtocolError};
