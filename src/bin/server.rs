//! # Server Binary Entry Point
//!
//! Thin wrapper that loads configuration and runs the HTTP service.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! cargo run --bin server -- --address 127.0.0.1:8080
//! ```
//!
//! Without `--config` the built-in defaults are used (in-memory ledger on 0.0.0.0:5000).

use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

use stego_ledger::common::config::AppConfig;
use stego_ledger::server;

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address from the configuration
    #[arg(short, long)]
    address: Option<String>,
}

/// Initialize logging with timestamp, level, and message formatting.
///
/// INFO by default; `RUST_LOG` overrides.
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("📄 Loading configuration from {}", path);
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(address) = args.address {
        config.server.address = address;
    }

    info!(
        "🚀 Starting stego-ledger ({:?} ledger)",
        config.ledger.backend
    );

    server::run(config).await
}
