//! # Offline CLI
//!
//! Runs the issuance and decode protocols directly against a local file ledger,
//! without going through the HTTP server.
//!
//! ```bash
//! stego-cli encode --image cover.png --recipient 4f1c0a9b2e --secret "meet at dawn" --out secret.png
//! stego-cli decode --image secret.png --device-id 4f1c0a9b2e
//! stego-cli blocks
//! stego-cli device-id "Mozilla/5.0 en-US 1920 1080 -60"
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use std::io::Write;

use stego_ledger::common::config::{AppConfig, LedgerBackend};
use stego_ledger::common::device::derive_device_id;
use stego_ledger::protocol;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ledger file (JSON lines)
    #[arg(short, long, default_value = "data/ledger.jsonl")]
    ledger: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a secret for a recipient and record it in the ledger
    Encode {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        recipient: String,
        /// Sending device (defaults to the id derived from $USER@$HOSTNAME)
        #[arg(long)]
        device_id: Option<String>,
        #[arg(long)]
        secret: String,
        /// Where to write the encoded PNG
        #[arg(long)]
        out: PathBuf,
    },
    /// Reveal the secret in an image, as the given device
    Decode {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        device_id: String,
    },
    /// List issued records, newest first
    Blocks,
    /// Derive a device id from a fingerprint string
    DeviceId { fingerprint: String },
}

fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("warn"))
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

fn local_fingerprint() -> String {
    let user = std::env::var("USER").unwrap_or_default();
    let host = std::env::var("HOSTNAME").unwrap_or_default();
    format!("{user}@{host}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    if let Command::DeviceId { fingerprint } = &args.command {
        println!("{}", derive_device_id(fingerprint));
        return Ok(());
    }

    let mut config = AppConfig::default();
    config.ledger.backend = LedgerBackend::File;
    config.ledger.path = args.ledger.clone();
    let ctx = config.build_context().await?;

    match args.command {
        Command::Encode {
            image,
            recipient,
            device_id,
            secret,
            out,
        } => {
            let cover = tokio::fs::read(&image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;
            let device_id = device_id.unwrap_or_else(|| derive_device_id(&local_fingerprint()));

            let issued = protocol::issue(&ctx, cover, &recipient, &device_id, &secret).await?;
            tokio::fs::write(&out, &issued.image)
                .await
                .with_context(|| format!("writing {}", out.display()))?;

            println!("hash:      {}", issued.record.hash);
            println!("timestamp: {}", issued.record.timestamp);
            println!("image:     {}", out.display());
        }
        Command::Decode { image, device_id } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;
            let secret = protocol::decode(&ctx, bytes, &device_id).await?;
            println!("{secret}");
        }
        Command::Blocks => {
            let records = protocol::list_records(&ctx).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::DeviceId { .. } => {}
    }

    Ok(())
}
