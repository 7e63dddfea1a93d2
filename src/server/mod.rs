//! # HTTP Server
//!
//! Thin transport over the protocol: multipart in, JSON out.
//!
//! - [`routes`]: router and handlers
//! - [`response`]: response bodies and error-to-status mapping

pub mod response;
pub mod routes;

use anyhow::Result;
use log::info;
use tokio::net::TcpListener;

use crate::common::config::AppConfig;

pub use routes::{build_router, AppState};

/// Build the context from `config`, bind, and serve until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<()> {
    let ctx = config.build_context().await?;
    info!(
        "⏱️ Timeouts: embed {:?}, ledger {:?}",
        ctx.embed_timeout(),
        ctx.ledger_timeout()
    );
    let app = build_router(ctx, &config.server);

    let listener = TcpListener::bind(&config.server.address).await?;
    info!("🌐 Server running on http://{}", listener.local_addr()?);
    info!("📡 Endpoints: POST /encode, POST /decode, GET /blocks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}
