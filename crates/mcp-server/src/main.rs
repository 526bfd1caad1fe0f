//! MCP memory server entry point.
//!
//! # Usage
//!
//! Run the server via stdio transport:
//!
//! ```bash
//! mcp-memory --root ~/.claude/memories
//! ```
//!
//! Or configure in `~/.config/claude/mcp.json`:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "memory": {
//!       "command": "mcp-memory"
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use mcp_memory_server::{Cli, MemoryService};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let config = cli
        .memory_config()
        .context("Failed to resolve storage root")?;

    tracing::info!(
        root = %config.storage_root.display(),
        "Starting mcp-memory v{}",
        env!("CARGO_PKG_VERSION")
    );

    let service = MemoryService::from_config(&config)
        .context("Failed to open memory store")?
        .serve(stdio())
        .await?;
    service.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
