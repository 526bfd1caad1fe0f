//! MCP server exposing a sandboxed memory directory to agents.
//!
//! The server publishes one tool, `memory`, backed by
//! [`mcp_memory::MemoryStore`]. The agent reads and edits notes under the
//! virtual `/memories` tree; the server maps that tree onto a real
//! directory (default `~/.claude/memories`) and refuses every path that
//! would leave it.
//!
//! # Architecture
//!
//! - [`service`] - `rmcp` server handler and the `memory` tool
//! - [`cli`] - command-line arguments for the `mcp-memory` binary
//!
//! # Examples
//!
//! ```no_run
//! use mcp_memory::MemoryConfig;
//! use mcp_memory_server::service::MemoryService;
//! use rmcp::transport::stdio;
//! use rmcp::ServiceExt;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = MemoryService::from_config(&MemoryConfig::default())?
//!     .serve(stdio())
//!     .await?;
//! service.waiting().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod service;

pub use cli::Cli;
pub use service::{MemoryService, SERVER_INSTRUCTIONS};
