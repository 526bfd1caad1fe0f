//! Command-line arguments for the `mcp-memory` binary.

use clap::Parser;
use mcp_memory::MemoryConfig;
use std::path::PathBuf;

/// MCP memory server - persistent, sandboxed notes for agents.
///
/// Serves the `memory` tool over stdio. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "mcp-memory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory backing the /memories namespace (default: ~/.claude/memories)
    #[arg(long, env = "MCP_MEMORY_ROOT")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the store configuration, resolving a relative `--root`
    /// against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn memory_config(&self) -> std::io::Result<MemoryConfig> {
        let Some(root) = &self.root else {
            return Ok(MemoryConfig::default());
        };
        Ok(MemoryConfig::builder()
            .storage_root(std::path::absolute(root)?)
            .build())
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[must_use]
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "info,mcp_memory=debug"
        } else {
            "info"
        }
    }
}
