//! Configuration for the memory store.
//!
//! The storage root is injected explicitly instead of being read from a
//! global, which lets tests point each store at its own temporary directory.
//!
//! # Examples
//!
//! ```
//! use mcp_memory::MemoryConfig;
//!
//! // Default: ~/.claude/memories
//! let config = MemoryConfig::default();
//! assert!(config.storage_root.ends_with(".claude/memories"));
//!
//! // Custom root
//! let custom = MemoryConfig::builder()
//!     .storage_root("/var/lib/agent/memories")
//!     .build();
//! assert!(custom.validate().is_ok());
//! ```

use crate::error::{MemoryError, Result};
use std::path::PathBuf;

/// Directory under the user's home that holds the default storage root.
pub const DEFAULT_PARENT_DIR: &str = ".claude";

/// Name of the default storage root directory.
pub const DEFAULT_ROOT_DIR: &str = "memories";

/// Memory store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Real directory that backs the `/memories` namespace.
    ///
    /// Created on first use if absent.
    /// Default: `~/.claude/memories`
    pub storage_root: PathBuf,
}

impl MemoryConfig {
    /// Creates a configuration for the given storage root.
    #[must_use]
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MemoryConfigBuilder {
        MemoryConfigBuilder::new()
    }

    /// Returns the default storage root, `~/.claude/memories`.
    ///
    /// Falls back to the current directory when no home directory is known.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_PARENT_DIR)
            .join(DEFAULT_ROOT_DIR)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if the storage root is empty
    /// or not an absolute path.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_memory::MemoryConfig;
    ///
    /// assert!(MemoryConfig::new("relative/dir").validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(MemoryError::ValidationError {
                field: "storage_root".to_string(),
                value: String::new(),
                reason: "storage root cannot be empty".to_string(),
            });
        }

        if !self.storage_root.is_absolute() {
            return Err(MemoryError::ValidationError {
                field: "storage_root".to_string(),
                value: self.storage_root.display().to_string(),
                reason: "storage root must be an absolute path".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Builder for [`MemoryConfig`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigBuilder {
    storage_root: Option<PathBuf>,
}

impl MemoryConfigBuilder {
    /// Creates a builder that falls back to the default root.
    #[must_use]
    pub const fn new() -> Self {
        Self { storage_root: None }
    }

    /// Sets the storage root.
    #[must_use]
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> MemoryConfig {
        self.storage_root
            .map_or_else(MemoryConfig::default, MemoryConfig::new)
    }
}
