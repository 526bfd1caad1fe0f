//! Error types for memory store operations.
//!
//! Every failure a command can produce is a [`MemoryError`] variant, so
//! callers can branch on the kind of failure instead of parsing messages.
//! Messages always name virtual paths (`/memories/...`), never the real
//! location on disk.
//!
//! # Examples
//!
//! ```
//! use mcp_memory::{MemoryError, Result};
//!
//! fn require(path: Option<&str>) -> Result<&str> {
//!     path.ok_or_else(|| MemoryError::MissingArgument {
//!         command: "view".to_string(),
//!         argument: "path".to_string(),
//!     })
//! }
//!
//! let err = require(None).unwrap_err();
//! assert!(err.is_missing_argument());
//! ```

use thiserror::Error;

/// Errors that can occur while executing a memory command.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// A field required by the dispatched command was not supplied.
    #[error("Missing required argument '{argument}' for command '{command}'")]
    MissingArgument {
        /// Command being executed
        command: String,
        /// Name of the absent argument
        argument: String,
    },

    /// A supplied value failed validation.
    ///
    /// Raised for virtual paths outside `/memories`, paths carrying literal
    /// or percent-encoded traversal sequences, and out-of-domain numeric
    /// arguments such as `insert_line = 0`.
    #[error("Invalid {field} '{value}': {reason}")]
    ValidationError {
        /// The argument that failed validation
        field: String,
        /// The offending value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The target path does not exist.
    #[error("Path not found: {path}")]
    NotFound {
        /// Virtual path that was not found
        path: String,
    },

    /// `str_replace` could not find the requested text.
    #[error("Text to replace was not found in {path}: {needle:?}")]
    NotMatched {
        /// Virtual path of the file searched
        path: String,
        /// The literal text that was searched for
        needle: String,
    },

    /// `rename` destination already exists.
    #[error("Destination already exists: {path}")]
    Conflict {
        /// Virtual path of the existing destination
        path: String,
    },

    /// Underlying filesystem call failed.
    #[error("Failed to {operation} {path}: {source}")]
    IoFailure {
        /// Short description of the attempted operation
        operation: &'static str,
        /// Virtual path the operation targeted
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl MemoryError {
    /// Creates a validation error for a path argument.
    pub(crate) fn invalid_path(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: "path".to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O failure error.
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoFailure {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if a required argument was absent.
    #[must_use]
    pub const fn is_missing_argument(&self) -> bool {
        matches!(self, Self::MissingArgument { .. })
    }

    /// Returns `true` if this is a validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_memory::VirtualPath;
    ///
    /// let err = VirtualPath::parse("/memories/../etc").unwrap_err();
    /// assert!(err.is_validation_error());
    /// ```
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }

    /// Returns `true` if the target path does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if `str_replace` found no match.
    #[must_use]
    pub const fn is_not_matched(&self) -> bool {
        matches!(self, Self::NotMatched { .. })
    }

    /// Returns `true` if a rename destination already exists.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if an underlying filesystem call failed.
    #[must_use]
    pub const fn is_io_failure(&self) -> bool {
        matches!(self, Self::IoFailure { .. })
    }
}

/// Result type for memory store operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
