//! Memory command model.
//!
//! [`MemoryRequest`] is the flat argument set an agent sends (one optional
//! field per possible argument). [`MemoryCommand`] is the checked form the
//! store executes: a closed enum whose variants carry exactly the arguments
//! their command needs, with paths already validated.
//!
//! # Examples
//!
//! ```
//! use mcp_memory::{CommandKind, MemoryCommand, MemoryRequest};
//!
//! let request = MemoryRequest {
//!     path: Some("/memories/todo.md".to_string()),
//!     file_text: Some("- write tests".to_string()),
//!     ..MemoryRequest::new(CommandKind::Create)
//! };
//!
//! let command = MemoryCommand::try_from(request)?;
//! assert_eq!(command.kind(), CommandKind::Create);
//!
//! let missing = MemoryCommand::try_from(MemoryRequest::new(CommandKind::Delete));
//! assert!(missing.unwrap_err().is_missing_argument());
//! # Ok::<(), mcp_memory::MemoryError>(())
//! ```

use crate::error::{MemoryError, Result};
use crate::path::VirtualPath;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a memory command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Show a directory listing or file contents
    View,
    /// Create or overwrite a file
    Create,
    /// Replace the first occurrence of a string in a file
    StrReplace,
    /// Insert a line into a file
    Insert,
    /// Delete a file or directory
    Delete,
    /// Rename or move a file or directory
    Rename,
}

impl CommandKind {
    /// Returns the wire name of the command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::StrReplace => "str_replace",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Rename => "rename",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw arguments for the `memory` tool.
///
/// Which fields are required depends on `command`; conversion into a
/// [`MemoryCommand`] reports the first missing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MemoryRequest {
    /// Command to execute
    pub command: CommandKind,

    /// Target path, rooted at /memories (view, create, str_replace, insert, delete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Inclusive 1-based line range [start, end] to show when viewing a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_range: Option<[usize; 2]>,

    /// Content of the file to create (default: empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_text: Option<String>,

    /// Exact text to replace; the first occurrence is replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_str: Option<String>,

    /// Replacement text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_str: Option<String>,

    /// 1-based line number the inserted text will occupy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_line: Option<usize>,

    /// Text to insert as a new line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,

    /// Source path for rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,

    /// Destination path for rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
}

impl MemoryRequest {
    /// Creates a request with only the command set.
    #[must_use]
    pub const fn new(command: CommandKind) -> Self {
        Self {
            command,
            path: None,
            view_range: None,
            file_text: None,
            old_str: None,
            new_str: None,
            insert_line: None,
            insert_text: None,
            old_path: None,
            new_path: None,
        }
    }
}

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRange {
    start: usize,
    end: usize,
}

impl ViewRange {
    /// Creates a line range.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if `start` is zero or
    /// `end < start`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_memory::ViewRange;
    ///
    /// assert!(ViewRange::new(2, 5).is_ok());
    /// assert!(ViewRange::new(0, 5).is_err());
    /// assert!(ViewRange::new(5, 2).is_err());
    /// ```
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start == 0 || end < start {
            return Err(MemoryError::ValidationError {
                field: "view_range".to_string(),
                value: format!("[{start}, {end}]"),
                reason: "expected 1-based [start, end] with end >= start".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// First line (1-based).
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Last line (1-based, inclusive).
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Selects the lines of `content` covered by this range.
    ///
    /// Indices past the end clamp to the available lines.
    #[must_use]
    pub fn slice(self, content: &str) -> String {
        let lines: Vec<&str> = content.split('\n').collect();
        let from = (self.start - 1).min(lines.len());
        let to = self.end.min(lines.len());
        lines[from..to].join("\n")
    }
}

/// A checked memory command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryCommand {
    /// List a directory or read a file
    View {
        /// Directory or file to show
        path: VirtualPath,
        /// Optional line range for files
        view_range: Option<ViewRange>,
    },
    /// Create or overwrite a file
    Create {
        /// File to write
        path: VirtualPath,
        /// Full file content
        file_text: String,
    },
    /// Replace the first occurrence of `old_str`
    StrReplace {
        /// File to edit
        path: VirtualPath,
        /// Literal text to find
        old_str: String,
        /// Replacement text
        new_str: String,
    },
    /// Insert a line
    Insert {
        /// File to edit
        path: VirtualPath,
        /// 1-based line the text will occupy
        insert_line: usize,
        /// Text to insert
        insert_text: String,
    },
    /// Delete a file or directory tree
    Delete {
        /// Entry to delete
        path: VirtualPath,
    },
    /// Move an entry
    Rename {
        /// Existing entry
        old_path: VirtualPath,
        /// New location
        new_path: VirtualPath,
    },
}

impl MemoryCommand {
    /// Returns the command identifier.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::View { .. } => CommandKind::View,
            Self::Create { .. } => CommandKind::Create,
            Self::StrReplace { .. } => CommandKind::StrReplace,
            Self::Insert { .. } => CommandKind::Insert,
            Self::Delete { .. } => CommandKind::Delete,
            Self::Rename { .. } => CommandKind::Rename,
        }
    }
}

impl TryFrom<MemoryRequest> for MemoryCommand {
    type Error = MemoryError;

    fn try_from(request: MemoryRequest) -> Result<Self> {
        let kind = request.command;
        let require = |value: Option<String>, argument: &str| {
            value.ok_or_else(|| MemoryError::MissingArgument {
                command: kind.to_string(),
                argument: argument.to_string(),
            })
        };
        let require_path = |value: Option<String>, argument: &str| {
            require(value, argument).and_then(|raw| VirtualPath::parse(&raw))
        };

        let command = match kind {
            CommandKind::View => Self::View {
                path: require_path(request.path, "path")?,
                view_range: request
                    .view_range
                    .map(|[start, end]| ViewRange::new(start, end))
                    .transpose()?,
            },
            CommandKind::Create => Self::Create {
                path: require_path(request.path, "path")?,
                file_text: request.file_text.unwrap_or_default(),
            },
            CommandKind::StrReplace => {
                let path = require_path(request.path, "path")?;
                let old_str = require(request.old_str, "old_str")?;
                let new_str = require(request.new_str, "new_str")?;
                if old_str.is_empty() {
                    return Err(MemoryError::ValidationError {
                        field: "old_str".to_string(),
                        value: String::new(),
                        reason: "text to replace cannot be empty".to_string(),
                    });
                }
                Self::StrReplace {
                    path,
                    old_str,
                    new_str,
                }
            }
            CommandKind::Insert => {
                let path = require_path(request.path, "path")?;
                let insert_line = request.insert_line.ok_or_else(|| {
                    MemoryError::MissingArgument {
                        command: kind.to_string(),
                        argument: "insert_line".to_string(),
                    }
                })?;
                let insert_text = require(request.insert_text, "insert_text")?;
                if insert_line == 0 {
                    return Err(MemoryError::ValidationError {
                        field: "insert_line".to_string(),
                        value: insert_line.to_string(),
                        reason: "line numbers start at 1".to_string(),
                    });
                }
                Self::Insert {
                    path,
                    insert_line,
                    insert_text,
                }
            }
            CommandKind::Delete => Self::Delete {
                path: require_path(request.path, "path")?,
            },
            CommandKind::Rename => Self::Rename {
                old_path: require_path(request.old_path, "old_path")?,
                new_path: require_path(request.new_path, "new_path")?,
            },
        };

        Ok(command)
    }
}
