//! Sandboxed on-disk memory store for MCP agents.
//!
//! An agent keeps notes in a virtual directory tree rooted at `/memories`.
//! This crate maps that tree onto a real storage directory and executes the
//! six memory commands against it, guaranteeing that no command can read,
//! write or delete anything outside the storage root.
//!
//! # Architecture
//!
//! - [`path`] - virtual path validation and real/virtual translation
//! - [`command`] - raw tool arguments and the checked command enum
//! - [`store`] - the command processor
//! - [`config`] - storage root configuration
//!
//! # Commands
//!
//! | Command       | Effect                                              |
//! |---------------|-----------------------------------------------------|
//! | `view`        | recursive directory listing, or file contents       |
//! | `create`      | write a file, creating parents, overwriting         |
//! | `str_replace` | replace the first literal occurrence of a string    |
//! | `insert`      | insert a line at a 1-based position                 |
//! | `delete`      | remove a file or a whole directory tree             |
//! | `rename`      | move an entry; never overwrites the destination     |
//!
//! # Examples
//!
//! ```
//! use mcp_memory::{CommandKind, MemoryCommand, MemoryConfig, MemoryRequest, MemoryStore};
//! # use tempfile::TempDir;
//!
//! # let temp = TempDir::new().unwrap();
//! let store = MemoryStore::open(&MemoryConfig::new(temp.path()))?;
//!
//! let request = MemoryRequest {
//!     path: Some("/memories/progress.md".to_string()),
//!     file_text: Some("step 1 done".to_string()),
//!     ..MemoryRequest::new(CommandKind::Create)
//! };
//! let message = store.execute(MemoryCommand::try_from(request)?)?;
//! assert_eq!(message, "Created: /memories/progress.md");
//! # Ok::<(), mcp_memory::MemoryError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod command;
pub mod config;
pub mod error;
pub mod path;
pub mod store;

pub use command::{CommandKind, MemoryCommand, MemoryRequest, ViewRange};
pub use config::{MemoryConfig, MemoryConfigBuilder};
pub use error::{MemoryError, Result};
pub use path::{PathResolver, VIRTUAL_ROOT, VirtualPath};
pub use store::MemoryStore;
