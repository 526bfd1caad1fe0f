//! Memory command processor.
//!
//! [`MemoryStore`] executes [`MemoryCommand`]s against the storage root.
//! It holds no state besides the root itself; everything lives on disk, so
//! a store can be cloned and shared freely between tasks.
//!
//! # Directory Structure
//!
//! ```text
//! /memories              -> <storage_root>/
//! /memories/todo.md      -> <storage_root>/todo.md
//! /memories/project/a.md -> <storage_root>/project/a.md
//! ```
//!
//! # Examples
//!
//! ```
//! use mcp_memory::{MemoryConfig, MemoryStore, VirtualPath};
//! # use tempfile::TempDir;
//!
//! # let temp = TempDir::new().unwrap();
//! let store = MemoryStore::open(&MemoryConfig::new(temp.path()))?;
//! let path = VirtualPath::parse("/memories/todo.md")?;
//!
//! store.create(&path, "- ship it")?;
//! assert_eq!(store.view(&path, None)?, "- ship it");
//! assert_eq!(store.view(&VirtualPath::root(), None)?, "/memories/todo.md");
//! # Ok::<(), mcp_memory::MemoryError>(())
//! ```

use crate::command::{MemoryCommand, ViewRange};
use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::path::{PathResolver, VIRTUAL_ROOT, VirtualPath};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Executes memory commands against a storage root.
///
/// # Thread Safety
///
/// `MemoryStore` is `Send + Sync`. Writes go to a temporary file in the
/// destination directory and are renamed into place, so a concurrent
/// `view` observes either the old or the new content. Concurrent writers
/// to the same file are not serialized: the last rename wins.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    resolver: PathResolver,
}

impl MemoryStore {
    /// Creates a store without touching the filesystem.
    ///
    /// The storage root is created by [`execute`](Self::execute) on first
    /// use.
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            resolver: PathResolver::new(config.storage_root.clone()),
        }
    }

    /// Validates `config`, creates the storage root if needed and returns a
    /// store for it.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] for an invalid configuration
    /// and [`MemoryError::IoFailure`] if the root cannot be created.
    pub fn open(config: &MemoryConfig) -> Result<Self> {
        config.validate()?;
        let store = Self::new(config);
        store.ensure_root()?;
        Ok(store)
    }

    /// Returns the real storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Returns the path resolver used by this store.
    #[must_use]
    pub const fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Creates the storage root and its ancestors if absent.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::IoFailure`] if directory creation fails.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(self.root())
            .map_err(|e| MemoryError::io("create storage root", VIRTUAL_ROOT, e))
    }

    /// Ensures the storage root exists, then runs `command`.
    ///
    /// Returns the human-readable result for the agent.
    ///
    /// # Errors
    ///
    /// Returns whatever error the dispatched handler returns.
    pub fn execute(&self, command: MemoryCommand) -> Result<String> {
        self.ensure_root()?;
        tracing::debug!(command = %command.kind(), "executing memory command");

        match command {
            MemoryCommand::View { path, view_range } => self.view(&path, view_range),
            MemoryCommand::Create { path, file_text } => self.create(&path, &file_text),
            MemoryCommand::StrReplace {
                path,
                old_str,
                new_str,
            } => self.str_replace(&path, &old_str, &new_str),
            MemoryCommand::Insert {
                path,
                insert_line,
                insert_text,
            } => self.insert(&path, insert_line, &insert_text),
            MemoryCommand::Delete { path } => self.delete(&path),
            MemoryCommand::Rename { old_path, new_path } => self.rename(&old_path, &new_path),
        }
    }

    /// Shows a directory listing or file contents.
    ///
    /// Directories are listed recursively, depth first, one virtual path per
    /// line with directories suffixed by `/`. Entries of each directory are
    /// visited in file-name order. An empty directory yields
    /// `Directory is empty: <path>`.
    ///
    /// Files are returned in full, or restricted to `view_range`. The range
    /// is ignored when `path` is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::NotFound`] if `path` does not exist.
    pub fn view(&self, path: &VirtualPath, view_range: Option<ViewRange>) -> Result<String> {
        let real = self.resolver.to_real(path)?;
        let metadata = fs::metadata(&real).map_err(|e| stat_error(path, e))?;

        if metadata.is_dir() {
            return self.list_directory(path, &real);
        }

        let content =
            fs::read_to_string(&real).map_err(|e| MemoryError::io("read", path.as_str(), e))?;
        Ok(match view_range {
            Some(range) => range.slice(&content),
            None => content,
        })
    }

    fn list_directory(&self, path: &VirtualPath, real: &Path) -> Result<String> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(real).min_depth(1).sort_by_file_name() {
            let entry =
                entry.map_err(|e| MemoryError::io("list", path.as_str(), io::Error::from(e)))?;
            let virtual_path = self.resolver.to_virtual(entry.path())?;
            if entry.file_type().is_dir() {
                entries.push(format!("{virtual_path}/"));
            } else {
                entries.push(virtual_path.to_string());
            }
        }

        if entries.is_empty() {
            return Ok(format!("Directory is empty: {path}"));
        }
        Ok(entries.join("\n"))
    }

    /// Writes `file_text` to `path`, creating parent directories and
    /// replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if `path` is a directory and
    /// [`MemoryError::IoFailure`] if the write fails.
    pub fn create(&self, path: &VirtualPath, file_text: &str) -> Result<String> {
        let real = self.resolver.to_real(path)?;
        if real.is_dir() {
            return Err(MemoryError::invalid_path(
                path.as_str(),
                "path is a directory",
            ));
        }

        write_file(path, &real, file_text)?;
        tracing::debug!(path = %path, bytes = file_text.len(), "created memory file");
        Ok(format!("Created: {path}"))
    }

    /// Replaces the first occurrence of `old_str` with `new_str`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if `old_str` is empty,
    /// [`MemoryError::NotFound`] if the file does not exist and
    /// [`MemoryError::NotMatched`] if `old_str` does not occur in it.
    pub fn str_replace(&self, path: &VirtualPath, old_str: &str, new_str: &str) -> Result<String> {
        if old_str.is_empty() {
            return Err(MemoryError::ValidationError {
                field: "old_str".to_string(),
                value: String::new(),
                reason: "search text must not be empty".to_string(),
            });
        }

        let real = self.resolver.to_real(path)?;
        let content = read_file(path, &real)?;

        if !content.contains(old_str) {
            return Err(MemoryError::NotMatched {
                path: path.to_string(),
                needle: old_str.to_string(),
            });
        }

        let updated = content.replacen(old_str, new_str, 1);
        write_file(path, &real, &updated)?;
        tracing::debug!(path = %path, "replaced text in memory file");
        Ok(format!("Replaced text in: {path}"))
    }

    /// Inserts `insert_text` so that it becomes line `insert_line`.
    ///
    /// Lines at or after that position move down by one. A line number past
    /// the end appends the text as the last line.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if `insert_line` is zero and
    /// [`MemoryError::NotFound`] if the file does not exist.
    pub fn insert(
        &self,
        path: &VirtualPath,
        insert_line: usize,
        insert_text: &str,
    ) -> Result<String> {
        if insert_line == 0 {
            return Err(MemoryError::ValidationError {
                field: "insert_line".to_string(),
                value: insert_line.to_string(),
                reason: "line numbers start at 1".to_string(),
            });
        }

        let real = self.resolver.to_real(path)?;
        let content = read_file(path, &real)?;

        let mut lines: Vec<&str> = content.split('\n').collect();
        let index = (insert_line - 1).min(lines.len());
        lines.insert(index, insert_text);

        write_file(path, &real, &lines.join("\n"))?;
        tracing::debug!(path = %path, line = index + 1, "inserted line into memory file");
        Ok(format!("Inserted text at line {} in: {path}", index + 1))
    }

    /// Deletes a file, or a directory with everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] for `/memories` itself and
    /// [`MemoryError::NotFound`] if `path` does not exist.
    pub fn delete(&self, path: &VirtualPath) -> Result<String> {
        if path.is_root() {
            return Err(MemoryError::invalid_path(
                path.as_str(),
                "the memory root cannot be deleted",
            ));
        }

        let real = self.resolver.to_real(path)?;
        let metadata = fs::symlink_metadata(&real).map_err(|e| stat_error(path, e))?;

        if metadata.is_dir() {
            fs::remove_dir_all(&real).map_err(|e| MemoryError::io("delete", path.as_str(), e))?;
            tracing::debug!(path = %path, "deleted memory directory");
            Ok(format!("Deleted directory: {path}"))
        } else {
            fs::remove_file(&real).map_err(|e| MemoryError::io("delete", path.as_str(), e))?;
            tracing::debug!(path = %path, "deleted memory file");
            Ok(format!("Deleted file: {path}"))
        }
    }

    /// Moves `old_path` to `new_path`, creating the destination's parent
    /// directories.
    ///
    /// An existing destination is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::NotFound`] if the source does not exist,
    /// [`MemoryError::Conflict`] if the destination exists, and
    /// [`MemoryError::ValidationError`] when either path is `/memories` or
    /// the destination lies inside the source.
    pub fn rename(&self, old_path: &VirtualPath, new_path: &VirtualPath) -> Result<String> {
        for path in [old_path, new_path] {
            if path.is_root() {
                return Err(MemoryError::invalid_path(
                    path.as_str(),
                    "the memory root cannot be renamed",
                ));
            }
        }

        let old_real = self.resolver.to_real(old_path)?;
        let new_real = self.resolver.to_real(new_path)?;

        fs::symlink_metadata(&old_real).map_err(|e| stat_error(old_path, e))?;

        match fs::symlink_metadata(&new_real) {
            Ok(_) => {
                return Err(MemoryError::Conflict {
                    path: new_path.to_string(),
                });
            }
            Err(e) if is_missing(&e) => {}
            Err(e) => return Err(MemoryError::io("stat", new_path.as_str(), e)),
        }

        if new_path.is_within(old_path) {
            return Err(MemoryError::invalid_path(
                new_path.as_str(),
                format!("cannot move {old_path} inside itself"),
            ));
        }

        if let Some(parent) = new_real.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MemoryError::io("create directory for", new_path.as_str(), e))?;
        }
        fs::rename(&old_real, &new_real)
            .map_err(|e| MemoryError::io("rename", old_path.as_str(), e))?;

        tracing::debug!(from = %old_path, to = %new_path, "renamed memory entry");
        Ok(format!("Renamed: {old_path} -> {new_path}"))
    }
}

fn is_missing(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn stat_error(path: &VirtualPath, error: io::Error) -> MemoryError {
    if is_missing(&error) {
        MemoryError::NotFound {
            path: path.to_string(),
        }
    } else {
        MemoryError::io("stat", path.as_str(), error)
    }
}

/// Reads a file that must exist and must not be a directory.
fn read_file(path: &VirtualPath, real: &Path) -> Result<String> {
    let metadata = fs::metadata(real).map_err(|e| stat_error(path, e))?;
    if metadata.is_dir() {
        return Err(MemoryError::invalid_path(
            path.as_str(),
            "path is a directory, not a file",
        ));
    }
    fs::read_to_string(real).map_err(|e| MemoryError::io("read", path.as_str(), e))
}

/// Writes `content` to `real` atomically.
///
/// Content goes to a temp file in the destination directory, is synced, and
/// is renamed over the target.
fn write_file(path: &VirtualPath, real: &Path, content: &str) -> Result<()> {
    let parent = real
        .parent()
        .ok_or_else(|| MemoryError::invalid_path(path.as_str(), "path has no parent directory"))?;
    fs::create_dir_all(parent)
        .map_err(|e| MemoryError::io("create directory for", path.as_str(), e))?;

    let mut temp =
        NamedTempFile::new_in(parent).map_err(|e| MemoryError::io("write", path.as_str(), e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| MemoryError::io("write", path.as_str(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| MemoryError::io("sync", path.as_str(), e))?;
    temp.persist(real)
        .map_err(|e| MemoryError::io("write", path.as_str(), e.error))?;

    Ok(())
}
