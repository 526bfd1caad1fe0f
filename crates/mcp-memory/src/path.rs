//! Virtual path validation and translation.
//!
//! Agents address memories through virtual paths rooted at
//! [`VIRTUAL_ROOT`] (`/memories`). A [`PathResolver`] maps those paths onto
//! a real storage directory and back.
//!
//! Containment is enforced twice:
//!
//! 1. [`VirtualPath::parse`] rejects anything outside `/memories` and any
//!    literal or percent-encoded `..` before a path object exists at all.
//! 2. [`PathResolver::to_real`] joins segments one component at a time,
//!    refusing anything that is not a plain file name, and then checks that
//!    the nearest existing ancestor canonicalizes to a location inside the
//!    storage root (so a symlink cannot be used to leave it).
//!
//! # Examples
//!
//! ```
//! use mcp_memory::{PathResolver, VirtualPath};
//! use std::path::Path;
//!
//! let resolver = PathResolver::new("/srv/memories");
//! let path = VirtualPath::parse("/memories/projects//notes.md/")?;
//! assert_eq!(path.as_str(), "/memories/projects/notes.md");
//!
//! let real = resolver.to_real(&path)?;
//! assert_eq!(real, Path::new("/srv/memories/projects/notes.md"));
//! assert_eq!(resolver.to_virtual(&real)?, path);
//!
//! assert!(VirtualPath::parse("/memories/%2e%2e/etc/passwd").is_err());
//! # Ok::<(), mcp_memory::MemoryError>(())
//! ```

use crate::error::{MemoryError, Result};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Prefix every virtual path must start with.
pub const VIRTUAL_ROOT: &str = "/memories";

/// Lowercased percent-encodings of `..`, `../` and `..\`.
const ENCODED_TRAVERSALS: [&str; 5] = ["%2e%2e", "%2e.", ".%2e", "..%2f", "..%5c"];

/// Checks a raw virtual path without touching the filesystem.
///
/// # Errors
///
/// Returns [`MemoryError::ValidationError`] if the path:
/// - is empty or contains a NUL byte
/// - is not `/memories` and does not start with `/memories/`
/// - has a `..` segment (split on both `/` and `\`)
/// - contains a percent-encoded traversal sequence, in any letter case,
///   including double-encoded forms such as `%252e%252e`
///
/// # Examples
///
/// ```
/// use mcp_memory::path::validate;
///
/// assert!(validate("/memories/notes.md").is_ok());
/// assert!(validate("/memories").is_ok());
/// assert!(validate("/memoriesX/notes.md").is_err());
/// assert!(validate("/memories/a/../../b").is_err());
/// assert!(validate("/memories/..%2Fsecret").is_err());
/// ```
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MemoryError::invalid_path(path, "path is empty"));
    }

    if path.contains('\0') {
        return Err(MemoryError::invalid_path(path, "path contains a NUL byte"));
    }

    let under_root = path
        .strip_prefix(VIRTUAL_ROOT)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if !under_root {
        return Err(MemoryError::invalid_path(
            path,
            format!("path must start with {VIRTUAL_ROOT}"),
        ));
    }

    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(MemoryError::invalid_path(
            path,
            "parent directory traversal is not allowed",
        ));
    }

    let lowered = path.to_ascii_lowercase();
    let decoded_once = lowered.replace("%25", "%");
    let encoded = ENCODED_TRAVERSALS
        .iter()
        .any(|pattern| lowered.contains(pattern) || decoded_once.contains(pattern));
    if encoded {
        return Err(MemoryError::invalid_path(
            path,
            "encoded directory traversal is not allowed",
        ));
    }

    Ok(())
}

/// A validated, normalized virtual path.
///
/// The stored form has no empty or `.` segments and no trailing slash, so
/// `/memories/a//b/./c/` and `/memories/a/b/c` compare equal after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath(String);

impl VirtualPath {
    /// Validates and normalizes a virtual path.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] under the rules described on
    /// [`validate`].
    pub fn parse(path: &str) -> Result<Self> {
        validate(path)?;

        let rest = &path[VIRTUAL_ROOT.len()..];
        Ok(Self::from_segments(
            rest.split('/')
                .filter(|segment| !segment.is_empty() && *segment != "."),
        ))
    }

    /// Returns the virtual root itself (`/memories`).
    #[must_use]
    pub fn root() -> Self {
        Self(VIRTUAL_ROOT.to_string())
    }

    fn from_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Self {
        let mut normalized = String::from(VIRTUAL_ROOT);
        for segment in segments {
            normalized.push('/');
            normalized.push_str(segment);
        }
        Self(normalized)
    }

    /// Returns the normalized path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is `/memories` itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == VIRTUAL_ROOT
    }

    /// Iterates the segments below the virtual root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[VIRTUAL_ROOT.len()..]
            .split('/')
            .filter(|segment| !segment.is_empty())
    }

    /// Returns `true` if `self` is `other` or lies beneath it.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcp_memory::VirtualPath;
    ///
    /// let dir = VirtualPath::parse("/memories/a")?;
    /// assert!(VirtualPath::parse("/memories/a/b.md")?.is_within(&dir));
    /// assert!(!VirtualPath::parse("/memories/ab.md")?.is_within(&dir));
    /// # Ok::<(), mcp_memory::MemoryError>(())
    /// ```
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self.0
            .strip_prefix(&other.0)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VirtualPath {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Translates between virtual paths and the real storage directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for the given storage root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a virtual path to its location under the storage root.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if a segment is not a plain
    /// file name on this platform, or if the nearest existing ancestor
    /// resolves (through a symlink) outside the storage root. Returns
    /// [`MemoryError::IoFailure`] if that ancestor cannot be canonicalized.
    pub fn to_real(&self, path: &VirtualPath) -> Result<PathBuf> {
        let mut real = self.root.clone();
        for segment in path.segments() {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => real.push(name),
                _ => {
                    return Err(MemoryError::invalid_path(
                        path.as_str(),
                        format!("segment '{segment}' is not a plain file name"),
                    ));
                }
            }
        }

        if !real.starts_with(&self.root) {
            return Err(MemoryError::invalid_path(
                path.as_str(),
                "path escapes the storage root",
            ));
        }

        self.ensure_contained(path, &real)?;
        Ok(real)
    }

    /// Maps a real path under the storage root back to its virtual path.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ValidationError`] if `real` is not beneath the
    /// storage root or contains a component that is not valid UTF-8.
    pub fn to_virtual(&self, real: &Path) -> Result<VirtualPath> {
        let relative = real.strip_prefix(&self.root).map_err(|_| {
            MemoryError::invalid_path(
                real.display().to_string(),
                "path is outside the storage root",
            )
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        MemoryError::invalid_path(
                            relative.display().to_string(),
                            "file name is not valid UTF-8",
                        )
                    })?;
                    segments.push(name);
                }
                Component::CurDir => {}
                _ => {
                    return Err(MemoryError::invalid_path(
                        relative.display().to_string(),
                        "unexpected path component",
                    ));
                }
            }
        }

        Ok(VirtualPath::from_segments(segments.into_iter()))
    }

    /// Verifies the nearest existing ancestor of `real` stays inside the root.
    fn ensure_contained(&self, path: &VirtualPath, real: &Path) -> Result<()> {
        // Root not created yet: nothing beneath it can exist.
        let Ok(canonical_root) = self.root.canonicalize() else {
            return Ok(());
        };

        let mut probe = real;
        while probe.symlink_metadata().is_err() {
            match probe.parent() {
                Some(parent) if parent.starts_with(&self.root) => probe = parent,
                _ => return Ok(()),
            }
        }

        let canonical = match probe.canonicalize() {
            Ok(canonical) => canonical,
            // Dangling symlink as the leaf: the link itself lives in its parent.
            Err(e) if e.kind() == io::ErrorKind::NotFound && probe == real => real
                .parent()
                .ok_or_else(|| MemoryError::invalid_path(path.as_str(), "path has no parent"))?
                .canonicalize()
                .map_err(|e| MemoryError::io("resolve", path.as_str(), e))?,
            Err(e) => return Err(MemoryError::io("resolve", path.as_str(), e)),
        };
        if canonical.starts_with(&canonical_root) {
            Ok(())
        } else {
            Err(MemoryError::invalid_path(
                path.as_str(),
                "path resolves outside the storage root",
            ))
        }
    }
}
