//! Core VFS types.
//!
//! Value objects produced by backends and by the listing/stat operations.
//! All of them are constructed fresh per call and never cached.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Kind of a storage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Lowercase name, as used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata reported by a backend for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Content type the backend knows about, if any.
    pub mime: Option<String>,
}

impl FileMetadata {
    /// Metadata for a file of `size` bytes modified now.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            modified: SystemTime::now(),
            mime: None,
        }
    }

    /// The reported MIME type, treating an empty string as unknown.
    pub fn reported_mime(&self) -> Option<&str> {
        self.mime.as_deref().filter(|m| !m.is_empty())
    }
}

/// One entry of a directory listing.
///
/// `children` is only present on directory entries of a nested recursive
/// listing; files and non-recursive listings never carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    /// Entry name (not full path).
    pub name: String,
    /// Absolute path of the entry, e.g. `/nested/c.txt`.
    pub full_path: String,
    /// Entry kind.
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<SystemTime>,
}

impl TreeItem {
    /// A bare directory entry.
    pub fn directory(name: impl Into<String>, full_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            kind: EntryKind::Directory,
            children: None,
            mime: None,
            size: None,
            modified_at: None,
        }
    }

    /// A file entry annotated with backend metadata.
    pub fn file(
        name: impl Into<String>,
        full_path: impl Into<String>,
        meta: &FileMetadata,
        mime: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            kind: EntryKind::File,
            children: None,
            mime,
            size: Some(meta.size),
            modified_at: Some(meta.modified),
        }
    }

    /// Attach a nested listing.
    pub fn with_children(mut self, children: Vec<TreeItem>) -> Self {
        self.children = Some(children);
        self
    }

    /// Returns true if this is a directory entry.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// File information returned by `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// File name.
    pub name: String,
    /// Absolute path of the containing directory (`/` at the root).
    pub directory_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified_at: SystemTime,
    /// Reported or sniffed content type.
    pub mime: Option<String>,
}
