//! Storage backend capability.
//!
//! Backends only offer primitive, handle-based access: open a named child of
//! a directory (optionally creating it), enumerate children, remove a child,
//! and read/write a file's bytes whole. Everything path-shaped (multi-segment
//! resolution, listing with full paths, move, rename) is built on top of
//! these traits by the rest of the crate.
//!
//! Handles are short-lived. Callers acquire them for one logical operation
//! and drop them; nothing in the crate retains a handle across calls.

use async_trait::async_trait;

use super::VfsResult;
use super::error::VfsError;
use super::types::{EntryKind, FileMetadata};

/// Entry point of a storage backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Acquire a handle to the storage root.
    async fn root(&self) -> VfsResult<Box<dyn DirectoryHandle>>;

    /// Returns true if every mutation on this backend fails.
    fn read_only(&self) -> bool {
        false
    }
}

/// A directory within a backend.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    /// Name of this directory (empty for the root).
    fn name(&self) -> &str;

    /// Open the child `name` as `kind`.
    ///
    /// Fails if the child is absent and `create` is false, or if it exists
    /// with a different kind. With `create` set, an existing child of the
    /// right kind is returned unchanged.
    async fn child(&self, name: &str, kind: EntryKind, create: bool) -> VfsResult<Handle>;

    /// Enumerate direct children.
    ///
    /// Order is whatever the backend yields; it is not guaranteed to be
    /// lexicographic.
    async fn entries(&self) -> VfsResult<Vec<(String, Handle)>>;

    /// Remove the child `name`. Directories lose all descendants when
    /// `recursive` is set; otherwise only empty directories can be removed.
    async fn remove_child(&self, name: &str, recursive: bool) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Open the child `name` as a directory.
    async fn directory(&self, name: &str, create: bool) -> VfsResult<Box<dyn DirectoryHandle>> {
        self.child(name, EntryKind::Directory, create)
            .await?
            .into_directory()
    }

    /// Open the child `name` as a file.
    async fn file(&self, name: &str, create: bool) -> VfsResult<Box<dyn FileHandle>> {
        self.child(name, EntryKind::File, create).await?.into_file()
    }
}

/// A file within a backend.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// File name.
    fn name(&self) -> &str;

    /// Read the whole contents.
    async fn read_all(&self) -> VfsResult<Vec<u8>>;

    /// Size, modification time and reported content type.
    async fn metadata(&self) -> VfsResult<FileMetadata>;

    /// Open a stream that replaces the contents on close.
    ///
    /// With `keep_existing_data`, written bytes are placed after the current
    /// contents instead of replacing them.
    async fn open_writable(&self, keep_existing_data: bool)
    -> VfsResult<Box<dyn WritableStream>>;
}

/// Pending write to a file.
///
/// Nothing is visible to readers until [`close`](WritableStream::close)
/// succeeds. Dropping a stream without closing it discards the write.
#[async_trait]
pub trait WritableStream: Send {
    /// Queue `data` for writing.
    async fn write(&mut self, data: &[u8]) -> VfsResult<()>;

    /// Commit queued data. Further writes fail.
    async fn close(&mut self) -> VfsResult<()>;
}

/// A directory or file handle.
pub enum Handle {
    Directory(Box<dyn DirectoryHandle>),
    File(Box<dyn FileHandle>),
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple(self.kind().as_str()).field(&self.name()).finish()
    }
}

impl Handle {
    /// Kind of entry this handle refers to.
    pub fn kind(&self) -> EntryKind {
        match self {
            Handle::Directory(_) => EntryKind::Directory,
            Handle::File(_) => EntryKind::File,
        }
    }

    /// Name of the entry.
    pub fn name(&self) -> &str {
        match self {
            Handle::Directory(d) => d.name(),
            Handle::File(f) => f.name(),
        }
    }

    /// Unwrap a directory handle.
    pub fn into_directory(self) -> VfsResult<Box<dyn DirectoryHandle>> {
        match self {
            Handle::Directory(d) => Ok(d),
            Handle::File(f) => Err(VfsError::not_a_directory(f.name())),
        }
    }

    /// Unwrap a file handle.
    pub fn into_file(self) -> VfsResult<Box<dyn FileHandle>> {
        match self {
            Handle::File(f) => Ok(f),
            Handle::Directory(d) => Err(VfsError::is_a_directory(d.name())),
        }
    }
}

/// Check that `name` can name a single child entry.
///
/// Backends call this before touching storage so a name can never address
/// anything but a direct child.
pub fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(VfsError::invalid_path(format!("bad entry name {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("a.txt").is_ok());
        assert!(validate_name("with space").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("nul\0").is_err());
    }
}
