//! Handle navigation.
//!
//! Walks a [`VfsPath`] from the storage root one segment at a time and hands
//! back a handle for the entry it names. Two independent switches control
//! creation:
//!
//! - `create_ancestors`: open missing *intermediate* directories by creating
//!   them (the "recursive" flag of create/move operations);
//! - `create`: create the *leaf* itself if it is missing.
//!
//! Neither has anything to do with recursing into subdirectories; that is a
//! listing concern. The root handle is re-acquired on every call.

use crate::path::VfsPath;
use crate::vfs::{
    DirectoryHandle, EntryKind, FileHandle, Handle, StorageBackend, VfsError, VfsResult,
};

/// Creation switches for [`Navigator::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolve {
    /// Create missing intermediate directories.
    pub create_ancestors: bool,
    /// Create the leaf if missing.
    pub create: bool,
}

impl Resolve {
    /// Look up an existing entry; create nothing.
    pub const EXISTING: Resolve = Resolve {
        create_ancestors: false,
        create: false,
    };

    /// Create the leaf, and its ancestors when `create_ancestors` is set.
    pub fn creating(create_ancestors: bool) -> Self {
        Self {
            create_ancestors,
            create: true,
        }
    }
}

/// Resolves paths against a backend.
#[derive(Clone, Copy)]
pub struct Navigator<'a> {
    backend: &'a dyn StorageBackend,
}

impl<'a> Navigator<'a> {
    pub fn new(backend: &'a dyn StorageBackend) -> Self {
        Self { backend }
    }

    /// Open the directory reached by following `segments` from the root.
    pub(crate) async fn walk(
        &self,
        segments: &[String],
        create_ancestors: bool,
    ) -> VfsResult<Box<dyn DirectoryHandle>> {
        let mut handle = self.backend.root().await?;
        for segment in segments {
            handle = handle.directory(segment, create_ancestors).await?;
        }
        Ok(handle)
    }

    /// Resolve `path` to a handle of the given kind.
    ///
    /// A root path (no leaf name) resolves to the root directory, unless a
    /// file or a created leaf was asked for, which needs a name.
    pub async fn resolve(&self, path: &VfsPath, kind: EntryKind, opts: Resolve) -> VfsResult<Handle> {
        let (parents, name) = path.split_leaf();
        let name = match name {
            Some(name) => name,
            None if opts.create || kind.is_file() => {
                return Err(VfsError::invalid_path("no name provided"));
            }
            None => {
                let root = self.walk(parents, opts.create_ancestors).await?;
                return Ok(Handle::Directory(root));
            }
        };

        let parent = self.walk(parents, opts.create_ancestors).await?;
        parent.child(name, kind, opts.create).await
    }

    /// Resolve `path` to a directory handle.
    pub async fn directory(
        &self,
        path: &VfsPath,
        opts: Resolve,
    ) -> VfsResult<Box<dyn DirectoryHandle>> {
        self.resolve(path, EntryKind::Directory, opts)
            .await?
            .into_directory()
    }

    /// Resolve `path` to a file handle.
    pub async fn file(&self, path: &VfsPath, opts: Resolve) -> VfsResult<Box<dyn FileHandle>> {
        self.resolve(path, EntryKind::File, opts).await?.into_file()
    }

    /// Returns true if `path` resolves to an existing entry of `kind`.
    pub async fn exists(&self, path: &VfsPath, kind: EntryKind) -> bool {
        self.resolve(path, kind, Resolve::EXISTING).await.is_ok()
    }
}
