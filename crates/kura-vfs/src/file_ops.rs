//! File operations.
//!
//! Each operation comes in two forms: `try_*` returns the full
//! [`VfsResult`], the plain form collapses failure to `false` / `None`
//! after logging it at debug level.

use crate::mime::resolve_mime;
use crate::navigator::Resolve;
use crate::path::{PathInput, VfsPath, rename_target};
use crate::store::Store;
use crate::vfs::{EntryKind, FileHandle, FileStat, VfsError, VfsResult, VfsResultExt};

/// Outcome of a successful file move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// False when the destination was written but the source could not be
    /// removed afterwards. The copy is kept; both paths then hold the data.
    pub source_removed: bool,
}

/// Write `data` through a fresh stream and commit it.
pub(crate) async fn write_all(file: &dyn FileHandle, data: &[u8], append: bool) -> VfsResult<()> {
    let mut stream = file.open_writable(append).await?;
    stream.write(data).await?;
    stream.close().await
}

/// File operations of a [`Store`].
#[derive(Clone, Copy)]
pub struct Files<'a> {
    store: &'a Store,
}

impl<'a> Files<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // ========================================================================
    // Create / read / write
    // ========================================================================

    /// Create an empty file, or open an existing one unchanged.
    ///
    /// `recursive` creates missing parent directories.
    pub async fn create(&self, path: impl Into<PathInput>, recursive: bool) -> bool {
        self.try_create(path, recursive, None).await.succeeded("file.create")
    }

    /// Create a file holding exactly `data`, replacing any existing contents.
    pub async fn create_with_data(
        &self,
        path: impl Into<PathInput>,
        recursive: bool,
        data: impl AsRef<[u8]>,
    ) -> bool {
        self.try_create(path, recursive, Some(data.as_ref()))
            .await
            .succeeded("file.create")
    }

    pub async fn try_create(
        &self,
        path: impl Into<PathInput>,
        recursive: bool,
        data: Option<&[u8]>,
    ) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.create_at(&path, recursive, data).await
    }

    #[tracing::instrument(skip_all, name = "file.create", fields(path = %path, recursive = recursive))]
    pub(crate) async fn create_at(&self, path: &VfsPath, recursive: bool, data: Option<&[u8]>) -> VfsResult<()> {
        let file = self
            .store
            .navigator()
            .file(path, Resolve::creating(recursive))
            .await?;
        if let Some(data) = data {
            write_all(file.as_ref(), data, false).await?;
        }
        Ok(())
    }

    /// Whole contents of an existing file.
    pub async fn read(&self, path: impl Into<PathInput>) -> Option<Vec<u8>> {
        self.try_read(path).await.found("file.read")
    }

    pub async fn try_read(&self, path: impl Into<PathInput>) -> VfsResult<Vec<u8>> {
        let path = self.store.normalize(path)?;
        self.read_at(&path).await
    }

    /// Contents decoded as UTF-8; invalid sequences become U+FFFD.
    pub async fn read_text(&self, path: impl Into<PathInput>) -> Option<String> {
        self.try_read_text(path).await.found("file.read")
    }

    pub async fn try_read_text(&self, path: impl Into<PathInput>) -> VfsResult<String> {
        let bytes = self.try_read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tracing::instrument(skip_all, name = "file.read", fields(path = %path))]
    pub(crate) async fn read_at(&self, path: &VfsPath) -> VfsResult<Vec<u8>> {
        let file = self.store.navigator().file(path, Resolve::EXISTING).await?;
        file.read_all().await
    }

    /// Replace the contents of an existing file, or append to them.
    pub async fn write(&self, path: impl Into<PathInput>, data: impl AsRef<[u8]>, append: bool) -> bool {
        self.try_write(path, data.as_ref(), append)
            .await
            .succeeded("file.write")
    }

    pub async fn try_write(
        &self,
        path: impl Into<PathInput>,
        data: &[u8],
        append: bool,
    ) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.write_at(&path, data, append).await
    }

    /// Append to an existing file.
    pub async fn append(&self, path: impl Into<PathInput>, data: impl AsRef<[u8]>) -> bool {
        self.write(path, data, true).await
    }

    pub async fn try_append(&self, path: impl Into<PathInput>, data: &[u8]) -> VfsResult<()> {
        self.try_write(path, data, true).await
    }

    #[tracing::instrument(skip_all, name = "file.write", fields(path = %path, len = data.len(), append = append))]
    async fn write_at(&self, path: &VfsPath, data: &[u8], append: bool) -> VfsResult<()> {
        let file = self.store.navigator().file(path, Resolve::EXISTING).await?;
        write_all(file.as_ref(), data, append).await
    }

    // ========================================================================
    // Delete / move / rename
    // ========================================================================

    /// Delete a file. Fails for directories.
    pub async fn delete(&self, path: impl Into<PathInput>) -> bool {
        self.try_delete(path).await.succeeded("file.delete")
    }

    /// Alias of [`delete`](Self::delete).
    pub async fn rm(&self, path: impl Into<PathInput>) -> bool {
        self.delete(path).await
    }

    pub async fn try_delete(&self, path: impl Into<PathInput>) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.delete_at(&path).await
    }

    #[tracing::instrument(skip_all, name = "file.delete", fields(path = %path))]
    async fn delete_at(&self, path: &VfsPath) -> VfsResult<()> {
        self.store
            .navigator()
            .delete_item(path, EntryKind::File)
            .await
    }

    /// Move a file by copying it to `to` and deleting `from`.
    ///
    /// `recursive` creates missing parent directories of `to`. Succeeds even
    /// if `from` could not be removed after the copy; see [`MoveReport`].
    pub async fn mv(
        &self,
        from: impl Into<PathInput>,
        to: impl Into<PathInput>,
        recursive: bool,
    ) -> bool {
        self.try_move(from, to, recursive)
            .await
            .succeeded("file.move")
    }

    pub async fn try_move(
        &self,
        from: impl Into<PathInput>,
        to: impl Into<PathInput>,
        recursive: bool,
    ) -> VfsResult<MoveReport> {
        let from = self.store.normalize(from)?;
        let to = self.store.normalize(to)?;
        self.move_at(&from, &to, recursive).await
    }

    /// Read the source, stage it at the destination, then remove the source.
    ///
    /// Failure while staging leaves the source untouched and removes a
    /// destination file this call created. A failed source removal is not
    /// rolled back.
    #[tracing::instrument(skip_all, name = "file.move", fields(from = %from, to = %to, recursive = recursive))]
    pub(crate) async fn move_at(
        &self,
        from: &VfsPath,
        to: &VfsPath,
        recursive: bool,
    ) -> VfsResult<MoveReport> {
        if from == to {
            return Err(VfsError::invalid_path(format!("cannot move {from} onto itself")));
        }

        let data = self.read_at(from).await?;
        let existed = self.store.navigator().exists(to, EntryKind::File).await;
        if let Err(e) = self.create_at(to, recursive, Some(&data)).await {
            if !existed {
                if let Err(cleanup) = self.delete_at(to).await {
                    tracing::debug!(%to, "nothing staged to clean up: {cleanup}");
                }
            }
            return Err(e);
        }

        match self.delete_at(from).await {
            Ok(()) => Ok(MoveReport {
                source_removed: true,
            }),
            Err(e) => {
                tracing::warn!(%from, %to, "copied but could not remove source: {e}");
                Ok(MoveReport {
                    source_removed: false,
                })
            }
        }
    }

    /// Give a file a new name in the same directory.
    pub async fn rename(&self, path: impl Into<PathInput>, new_name: &str) -> bool {
        self.try_rename(path, new_name)
            .await
            .succeeded("file.rename")
    }

    pub async fn try_rename(
        &self,
        path: impl Into<PathInput>,
        new_name: &str,
    ) -> VfsResult<MoveReport> {
        let path = self.store.normalize(path)?;
        path.require_leaf()?;
        let target = path.with_leaf(rename_target(new_name)?);
        self.move_at(&path, &target, false).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns true if a file (not a directory) exists at `path`.
    pub async fn exists(&self, path: impl Into<PathInput>) -> bool {
        match self.store.normalize(path) {
            Ok(path) => self.store.navigator().exists(&path, EntryKind::File).await,
            Err(e) => {
                tracing::debug!(op = "file.exists", kind = ?e.kind(), "{e}");
                false
            }
        }
    }

    /// Name, size, modification time, MIME type and containing directory.
    pub async fn stat(&self, path: impl Into<PathInput>) -> Option<FileStat> {
        self.try_stat(path).await.found("file.stat")
    }

    pub async fn try_stat(&self, path: impl Into<PathInput>) -> VfsResult<FileStat> {
        let path = self.store.normalize(path)?;
        self.stat_at(&path).await
    }

    #[tracing::instrument(skip_all, name = "file.stat", fields(path = %path))]
    async fn stat_at(&self, path: &VfsPath) -> VfsResult<FileStat> {
        let name = path.require_leaf()?;
        let file = self.store.navigator().file(path, Resolve::EXISTING).await?;
        let meta = file.metadata().await?;
        let mime = resolve_mime(&meta, self.store.sniffer(), || async {
            file.read_all().await.ok()
        })
        .await;

        Ok(FileStat {
            name: name.to_owned(),
            directory_path: path.parent().to_string(),
            size: meta.size,
            modified_at: meta.modified,
            mime,
        })
    }
}
