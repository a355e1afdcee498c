//! Kind-checked deletion.

use crate::navigator::Navigator;
use crate::path::VfsPath;
use crate::vfs::{EntryKind, VfsError, VfsResult};

impl Navigator<'_> {
    /// Remove the entry at `path`, which must exist as `kind`.
    ///
    /// The child is opened as `kind` before removal, so deleting a directory
    /// through the file API (or the reverse) fails with `NotFound` instead of
    /// removing it. Directories are removed with all descendants.
    pub async fn delete_item(&self, path: &VfsPath, kind: EntryKind) -> VfsResult<()> {
        let (parents, name) = path.split_leaf();
        let name = name.ok_or_else(|| VfsError::invalid_path("no name provided"))?;

        let parent = self.walk(parents, false).await?;
        if parent.child(name, kind, false).await.is_err() {
            return Err(VfsError::not_found(format!("no such {kind}: {path}")));
        }
        parent.remove_child(name, true).await
    }
}
