//! Directory operations.
//!
//! Same two-form convention as the file operations: `try_*` returns the
//! full [`VfsResult`], the plain form collapses it to `bool` / `Option`.

use crate::listing::{ListOptions, Lister};
use crate::navigator::Resolve;
use crate::path::{PathInput, VfsPath, rename_target};
use crate::store::Store;
use crate::vfs::{EntryKind, TreeItem, VfsError, VfsResult, VfsResultExt};

/// What a directory move has done so far, for rollback.
#[derive(Debug, Default)]
struct Transplant {
    /// Destination directories that did not exist before the move.
    created_dirs: Vec<VfsPath>,
    /// Files moved so far, as `(source, destination)`.
    moved_files: Vec<(VfsPath, VfsPath)>,
    /// Destination files that existed before being overwritten, with their
    /// previous contents.
    overwritten: Vec<(VfsPath, Vec<u8>)>,
}

/// Directory operations of a [`Store`].
#[derive(Clone, Copy)]
pub struct Dirs<'a> {
    store: &'a Store,
}

impl<'a> Dirs<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a directory. Creating one that already exists succeeds and
    /// leaves its contents alone. The root has no name to create and fails.
    ///
    /// `recursive` creates missing parent directories.
    pub async fn create(&self, path: impl Into<PathInput>, recursive: bool) -> bool {
        self.try_create(path, recursive).await.succeeded("dir.create")
    }

    pub async fn try_create(&self, path: impl Into<PathInput>, recursive: bool) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.create_at(&path, recursive).await
    }

    #[tracing::instrument(skip_all, name = "dir.create", fields(path = %path, recursive = recursive))]
    async fn create_at(&self, path: &VfsPath, recursive: bool) -> VfsResult<()> {
        self.store
            .navigator()
            .directory(path, Resolve::creating(recursive))
            .await
            .map(drop)
    }

    /// Returns true if a directory (not a file) exists at `path`.
    pub async fn exists(&self, path: impl Into<PathInput>) -> bool {
        match self.store.normalize(path) {
            Ok(path) => {
                self.store
                    .navigator()
                    .exists(&path, EntryKind::Directory)
                    .await
            }
            Err(e) => {
                tracing::debug!(op = "dir.exists", kind = ?e.kind(), "{e}");
                false
            }
        }
    }

    /// Delete a directory and everything below it. Fails for files and for
    /// the root.
    pub async fn delete(&self, path: impl Into<PathInput>) -> bool {
        self.try_delete(path).await.succeeded("dir.delete")
    }

    /// Alias of [`delete`](Self::delete).
    pub async fn rm(&self, path: impl Into<PathInput>) -> bool {
        self.delete(path).await
    }

    pub async fn try_delete(&self, path: impl Into<PathInput>) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.delete_at(&path).await
    }

    #[tracing::instrument(skip_all, name = "dir.delete", fields(path = %path))]
    async fn delete_at(&self, path: &VfsPath) -> VfsResult<()> {
        self.store
            .navigator()
            .delete_item(path, EntryKind::Directory)
            .await
    }

    /// Remove every child of the directory, keeping the directory itself.
    pub async fn empty(&self, path: impl Into<PathInput>) -> bool {
        self.try_empty(path).await.succeeded("dir.empty")
    }

    /// Remove everything in the store.
    pub async fn empty_root(&self) -> bool {
        self.empty(VfsPath::root()).await
    }

    pub async fn try_empty(&self, path: impl Into<PathInput>) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        self.empty_at(&path).await
    }

    #[tracing::instrument(skip_all, name = "dir.empty", fields(path = %path))]
    async fn empty_at(&self, path: &VfsPath) -> VfsResult<()> {
        let dir = self
            .store
            .navigator()
            .directory(path, Resolve::EXISTING)
            .await?;
        for (name, _) in dir.entries().await? {
            dir.remove_child(&name, true).await?;
        }
        Ok(())
    }

    /// List the directory; see [`ListOptions`] for the shapes.
    pub async fn list(&self, path: impl Into<PathInput>, opts: ListOptions) -> Option<Vec<TreeItem>> {
        self.try_list(path, opts).await.found("dir.list")
    }

    pub async fn try_list(
        &self,
        path: impl Into<PathInput>,
        opts: ListOptions,
    ) -> VfsResult<Vec<TreeItem>> {
        let path = self.store.normalize(path)?;
        self.list_at(&path, opts).await
    }

    #[tracing::instrument(skip_all, name = "dir.list", fields(path = %path, recursive = opts.recursive, flat = opts.flat))]
    async fn list_at(&self, path: &VfsPath, opts: ListOptions) -> VfsResult<Vec<TreeItem>> {
        self.store
            .lister()
            .list(&self.store.navigator(), path, opts)
            .await
    }

    /// Move a directory and its whole subtree to `to`.
    ///
    /// Missing parents of `to` are created. On failure the move is undone as
    /// far as possible and `false` is returned.
    pub async fn mv(&self, from: impl Into<PathInput>, to: impl Into<PathInput>) -> bool {
        self.try_move(from, to).await.succeeded("dir.move")
    }

    pub async fn try_move(
        &self,
        from: impl Into<PathInput>,
        to: impl Into<PathInput>,
    ) -> VfsResult<()> {
        let from = self.store.normalize(from)?;
        let to = self.store.normalize(to)?;
        self.move_at(&from, &to).await
    }

    /// Copy-then-delete move of a subtree.
    ///
    /// Phases: snapshot the source as a flat listing, materialize the
    /// destination, transplant entries (directories before the files inside
    /// them), remove the source. Any failure rolls back: transplanted files
    /// go back to their source paths, destination files they replaced get
    /// their previous contents back, and directories this call created
    /// (including missing ancestors of `to`) are removed again if empty.
    ///
    /// Moving the root transplants its entries but never removes the root;
    /// the emptied directory skeleton stays behind.
    #[tracing::instrument(skip_all, name = "dir.move", fields(from = %from, to = %to))]
    async fn move_at(&self, from: &VfsPath, to: &VfsPath) -> VfsResult<()> {
        if to.is_root() {
            return Err(VfsError::invalid_path(format!("cannot move {from} onto the root")));
        }
        if !from.is_root() && (to.starts_with(from) || from.starts_with(to)) {
            return Err(VfsError::invalid_path(format!("{from} and {to} overlap")));
        }

        let mut entries = Lister::new(None)
            .list(&self.store.navigator(), from, ListOptions::flat())
            .await?;
        entries.sort_by_key(|item| (item.kind.is_file(), item.full_path.len()));

        let mut state = Transplant::default();
        let result = self.transplant(from, to, &entries, &mut state).await;
        let result = match result {
            Ok(()) if from.is_root() => Ok(()),
            Ok(()) => self.delete_at(from).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::debug!(%from, %to, "rolling back directory move: {e}");
            self.roll_back(state).await;
            return Err(e);
        }
        Ok(())
    }

    async fn transplant(
        &self,
        from: &VfsPath,
        to: &VfsPath,
        entries: &[TreeItem],
        state: &mut Transplant,
    ) -> VfsResult<()> {
        let nav = self.store.navigator();
        let files = self.store.file();

        self.materialize(to, state).await?;

        for item in entries {
            let source = VfsPath::parse(&item.full_path)?;
            let dest = source.rebase(from, to).ok_or_else(|| {
                VfsError::other(format!("{source} is not inside {from}"))
            })?;

            if item.is_dir() {
                self.materialize(&dest, state).await?;
                continue;
            }

            if nav.exists(&dest, EntryKind::File).await {
                let previous = files.read_at(&dest).await?;
                state.overwritten.push((dest.clone(), previous));
            }
            let report = files.move_at(&source, &dest, true).await?;
            state.moved_files.push((source.clone(), dest));
            if !report.source_removed {
                return Err(VfsError::other(format!("could not remove {source}")));
            }
        }

        // The destination must have survived the transplant as a directory.
        nav.directory(to, Resolve::EXISTING).await.map(drop)
    }

    /// Ensure `path` exists as a directory, recording it and every ancestor
    /// that had to be created, shallowest first.
    async fn materialize(&self, path: &VfsPath, state: &mut Transplant) -> VfsResult<()> {
        let nav = self.store.navigator();
        let mut missing = Vec::new();
        for depth in (1..=path.len()).rev() {
            let prefix = VfsPath::from_segments(&path.segments()[..depth]);
            if nav.exists(&prefix, EntryKind::Directory).await {
                break;
            }
            missing.push(prefix);
        }
        state.created_dirs.extend(missing.into_iter().rev());
        nav.directory(path, Resolve::creating(true)).await.map(drop)
    }

    async fn roll_back(&self, state: Transplant) {
        let nav = self.store.navigator();
        let files = self.store.file();

        for (source, dest) in state.moved_files.iter().rev() {
            if let Err(e) = files.move_at(dest, source, true).await {
                tracing::warn!(%source, %dest, "rollback could not restore file: {e}");
            }
        }

        for (dest, previous) in state.overwritten.iter().rev() {
            if let Err(e) = files.create_at(dest, true, Some(previous.as_slice())).await {
                tracing::warn!(%dest, "rollback could not restore overwritten file: {e}");
            }
        }

        // Deepest first, and only while empty: anything that could not be
        // restored stays where it is.
        for dir in state.created_dirs.iter().rev() {
            let Some(name) = dir.leaf() else { continue };
            let removed = match nav.directory(&dir.parent(), Resolve::EXISTING).await {
                Ok(parent) => parent.remove_child(name, false).await,
                Err(e) => Err(e),
            };
            if let Err(e) = removed {
                tracing::warn!(%dir, "rollback could not remove directory: {e}");
            }
        }
    }

    /// Give a directory a new name under the same parent.
    pub async fn rename(&self, path: impl Into<PathInput>, new_name: &str) -> bool {
        self.try_rename(path, new_name).await.succeeded("dir.rename")
    }

    pub async fn try_rename(&self, path: impl Into<PathInput>, new_name: &str) -> VfsResult<()> {
        let path = self.store.normalize(path)?;
        path.require_leaf()?;
        let target = path.with_leaf(rename_target(new_name)?);
        self.move_at(&path, &target).await
    }
}
