//! Directory listing.
//!
//! Children come out in backend enumeration order, which is host-defined and
//! not lexicographic; callers needing a stable order must sort. Three shapes:
//!
//! - **shallow** (`recursive = false`): direct children only, no `children`
//!   field on directories;
//! - **tree** (`recursive`, not `flat`): every directory carries its own
//!   listing in `children` (`[]` when empty);
//! - **flat** (`recursive` and `flat`): one sequence. When a directory is
//!   reached, its entry is appended and then its whole flat listing is
//!   spliced in at the *front* of what has been collected so far. For a root
//!   holding `a.txt`, `b.txt`, `nested/c.txt` (enumerated in that order) this
//!   yields `c.txt, a.txt, b.txt, nested`.
//!
//! File metadata is fetched concurrently once enumeration is done; results
//! keep enumeration order regardless of completion order.

use futures::future::{BoxFuture, try_join_all};

use crate::mime::{MimeSniffer, resolve_mime};
use crate::navigator::{Navigator, Resolve};
use crate::path::VfsPath;
use crate::vfs::{DirectoryHandle, FileHandle, Handle, TreeItem, VfsResult};

/// Listing shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// With `recursive`, produce one flat sequence instead of a tree.
    pub flat: bool,
}

impl ListOptions {
    /// Direct children only.
    pub fn shallow() -> Self {
        Self::default()
    }

    /// Nested tree of the whole subtree.
    pub fn tree() -> Self {
        Self {
            recursive: true,
            flat: false,
        }
    }

    /// Flat sequence of the whole subtree.
    pub fn flat() -> Self {
        Self {
            recursive: true,
            flat: true,
        }
    }
}

/// A listing position whose file metadata may still be outstanding.
enum Slot {
    Ready(TreeItem),
    File {
        name: String,
        path: VfsPath,
        handle: Box<dyn FileHandle>,
    },
}

/// Produces [`TreeItem`] listings.
#[derive(Clone, Copy)]
pub struct Lister<'a> {
    sniffer: Option<&'a dyn MimeSniffer>,
}

impl<'a> Lister<'a> {
    /// `sniffer` is consulted for files whose backend reports no type;
    /// `None` leaves such files without a MIME type.
    pub fn new(sniffer: Option<&'a dyn MimeSniffer>) -> Self {
        Self { sniffer }
    }

    /// List the directory at `path`, which must already exist.
    pub async fn list(
        &self,
        nav: &Navigator<'_>,
        path: &VfsPath,
        opts: ListOptions,
    ) -> VfsResult<Vec<TreeItem>> {
        let dir = nav.directory(path, Resolve::EXISTING).await?;
        self.list_handle(dir, path.clone(), opts).await
    }

    fn list_handle<'s>(
        &'s self,
        dir: Box<dyn DirectoryHandle>,
        base: VfsPath,
        opts: ListOptions,
    ) -> BoxFuture<'s, VfsResult<Vec<TreeItem>>> {
        Box::pin(async move {
            let mut slots = Vec::new();

            for (name, handle) in dir.entries().await? {
                let path = base.join(name.as_str());
                let sub = match handle {
                    Handle::File(handle) => {
                        slots.push(Slot::File { name, path, handle });
                        continue;
                    }
                    Handle::Directory(sub) => sub,
                };

                let item = TreeItem::directory(name, path.to_string());
                match (opts.recursive, opts.flat) {
                    (false, _) => slots.push(Slot::Ready(item)),
                    (true, false) => {
                        let children = self.list_handle(sub, path, opts).await?;
                        slots.push(Slot::Ready(item.with_children(children)));
                    }
                    (true, true) => {
                        slots.push(Slot::Ready(item));
                        let nested = self.list_handle(sub, path, opts).await?;
                        slots.splice(0..0, nested.into_iter().map(Slot::Ready));
                    }
                }
            }

            try_join_all(slots.into_iter().map(|slot| self.resolve(slot))).await
        })
    }

    async fn resolve(&self, slot: Slot) -> VfsResult<TreeItem> {
        let (name, path, handle) = match slot {
            Slot::Ready(item) => return Ok(item),
            Slot::File { name, path, handle } => (name, path, handle),
        };

        let meta = handle.metadata().await?;
        let mime = resolve_mime(&meta, self.sniffer, || async {
            handle.read_all().await.ok()
        })
        .await;
        Ok(TreeItem::file(name, path.to_string(), &meta, mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::InferSniffer;
    use crate::vfs::{EntryKind, EnumerationOrder, MemoryBackend, VfsError};

    fn path(s: &str) -> VfsPath {
        VfsPath::parse(s).unwrap()
    }

    async fn touch(nav: &Navigator<'_>, p: &str) {
        nav.file(&path(p), Resolve::creating(true)).await.unwrap();
    }

    fn names(items: &[TreeItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    async fn fixture(backend: &MemoryBackend) {
        let nav = Navigator::new(backend);
        touch(&nav, "/a.txt").await;
        touch(&nav, "/b.txt").await;
        touch(&nav, "/nested/c.txt").await;
    }

    #[tokio::test]
    async fn test_shallow() {
        let backend = MemoryBackend::new();
        fixture(&backend).await;
        let nav = Navigator::new(&backend);

        let items = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::shallow())
            .await
            .unwrap();
        assert_eq!(names(&items), ["a.txt", "b.txt", "nested"]);
        assert_eq!(items[2].kind, EntryKind::Directory);
        assert_eq!(items[2].children, None);
        assert_eq!(items[0].size, Some(0));
        assert_eq!(items[0].full_path, "/a.txt");
    }

    #[tokio::test]
    async fn test_tree() {
        let backend = MemoryBackend::new();
        fixture(&backend).await;
        let nav = Navigator::new(&backend);
        nav.directory(&path("/nested/empty"), Resolve::creating(false))
            .await
            .unwrap();

        let items = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::tree())
            .await
            .unwrap();
        assert_eq!(names(&items), ["a.txt", "b.txt", "nested"]);
        assert_eq!(items[0].children, None);

        let nested = items[2].children.as_ref().unwrap();
        assert_eq!(names(nested), ["c.txt", "empty"]);
        assert_eq!(nested[0].full_path, "/nested/c.txt");
        assert_eq!(nested[1].children, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_flat_splices_descendants_first() {
        let backend = MemoryBackend::new();
        fixture(&backend).await;
        let nav = Navigator::new(&backend);

        let items = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::flat())
            .await
            .unwrap();
        assert_eq!(names(&items), ["c.txt", "a.txt", "b.txt", "nested"]);
        assert_eq!(items[0].full_path, "/nested/c.txt");
        assert!(items.iter().all(|i| i.children.is_none()));
    }

    #[tokio::test]
    async fn test_flat_deeper_nesting() {
        let backend = MemoryBackend::new();
        let nav = Navigator::new(&backend);
        touch(&nav, "/x/file1").await;
        touch(&nav, "/x/y/file2").await;
        touch(&nav, "/top").await;

        let items = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::flat())
            .await
            .unwrap();
        let paths: Vec<_> = items.iter().map(|i| i.full_path.as_str()).collect();
        assert_eq!(paths, ["/x/y/file2", "/x/file1", "/x/y", "/x", "/top"]);
    }

    #[tokio::test]
    async fn test_follows_backend_order() {
        let backend = MemoryBackend::with_order(EnumerationOrder::Reverse);
        fixture(&backend).await;
        let nav = Navigator::new(&backend);

        let items = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::flat())
            .await
            .unwrap();
        assert_eq!(names(&items), ["c.txt", "nested", "b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let backend = MemoryBackend::new();
        touch(&Navigator::new(&backend), "/file.txt").await;
        let nav = Navigator::new(&backend);

        let missing = Lister::new(None)
            .list(&nav, &path("/fake"), ListOptions::shallow())
            .await;
        assert!(matches!(missing, Err(VfsError::NotFound(_))));

        let not_dir = Lister::new(None)
            .list(&nav, &path("/file.txt"), ListOptions::shallow())
            .await;
        assert!(not_dir.is_err());
    }

    #[tokio::test]
    async fn test_mime_annotation() {
        let backend = MemoryBackend::new();
        let nav = Navigator::new(&backend);
        let png = nav.file(&path("/img"), Resolve::creating(false)).await.unwrap();
        let mut stream = png.open_writable(false).await.unwrap();
        stream
            .write(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
            .await
            .unwrap();
        stream.close().await.unwrap();
        touch(&nav, "/page").await;
        backend.set_reported_mime(&["page"], Some("text/html")).unwrap();

        let sniffer = InferSniffer;
        let items = Lister::new(Some(&sniffer))
            .list(&nav, &VfsPath::root(), ListOptions::shallow())
            .await
            .unwrap();
        assert_eq!(items[0].mime.as_deref(), Some("image/png"));
        assert_eq!(items[0].size, Some(8));
        assert_eq!(items[1].mime.as_deref(), Some("text/html"));

        let unsniffed = Lister::new(None)
            .list(&nav, &VfsPath::root(), ListOptions::shallow())
            .await
            .unwrap();
        assert_eq!(unsniffed[0].mime, None);
    }
}
