//! In-memory storage backend.
//!
//! Used for testing and ephemeral stores. All data is lost when dropped.
//!
//! Children keep their creation order, and the order they are enumerated in
//! is selectable via [`EnumerationOrder`], so listings over this backend are
//! deterministic. Failures can be injected per entry name with
//! [`MemoryBackend::inject_fault`] to drive partial-failure paths.

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::SystemTime;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{
    DirectoryHandle, FileHandle, Handle, StorageBackend, WritableStream, validate_name,
};
use crate::vfs::types::{EntryKind, FileMetadata};

/// Order in which [`MemoryBackend`] enumerates directory children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumerationOrder {
    /// Creation order.
    #[default]
    Insertion,
    /// Sorted by name.
    Lexicographic,
    /// Reverse creation order.
    Reverse,
}

/// Backend primitive a [`Fault`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    /// Creating the named child.
    Create,
    /// Removing the named child.
    Remove,
    /// Committing a write to the named file.
    Write,
    /// Reading the named file.
    Read,
}

/// An injected failure: `op` on any entry called `name` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub op: FaultOp,
    pub name: String,
}

impl Fault {
    pub fn create(name: impl Into<String>) -> Self {
        Self { op: FaultOp::Create, name: name.into() }
    }

    pub fn remove(name: impl Into<String>) -> Self {
        Self { op: FaultOp::Remove, name: name.into() }
    }

    pub fn write(name: impl Into<String>) -> Self {
        Self { op: FaultOp::Write, name: name.into() }
    }

    pub fn read(name: impl Into<String>) -> Self {
        Self { op: FaultOp::Read, name: name.into() }
    }
}

#[derive(Debug)]
struct FileNode {
    data: Vec<u8>,
    modified: SystemTime,
    mime: Option<String>,
}

#[derive(Debug, Default)]
struct DirNode {
    children: IndexMap<String, Node>,
}

#[derive(Debug, Clone)]
enum Node {
    File(Arc<RwLock<FileNode>>),
    Directory(Arc<RwLock<DirNode>>),
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Node::File(_) => EntryKind::File,
            Node::Directory(_) => EntryKind::Directory,
        }
    }

    fn empty(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => Node::File(Arc::new(RwLock::new(FileNode {
                data: Vec::new(),
                modified: SystemTime::now(),
                mime: None,
            }))),
            EntryKind::Directory => Node::Directory(Arc::new(RwLock::new(DirNode::default()))),
        }
    }
}

/// Shared state every handle of one backend points at.
#[derive(Debug, Default)]
struct Shared {
    order: EnumerationOrder,
    faults: Mutex<Vec<Fault>>,
}

impl Shared {
    fn check(&self, op: FaultOp, name: &str) -> VfsResult<()> {
        let faults = self.faults.lock();
        if faults.iter().any(|f| f.op == op && f.name == name) {
            return Err(VfsError::other(format!("injected {op:?} failure on {name}")));
        }
        Ok(())
    }
}

/// In-memory storage backend.
///
/// Thread-safe via per-node `RwLock`s.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    root: Arc<RwLock<DirNode>>,
    shared: Arc<Shared>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty store enumerating in creation order.
    pub fn new() -> Self {
        Self::with_order(EnumerationOrder::default())
    }

    /// Create an empty store with the given enumeration order.
    pub fn with_order(order: EnumerationOrder) -> Self {
        Self {
            root: Arc::new(RwLock::new(DirNode::default())),
            shared: Arc::new(Shared {
                order,
                faults: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Make `fault.op` fail for every entry named `fault.name`.
    pub fn inject_fault(&self, fault: Fault) {
        self.shared.faults.lock().push(fault);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.shared.faults.lock().clear();
    }

    /// Set the content type reported for the file at `segments`.
    ///
    /// Stands in for backends that know a file's type from elsewhere
    /// (an upload header, a file picker).
    pub fn set_reported_mime(&self, segments: &[&str], mime: Option<&str>) -> VfsResult<()> {
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(VfsError::invalid_path("no file name"));
        };
        let mut dir = Arc::clone(&self.root);
        for segment in parents {
            let next = match dir.read().children.get(*segment) {
                Some(Node::Directory(d)) => Arc::clone(d),
                _ => return Err(VfsError::not_found(*segment)),
            };
            dir = next;
        }
        match dir.read().children.get(*leaf) {
            Some(Node::File(f)) => {
                f.write().mime = mime.map(str::to_owned);
                Ok(())
            }
            _ => Err(VfsError::not_found(*leaf)),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn root(&self) -> VfsResult<Box<dyn DirectoryHandle>> {
        Ok(Box::new(MemoryDir {
            name: String::new(),
            node: Arc::clone(&self.root),
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MemoryDir {
    name: String,
    node: Arc<RwLock<DirNode>>,
    shared: Arc<Shared>,
}

impl MemoryDir {
    fn handle(&self, name: &str, node: &Node) -> Handle {
        match node {
            Node::File(f) => Handle::File(Box::new(MemoryFile {
                name: name.to_owned(),
                node: Arc::clone(f),
                shared: Arc::clone(&self.shared),
            })),
            Node::Directory(d) => Handle::Directory(Box::new(MemoryDir {
                name: name.to_owned(),
                node: Arc::clone(d),
                shared: Arc::clone(&self.shared),
            })),
        }
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDir {
    fn name(&self) -> &str {
        &self.name
    }

    async fn child(&self, name: &str, kind: EntryKind, create: bool) -> VfsResult<Handle> {
        validate_name(name)?;
        let mut dir = self.node.write();

        if let Some(existing) = dir.children.get(name) {
            return match (existing.kind(), kind) {
                (found, wanted) if found == wanted => Ok(self.handle(name, existing)),
                (EntryKind::File, EntryKind::Directory) => Err(VfsError::not_a_directory(name)),
                _ => Err(VfsError::is_a_directory(name)),
            };
        }

        if !create {
            return Err(VfsError::not_found(name));
        }
        self.shared.check(FaultOp::Create, name)?;

        let node = Node::empty(kind);
        let handle = self.handle(name, &node);
        dir.children.insert(name.to_owned(), node);
        Ok(handle)
    }

    async fn entries(&self) -> VfsResult<Vec<(String, Handle)>> {
        let dir = self.node.read();
        let mut entries: Vec<(String, Handle)> = dir
            .children
            .iter()
            .map(|(name, node)| (name.clone(), self.handle(name, node)))
            .collect();

        match self.shared.order {
            EnumerationOrder::Insertion => {}
            EnumerationOrder::Lexicographic => entries.sort_by(|a, b| a.0.cmp(&b.0)),
            EnumerationOrder::Reverse => entries.reverse(),
        }
        Ok(entries)
    }

    async fn remove_child(&self, name: &str, recursive: bool) -> VfsResult<()> {
        validate_name(name)?;
        self.shared.check(FaultOp::Remove, name)?;
        let mut dir = self.node.write();

        match dir.children.get(name) {
            None => return Err(VfsError::not_found(name)),
            Some(Node::Directory(d)) if !recursive && !d.read().children.is_empty() => {
                return Err(VfsError::other(format!("directory not empty: {name}")));
            }
            Some(_) => {}
        }

        dir.children.shift_remove(name);
        Ok(())
    }
}

struct MemoryFile {
    name: String,
    node: Arc<RwLock<FileNode>>,
    shared: Arc<Shared>,
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all(&self) -> VfsResult<Vec<u8>> {
        self.shared.check(FaultOp::Read, &self.name)?;
        Ok(self.node.read().data.clone())
    }

    async fn metadata(&self) -> VfsResult<FileMetadata> {
        let file = self.node.read();
        Ok(FileMetadata {
            size: file.data.len() as u64,
            modified: file.modified,
            mime: file.mime.clone(),
        })
    }

    async fn open_writable(
        &self,
        keep_existing_data: bool,
    ) -> VfsResult<Box<dyn WritableStream>> {
        let buffer = if keep_existing_data {
            self.node.read().data.clone()
        } else {
            Vec::new()
        };
        Ok(Box::new(MemoryWriter {
            name: self.name.clone(),
            node: Arc::clone(&self.node),
            shared: Arc::clone(&self.shared),
            buffer,
            closed: false,
        }))
    }
}

struct MemoryWriter {
    name: String,
    node: Arc<RwLock<FileNode>>,
    shared: Arc<Shared>,
    buffer: Vec<u8>,
    closed: bool,
}

#[async_trait]
impl WritableStream for MemoryWriter {
    async fn write(&mut self, data: &[u8]) -> VfsResult<()> {
        if self.closed {
            return Err(VfsError::other(format!("stream for {} is closed", self.name)));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> VfsResult<()> {
        if self.closed {
            return Err(VfsError::other(format!("stream for {} is closed", self.name)));
        }
        self.shared.check(FaultOp::Write, &self.name)?;
        self.closed = true;

        let mut file = self.node.write();
        file.data = std::mem::take(&mut self.buffer);
        file.modified = SystemTime::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(file: &dyn FileHandle, data: &[u8], keep: bool) {
        let mut stream = file.open_writable(keep).await.unwrap();
        stream.write(data).await.unwrap();
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        let file = root.file("test.txt", true).await.unwrap();
        write(file.as_ref(), b"hello world", false).await;

        let again = root.file("test.txt", false).await.unwrap();
        assert_eq!(again.read_all().await.unwrap(), b"hello world");
        assert_eq!(again.metadata().await.unwrap().size, 11);
    }

    #[tokio::test]
    async fn test_keep_existing_data_appends() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        let file = root.file("log", true).await.unwrap();
        write(file.as_ref(), b"one", false).await;
        write(file.as_ref(), b" two", true).await;
        assert_eq!(file.read_all().await.unwrap(), b"one two");

        write(file.as_ref(), b"three", false).await;
        assert_eq!(file.read_all().await.unwrap(), b"three");
    }

    #[tokio::test]
    async fn test_unclosed_stream_is_discarded() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        let file = root.file("draft", true).await.unwrap();
        {
            let mut stream = file.open_writable(false).await.unwrap();
            stream.write(b"never committed").await.unwrap();
        }
        assert!(file.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_child_kind_is_checked() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        root.directory("dir", true).await.unwrap();
        root.file("file", true).await.unwrap();

        assert!(matches!(
            root.file("dir", false).await,
            Err(VfsError::IsADirectory(_))
        ));
        assert!(matches!(
            root.directory("file", true).await,
            Err(VfsError::NotADirectory(_))
        ));
        assert!(matches!(
            root.file("missing", false).await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_enumeration_order() {
        for (order, expected) in [
            (EnumerationOrder::Insertion, ["b", "c", "a"]),
            (EnumerationOrder::Lexicographic, ["a", "b", "c"]),
            (EnumerationOrder::Reverse, ["a", "c", "b"]),
        ] {
            let fs = MemoryBackend::with_order(order);
            let root = fs.root().await.unwrap();
            for name in ["b", "c", "a"] {
                root.file(name, true).await.unwrap();
            }
            let names: Vec<_> = root
                .entries()
                .await
                .unwrap()
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            assert_eq!(names, expected, "{order:?}");
        }
    }

    #[tokio::test]
    async fn test_remove_child() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        let dir = root.directory("nonempty", true).await.unwrap();
        dir.file("file.txt", true).await.unwrap();

        assert!(root.remove_child("nonempty", false).await.is_err());
        root.remove_child("nonempty", true).await.unwrap();
        assert!(root.entries().await.unwrap().is_empty());
        assert!(matches!(
            root.remove_child("nonempty", true).await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_removal_keeps_sibling_order() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        for name in ["x", "y", "z"] {
            root.file(name, true).await.unwrap();
        }
        root.remove_child("y", true).await.unwrap();
        root.file("y", true).await.unwrap();

        let names: Vec<_> = root.entries().await.unwrap().into_iter().map(|e| e.0).collect();
        assert_eq!(names, ["x", "z", "y"]);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let fs = MemoryBackend::new();
        fs.inject_fault(Fault::create("blocked"));
        fs.inject_fault(Fault::write("readonly.txt"));
        let root = fs.root().await.unwrap();

        assert!(root.directory("blocked", true).await.is_err());

        let file = root.file("readonly.txt", true).await.unwrap();
        let mut stream = file.open_writable(false).await.unwrap();
        stream.write(b"data").await.unwrap();
        assert!(stream.close().await.is_err());

        fs.clear_faults();
        assert!(root.directory("blocked", true).await.is_ok());
    }

    #[tokio::test]
    async fn test_reported_mime() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        let dir = root.directory("docs", true).await.unwrap();
        let file = dir.file("page", true).await.unwrap();

        fs.set_reported_mime(&["docs", "page"], Some("text/html")).unwrap();
        let meta = file.metadata().await.unwrap();
        assert_eq!(meta.reported_mime(), Some("text/html"));
        assert!(fs.set_reported_mime(&["docs", "missing"], None).is_err());
    }

    #[tokio::test]
    async fn test_bad_names_rejected() {
        let fs = MemoryBackend::new();
        let root = fs.root().await.unwrap();
        assert!(matches!(
            root.file("a/b", true).await,
            Err(VfsError::InvalidPath(_))
        ));
        assert!(root.directory("..", true).await.is_err());
    }
}
