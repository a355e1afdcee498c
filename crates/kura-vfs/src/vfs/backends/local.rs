//! Local filesystem backend.
//!
//! Exposes a host directory as a storage root. Handles only ever address a
//! directory's direct children by validated single-segment names, so nothing
//! outside the root is reachable. Symlinks and special files are invisible:
//! enumeration skips them and opening one fails.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{
    DirectoryHandle, FileHandle, Handle, StorageBackend, WritableStream, validate_name,
};
use crate::vfs::types::{EntryKind, FileMetadata};

/// Local filesystem backend.
///
/// All handles are relative to `root`. For example, if `root` is
/// `/home/amy/store`, then the child `notes.txt` of the root handle is
/// `/home/amy/store/notes.txt`.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    read_only: bool,
}

impl LocalBackend {
    /// Create a new local store rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            read_only: false,
        }
    }

    /// Create a read-only local store.
    pub fn read_only(root: impl Into<PathBuf>) -> Self {
        Self {
            read_only: true,
            ..Self::new(root)
        }
    }

    /// Set whether this store is read-only.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Get the root path.
    pub fn root_path(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn root(&self) -> VfsResult<Box<dyn DirectoryHandle>> {
        let meta = fs::metadata(&self.root)
            .await
            .map_err(|e| io_error(e, &self.root))?;
        if !meta.is_dir() {
            return Err(VfsError::not_a_directory(self.root.display().to_string()));
        }
        Ok(Box::new(LocalDir {
            name: String::new(),
            path: self.root.clone(),
            read_only: self.read_only,
        }))
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}

/// Map an I/O error, keeping `NotFound` distinguishable.
fn io_error(e: io::Error, path: &Path) -> VfsError {
    match e.kind() {
        io::ErrorKind::NotFound => VfsError::not_found(path.display().to_string()),
        _ => VfsError::Io(e),
    }
}

/// Kind of the entry at `path`, or `None` for symlinks and special files.
fn entry_kind(file_type: std::fs::FileType) -> Option<EntryKind> {
    if file_type.is_symlink() {
        None
    } else if file_type.is_dir() {
        Some(EntryKind::Directory)
    } else if file_type.is_file() {
        Some(EntryKind::File)
    } else {
        None
    }
}

struct LocalDir {
    name: String,
    path: PathBuf,
    read_only: bool,
}

impl LocalDir {
    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn handle(&self, name: &str, kind: EntryKind) -> Handle {
        let path = self.path.join(name);
        match kind {
            EntryKind::Directory => Handle::Directory(Box::new(LocalDir {
                name: name.to_owned(),
                path,
                read_only: self.read_only,
            })),
            EntryKind::File => Handle::File(Box::new(LocalFile {
                name: name.to_owned(),
                path,
                read_only: self.read_only,
            })),
        }
    }
}

#[async_trait]
impl DirectoryHandle for LocalDir {
    fn name(&self) -> &str {
        &self.name
    }

    async fn child(&self, name: &str, kind: EntryKind, create: bool) -> VfsResult<Handle> {
        validate_name(name)?;
        let path = self.path.join(name);

        match fs::symlink_metadata(&path).await {
            Ok(meta) => {
                return match entry_kind(meta.file_type()) {
                    Some(found) if found == kind => Ok(self.handle(name, kind)),
                    Some(EntryKind::File) => Err(VfsError::not_a_directory(name)),
                    Some(EntryKind::Directory) => Err(VfsError::is_a_directory(name)),
                    None => Err(VfsError::not_found(name)),
                };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(VfsError::Io(e)),
        }

        if !create {
            return Err(VfsError::not_found(name));
        }
        self.check_writable()?;

        match kind {
            EntryKind::Directory => fs::create_dir(&path).await,
            EntryKind::File => fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
                .map(drop),
        }
        .map_err(|e| io_error(e, &path))?;

        Ok(self.handle(name, kind))
    }

    async fn entries(&self) -> VfsResult<Vec<(String, Handle)>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))?;

        while let Some(entry) = dir.next_entry().await.map_err(VfsError::from)? {
            let file_type = entry.file_type().await.map_err(VfsError::from)?;
            let Some(kind) = entry_kind(file_type) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let handle = self.handle(&name, kind);
            entries.push((name, handle));
        }

        Ok(entries)
    }

    async fn remove_child(&self, name: &str, recursive: bool) -> VfsResult<()> {
        validate_name(name)?;
        self.check_writable()?;
        let path = self.path.join(name);

        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(|e| io_error(e, &path))?;
        let result = match entry_kind(meta.file_type()) {
            Some(EntryKind::Directory) if recursive => fs::remove_dir_all(&path).await,
            Some(EntryKind::Directory) => fs::remove_dir(&path).await,
            Some(EntryKind::File) => fs::remove_file(&path).await,
            None => return Err(VfsError::not_found(name)),
        };
        result.map_err(|e| io_error(e, &path))
    }
}

struct LocalFile {
    name: String,
    path: PathBuf,
    read_only: bool,
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all(&self) -> VfsResult<Vec<u8>> {
        fs::read(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))
    }

    async fn metadata(&self) -> VfsResult<FileMetadata> {
        let meta = fs::metadata(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))?;
        Ok(FileMetadata {
            size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            mime: None,
        })
    }

    async fn open_writable(
        &self,
        keep_existing_data: bool,
    ) -> VfsResult<Box<dyn WritableStream>> {
        if self.read_only {
            return Err(VfsError::ReadOnly);
        }
        Ok(Box::new(LocalWriter {
            path: self.path.clone(),
            append: keep_existing_data,
            buffer: Vec::new(),
            closed: false,
        }))
    }
}

/// Buffers writes and commits them in one go on close, so readers never
/// observe a half-written file through this layer.
struct LocalWriter {
    path: PathBuf,
    append: bool,
    buffer: Vec<u8>,
    closed: bool,
}

#[async_trait]
impl WritableStream for LocalWriter {
    async fn write(&mut self, data: &[u8]) -> VfsResult<()> {
        if self.closed {
            return Err(VfsError::other(format!(
                "stream for {} is closed",
                self.path.display()
            )));
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> VfsResult<()> {
        if self.closed {
            return Err(VfsError::other(format!(
                "stream for {} is closed",
                self.path.display()
            )));
        }
        self.closed = true;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))?;
        file.write_all(&self.buffer).await.map_err(VfsError::from)?;
        file.flush().await.map_err(VfsError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (LocalBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path());
        (backend, dir)
    }

    async fn write(file: &dyn FileHandle, data: &[u8], keep: bool) {
        let mut stream = file.open_writable(keep).await.unwrap();
        stream.write(data).await.unwrap();
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let (backend, dir) = setup();
        let root = backend.root().await.unwrap();

        let file = root.file("test.txt", true).await.unwrap();
        write(file.as_ref(), b"hello world", false).await;

        assert_eq!(file.read_all().await.unwrap(), b"hello world");
        assert_eq!(
            std::fs::read(dir.path().join("test.txt")).unwrap(),
            b"hello world"
        );
        assert_eq!(file.metadata().await.unwrap().size, 11);
    }

    #[tokio::test]
    async fn test_append_and_overwrite() {
        let (backend, _dir) = setup();
        let root = backend.root().await.unwrap();
        let file = root.file("log.txt", true).await.unwrap();

        write(file.as_ref(), b"one", false).await;
        write(file.as_ref(), b" two", true).await;
        assert_eq!(file.read_all().await.unwrap(), b"one two");

        write(file.as_ref(), b"3", false).await;
        assert_eq!(file.read_all().await.unwrap(), b"3");
    }

    #[tokio::test]
    async fn test_create_is_idempotent_and_kind_checked() {
        let (backend, _dir) = setup();
        let root = backend.root().await.unwrap();

        let sub = root.directory("subdir", true).await.unwrap();
        sub.file("file.txt", true).await.unwrap();
        let again = root.directory("subdir", true).await.unwrap();
        assert_eq!(again.entries().await.unwrap().len(), 1);

        assert!(matches!(
            root.file("subdir", false).await,
            Err(VfsError::IsADirectory(_))
        ));
        assert!(matches!(
            root.directory("missing", false).await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_child() {
        let (backend, dir) = setup();
        let root = backend.root().await.unwrap();
        let sub = root.directory("nonempty", true).await.unwrap();
        sub.file("file.txt", true).await.unwrap();

        assert!(root.remove_child("nonempty", false).await.is_err());
        root.remove_child("nonempty", true).await.unwrap();
        assert!(!dir.path().join("nonempty").exists());
    }

    #[tokio::test]
    async fn test_read_only() {
        let (mut backend, _dir) = setup();
        backend.set_read_only(true);
        let root = backend.root().await.unwrap();

        let result = root.file("test.txt", true).await;
        assert!(matches!(result, Err(VfsError::ReadOnly)));
        assert!(StorageBackend::read_only(&backend));
    }

    #[tokio::test]
    async fn test_escape_blocked() {
        let (backend, _dir) = setup();
        let root = backend.root().await.unwrap();

        assert!(matches!(
            root.directory("..", false).await,
            Err(VfsError::InvalidPath(_))
        ));
        assert!(root.file("../../etc/passwd", false).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_invisible() {
        let (backend, dir) = setup();
        std::fs::write(dir.path().join("target.txt"), "content").unwrap();
        std::os::unix::fs::symlink(dir.path().join("target.txt"), dir.path().join("link.txt"))
            .unwrap();

        let root = backend.root().await.unwrap();
        let names: Vec<_> = root.entries().await.unwrap().into_iter().map(|e| e.0).collect();
        assert_eq!(names, ["target.txt"]);
        assert!(root.file("link.txt", false).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path().join("nope"));
        assert!(backend.root().await.is_err());
    }
}
