//! # kura-vfs
//!
//! Path-addressed file and directory operations over a sandboxed storage
//! backend that only offers handle-based primitives.
//!
//! The backend ([`StorageBackend`]) can open a named child of a directory,
//! enumerate children, remove a child, and read or write a file whole. On top
//! of that this crate builds:
//!
//! - multi-segment path resolution, optionally creating missing ancestors;
//! - recursive listing as a nested tree or a flat sequence;
//! - kind-checked deletion;
//! - file and directory move/rename emulated by copy-then-delete, with
//!   rollback for directory moves.
//!
//! ```no_run
//! use kura_vfs::{ListOptions, MemoryBackend, Store};
//!
//! # async fn demo() {
//! let store = Store::new(MemoryBackend::new());
//! store.file().create_with_data("/notes/today.txt", true, "hello").await;
//! let items = store.dir().list("/", ListOptions::flat()).await;
//! # }
//! ```

pub mod config;
mod delete;
pub mod dir_ops;
pub mod file_ops;
pub mod listing;
pub mod mime;
pub mod navigator;
pub mod path;
pub mod store;
pub mod vfs;

pub use config::{ConfigError, LocalStoreConfig, StoreConfig};
pub use dir_ops::Dirs;
pub use file_ops::{Files, MoveReport};
pub use listing::{ListOptions, Lister};
pub use mime::{InferSniffer, MimeCategory, MimeSniffer, NoSniffer, human_size};
pub use navigator::{Navigator, Resolve};
pub use path::{PathInput, VfsPath};
pub use store::Store;
pub use vfs::{
    DirectoryHandle, EntryKind, EnumerationOrder, ErrorKind, Fault, FaultOp, FileHandle,
    FileMetadata, FileStat, Handle, LocalBackend, MemoryBackend, StorageBackend, TreeItem,
    VfsError, VfsResult, VfsResultExt, WritableStream,
};

