//! Storage capability layer.
//!
//! This module defines the primitive, handle-based backend the rest of the
//! crate builds on. Key components:
//!
//! - [`StorageBackend`] - Entry point yielding the root [`DirectoryHandle`]
//! - [`DirectoryHandle`] / [`FileHandle`] / [`WritableStream`] - Primitive ops
//! - [`MemoryBackend`] - In-memory store with controllable enumeration order
//! - [`LocalBackend`] - Host directory access (names confined to the root)
//!
//! ## Design Decisions
//!
//! - **Handles, not paths**: Backends never see a multi-segment path. Path
//!   resolution happens one child name at a time in the navigator.
//! - **Whole-file I/O**: Reads return the full contents and writes replace
//!   (or extend) the full contents on close.
//! - **Host-defined order**: Enumeration order belongs to the backend and is
//!   never sorted here.

pub mod backends;
mod error;
mod ops;
mod types;

pub use backends::{EnumerationOrder, Fault, FaultOp, LocalBackend, MemoryBackend};
pub use error::{ErrorKind, VfsError, VfsResult, VfsResultExt};
pub use ops::{DirectoryHandle, FileHandle, Handle, StorageBackend, WritableStream, validate_name};
pub use types::{EntryKind, FileMetadata, FileStat, TreeItem};
