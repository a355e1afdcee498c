//! Storage backends.
//!
//! Backends implement [`StorageBackend`](crate::vfs::StorageBackend) for
//! different storage types.

mod local;
mod memory;

pub use local::LocalBackend;
pub use memory::{EnumerationOrder, Fault, FaultOp, MemoryBackend};
