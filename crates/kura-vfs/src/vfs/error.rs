//! Errors raised by backends and the path layer.

use std::io;
use thiserror::Error;

/// Failure of a backend primitive or a path-level operation.
#[derive(Debug, Error)]
pub enum VfsError {
    /// No entry under that name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Mutation attempted on a read-only backend.
    #[error("storage is read-only")]
    ReadOnly,

    /// A directory was required but the entry is a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A file was required but the entry is a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Malformed path or entry name.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Anything else the backend reports, as text.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a [`VfsError`].
///
/// Callers that only care about "what went wrong" match on this instead of
/// the full error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path string was malformed or a required leaf name was missing.
    InvalidPath,
    /// The entry is missing, or exists with the wrong kind.
    NotFound,
    /// The entry already exists where it must not.
    AlreadyExists,
    /// Opaque storage failure.
    Backend,
}

impl VfsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Wrap a backend message that fits no other variant.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Classify this error.
    ///
    /// Kind mismatches count as `NotFound`: asking for a file where a
    /// directory lives means the requested file does not exist.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VfsError::InvalidPath(_) => ErrorKind::InvalidPath,
            VfsError::NotFound(_) | VfsError::NotADirectory(_) | VfsError::IsADirectory(_) => {
                ErrorKind::NotFound
            }
            VfsError::Io(e) if e.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
            VfsError::Io(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                ErrorKind::AlreadyExists
            }
            VfsError::ReadOnly | VfsError::Io(_) | VfsError::Other(_) => ErrorKind::Backend,
        }
    }
}

pub type VfsResult<T> = Result<T, VfsError>;

/// Collapse a [`VfsResult`] into the boolean / optional contract of the
/// public operations, logging the discarded error.
pub trait VfsResultExt<T> {
    /// `true` on success; the error is logged at debug level.
    fn succeeded(self, op: &'static str) -> bool;

    /// `Some` on success; the error is logged at debug level.
    fn found(self, op: &'static str) -> Option<T>;
}

impl<T> VfsResultExt<T> for VfsResult<T> {
    fn succeeded(self, op: &'static str) -> bool {
        self.found(op).is_some()
    }

    fn found(self, op: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(op, kind = ?e.kind(), "{e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_is_not_found() {
        assert_eq!(VfsError::not_a_directory("/a").kind(), ErrorKind::NotFound);
        assert_eq!(VfsError::is_a_directory("/a").kind(), ErrorKind::NotFound);
        assert_eq!(VfsError::invalid_path("//").kind(), ErrorKind::InvalidPath);
        assert_eq!(VfsError::ReadOnly.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_io_errors_classified_by_io_kind() {
        let missing = VfsError::from(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let broken = VfsError::from(io::Error::other("disk on fire"));
        assert_eq!(broken.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_collapse_to_contract() {
        let ok: VfsResult<u8> = Ok(7);
        assert_eq!(ok.found("test"), Some(7));

        let err: VfsResult<()> = Err(VfsError::not_found("/x"));
        assert!(!err.succeeded("test"));
    }
}
